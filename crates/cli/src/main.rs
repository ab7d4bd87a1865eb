use clap::{Parser, Subcommand};
use tracing::info;
use warden_dns_domain::CliOverrides;

mod bootstrap;
mod commands;
mod di;

#[derive(Parser)]
#[command(name = "warden-dns")]
#[command(version)]
#[command(about = "Warden DNS - cache-aware DNS resolver over pluggable transports")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Bypass the answer cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a domain to addresses
    Lookup {
        domain: String,

        /// Upstream name from the configuration (defaults to the first one)
        #[arg(short, long)]
        server: Option<String>,

        /// as_is, prefer_ipv4, prefer_ipv6, only_ipv4 or only_ipv6
        #[arg(long, default_value = "as_is")]
        strategy: String,
    },
    /// Send a raw DNS query and print the answer
    Query {
        domain: String,

        /// Record type, e.g. A, AAAA, MX, TXT, HTTPS
        #[arg(short = 't', long = "type", default_value = "A")]
        record_type: String,

        #[arg(short, long)]
        server: Option<String>,

        #[arg(long, default_value = "as_is")]
        strategy: String,

        /// EDNS client subnet to attach, e.g. 198.51.100.0/24
        #[arg(long)]
        subnet: Option<String>,

        /// Rewrite every answer TTL to this value
        #[arg(long)]
        ttl: Option<u32>,
    },
    /// List configured upstreams
    Upstreams,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        log_level: cli.log_level.clone(),
        disable_cache: cli.no_cache,
    };
    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config);

    info!("Starting Warden DNS v{}", env!("CARGO_PKG_VERSION"));

    if let Commands::Upstreams = cli.command {
        commands::list_upstreams(&config);
        return Ok(());
    }

    let services = di::DnsServices::new(&config).await?;

    let result = match cli.command {
        Commands::Lookup {
            domain,
            server,
            strategy,
        } => commands::lookup(&services, &domain, server.as_deref(), &strategy).await,
        Commands::Query {
            domain,
            record_type,
            server,
            strategy,
            subnet,
            ttl,
        } => {
            let request = commands::QueryRequest {
                domain: &domain,
                record_type: &record_type,
                server: server.as_deref(),
                strategy: &strategy,
                subnet: subnet.as_deref(),
                ttl,
            };
            commands::query(&services, request).await
        }
        Commands::Upstreams => Ok(()),
    };

    services.shutdown();
    result
}
