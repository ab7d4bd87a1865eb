use serde::{Deserialize, Serialize};

/// `[logging]` table. `level` takes any `EnvFilter` directive, so
/// `"warn,warden_dns_infrastructure=debug"` works as well as `"debug"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,

    /// One JSON object per event instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
