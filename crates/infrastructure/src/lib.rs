//! Warden DNS Infrastructure Layer: resolver, cache and wire transports.
pub mod dns;
