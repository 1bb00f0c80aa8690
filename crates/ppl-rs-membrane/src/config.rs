//! Membrane configuration.
//!
//! Resolved once, from the environment unless [`install`] ran first:
//! - `PPL_RS_PROTOCOL`: `abort` (default) or `report`. Decides what happens
//!   when a failing call's status disagrees with its error report.
//! - `PPL_RS_TIMEOUT_CSECS`: wall-clock budget in centiseconds, armed when
//!   the library is initialized.
//! - `PPL_RS_DETERMINISTIC_TIMEOUT`: budget of elementary computation steps.
//! - `PPL_RS_COEFFICIENT_BITS`: coefficient bound in bits; `0` is unbounded.
//!
//! Unparsable values fall back to the defaults.

use std::sync::OnceLock;

use serde::Serialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProtocolPolicy {
    /// Record the violation, then abort the process.
    #[default]
    Abort,
    /// Return `PplError::Protocol` to the caller.
    Report,
}

impl ProtocolPolicy {
    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "report" | "return" | "error" => Self::Report,
            _ => Self::Abort,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub protocol: ProtocolPolicy,
    pub timeout_csecs: Option<u32>,
    pub deterministic_timeout: Option<u64>,
    pub coefficient_bits: u32,
}

fn positive<T: std::str::FromStr + PartialEq + Default>(raw: Option<String>) -> Option<T> {
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v != T::default())
}

impl Config {
    /// Build from a variable lookup; `std::env::var` in production.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            protocol: lookup("PPL_RS_PROTOCOL")
                .map(|v| ProtocolPolicy::from_str_loose(&v))
                .unwrap_or_default(),
            timeout_csecs: positive(lookup("PPL_RS_TIMEOUT_CSECS")),
            deterministic_timeout: positive(lookup("PPL_RS_DETERMINISTIC_TIMEOUT")),
            coefficient_bits: positive(lookup("PPL_RS_COEFFICIENT_BITS")).unwrap_or(0),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// The process configuration, read from the environment on first use.
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Install `cfg` before first use; hands it back if a configuration is
/// already in place.
pub fn install(cfg: Config) -> Result<(), Config> {
    CONFIG.set(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn parse_protocol_policies() {
        assert_eq!(ProtocolPolicy::from_str_loose("report"), ProtocolPolicy::Report);
        assert_eq!(ProtocolPolicy::from_str_loose(" REPORT "), ProtocolPolicy::Report);
        assert_eq!(ProtocolPolicy::from_str_loose("abort"), ProtocolPolicy::Abort);
        assert_eq!(ProtocolPolicy::from_str_loose("bogus"), ProtocolPolicy::Abort);
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn values_are_parsed_loosely() {
        let cfg = Config::from_lookup(lookup(&[
            ("PPL_RS_PROTOCOL", "report"),
            ("PPL_RS_TIMEOUT_CSECS", "250"),
            ("PPL_RS_DETERMINISTIC_TIMEOUT", "not a number"),
            ("PPL_RS_COEFFICIENT_BITS", "64"),
        ]));
        assert_eq!(cfg.protocol, ProtocolPolicy::Report);
        assert_eq!(cfg.timeout_csecs, Some(250));
        assert_eq!(cfg.deterministic_timeout, None);
        assert_eq!(cfg.coefficient_bits, 64);
    }

    #[test]
    fn zero_budgets_mean_unset() {
        let cfg = Config::from_lookup(lookup(&[
            ("PPL_RS_TIMEOUT_CSECS", "0"),
            ("PPL_RS_COEFFICIENT_BITS", "0"),
        ]));
        assert_eq!(cfg.timeout_csecs, None);
        assert_eq!(cfg.coefficient_bits, 0);
    }
}
