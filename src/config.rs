//! Runtime configuration for the binary.
//!
//! The library itself takes no ambient configuration; it only emits
//! `tracing` events. The binary reads this struct from the environment and
//! installs the subscriber accordingly.

/// Process configuration derived from the environment.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Enables debug-level logging for this crate.
    pub verbose: bool,
}

impl Config {
    /// Read configuration from `CARDFERRY_DEBUG` ("1"/"true"/"yes").
    pub fn from_env() -> Self {
        let verbose = std::env::var("CARDFERRY_DEBUG")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self { verbose }
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "cardferry=debug,info"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_follows_verbosity() {
        assert_eq!(Config { verbose: true }.log_directive(), "cardferry=debug,info");
        assert_eq!(Config { verbose: false }.log_directive(), "info");
    }
}
