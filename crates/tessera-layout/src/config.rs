//! Runtime switches for the layout engine.

use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Bypass measure/arrange memoization; every call recomputes.
    pub force_full: bool,
    /// Enable the solve debugger from construction.
    pub record_solves: bool,
    /// Emit a `warn!` when a grid arrange solve overflows its extent.
    pub warn_on_overflow: bool,
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

impl LayoutConfig {
    /// Read `TESSERA_FULL_LAYOUT`, `TESSERA_LAYOUT_DEBUG`, and
    /// `TESSERA_LAYOUT_WARN_OVERFLOW` (`1`/`true`/`yes`).
    pub fn from_env() -> Self {
        Self {
            force_full: env_flag("TESSERA_FULL_LAYOUT"),
            record_solves: env_flag("TESSERA_LAYOUT_DEBUG"),
            warn_on_overflow: env_flag("TESSERA_LAYOUT_WARN_OVERFLOW"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_incremental() {
        let config = LayoutConfig::default();
        assert!(!config.force_full);
        assert!(!config.record_solves);
    }

    #[test]
    fn from_env_does_not_panic() {
        // Variables may or may not be set in CI; only the call path matters.
        let _ = LayoutConfig::from_env();
    }

    #[test]
    fn unset_variable_reads_false() {
        assert!(!env_flag("TESSERA_TEST_FLAG_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: LayoutConfig = serde_json::from_str(r#"{"force_full":true}"#).unwrap();
        assert!(config.force_full);
        assert!(!config.warn_on_overflow);
    }
}
