//! Console configuration
//!
//! Read from the options object passed to `initWithOptions`; every field is
//! optional. Timing constants are not configurable.

use crate::error::{ConsoleError, ConsoleResult};
use crate::history::DEFAULT_CAPACITY;
use crate::printer::Cadence;
use crate::text::DEFAULT_MARKER;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Leading sequence that flags input as a script block
    pub marker: String,
    pub history_capacity: usize,
    /// What history navigation yields past the newest entry
    pub history_empty_value: String,
    /// Forward intercepted calls to the page's real console
    pub std_passthrough: bool,
    /// Print on animation frames instead of fixed timers
    pub use_animations: bool,
    /// Overlay stylesheet; derived from the script location when unset
    pub stylesheet_url: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            history_capacity: DEFAULT_CAPACITY,
            history_empty_value: String::new(),
            std_passthrough: false,
            use_animations: true,
            stylesheet_url: None,
        }
    }
}

impl ConsoleConfig {
    /// Parse from JSON text, filling in defaults
    pub fn from_json(json: &str) -> ConsoleResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConsoleResult<()> {
        if self.marker.trim().is_empty() {
            return Err(ConsoleError::InvalidConfig("marker must not be empty".into()));
        }
        Ok(())
    }

    pub fn cadence(&self) -> Cadence {
        if self.use_animations {
            Cadence::Animations
        } else {
            Cadence::Timeouts
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.marker, "=>");
        assert_eq!(config.history_capacity, 69);
        assert!(!config.std_passthrough);
        assert_eq!(config.cadence(), Cadence::Animations);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{"marker": ">>", "stdPassthrough": true, "useAnimations": false}"#;
        let config = ConsoleConfig::from_json(json).unwrap();
        assert_eq!(config.marker, ">>");
        assert!(config.std_passthrough);
        assert_eq!(config.cadence(), Cadence::Timeouts);
        assert_eq!(config.history_capacity, 69);
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(ConsoleConfig::from_json("{}").unwrap(), ConsoleConfig::default());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            ConsoleConfig::from_json(r#"{"marker": "  "}"#),
            Err(ConsoleError::InvalidConfig(_))
        ));
        assert!(ConsoleConfig::from_json(r#"{"historyCapacity": -3}"#).is_err());
        assert!(ConsoleConfig::from_json(r#"{"colour": "red"}"#).is_err());
    }
}
