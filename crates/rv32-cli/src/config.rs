//! Run configuration loaded from JSON and refined by command-line flags.

use std::fs;
use std::path::Path;

use rv32_core::CoreConfig;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Step budget when none is configured.
pub const DEFAULT_MAX_STEPS: u64 = 200;

/// Steps between periodic VRAM displays when none is configured.
pub const DEFAULT_DISPLAY_EVERY: u64 = 10;

/// Everything the runner needs besides the program image.
///
/// Core fields sit at the top level of the JSON document:
///
/// ```json
/// { "interrupt_threshold": 50, "max_steps": 1000 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Core configuration.
    #[serde(flatten)]
    pub core: CoreConfig,
    /// Upper bound on executed steps.
    pub max_steps: u64,
    /// Steps between VRAM displays; 0 shows only the final state.
    pub display_every: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            max_steps: DEFAULT_MAX_STEPS,
            display_every: DEFAULT_DISPLAY_EVERY,
        }
    }
}

impl RunConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Config`] when the text is not a valid document.
    pub fn from_json(text: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Io`] when the file cannot be read and
    /// [`CliError::Config`] when it does not parse.
    pub fn from_file(path: &Path) -> Result<Self, CliError> {
        let text = fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal address.
///
/// # Errors
///
/// Returns a message suitable for a command-line parser.
pub fn parse_address(text: &str) -> Result<u32, String> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => trimmed.replace('_', "").parse(),
    };
    parsed.map_err(|err| format!("invalid address {text:?}: {err}"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_document_is_the_default() {
        assert_eq!(RunConfig::from_json("{}").unwrap(), RunConfig::default());
        assert_eq!(RunConfig::default().max_steps, 200);
        assert_eq!(RunConfig::default().display_every, 10);
    }

    #[test]
    fn core_fields_are_flattened() {
        let config = RunConfig::from_json(
            r#"{ "interrupt_threshold": 50, "interrupts_enabled": false, "max_steps": 7 }"#,
        )
        .unwrap();
        assert_eq!(config.core.interrupt_threshold, 50);
        assert!(!config.core.interrupts_enabled);
        assert_eq!(config.core.interrupt_handler, 0x1000);
        assert_eq!(config.max_steps, 7);
        assert_eq!(config.display_every, 10);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = RunConfig::from_json("{ max_steps: }").unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "display_every": 0 }}"#).unwrap();
        let config = RunConfig::from_file(file.path()).unwrap();
        assert_eq!(config.display_every, 0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }

    #[test]
    fn addresses_parse_in_hex_and_decimal() {
        assert_eq!(parse_address("0x1000"), Ok(0x1000));
        assert_eq!(parse_address("0X8_0000"), Ok(0x8_0000));
        assert_eq!(parse_address("4096"), Ok(4096));
        assert!(parse_address("0xZZ").is_err());
        assert!(parse_address("-4").is_err());
    }
}
