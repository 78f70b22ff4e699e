//! Shared helpers for command handlers.

use std::path::Path;

use serde::de::DeserializeOwned;

use netgate_core::EntityId;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON in {}: {e}", path.display()),
    })
}

pub fn entity_id(raw: &str) -> EntityId {
    EntityId::from(raw.trim())
}

/// Render an optional value, `-` when absent.
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn read_json_file_reports_path_on_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rule.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_json_file::<serde_json::Value>(&path).unwrap_err();
        assert!(err.to_string().contains("rule.json"));
    }

    #[test]
    fn confirm_short_circuits_with_yes() {
        assert!(confirm("Delete everything?", true).unwrap());
    }

    #[test]
    fn or_dash_fills_missing() {
        assert_eq!(or_dash(None::<u32>), "-");
        assert_eq!(or_dash(Some(1500)), "1500");
    }
}
