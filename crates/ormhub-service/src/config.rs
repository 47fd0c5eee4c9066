//! Loading registration options from TOML or JSON
//!
//! Files go through the same shape check as options built in code, so a
//! file may hold a bare model list (JSON only) or an options object.

use ormhub_core::RegistrationInput;
use std::path::Path;
use tracing::{debug, instrument};

use crate::error::{HubError, HubResult};

/// Parse registration options written as TOML
pub fn options_from_toml_str(text: &str) -> HubResult<RegistrationInput> {
    let value: serde_json::Value =
        toml::from_str(text).map_err(|e| HubError::config("TOML input", e))?;
    Ok(RegistrationInput::from_value(value)?)
}

/// Parse registration options written as JSON
pub fn options_from_json_str(text: &str) -> HubResult<RegistrationInput> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| HubError::config("JSON input", e))?;
    Ok(RegistrationInput::from_value(value)?)
}

/// Load registration options from a `.toml` or `.json` file
#[instrument]
pub fn load_options_from_path(path: &Path) -> HubResult<RegistrationInput> {
    let source_name = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|e| HubError::config(&source_name, e))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    debug!(path = %source_name, format = ?extension, "Loading registration options");

    let parsed: serde_json::Value = match extension.as_deref() {
        Some("toml") => toml::from_str(&text).map_err(|e| HubError::config(&source_name, e))?,
        Some("json") => {
            serde_json::from_str(&text).map_err(|e| HubError::config(&source_name, e))?
        }
        _ => {
            return Err(HubError::config(
                &source_name,
                "unsupported file extension, expected .toml or .json",
            ))
        }
    };

    Ok(RegistrationInput::from_value(parsed)?)
}
