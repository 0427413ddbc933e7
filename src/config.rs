//! Layered configuration loading.
//!
//! Layers, lowest precedence first:
//! 1. Programmed defaults
//! 2. `semantic-tokens.toml` in the project root
//! 3. A JSON override, e.g. taken from LSP initialization options
//!
//! Problems are reported as [`SettingsEvent`]s rather than errors so a broken
//! layer never prevents the adapters from starting.

pub mod settings;

pub use settings::{SemanticTokensConfig, SemanticTokensSettings, merge_all};

use serde_json::Value;
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "semantic-tokens.toml";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEventKind {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsEvent {
    pub kind: SettingsEventKind,
    pub message: String,
}

impl SettingsEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Warning,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SettingsLoadOutcome {
    pub settings: SemanticTokensSettings,
    pub events: Vec<SettingsEvent>,
}

pub fn load_settings(
    root_path: Option<&Path>,
    override_settings: Option<Value>,
) -> SettingsLoadOutcome {
    let mut events = Vec::new();

    let project_settings = load_toml_settings(root_path, &mut events);
    let override_settings =
        override_settings.and_then(|value| parse_override_settings(value, &mut events));

    let merged = merge_all(&[project_settings, override_settings]);
    let settings = match SemanticTokensSettings::try_from(merged) {
        Ok(settings) => settings,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Ignoring configuration, falling back to defaults: {}",
                err
            )));
            SemanticTokensSettings::default()
        }
    };

    for event in &events {
        match event.kind {
            SettingsEventKind::Info => {
                log::debug!(target: "semantic_tokens_wire::settings", "{}", event.message)
            }
            SettingsEventKind::Warning => {
                log::warn!(target: "semantic_tokens_wire::settings", "{}", event.message)
            }
        }
    }

    SettingsLoadOutcome { settings, events }
}

fn load_toml_settings(
    root_path: Option<&Path>,
    events: &mut Vec<SettingsEvent>,
) -> Option<SemanticTokensConfig> {
    let root = root_path?;
    let config_path = root.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return None;
    }

    events.push(SettingsEvent::info(format!(
        "Found config file: {}",
        config_path.display()
    )));

    match fs::read_to_string(&config_path) {
        Ok(contents) => match SemanticTokensConfig::from_toml_str(&contents) {
            Ok(config) => {
                events.push(SettingsEvent::info(format!(
                    "Successfully loaded {}",
                    CONFIG_FILE_NAME
                )));
                Some(config)
            }
            Err(err) => {
                events.push(SettingsEvent::warning(format!(
                    "Failed to parse {}: {}",
                    CONFIG_FILE_NAME, err
                )));
                None
            }
        },
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to read {}: {}",
                CONFIG_FILE_NAME, err
            )));
            None
        }
    }
}

fn parse_override_settings(
    value: Value,
    events: &mut Vec<SettingsEvent>,
) -> Option<SemanticTokensConfig> {
    match SemanticTokensConfig::from_json(value) {
        Ok(config) => {
            events.push(SettingsEvent::info("Parsed override settings"));
            Some(config)
        }
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to parse override settings: {}",
                err
            )));
            None
        }
    }
}
