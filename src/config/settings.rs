use serde::Deserialize;

use crate::error::{SemanticTokensError, SemanticTokensResult};

/// One layer of configuration as written by the user.
///
/// Every field is optional so layers can be merged; see [`merge_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensConfig {
    /// Upper bound on cached previous results per document.
    pub max_retained_results: Option<usize>,
    /// Ask providers for edits when they support it.
    pub prefer_provider_edits: Option<bool>,
}

impl SemanticTokensConfig {
    pub fn from_toml_str(contents: &str) -> SemanticTokensResult<Self> {
        toml::from_str(contents).map_err(|err| SemanticTokensError::config(err.to_string()))
    }

    pub fn from_json(value: serde_json::Value) -> SemanticTokensResult<Self> {
        serde_json::from_value(value).map_err(|err| SemanticTokensError::config(err.to_string()))
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(self, other: SemanticTokensConfig) -> SemanticTokensConfig {
        SemanticTokensConfig {
            max_retained_results: other.max_retained_results.or(self.max_retained_results),
            prefer_provider_edits: other.prefer_provider_edits.or(self.prefer_provider_edits),
        }
    }
}

/// Merge layers in order; later layers override earlier ones.
pub fn merge_all(layers: &[Option<SemanticTokensConfig>]) -> SemanticTokensConfig {
    layers
        .iter()
        .flatten()
        .cloned()
        .fold(SemanticTokensConfig::default(), SemanticTokensConfig::merge)
}

/// Resolved settings used by the adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticTokensSettings {
    /// `None` keeps every result until it is released.
    pub max_retained_results: Option<usize>,
    pub prefer_provider_edits: bool,
}

impl Default for SemanticTokensSettings {
    fn default() -> Self {
        Self {
            max_retained_results: None,
            prefer_provider_edits: true,
        }
    }
}

impl TryFrom<SemanticTokensConfig> for SemanticTokensSettings {
    type Error = SemanticTokensError;

    fn try_from(config: SemanticTokensConfig) -> Result<Self, Self::Error> {
        // A cap of zero would evict the entry a reply was just built on.
        if config.max_retained_results == Some(0) {
            return Err(SemanticTokensError::config(
                "maxRetainedResults must be at least 1",
            ));
        }
        let defaults = SemanticTokensSettings::default();
        Ok(Self {
            max_retained_results: config.max_retained_results,
            prefer_provider_edits: config
                .prefer_provider_edits
                .unwrap_or(defaults.prefer_provider_edits),
        })
    }
}
