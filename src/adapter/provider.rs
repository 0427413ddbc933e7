//! Interfaces of the token-analysis collaborators the adapters drive.

use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::Range;
use url::Url;

use crate::semantic::ProvidedTokens;

/// Failure reported by a token provider.
///
/// Adapters never propagate this to their callers; it is logged and the
/// request resolves to "no result".
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub type ProviderResult = Result<Option<ProvidedTokens>, ProviderError>;

/// Computes semantic tokens for a whole document.
pub trait DocumentSemanticTokensProvider: Send + Sync {
    /// Fresh token array for the document. `Ok(None)` means nothing to report.
    fn provide_full(
        &self,
        uri: &Url,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ProviderResult> + Send;

    /// Whether [`provide_edits`](Self::provide_edits) is implemented.
    fn supports_edits(&self) -> bool {
        false
    }

    /// Tokens relative to the provider's own earlier result `previous_result_id`.
    ///
    /// May answer with either a full array or edits.
    fn provide_edits(
        &self,
        _uri: &Url,
        _previous_result_id: &str,
        _cancel: &CancellationToken,
    ) -> impl Future<Output = ProviderResult> + Send {
        async { Ok(None) }
    }
}

/// Computes semantic tokens for a range of a document.
pub trait DocumentRangeSemanticTokensProvider: Send + Sync {
    /// Must answer with a full token array scoped to `range`.
    fn provide_range(
        &self,
        uri: &Url,
        range: Range,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ProviderResult> + Send;
}
