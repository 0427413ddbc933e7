//! Semantic tokens for a range of a document.
//!
//! Range replies are always full snapshots with `ResultHandle::NONE`; nothing
//! is cached and there is no delta path.

use tokio_util::sync::CancellationToken;
use tower_lsp_server::ls_types::Range;
use url::Url;

use super::provider::DocumentRangeSemanticTokensProvider;
use crate::error::{SemanticTokensError, SemanticTokensResult};
use crate::semantic::token::is_whole_tokens;
use crate::semantic::{ProvidedTokens, ResultHandle, SemanticTokensCodec, TokensSnapshot};

const LOG_TARGET: &str = "semantic_tokens_wire::range";

pub struct RangeSemanticTokensAdapter<P> {
    provider: P,
    codec: SemanticTokensCodec,
}

impl<P: DocumentRangeSemanticTokensProvider> RangeSemanticTokensAdapter<P> {
    pub fn new(provider: P, codec: SemanticTokensCodec) -> Self {
        Self { provider, codec }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Encoded full snapshot of the tokens in `range`.
    ///
    /// Provider failures and cancellation yield `Ok(None)`. A provider that
    /// answers with edits, or with data that is not whole tokens, breaks its
    /// contract and fails the request.
    pub async fn provide_range_semantic_tokens(
        &self,
        uri: &Url,
        range: Range,
        cancel: &CancellationToken,
    ) -> SemanticTokensResult<Option<Vec<u8>>> {
        Ok(self
            .provide_range_snapshot(uri, range, cancel)
            .await?
            .map(|snapshot| self.codec.encode(&snapshot)))
    }

    pub async fn provide_range_snapshot(
        &self,
        uri: &Url,
        range: Range,
        cancel: &CancellationToken,
    ) -> SemanticTokensResult<Option<TokensSnapshot>> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            result = self.provider.provide_range(uri, range, cancel) => result,
        };

        let tokens = match result {
            Ok(Some(ProvidedTokens::Tokens(tokens))) => tokens,
            Ok(Some(ProvidedTokens::Edits(_))) => {
                return Err(SemanticTokensError::contract_violation(format!(
                    "range provider returned edits for {}",
                    uri
                )));
            }
            Ok(None) => return Ok(None),
            Err(err) => {
                log::warn!(
                    target: LOG_TARGET,
                    "Range semantic token provider failed for {}: {}",
                    uri,
                    err
                );
                return Ok(None);
            }
        };

        if !is_whole_tokens(tokens.data.len()) {
            return Err(SemanticTokensError::contract_violation(format!(
                "range provider returned {} words for {}, not a multiple of 5",
                tokens.data.len(),
                uri
            )));
        }

        if cancel.is_cancelled() {
            return Ok(None);
        }

        Ok(Some(TokensSnapshot::Full {
            result_handle: ResultHandle::NONE,
            data: tokens.data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::provider::{ProviderError, ProviderResult};
    use crate::semantic::{SemanticTokens, SemanticTokensEdits};
    use std::sync::Mutex;
    use tower_lsp_server::ls_types::Position;

    struct FixedProvider {
        response: Mutex<Option<ProviderResult>>,
        seen_ranges: Mutex<Vec<Range>>,
        cancel_during_call: bool,
    }

    impl FixedProvider {
        fn new(response: ProviderResult) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                seen_ranges: Mutex::new(Vec::new()),
                cancel_during_call: false,
            }
        }
    }

    impl DocumentRangeSemanticTokensProvider for FixedProvider {
        async fn provide_range(
            &self,
            _uri: &Url,
            range: Range,
            cancel: &CancellationToken,
        ) -> ProviderResult {
            self.seen_ranges.lock().unwrap().push(range);
            if self.cancel_during_call {
                cancel.cancel();
            }
            self.response.lock().unwrap().take().unwrap_or(Ok(None))
        }
    }

    fn range() -> Range {
        Range::new(Position::new(2, 0), Position::new(4, 10))
    }

    fn uri() -> Url {
        Url::parse("file:///test.lua").unwrap()
    }

    #[tokio::test]
    async fn returns_full_snapshot_without_handle() {
        let adapter = RangeSemanticTokensAdapter::new(
            FixedProvider::new(Ok(Some(ProvidedTokens::Tokens(SemanticTokens {
                result_id: Some("ignored".to_string()),
                data: vec![2, 0, 5, 1, 0],
            })))),
            SemanticTokensCodec::default(),
        );

        let bytes = adapter
            .provide_range_semantic_tokens(&uri(), range(), &CancellationToken::new())
            .await
            .unwrap()
            .expect("range tokens");

        assert_eq!(
            SemanticTokensCodec::default().decode(&bytes).unwrap(),
            TokensSnapshot::Full {
                result_handle: ResultHandle::NONE,
                data: vec![2, 0, 5, 1, 0],
            }
        );
        assert_eq!(*adapter.provider().seen_ranges.lock().unwrap(), vec![range()]);
    }

    #[tokio::test]
    async fn edits_are_a_contract_violation() {
        let adapter = RangeSemanticTokensAdapter::new(
            FixedProvider::new(Ok(Some(ProvidedTokens::Edits(SemanticTokensEdits::default())))),
            SemanticTokensCodec::default(),
        );

        let err = adapter
            .provide_range_semantic_tokens(&uri(), range(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SemanticTokensError::ContractViolation { .. }));
    }

    #[tokio::test]
    async fn partial_tokens_are_a_contract_violation() {
        let adapter = RangeSemanticTokensAdapter::new(
            FixedProvider::new(Ok(Some(ProvidedTokens::Tokens(SemanticTokens {
                result_id: None,
                data: vec![1, 2],
            })))),
            SemanticTokensCodec::default(),
        );

        let result = adapter
            .provide_range_snapshot(&uri(), range(), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(SemanticTokensError::ContractViolation { .. })
        ));
    }

    #[tokio::test]
    async fn provider_failure_yields_no_result() {
        let adapter = RangeSemanticTokensAdapter::new(
            FixedProvider::new(Err(ProviderError::new("boom"))),
            SemanticTokensCodec::default(),
        );

        let result = adapter
            .provide_range_snapshot(&uri(), range(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn cancelled_request_yields_no_result() {
        let adapter = RangeSemanticTokensAdapter::new(
            FixedProvider::new(Ok(Some(ProvidedTokens::Tokens(SemanticTokens::default())))),
            SemanticTokensCodec::default(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = adapter
            .provide_range_snapshot(&uri(), range(), &cancel)
            .await
            .unwrap();

        assert!(result.is_none());
        assert!(adapter.provider().seen_ranges.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_during_provider_call_yields_no_result() {
        let adapter = RangeSemanticTokensAdapter::new(
            FixedProvider {
                cancel_during_call: true,
                ..FixedProvider::new(Ok(Some(ProvidedTokens::Tokens(SemanticTokens {
                    result_id: None,
                    data: vec![2, 0, 5, 1, 0],
                }))))
            },
            SemanticTokensCodec::default(),
        );
        let cancel = CancellationToken::new();

        let result = adapter
            .provide_range_semantic_tokens(&uri(), range(), &cancel)
            .await
            .unwrap();

        assert!(cancel.is_cancelled());
        assert_eq!(adapter.provider().seen_ranges.lock().unwrap().len(), 1);
        assert!(result.is_none());
    }
}
