//! Full-document semantic tokens with delta replies.
//!
//! ## Request flow
//!
//! ```text
//! request(uri, previous handle)
//!   │  start generation, look up previous result
//!   ▼
//! provider: edits (if supported and a provider result id is known) or full
//!   │
//!   ▼
//! full + previous full basis ──► compute_delta ──► Delta
//! full, no basis ─────────────────────────────────► Full
//! edits ──► apply to previous basis (if any) ─────► Delta
//!   │
//!   ▼
//! commit: fence stale generations, allocate handle, cache full basis
//!   │
//!   ▼
//! encode
//! ```
//!
//! Previous results are cached per document and live until the caller releases
//! them, the document is closed, or the optional retention cap evicts them.
//! Per-document state is created on the first request for a URI and is only
//! dropped by [`DocumentSemanticTokensAdapter::close_document`]; callers must
//! close documents they no longer serve.
//! Provider failures and cancellation resolve to `None`; nothing is cached.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::provider::DocumentSemanticTokensProvider;
use super::request_tracker::{Generation, RequestTracker};
use super::result_cache::{HandleAllocator, PreviousResult, ResultCache};
use crate::config::SemanticTokensSettings;
use crate::error::LockResultExt;
use crate::semantic::token::is_whole_tokens;
use crate::semantic::{
    ProvidedTokens, ResultHandle, SemanticTokensCodec, SemanticTokensEdit, TokensSnapshot,
    apply_edits, compute_delta,
};

const LOG_TARGET: &str = "semantic_tokens_wire::adapter";

/// Per-document state: its previous results and request generations.
#[derive(Debug, Default)]
struct DocumentState {
    tracker: RequestTracker,
    cache: Mutex<ResultCache>,
}

impl DocumentState {
    fn lookup(&self, handle: ResultHandle) -> Option<PreviousResult> {
        self.cache
            .lock()
            .recover_poison("DocumentState::lookup")
            .get(handle)
            .cloned()
    }
}

/// Reply body before a handle is assigned.
enum ReplyBody {
    Full(Vec<u32>),
    Delta(Vec<SemanticTokensEdit>),
}

/// A reply plus the entry to cache for it.
struct PreparedReply {
    body: ReplyBody,
    basis: PreviousResult,
}

impl ReplyBody {
    fn into_snapshot(self, result_handle: ResultHandle) -> TokensSnapshot {
        match self {
            ReplyBody::Full(data) => TokensSnapshot::Full {
                result_handle,
                data,
            },
            ReplyBody::Delta(edits) => TokensSnapshot::Delta {
                result_handle,
                edits,
            },
        }
    }
}

/// Serves whole-document semantic tokens from a provider, replying with
/// deltas when a previous result is known.
pub struct DocumentSemanticTokensAdapter<P> {
    provider: P,
    codec: SemanticTokensCodec,
    settings: SemanticTokensSettings,
    handles: HandleAllocator,
    documents: DashMap<Url, Arc<DocumentState>>,
}

impl<P: DocumentSemanticTokensProvider> DocumentSemanticTokensAdapter<P> {
    pub fn new(provider: P, codec: SemanticTokensCodec, settings: SemanticTokensSettings) -> Self {
        Self {
            provider,
            codec,
            settings,
            handles: HandleAllocator::new(),
            documents: DashMap::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn codec(&self) -> &SemanticTokensCodec {
        &self.codec
    }

    /// Encoded snapshot for `uri`, as a delta against `previous` when possible.
    ///
    /// `None` means no result: the provider had nothing, failed, the request
    /// was cancelled, or a newer request for the document already answered.
    pub async fn provide_document_semantic_tokens(
        &self,
        uri: &Url,
        previous: ResultHandle,
        cancel: &CancellationToken,
    ) -> Option<Vec<u8>> {
        let snapshot = self.provide_snapshot(uri, previous, cancel).await?;
        Some(self.codec.encode(&snapshot))
    }

    /// Same as [`provide_document_semantic_tokens`](Self::provide_document_semantic_tokens)
    /// without the encoding step.
    pub async fn provide_snapshot(
        &self,
        uri: &Url,
        previous: ResultHandle,
        cancel: &CancellationToken,
    ) -> Option<TokensSnapshot> {
        let document = self.document(uri);
        let generation = document.tracker.start_request();
        let previous_result = document.lookup(previous);

        log::debug!(
            target: LOG_TARGET,
            "START uri={} gen={} previous={} (known: {})",
            uri,
            generation,
            previous,
            previous_result.is_some()
        );

        let provided = self.fetch(uri, previous_result.as_ref(), cancel).await?;

        // Skip the diff if a newer request already answered.
        if document.tracker.is_stale(generation) {
            log::debug!(target: LOG_TARGET, "STALE uri={} gen={}", uri, generation);
            return None;
        }

        let reply = match prepare_reply(provided, previous_result.as_ref()) {
            Ok(reply) => reply,
            Err(message) => {
                log::warn!(
                    target: LOG_TARGET,
                    "Discarding provider result for {}: {}",
                    uri,
                    message
                );
                return None;
            }
        };

        if cancel.is_cancelled() {
            log::debug!(target: LOG_TARGET, "CANCELLED uri={} gen={}", uri, generation);
            return None;
        }

        let PreparedReply { body, basis } = reply;
        let handle = self.commit(uri, &document, generation, basis)?;
        let snapshot = body.into_snapshot(handle);
        log::debug!(
            target: LOG_TARGET,
            "DONE uri={} gen={} handle={} delta={}",
            uri,
            generation,
            handle,
            snapshot.is_delta()
        );
        Some(snapshot)
    }

    /// Forget a previously returned handle. Unknown handles are ignored.
    pub fn release(&self, uri: &Url, handle: ResultHandle) {
        let Some(document) = self.documents.get(uri).map(|entry| Arc::clone(&entry)) else {
            return;
        };
        let released = document
            .cache
            .lock()
            .recover_poison("DocumentSemanticTokensAdapter::release")
            .release(handle);
        if released {
            log::debug!(
                target: "semantic_tokens_wire::result_cache",
                "Released handle {} for {}",
                handle,
                uri
            );
        }
    }

    /// Drop all cached results for a document and fence its in-flight requests.
    pub fn close_document(&self, uri: &Url) {
        if let Some((_, document)) = self.documents.remove(uri) {
            document.tracker.cancel_all();
            document
                .cache
                .lock()
                .recover_poison("DocumentSemanticTokensAdapter::close_document")
                .clear();
            log::debug!(
                target: "semantic_tokens_wire::result_cache",
                "Closed {}",
                uri
            );
        }
    }

    /// Handles currently cached for a document, oldest first.
    pub fn cached_results(&self, uri: &Url) -> Vec<ResultHandle> {
        self.documents
            .get(uri)
            .map(|document| {
                document
                    .cache
                    .lock()
                    .recover_poison("DocumentSemanticTokensAdapter::cached_results")
                    .handles()
            })
            .unwrap_or_default()
    }

    fn document(&self, uri: &Url) -> Arc<DocumentState> {
        Arc::clone(&self.documents.entry(uri.clone()).or_default())
    }

    async fn fetch(
        &self,
        uri: &Url,
        previous: Option<&PreviousResult>,
        cancel: &CancellationToken,
    ) -> Option<ProvidedTokens> {
        let previous_result_id = previous
            .and_then(|result| result.result_id.as_deref())
            .filter(|_| self.settings.prefer_provider_edits && self.provider.supports_edits());

        let request = async {
            match previous_result_id {
                Some(result_id) => self.provider.provide_edits(uri, result_id, cancel).await,
                None => self.provider.provide_full(uri, cancel).await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!(target: LOG_TARGET, "CANCELLED uri={} (during provider call)", uri);
                return None;
            }
            result = request => result,
        };

        match result {
            Ok(Some(provided)) => Some(provided),
            Ok(None) => {
                log::debug!(target: LOG_TARGET, "Provider returned no tokens for {}", uri);
                None
            }
            Err(err) => {
                log::warn!(
                    target: LOG_TARGET,
                    "Semantic token provider failed for {}: {}",
                    uri,
                    err
                );
                None
            }
        }
    }

    /// Write the result into the document's cache if `generation` is still current.
    fn commit(
        &self,
        uri: &Url,
        document: &DocumentState,
        generation: Generation,
        basis: PreviousResult,
    ) -> Option<ResultHandle> {
        let mut cache = document
            .cache
            .lock()
            .recover_poison("DocumentSemanticTokensAdapter::commit");

        if !document.tracker.try_commit(generation) {
            log::debug!(
                target: LOG_TARGET,
                "STALE uri={} gen={} (newer result committed or document closed)",
                uri,
                generation
            );
            return None;
        }

        let Some(handle) = self.handles.allocate() else {
            log::warn!(target: LOG_TARGET, "Result handles exhausted; dropping result for {}", uri);
            return None;
        };
        cache.insert(handle, basis);

        if let Some(max) = self.settings.max_retained_results {
            // The entry just inserted always survives.
            let max = max.max(1);
            let evicted = cache.retain_newest(max);
            if !evicted.is_empty() {
                log::debug!(
                    target: "semantic_tokens_wire::result_cache",
                    "Evicted {} cached result(s) for {} (cap {})",
                    evicted.len(),
                    uri,
                    max
                );
            }
        }

        Some(handle)
    }
}

/// Turn a provider result into the reply and the basis to cache for it.
fn prepare_reply(
    provided: ProvidedTokens,
    previous: Option<&PreviousResult>,
) -> Result<PreparedReply, String> {
    match provided {
        ProvidedTokens::Tokens(tokens) => {
            if !is_whole_tokens(tokens.data.len()) {
                return Err(format!(
                    "token data of {} words is not a multiple of 5",
                    tokens.data.len()
                ));
            }
            let body = match previous.and_then(|result| result.tokens.as_deref()) {
                Some(old) => ReplyBody::Delta(compute_delta(old, &tokens.data)),
                None => ReplyBody::Full(tokens.data.clone()),
            };
            Ok(PreparedReply {
                body,
                basis: PreviousResult::new(tokens.result_id, Some(tokens.data)),
            })
        }
        ProvidedTokens::Edits(edits) => {
            let previous = previous.ok_or("edits returned without a previous result")?;
            let tokens = match previous.tokens.as_deref() {
                Some(base) => {
                    let data = apply_edits(base, &edits.edits).map_err(|err| {
                        format!("edits do not apply to the previous result: {err}")
                    })?;
                    if !is_whole_tokens(data.len()) {
                        return Err(format!(
                            "edited token data of {} words is not a multiple of 5",
                            data.len()
                        ));
                    }
                    Some(data)
                }
                None => None,
            };
            Ok(PreparedReply {
                body: ReplyBody::Delta(edits.edits),
                basis: PreviousResult::new(edits.result_id, tokens),
            })
        }
    }
}
