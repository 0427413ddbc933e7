//! Receiving side of the snapshot protocol.
//!
//! `SemanticTokensStore` holds the token array for one document as last
//! reported by the far side's adapter. It remembers which result handle that
//! array corresponds to, so the next request can ask for a delta against it,
//! and hands back superseded handles for the caller to release.

use super::codec::SemanticTokensCodec;
use super::delta::apply_edits;
use super::dto::{ResultHandle, TokensSnapshot};
use super::token::{TokenTuple, is_whole_tokens, iter_tokens};
use crate::error::{ApplyError, SemanticTokensResult};

#[derive(Debug, Default)]
pub struct SemanticTokensStore {
    handle: ResultHandle,
    data: Option<Vec<u32>>,
}

impl SemanticTokensStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to send as "previous result" with the next request.
    pub fn previous_handle(&self) -> ResultHandle {
        self.handle
    }

    pub fn data(&self) -> &[u32] {
        self.data.as_deref().unwrap_or_default()
    }

    pub fn tokens(&self) -> impl Iterator<Item = TokenTuple> + '_ {
        iter_tokens(self.data())
    }

    /// Apply a snapshot and return the handle it supersedes, if any.
    ///
    /// On error the store is left unchanged.
    pub fn apply(&mut self, snapshot: TokensSnapshot) -> Result<Option<ResultHandle>, ApplyError> {
        let (handle, data) = match snapshot {
            TokensSnapshot::Full {
                result_handle,
                data,
            } => {
                if !is_whole_tokens(data.len()) {
                    return Err(ApplyError::InvalidTokenData { len: data.len() });
                }
                (result_handle, data)
            }
            TokensSnapshot::Delta {
                result_handle,
                edits,
            } => {
                let base = self.data.as_deref().ok_or(ApplyError::MissingBase)?;
                let data = apply_edits(base, &edits)?;
                if !is_whole_tokens(data.len()) {
                    return Err(ApplyError::InvalidTokenData { len: data.len() });
                }
                (result_handle, data)
            }
        };

        let superseded = std::mem::replace(&mut self.handle, handle);
        self.data = Some(data);
        Ok((!superseded.is_none() && superseded != handle).then_some(superseded))
    }

    /// Decode `bytes` and apply the snapshot they carry.
    pub fn apply_encoded(
        &mut self,
        codec: &SemanticTokensCodec,
        bytes: &[u8],
    ) -> SemanticTokensResult<Option<ResultHandle>> {
        let snapshot = codec.decode(bytes)?;
        Ok(self.apply(snapshot)?)
    }

    /// Forget everything, e.g. when the document is closed.
    ///
    /// Returns the handle that was current so the caller can release it.
    pub fn clear(&mut self) -> Option<ResultHandle> {
        self.data = None;
        let handle = std::mem::take(&mut self.handle);
        (!handle.is_none()).then_some(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::dto::SemanticTokensEdit;

    fn full(handle: u32, data: Vec<u32>) -> TokensSnapshot {
        TokensSnapshot::Full {
            result_handle: ResultHandle::new(handle),
            data,
        }
    }

    #[test]
    fn full_snapshot_replaces_data() {
        let mut store = SemanticTokensStore::new();
        assert_eq!(store.apply(full(1, vec![0, 0, 3, 1, 0])).unwrap(), None);
        assert_eq!(store.previous_handle(), ResultHandle::new(1));

        let superseded = store.apply(full(2, vec![0, 2, 4, 1, 0])).unwrap();
        assert_eq!(superseded, Some(ResultHandle::new(1)));
        assert_eq!(store.data(), &[0, 2, 4, 1, 0]);
        assert_eq!(store.tokens().next().unwrap().length, 4);
    }

    #[test]
    fn delta_is_applied_to_current_data() {
        let mut store = SemanticTokensStore::new();
        store.apply(full(1, vec![0, 0, 3, 1, 0, 1, 0, 2, 2, 0])).unwrap();

        let superseded = store
            .apply(TokensSnapshot::Delta {
                result_handle: ResultHandle::new(2),
                edits: vec![SemanticTokensEdit {
                    start: 7,
                    delete_count: 1,
                    data: vec![5],
                }],
            })
            .unwrap();

        assert_eq!(superseded, Some(ResultHandle::new(1)));
        assert_eq!(store.data(), &[0, 0, 3, 1, 0, 1, 0, 5, 2, 0]);
    }

    #[test]
    fn delta_without_base_is_rejected() {
        let mut store = SemanticTokensStore::new();
        let err = store
            .apply(TokensSnapshot::Delta {
                result_handle: ResultHandle::new(1),
                edits: vec![],
            })
            .unwrap_err();

        assert_eq!(err, ApplyError::MissingBase);
        assert!(store.previous_handle().is_none());
    }

    #[test]
    fn failed_delta_leaves_store_untouched() {
        let mut store = SemanticTokensStore::new();
        store.apply(full(1, vec![0, 0, 3, 1, 0])).unwrap();

        let result = store.apply(TokensSnapshot::Delta {
            result_handle: ResultHandle::new(2),
            edits: vec![SemanticTokensEdit {
                start: 4,
                delete_count: 0,
                data: vec![1],
            }],
        });

        assert_eq!(
            result.unwrap_err(),
            ApplyError::InvalidTokenData { len: 6 }
        );
        assert_eq!(store.previous_handle(), ResultHandle::new(1));
        assert_eq!(store.data(), &[0, 0, 3, 1, 0]);
    }

    #[test]
    fn clear_returns_current_handle() {
        let mut store = SemanticTokensStore::new();
        assert_eq!(store.clear(), None);

        store.apply(full(4, vec![])).unwrap();
        assert_eq!(store.clear(), Some(ResultHandle::new(4)));
        assert!(store.data().is_empty());
    }
}
