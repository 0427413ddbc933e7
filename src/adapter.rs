//! Adapters between a token-analysis provider and the snapshot wire format.
//!
//! - [`DocumentSemanticTokensAdapter`] serves whole documents, caches previous
//!   results per document and replies with deltas
//! - [`RangeSemanticTokensAdapter`] serves ranges, one-shot and uncached

pub mod document;
pub mod provider;
pub mod range;
pub mod request_tracker;
pub mod result_cache;

pub use document::DocumentSemanticTokensAdapter;
pub use provider::{
    DocumentRangeSemanticTokensProvider, DocumentSemanticTokensProvider, ProviderError,
    ProviderResult,
};
pub use range::RangeSemanticTokensAdapter;
pub use request_tracker::RequestTracker;
pub use result_cache::{HandleAllocator, PreviousResult, ResultCache};
