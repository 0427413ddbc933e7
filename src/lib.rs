pub mod adapter;
pub mod config;
pub mod error;
pub mod semantic;

pub use adapter::{
    DocumentRangeSemanticTokensProvider, DocumentSemanticTokensAdapter,
    DocumentSemanticTokensProvider, ProviderError, ProviderResult, RangeSemanticTokensAdapter,
};
pub use config::{SemanticTokensSettings, load_settings};
pub use error::{ApplyError, DecodeError, SemanticTokensError, SemanticTokensResult};
pub use semantic::{
    Endianness, ProvidedTokens, ResultHandle, SemanticTokens, SemanticTokensBuilder,
    SemanticTokensCodec, SemanticTokensEdit, SemanticTokensEdits, SemanticTokensStore,
    TokenTuple, TokensSnapshot, apply_edits, compute_delta,
};
