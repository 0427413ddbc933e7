//! Semantic token data: the wire snapshot, its codec, delta computation and
//! the receiving-side token store.

pub mod builder;
pub mod codec;
pub mod delta;
pub mod dto;
pub mod store;
pub mod token;

pub use builder::SemanticTokensBuilder;
pub use codec::{Endianness, SemanticTokensCodec};
pub use delta::{apply_edits, compute_delta};
pub use dto::{
    ProvidedTokens, ResultHandle, SemanticTokens, SemanticTokensEdit, SemanticTokensEdits,
    TokensSnapshot,
};
pub use store::SemanticTokensStore;
pub use token::{TOKEN_WORDS, TokenTuple, flatten_tokens, iter_tokens};
