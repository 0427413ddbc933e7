//! Snapshot and provider result types.
//!
//! `TokensSnapshot` is what crosses the transport boundary (see `codec`).
//! `ProvidedTokens` is what a token-analysis provider hands to the adapter;
//! both are explicitly tagged so no caller has to guess a result's shape.

use std::fmt;

/// Opaque identifier of a previously returned snapshot.
///
/// `0` is reserved for "no previous result".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ResultHandle(u32);

impl ResultHandle {
    pub const NONE: ResultHandle = ResultHandle(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for ResultHandle {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Replace `delete_count` words starting at `start` with `data`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SemanticTokensEdit {
    pub start: u32,
    pub delete_count: u32,
    pub data: Vec<u32>,
}

/// Tagged token snapshot, the unit the codec encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokensSnapshot {
    Full {
        result_handle: ResultHandle,
        data: Vec<u32>,
    },
    Delta {
        result_handle: ResultHandle,
        edits: Vec<SemanticTokensEdit>,
    },
}

impl TokensSnapshot {
    pub fn result_handle(&self) -> ResultHandle {
        match self {
            TokensSnapshot::Full { result_handle, .. }
            | TokensSnapshot::Delta { result_handle, .. } => *result_handle,
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, TokensSnapshot::Delta { .. })
    }
}

/// A complete token array as returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SemanticTokens {
    /// Provider-chosen id used to request edits relative to this result later.
    pub result_id: Option<String>,
    pub data: Vec<u32>,
}

/// Edits relative to an earlier provider result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SemanticTokensEdits {
    pub result_id: Option<String>,
    pub edits: Vec<SemanticTokensEdit>,
}

/// What a token-analysis provider returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvidedTokens {
    Tokens(SemanticTokens),
    Edits(SemanticTokensEdits),
}

impl ProvidedTokens {
    pub fn result_id(&self) -> Option<&str> {
        match self {
            ProvidedTokens::Tokens(tokens) => tokens.result_id.as_deref(),
            ProvidedTokens::Edits(edits) => edits.result_id.as_deref(),
        }
    }
}

impl From<SemanticTokens> for ProvidedTokens {
    fn from(tokens: SemanticTokens) -> Self {
        ProvidedTokens::Tokens(tokens)
    }
}

impl From<SemanticTokensEdits> for ProvidedTokens {
    fn from(edits: SemanticTokensEdits) -> Self {
        ProvidedTokens::Edits(edits)
    }
}
