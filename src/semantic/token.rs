//! The 5-word token tuple that makes up every full token array.

use tower_lsp_server::ls_types::SemanticToken;

/// Number of `u32` words per token.
pub const TOKEN_WORDS: usize = 5;

/// One semantic token in relative (delta) encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TokenTuple {
    pub delta_line: u32,
    pub delta_start: u32,
    pub length: u32,
    pub token_type: u32,
    pub token_modifiers: u32,
}

impl TokenTuple {
    /// Build a tuple from exactly five words.
    pub fn from_words(words: [u32; TOKEN_WORDS]) -> Self {
        let [delta_line, delta_start, length, token_type, token_modifiers] = words;
        Self {
            delta_line,
            delta_start,
            length,
            token_type,
            token_modifiers,
        }
    }

    pub fn to_words(self) -> [u32; TOKEN_WORDS] {
        [
            self.delta_line,
            self.delta_start,
            self.length,
            self.token_type,
            self.token_modifiers,
        ]
    }
}

/// Iterate the tuples of a flat token array.
///
/// A trailing partial tuple is ignored; callers validate lengths with
/// [`is_whole_tokens`] before trusting the data.
pub fn iter_tokens(data: &[u32]) -> impl Iterator<Item = TokenTuple> + '_ {
    data.chunks_exact(TOKEN_WORDS).map(|chunk| {
        TokenTuple::from_words([chunk[0], chunk[1], chunk[2], chunk[3], chunk[4]])
    })
}

/// Flatten tuples into the wire word layout.
pub fn flatten_tokens(tokens: impl IntoIterator<Item = TokenTuple>) -> Vec<u32> {
    tokens.into_iter().flat_map(TokenTuple::to_words).collect()
}

#[inline]
pub fn is_whole_tokens(len: usize) -> bool {
    len % TOKEN_WORDS == 0
}

impl From<SemanticToken> for TokenTuple {
    fn from(token: SemanticToken) -> Self {
        Self {
            delta_line: token.delta_line,
            delta_start: token.delta_start,
            length: token.length,
            token_type: token.token_type,
            token_modifiers: token.token_modifiers_bitset,
        }
    }
}

impl From<TokenTuple> for SemanticToken {
    fn from(token: TokenTuple) -> Self {
        SemanticToken {
            delta_line: token.delta_line,
            delta_start: token.delta_start,
            length: token.length,
            token_type: token.token_type,
            token_modifiers_bitset: token.token_modifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iter_tokens_splits_flat_array_into_tuples() {
        let data = vec![0, 1, 3, 2, 0, 1, 4, 5, 7, 1];
        let tokens: Vec<_> = iter_tokens(&data).collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].delta_line, 1);
        assert_eq!(tokens[1].token_type, 7);
        assert_eq!(flatten_tokens(tokens), data);
    }

    #[test]
    fn lsp_semantic_token_conversion_keeps_all_fields() {
        let lsp = SemanticToken {
            delta_line: 2,
            delta_start: 4,
            length: 6,
            token_type: 1,
            token_modifiers_bitset: 0b101,
        };

        let tuple = TokenTuple::from(lsp);
        assert_eq!(tuple.to_words(), [2, 4, 6, 1, 0b101]);
        assert_eq!(SemanticToken::from(tuple), lsp);
    }

    #[test]
    fn whole_token_check() {
        assert!(is_whole_tokens(0));
        assert!(is_whole_tokens(10));
        assert!(!is_whole_tokens(7));
    }
}
