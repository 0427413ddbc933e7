//! Assembles a delta-encoded token array from absolute token positions.

use super::dto::SemanticTokens;
use super::token::TOKEN_WORDS;

/// Incremental builder for [`SemanticTokens`].
///
/// Tokens pushed in document order are delta-encoded on the fly. The first
/// out-of-order push converts the stored data back to absolute positions;
/// `build` then sorts by (line, char) and re-encodes.
#[derive(Debug, Default)]
pub struct SemanticTokensBuilder {
    prev_line: u32,
    prev_char: u32,
    unsorted: bool,
    data: Vec<u32>,
}

impl SemanticTokensBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len() / TOKEN_WORDS
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Push one token at an absolute position.
    pub fn push(&mut self, line: u32, char: u32, length: u32, token_type: u32, modifiers: u32) {
        if !self.unsorted
            && (line < self.prev_line || (line == self.prev_line && char < self.prev_char))
        {
            self.unsorted = true;
            self.make_absolute();
        }

        let (push_line, push_char) = if !self.unsorted && !self.data.is_empty() {
            let delta_line = line - self.prev_line;
            let delta_char = if delta_line == 0 {
                char - self.prev_char
            } else {
                char
            };
            (delta_line, delta_char)
        } else {
            (line, char)
        };

        self.data
            .extend_from_slice(&[push_line, push_char, length, token_type, modifiers]);
        self.prev_line = line;
        self.prev_char = char;
    }

    pub fn build(self, result_id: Option<String>) -> SemanticTokens {
        let data = if self.unsorted {
            sort_and_delta_encode(&self.data)
        } else {
            self.data
        };
        SemanticTokens { result_id, data }
    }

    /// Undo the delta encoding of everything pushed so far.
    fn make_absolute(&mut self) {
        let mut prev_line = 0;
        let mut prev_char = 0;
        for token in self.data.chunks_exact_mut(TOKEN_WORDS) {
            let (line, char) = if token[0] == 0 {
                (prev_line, token[1] + prev_char)
            } else {
                (token[0] + prev_line, token[1])
            };
            token[0] = line;
            token[1] = char;
            prev_line = line;
            prev_char = char;
        }
    }
}

fn sort_and_delta_encode(absolute: &[u32]) -> Vec<u32> {
    let mut tokens: Vec<&[u32]> = absolute.chunks_exact(TOKEN_WORDS).collect();
    // Stable, so tokens at the same position keep their push order.
    tokens.sort_by_key(|token| (token[0], token[1]));

    let mut result = Vec::with_capacity(absolute.len());
    let mut prev_line = 0;
    let mut prev_char = 0;
    for token in tokens {
        let (line, char) = (token[0], token[1]);
        let delta_line = line - prev_line;
        let delta_char = if delta_line == 0 { char - prev_char } else { char };
        result.extend_from_slice(&[delta_line, delta_char, token[2], token[3], token[4]]);
        prev_line = line;
        prev_char = char;
    }
    result
}
