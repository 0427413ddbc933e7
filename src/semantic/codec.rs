//! Binary codec for token snapshots.
//!
//! Wire layout, every word a little-endian `u32`:
//!
//! ```text
//! word0  result handle
//! word1  type tag (1 = full, 2 = delta)
//! full:  word2 = N, then N data words
//! delta: word2 = E, then E times: start, deleteCount, M, then M data words
//! ```
//!
//! The host byte order is not probed lazily inside the codec; callers pass an
//! [`Endianness`] (normally [`Endianness::host`]) when building it.

use super::dto::{ResultHandle, SemanticTokensEdit, TokensSnapshot};
use super::token::is_whole_tokens;
use crate::error::DecodeError;

const WORD_BYTES: usize = 4;
const SNAPSHOT_HEADER_WORDS: usize = 3;
const EDIT_HEADER_WORDS: usize = 3;

/// Byte order of the machine doing the encoding or decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Byte order of the compilation target.
    pub const fn host() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    fn native_bytes(self, word: u32) -> [u8; WORD_BYTES] {
        match self {
            Endianness::Little => word.to_le_bytes(),
            Endianness::Big => word.to_be_bytes(),
        }
    }

    fn native_word(self, bytes: [u8; WORD_BYTES]) -> u32 {
        match self {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        }
    }

    /// Convert between host order and wire order in place.
    ///
    /// The swap is its own inverse, so the same call serves encode and decode.
    fn swap_to_wire(self, buf: &mut [u8]) {
        if self == Endianness::Big {
            for word in buf.chunks_exact_mut(WORD_BYTES) {
                word.reverse();
            }
        }
    }
}

impl Default for Endianness {
    fn default() -> Self {
        Self::host()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
enum SnapshotType {
    Full = 1,
    Delta = 2,
}

impl SnapshotType {
    fn parse(tag: u32) -> Result<Self, DecodeError> {
        match tag {
            1 => Ok(Self::Full),
            2 => Ok(Self::Delta),
            _ => Err(DecodeError::UnknownSnapshotType { tag }),
        }
    }
}

/// Encodes and decodes [`TokensSnapshot`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SemanticTokensCodec {
    host: Endianness,
}

impl SemanticTokensCodec {
    pub fn new(host: Endianness) -> Self {
        Self { host }
    }

    pub fn host(&self) -> Endianness {
        self.host
    }

    /// Exact encoded size of `snapshot` in bytes.
    pub fn encoded_len(snapshot: &TokensSnapshot) -> usize {
        let words = match snapshot {
            TokensSnapshot::Full { data, .. } => SNAPSHOT_HEADER_WORDS + data.len(),
            TokensSnapshot::Delta { edits, .. } => {
                SNAPSHOT_HEADER_WORDS
                    + edits
                        .iter()
                        .map(|edit| EDIT_HEADER_WORDS + edit.data.len())
                        .sum::<usize>()
            }
        };
        words * WORD_BYTES
    }

    pub fn encode(&self, snapshot: &TokensSnapshot) -> Vec<u8> {
        let len = Self::encoded_len(snapshot);
        let mut writer = WordWriter {
            buf: Vec::with_capacity(len),
            host: self.host,
        };

        match snapshot {
            TokensSnapshot::Full {
                result_handle,
                data,
            } => {
                writer.push(result_handle.get());
                writer.push(SnapshotType::Full as u32);
                writer.push_run(data);
            }
            TokensSnapshot::Delta {
                result_handle,
                edits,
            } => {
                writer.push(result_handle.get());
                writer.push(SnapshotType::Delta as u32);
                writer.push(edits.len() as u32);
                for edit in edits {
                    writer.push(edit.start);
                    writer.push(edit.delete_count);
                    writer.push_run(&edit.data);
                }
            }
        }

        let mut buf = writer.buf;
        debug_assert_eq!(buf.len(), len);
        self.host.swap_to_wire(&mut buf);
        buf
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<TokensSnapshot, DecodeError> {
        if bytes.len() % WORD_BYTES != 0 {
            return Err(DecodeError::Misaligned { len: bytes.len() });
        }

        // Copy into an owned buffer so the swap never touches the caller's
        // bytes, then read it out as an aligned word vector.
        let mut buf = bytes.to_vec();
        self.host.swap_to_wire(&mut buf);
        let words: Vec<u32> = buf
            .chunks_exact(WORD_BYTES)
            .map(|chunk| self.host.native_word([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let mut reader = WordReader {
            words: &words,
            pos: 0,
        };
        let result_handle = ResultHandle::new(reader.next()?);
        let snapshot = match SnapshotType::parse(reader.next()?)? {
            SnapshotType::Full => {
                let data = reader.take_run()?;
                if !is_whole_tokens(data.len()) {
                    return Err(DecodeError::InvalidTokenData { len: data.len() });
                }
                TokensSnapshot::Full {
                    result_handle,
                    data: data.to_vec(),
                }
            }
            SnapshotType::Delta => {
                let edit_count = reader.next()? as usize;
                // Each edit needs at least its header, so a bogus count cannot
                // reserve more than the buffer could hold.
                let capacity = edit_count.min(reader.remaining() / EDIT_HEADER_WORDS);
                let mut edits = Vec::with_capacity(capacity);
                for _ in 0..edit_count {
                    let start = reader.next()?;
                    let delete_count = reader.next()?;
                    let data = reader.take_run()?.to_vec();
                    edits.push(SemanticTokensEdit {
                        start,
                        delete_count,
                        data,
                    });
                }
                TokensSnapshot::Delta {
                    result_handle,
                    edits,
                }
            }
        };

        match reader.remaining() {
            0 => Ok(snapshot),
            count => Err(DecodeError::TrailingWords { count }),
        }
    }
}

struct WordWriter {
    buf: Vec<u8>,
    host: Endianness,
}

impl WordWriter {
    fn push(&mut self, word: u32) {
        self.buf.extend_from_slice(&self.host.native_bytes(word));
    }

    /// Length-prefixed run of words.
    fn push_run(&mut self, words: &[u32]) {
        self.push(words.len() as u32);
        for &word in words {
            self.push(word);
        }
    }
}

struct WordReader<'a> {
    words: &'a [u32],
    pos: usize,
}

impl<'a> WordReader<'a> {
    fn remaining(&self) -> usize {
        self.words.len() - self.pos
    }

    fn next(&mut self) -> Result<u32, DecodeError> {
        let word = self
            .words
            .get(self.pos)
            .copied()
            .ok_or(DecodeError::Truncated {
                needed: 1,
                available: 0,
            })?;
        self.pos += 1;
        Ok(word)
    }

    fn take_run(&mut self) -> Result<&'a [u32], DecodeError> {
        let len = self.next()? as usize;
        if len > self.remaining() {
            return Err(DecodeError::Truncated {
                needed: len,
                available: self.remaining(),
            });
        }
        let run = &self.words[self.pos..self.pos + len];
        self.pos += len;
        Ok(run)
    }
}
