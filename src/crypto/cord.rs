//! Non-contiguous byte container for large payloads

use bytes::Bytes;
use std::fmt;

/// A rope of reference-counted byte chunks
///
/// Appending and slicing never copy chunk contents; a cord is only flattened
/// when the caller asks for it with [`Cord::to_vec`].
#[derive(Clone, Default)]
pub struct Cord {
    chunks: Vec<Bytes>,
    len: usize,
}

impl Cord {
    /// Creates an empty cord
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk; empty chunks are dropped
    pub fn append(&mut self, chunk: impl Into<Bytes>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }
        self.len += chunk.len();
        self.chunks.push(chunk);
    }

    /// Appends all chunks of another cord
    pub fn append_cord(&mut self, other: Cord) {
        self.len += other.len;
        self.chunks.extend(other.chunks);
    }

    /// Total length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the cord holds no bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of chunks
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Iterates over the chunks in order
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.chunks.iter().map(|c| &c[..])
    }

    /// Iterates over every byte in order
    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.chunks.iter().flat_map(|c| c.iter().copied())
    }

    /// Returns the sub-cord covering `start..end` without copying
    ///
    /// The range is clamped to the cord length.
    pub fn slice(&self, start: usize, end: usize) -> Cord {
        let end = end.min(self.len);
        let mut out = Cord::new();
        if start >= end {
            return out;
        }

        let mut offset = 0;
        for chunk in &self.chunks {
            let chunk_start = offset;
            let chunk_end = offset + chunk.len();
            offset = chunk_end;

            if chunk_end <= start {
                continue;
            }
            if chunk_start >= end {
                break;
            }

            let from = start.saturating_sub(chunk_start);
            let to = end.min(chunk_end) - chunk_start;
            out.append(chunk.slice(from..to));
        }
        out
    }

    /// Copies `start..start + N` into a fixed-size array
    pub(crate) fn copy_array<const N: usize>(&self, start: usize) -> Option<[u8; N]> {
        if start.checked_add(N)? > self.len {
            return None;
        }
        let mut out = [0_u8; N];
        for (dst, src) in out.iter_mut().zip(self.slice(start, start + N).bytes()) {
            *dst = src;
        }
        Some(out)
    }

    /// Flattens the cord into one contiguous buffer
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len);
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }
}

impl fmt::Debug for Cord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cord")
            .field("len", &self.len)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

impl PartialEq for Cord {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.bytes().eq(other.bytes())
    }
}

impl Eq for Cord {}

impl From<Vec<u8>> for Cord {
    fn from(bytes: Vec<u8>) -> Self {
        let mut cord = Cord::new();
        cord.append(bytes);
        cord
    }
}

impl From<&[u8]> for Cord {
    fn from(bytes: &[u8]) -> Self {
        Cord::from(bytes.to_vec())
    }
}

impl From<Bytes> for Cord {
    fn from(bytes: Bytes) -> Self {
        let mut cord = Cord::new();
        cord.append(bytes);
        cord
    }
}

impl<T: Into<Bytes>> FromIterator<T> for Cord {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut cord = Cord::new();
        for chunk in iter {
            cord.append(chunk);
        }
        cord
    }
}
