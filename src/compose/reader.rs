//! Byte reader with put-back
//!
//! Host I/O arrives in arbitrary chunks, so a multi-byte UTF-8 sequence can
//! straddle two deliveries. The reader presents the bytes left over from the
//! previous delivery followed by the new chunk as one stream, and lets the
//! composer push an incomplete sequence back for the next call.

/// Owned put-back storage that survives between print spans
#[derive(Debug, Clone, Default)]
pub struct ByteReader {
    putback: Vec<u8>,
}

impl ByteReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a chunk behind any stored put-back bytes. The returned span
    /// borrows the reader, so only one span can be pending at a time.
    pub fn prepare<'a>(&'a mut self, chunk: &'a [u8]) -> ReadSpan<'a> {
        ReadSpan {
            reader: self,
            chunk,
            index: 0,
            finished: false,
        }
    }

    /// Bytes held over from an earlier span
    pub fn pending(&self) -> &[u8] {
        &self.putback
    }

    /// Drop any held-over bytes
    pub fn reset(&mut self) {
        self.putback.clear();
    }
}

/// A read pass over put-back bytes followed by the current chunk
#[derive(Debug)]
pub struct ReadSpan<'a> {
    reader: &'a mut ByteReader,
    chunk: &'a [u8],
    /// Read position across put-back store and chunk
    index: usize,
    finished: bool,
}

impl<'a> ReadSpan<'a> {
    fn total(&self) -> usize {
        self.reader.putback.len() + self.chunk.len()
    }

    pub fn has_next(&self) -> bool {
        self.index < self.total()
    }

    pub fn bytes_left(&self) -> usize {
        self.total() - self.index
    }

    /// Next byte, taken from the put-back store first
    pub fn get_next(&mut self) -> Option<u8> {
        let stored = self.reader.putback.len();
        let byte = if self.index < stored {
            self.reader.putback[self.index]
        } else {
            *self.chunk.get(self.index - stored)?
        };
        self.index += 1;
        Some(byte)
    }

    fn unread(&self) -> Vec<u8> {
        let stored = self.reader.putback.len();
        let mut rest = Vec::with_capacity(self.bytes_left());
        if self.index < stored {
            rest.extend_from_slice(&self.reader.putback[self.index..]);
            rest.extend_from_slice(self.chunk);
        } else {
            rest.extend_from_slice(&self.chunk[self.index - stored..]);
        }
        rest
    }

    /// End the span, storing `byte` followed by every byte not yet read so
    /// the next span starts at `byte`
    pub fn putback(mut self, byte: u8) {
        let mut store = Vec::with_capacity(self.bytes_left() + 1);
        store.push(byte);
        store.extend(self.unread());
        self.reader.putback = store;
        self.finished = true;
    }

    /// End the span, keeping only the bytes that were never read
    pub fn done(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.finished {
            self.reader.putback = self.unread();
            self.finished = true;
        }
    }
}

impl Drop for ReadSpan<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
