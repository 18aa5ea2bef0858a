//! Ordered audio chunk storage for a single session.

/// Append-only list of audio chunks, merged on demand.
///
/// Insertion order is arrival order is playback order. Merging is plain
/// concatenation: no resampling and no cross-fade, so chunk boundaries stay
/// sample-exact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioAccumulator {
    chunks: Vec<Vec<f32>>,
}

impl AudioAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk.
    pub fn append(&mut self, samples: Vec<f32>) {
        self.chunks.push(samples);
    }

    /// Number of chunks held.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total samples across all chunks.
    pub fn total_samples(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Concatenate all chunks in arrival order.
    ///
    /// An empty accumulator yields an empty buffer.
    pub fn merge(&self) -> Vec<f32> {
        let mut merged = Vec::with_capacity(self.total_samples());
        for chunk in &self.chunks {
            merged.extend_from_slice(chunk);
        }
        merged
    }

    /// Like [`merge`](Self::merge) but consumes the chunks.
    pub fn into_merged(self) -> Vec<f32> {
        if self.chunks.len() == 1 {
            return self.chunks.into_iter().next().unwrap_or_default();
        }
        self.merge()
    }
}
