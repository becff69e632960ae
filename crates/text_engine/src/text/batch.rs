//! Fixed-capacity instance batch
//!
//! Glyph placements accumulate here until the batch fills, then the whole
//! batch goes out as one instanced draw. Storage is allocated once, so
//! rendering never allocates per glyph.

use crate::foundation::math::Mat4;

/// Instances per draw used by the default layout
pub const DEFAULT_BATCH_CAPACITY: usize = 400;

/// Parallel transform/layer arrays with a fill count
///
/// Only entries `0..len()` are meaningful; stale entries past the fill count
/// are never handed to a flush.
#[derive(Debug, Clone)]
pub struct InstanceBatch {
    transforms: Vec<Mat4>,
    layers: Vec<u32>,
    len: usize,
}

impl InstanceBatch {
    /// Allocate a batch holding up to `capacity` instances (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            transforms: vec![Mat4::identity(); capacity],
            layers: vec![0; capacity],
            len: 0,
        }
    }

    /// Maximum instances per flush
    pub fn capacity(&self) -> usize {
        self.transforms.len()
    }

    /// Instances currently pending
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the next push triggers a flush
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Pending transforms
    pub fn transforms(&self) -> &[Mat4] {
        &self.transforms[..self.len]
    }

    /// Pending atlas layers, parallel to [`Self::transforms`]
    pub fn layers(&self) -> &[u32] {
        &self.layers[..self.len]
    }

    /// Drop pending instances without drawing them
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append one instance, flushing through `flush` once the batch is full
    ///
    /// Returns whether a flush happened.
    pub fn push<E, F>(&mut self, transform: Mat4, layer: u32, flush: F) -> Result<bool, E>
    where
        F: FnOnce(&[Mat4], &[u32]) -> Result<(), E>,
    {
        self.transforms[self.len] = transform;
        self.layers[self.len] = layer;
        self.len += 1;

        if self.is_full() {
            self.flush(flush)
        } else {
            Ok(false)
        }
    }

    /// Hand pending instances to `flush` and reset; does nothing when empty
    ///
    /// The batch is reset even when `flush` fails, so a failed draw never
    /// leaves a full batch behind.
    pub fn flush<E, F>(&mut self, flush: F) -> Result<bool, E>
    where
        F: FnOnce(&[Mat4], &[u32]) -> Result<(), E>,
    {
        if self.len == 0 {
            return Ok(false);
        }

        let count = self.len;
        self.len = 0;
        flush(&self.transforms[..count], &self.layers[..count])?;
        Ok(true)
    }
}

impl Default for InstanceBatch {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BATCH_CAPACITY)
    }
}
