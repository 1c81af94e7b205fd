//! Per-channel median of a stack of RGBA samples.
//!
//! Each of the four channels is sorted and reduced on its own, so the result
//! is generally not one of the input pixels. For an even number of samples the
//! two middle values are averaged and rounded half up.

use image::Rgba;

/// Median of a slice of channel values, sorting it in place.
///
/// Returns `None` for an empty slice.
#[must_use]
pub fn channel_median(values: &mut [u8]) -> Option<u8> {
    let k = values.len();
    if k == 0 {
        return None;
    }

    values.sort_unstable();
    let mid = k / 2;
    if k % 2 == 1 {
        return Some(values[mid]);
    }

    // Round half up: (a + b + 1) / 2, which never exceeds 255.
    let sum = u16::from(values[mid - 1]) + u16::from(values[mid]);
    u8::try_from(sum.div_ceil(2)).ok()
}

/// Reusable buffer for the samples covering one canvas coordinate.
///
/// Fully transparent samples are rejected on [`push`](Self::push) and never
/// reach the median.
#[derive(Debug, Default)]
pub struct SampleStack {
    samples: Vec<Rgba<u8>>,
    scratch: Vec<u8>,
}

impl SampleStack {
    /// Create a stack with room for `capacity` samples.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            scratch: Vec::with_capacity(capacity),
        }
    }

    /// Drop all samples, keeping the allocation.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Add a sample. Returns `false` if it was skipped for having zero alpha.
    pub fn push(&mut self, px: Rgba<u8>) -> bool {
        if px[3] == 0 {
            return false;
        }
        self.samples.push(px);
        true
    }

    /// Number of samples held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Reduce the stack to one pixel, channel by channel.
    ///
    /// Returns `None` when the stack is empty.
    pub fn median(&mut self) -> Option<Rgba<u8>> {
        if self.samples.is_empty() {
            return None;
        }

        let mut out = [0u8; 4];
        for (ch, slot) in out.iter_mut().enumerate() {
            self.scratch.clear();
            self.scratch.extend(self.samples.iter().map(|px| px[ch]));
            *slot = channel_median(&mut self.scratch)?;
        }
        Some(Rgba(out))
    }
}
