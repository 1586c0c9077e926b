//! Per-frame spectral statistics.
//!
//! An [`AudioStats`] is an immutable snapshot of one analysis frame. The
//! frequency bins are copied out of the analyzer's working buffer, so a
//! consumer holding a snapshot never observes later frames.

use std::ops::Range;

use serde::Deserialize;

/// Split of the bin range into low / mid / high bands.
///
/// The bands are half-open, contiguous and non-overlapping: low covers the
/// first `low` bins, mid the next `mid`, high everything after. Bands that
/// would exceed the bin count are clipped, so together they always cover
/// `0..len` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BinPartition {
    pub low: usize,
    pub mid: usize,
}

impl Default for BinPartition {
    fn default() -> Self {
        Self { low: 10, mid: 40 }
    }
}

impl BinPartition {
    /// Bin ranges for (bass, mid, treble) over `len` bins
    pub fn ranges(&self, len: usize) -> [Range<usize>; 3] {
        let low_end = self.low.min(len);
        let mid_end = low_end.saturating_add(self.mid).min(len);
        [0..low_end, low_end..mid_end, mid_end..len]
    }
}

/// One frame of spectral statistics
#[derive(Debug, Clone, PartialEq)]
pub struct AudioStats {
    /// Byte magnitude per frequency bin (most recent frame only)
    pub frequency_data: Vec<u8>,
    /// Mean of all bins, [0, 255]
    pub average_frequency: f32,
    /// Mean of the low band, [0, 255]
    pub bass: f32,
    /// Mean of the mid band, [0, 255]
    pub mid: f32,
    /// Mean of the high band, [0, 255]
    pub treble: f32,
}

impl AudioStats {
    /// Reduce a bin buffer into a snapshot (the buffer is copied)
    pub fn from_bins(bins: &[u8], partition: BinPartition) -> Self {
        let [low, mid, high] = partition.ranges(bins.len());
        Self {
            frequency_data: bins.to_vec(),
            average_frequency: mean(bins),
            bass: mean(&bins[low]),
            mid: mean(&bins[mid]),
            treble: mean(&bins[high]),
        }
    }

    /// Normalized overall intensity, [0, 1]
    pub fn intensity(&self) -> f32 {
        self.average_frequency / 255.0
    }
}

fn mean(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| u32::from(b)).sum();
    sum as f32 / bins.len() as f32
}
