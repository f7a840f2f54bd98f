//! Typed, bounds-checked view over one channel's slots in a refilled buffer.
//!
//! An IIO buffer interleaves the enabled channels scan by scan:
//!
//! ```text
//! | I0 Q0 | I1 Q1 | I2 Q2 | ...
//!  <step>
//! ```
//!
//! A channel's samples therefore start at its first slot and repeat every
//! `step` bytes. [`ChannelSamples`] walks exactly those slots and never reads
//! past the end of the byte range handed to it.

use crate::error::{IioError, Result};

/// Width in bytes of the only storage format decoded here.
pub const SAMPLE_WIDTH: usize = 2;

/// Position and shape of one channel inside an interleaved buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLayout {
    /// Byte offset of the channel's first slot from the start of the buffer
    pub offset: usize,
    /// Bytes between consecutive scans
    pub step: usize,
    /// Element width in bytes
    pub width: usize,
    /// Samples are stored big-endian
    pub big_endian: bool,
}

impl SampleLayout {
    /// Layout of a little-endian 16-bit channel.
    pub fn new(offset: usize, step: usize) -> Self {
        Self {
            offset,
            step,
            width: SAMPLE_WIDTH,
            big_endian: false,
        }
    }

    /// Set the byte order.
    pub fn with_big_endian(mut self, big_endian: bool) -> Self {
        self.big_endian = big_endian;
        self
    }

    /// Check that this layout can be walked as signed 16-bit samples.
    pub fn validate(&self) -> Result<()> {
        if self.width != SAMPLE_WIDTH {
            return Err(IioError::InvalidLayout {
                message: format!(
                    "element width {} bytes, expected {}",
                    self.width, SAMPLE_WIDTH
                ),
            });
        }
        if self.step < self.width {
            return Err(IioError::InvalidLayout {
                message: format!(
                    "step {} bytes is smaller than element width {}",
                    self.step, self.width
                ),
            });
        }
        Ok(())
    }

    /// Number of whole slots for this channel inside `len` bytes.
    ///
    /// This is `len / step`, reduced when the channel's offset would push the
    /// last slot past the end.
    pub fn slots_in(&self, len: usize) -> usize {
        if self.step == 0 || self.offset + self.width > len {
            return 0;
        }
        let reachable = (len - self.offset - self.width) / self.step + 1;
        reachable.min(len / self.step)
    }
}

/// Iterator over the signed 16-bit samples of one channel.
#[derive(Debug, Clone)]
pub struct ChannelSamples<'a> {
    bytes: &'a [u8],
    pos: usize,
    step: usize,
    remaining: usize,
    big_endian: bool,
}

impl<'a> ChannelSamples<'a> {
    /// Create a view over `bytes` using `layout`.
    pub fn new(bytes: &'a [u8], layout: SampleLayout) -> Result<Self> {
        layout.validate()?;
        Ok(Self {
            bytes,
            pos: layout.offset,
            step: layout.step,
            remaining: layout.slots_in(bytes.len()),
            big_endian: layout.big_endian,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ChannelSamples<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Interleave I/Q pairs the way the hardware lays them out.
    fn interleave(pairs: &[(i16, i16)]) -> Vec<u8> {
        pairs
            .iter()
            .flat_map(|(i, q)| i.to_le_bytes().into_iter().chain(q.to_le_bytes()))
            .collect()
    }

    #[test]
    fn test_walks_each_channel() {
        let bytes = interleave(&[(1, -1), (2, -2), (3, -3)]);

        let i: Vec<i16> = ChannelSamples::new(&bytes, SampleLayout::new(0, 4))
            .unwrap()
            .collect();
        let q: Vec<i16> = ChannelSamples::new(&bytes, SampleLayout::new(2, 4))
            .unwrap()
            .collect();

        assert_eq!(i, vec![1, 2, 3]);
        assert_eq!(q, vec![-1, -2, -3]);
    }

    #[test]
    fn test_count_is_length_over_step() {
        let bytes = vec![0u8; 16384 * 4];
        let view = ChannelSamples::new(&bytes, SampleLayout::new(2, 4)).unwrap();
        assert_eq!(view.len(), 16384);
    }

    #[test]
    fn test_single_channel_step() {
        let bytes: Vec<u8> = [10i16, 20, 30, 40]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let samples: Vec<i16> = ChannelSamples::new(&bytes, SampleLayout::new(0, 2))
            .unwrap()
            .collect();
        assert_eq!(samples, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_truncated_trailing_scan_is_not_read() {
        // Two full scans plus one stray byte
        let mut bytes = interleave(&[(5, 6), (7, 8)]);
        bytes.push(0xff);

        let q: Vec<i16> = ChannelSamples::new(&bytes, SampleLayout::new(2, 4))
            .unwrap()
            .collect();
        assert_eq!(q, vec![6, 8]);
    }

    #[test]
    fn test_offset_past_end_yields_nothing() {
        let bytes = vec![0u8; 3];
        let view = ChannelSamples::new(&bytes, SampleLayout::new(2, 4)).unwrap();
        assert_eq!(view.count(), 0);
    }

    #[test]
    fn test_big_endian() {
        let bytes: Vec<u8> = [-300i16, 300].iter().flat_map(|v| v.to_be_bytes()).collect();
        let layout = SampleLayout::new(0, 2).with_big_endian(true);
        let samples: Vec<i16> = ChannelSamples::new(&bytes, layout).unwrap().collect();
        assert_eq!(samples, vec![-300, 300]);
    }

    #[test]
    fn test_invalid_layouts() {
        let bytes = vec![0u8; 8];
        let narrow_step = SampleLayout::new(0, 1);
        assert!(ChannelSamples::new(&bytes, narrow_step).is_err());

        let wide = SampleLayout {
            width: 4,
            ..SampleLayout::new(0, 8)
        };
        assert!(ChannelSamples::new(&bytes, wide).is_err());
    }
}
