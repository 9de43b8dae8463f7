use chrono::NaiveDateTime;

use crate::error::{AntError, Result};
use crate::types::{RawChannel, RawTrigger};

/// Low-level access to an opened `.cnt` file.
///
/// Implementations wrap the binary reader and hand out records verbatim.
/// Any I/O or parse failure should surface as `AntError::Container`.
pub trait CntContainer {
    fn channel_count(&self) -> Result<usize>;

    fn channel(&self, index: usize) -> Result<RawChannel>;

    /// Sampling frequency in Hz, shared by all channels.
    fn sample_frequency(&self) -> Result<f64>;

    /// Number of samples per channel.
    fn sample_count(&self) -> Result<usize>;

    /// Reads `count` samples starting at `start`, interleaved by sample:
    /// `count * channel_count()` values.
    fn samples(&mut self, start: usize, count: usize) -> Result<Vec<f32>>;

    fn trigger_count(&self) -> Result<usize>;

    fn trigger(&self, index: usize) -> Result<RawTrigger>;

    /// Recording start, when the file stores one.
    fn start_time(&self) -> Result<Option<NaiveDateTime>> {
        Ok(None)
    }
}

/// Container held entirely in memory.
///
/// Bindings fill it from a real `.cnt` parser; it also backs the tests.
///
/// # Examples
///
/// ```rust
/// use antio::{CntContainer, MemoryContainer, RawChannel, RawTrigger};
///
/// let mut cnt = MemoryContainer::new(500.0)
///     .with_channel(RawChannel::new("Fp1", "uV", "CPz"))
///     .with_channel(RawChannel::new("Fp2", "uV", "CPz"))
///     .with_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]])?
///     .with_trigger(RawTrigger::new("1", 0));
///
/// assert_eq!(cnt.channel_count()?, 2);
/// assert_eq!(cnt.sample_count()?, 2);
/// assert_eq!(cnt.samples(0, 2)?, vec![1.0, 3.0, 2.0, 4.0]);
/// # Ok::<(), antio::AntError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    sample_frequency: f64,
    channels: Vec<RawChannel>,
    /// 按样本交错存储
    data: Vec<f32>,
    triggers: Vec<RawTrigger>,
    start_time: Option<NaiveDateTime>,
}

impl MemoryContainer {
    pub fn new(sample_frequency: f64) -> Self {
        MemoryContainer {
            sample_frequency,
            ..Default::default()
        }
    }

    pub fn with_channel(mut self, channel: RawChannel) -> Self {
        self.channels.push(channel);
        self
    }

    /// Sets the sample block from one row per channel. Must be called after
    /// all channels are added.
    pub fn with_rows(mut self, rows: &[Vec<f32>]) -> Result<Self> {
        if rows.len() != self.channels.len() {
            return Err(AntError::Container(format!(
                "{} rows for {} channels",
                rows.len(),
                self.channels.len()
            )));
        }
        let n_samples = rows.first().map_or(0, |r| r.len());
        if let Some(bad) = rows.iter().position(|r| r.len() != n_samples) {
            return Err(AntError::Container(format!(
                "row {} has {} samples, expected {}",
                bad,
                rows[bad].len(),
                n_samples
            )));
        }

        self.data = (0..n_samples)
            .flat_map(|s| rows.iter().map(move |r| r[s]))
            .collect();
        Ok(self)
    }

    /// Sets the raw interleaved block as stored in the file.
    pub fn with_interleaved(mut self, data: Vec<f32>) -> Self {
        self.data = data;
        self
    }

    pub fn with_trigger(mut self, trigger: RawTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn with_start_time(mut self, start_time: NaiveDateTime) -> Self {
        self.start_time = Some(start_time);
        self
    }
}

impl CntContainer for MemoryContainer {
    fn channel_count(&self) -> Result<usize> {
        Ok(self.channels.len())
    }

    fn channel(&self, index: usize) -> Result<RawChannel> {
        self.channels.get(index).cloned().ok_or(AntError::IndexOutOfRange {
            index,
            count: self.channels.len(),
        })
    }

    fn sample_frequency(&self) -> Result<f64> {
        Ok(self.sample_frequency)
    }

    fn sample_count(&self) -> Result<usize> {
        if self.channels.is_empty() {
            return Ok(0);
        }
        Ok(self.data.len() / self.channels.len())
    }

    fn samples(&mut self, start: usize, count: usize) -> Result<Vec<f32>> {
        let n_channels = self.channels.len();
        let total = self.sample_count()?;
        let end = match start.checked_add(count) {
            Some(end) if end <= total => end,
            _ => {
                return Err(AntError::IndexOutOfRange {
                    index: start.saturating_add(count),
                    count: total,
                })
            }
        };
        Ok(self.data[start * n_channels..end * n_channels].to_vec())
    }

    fn trigger_count(&self) -> Result<usize> {
        Ok(self.triggers.len())
    }

    fn trigger(&self, index: usize) -> Result<RawTrigger> {
        self.triggers.get(index).cloned().ok_or(AntError::IndexOutOfRange {
            index,
            count: self.triggers.len(),
        })
    }

    fn start_time(&self) -> Result<Option<NaiveDateTime>> {
        Ok(self.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_rejected() {
        let result = MemoryContainer::new(256.0)
            .with_channel(RawChannel::new("Fp1", "uV", "CPz"))
            .with_channel(RawChannel::new("Fp2", "uV", "CPz"))
            .with_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_range() {
        let mut cnt = MemoryContainer::new(256.0)
            .with_channel(RawChannel::new("Fp1", "uV", "CPz"))
            .with_rows(&[vec![1.0, 2.0, 3.0, 4.0]])
            .unwrap();
        assert_eq!(cnt.samples(1, 2).unwrap(), vec![2.0, 3.0]);
        assert!(cnt.samples(3, 2).is_err());
        // 超大起点不能溢出
        assert!(matches!(
            cnt.samples(usize::MAX, 2),
            Err(AntError::IndexOutOfRange { index: usize::MAX, count: 4 })
        ));
    }

    #[test]
    fn test_out_of_range_records() {
        let cnt = MemoryContainer::new(256.0);
        assert!(matches!(cnt.channel(0), Err(AntError::IndexOutOfRange { index: 0, count: 0 })));
        assert!(cnt.trigger(3).is_err());
        assert_eq!(cnt.start_time().unwrap(), None);
    }
}
