use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

use crate::error::{AntError, Result};

/// Electrode class assigned to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Eeg,
    Eog,
    Misc,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Eeg => "eeg",
            ChannelType::Eog => "eog",
            ChannelType::Misc => "misc",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel record as exposed by the container, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChannel {
    pub name: String,
    pub unit: String,
    pub reference: String,
}

impl RawChannel {
    pub fn new(name: &str, unit: &str, reference: &str) -> Self {
        RawChannel {
            name: name.to_string(),
            unit: unit.to_string(),
            reference: reference.to_string(),
        }
    }
}

/// Classified channel. Its identity is its position in the recording.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDescriptor {
    pub name: String,
    pub unit: String,      // 小写，用于单位表查找
    pub reference: String,
    pub kind: ChannelType,
}

/// Trigger record as exposed by the container. Never mutated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTrigger {
    pub code: String,
    pub sample_index: u64,
    pub duration: u64,               // 样本数
    pub condition: Option<String>,
    pub description: Option<String>,
    pub impedance: Option<String>,   // 空格分隔的每通道阻抗值
}

impl RawTrigger {
    /// Creates an ordinary trigger with no duration, condition or description.
    pub fn new(code: &str, sample_index: u64) -> Self {
        RawTrigger {
            code: code.to_string(),
            sample_index,
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_condition(mut self, condition: &str) -> Self {
        self.condition = Some(condition.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_impedance(mut self, impedance: &str) -> Self {
        self.impedance = Some(impedance.to_string());
        self
    }
}

/// Labelled interval expressed in samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSpan {
    pub onset_sample: u64,
    pub duration_sample: u64,
    pub label: String,
}

impl AnnotationSpan {
    pub fn new(onset_sample: u64, duration_sample: u64, label: &str) -> Self {
        AnnotationSpan {
            onset_sample,
            duration_sample,
            label: label.to_string(),
        }
    }

    /// First sample after the span.
    pub fn end_sample(&self) -> u64 {
        self.onset_sample.saturating_add(self.duration_sample)
    }

    /// Converts the span to seconds using the recording sampling frequency.
    pub fn to_annotation(&self, sample_frequency: f64) -> Annotation {
        Annotation {
            onset: self.onset_sample as f64 / sample_frequency,
            duration: self.duration_sample as f64 / sample_frequency,
            description: self.label.clone(),
        }
    }
}

/// Labelled interval expressed in seconds, relative to the first sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub onset: f64,           // 秒
    pub duration: f64,        // 秒
    pub description: String,
}

/// Impedance measurements keyed by the sample index of the check.
/// Values are parallel to the channel order.
pub type ImpedanceReadings = BTreeMap<u64, Vec<f64>>;

/// Channel-major matrix of samples, one row per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMatrix {
    n_channels: usize,
    n_samples: usize,
    data: Vec<f64>,
}

impl SampleMatrix {
    pub fn zeros(n_channels: usize, n_samples: usize) -> Self {
        SampleMatrix {
            n_channels,
            n_samples,
            data: vec![0.0; n_channels * n_samples],
        }
    }

    /// Builds a matrix from one vector per channel. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_channels = rows.len();
        let n_samples = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(n_channels * n_samples);
        for row in rows {
            if row.len() != n_samples {
                return Err(AntError::SampleBlockSize {
                    expected: n_channels * n_samples,
                    actual: data.len() + row.len(),
                });
            }
            data.extend(row);
        }
        Ok(SampleMatrix { n_channels, n_samples, data })
    }

    /// De-interleaves a sample-major block (`s0c0, s0c1, ..., s1c0, ...`).
    pub fn from_interleaved(block: &[f32], n_channels: usize, n_samples: usize) -> Result<Self> {
        let expected = n_channels * n_samples;
        if block.len() != expected {
            return Err(AntError::SampleBlockSize { expected, actual: block.len() });
        }

        let mut matrix = SampleMatrix::zeros(n_channels, n_samples);
        for (s, frame) in block.chunks_exact(n_channels.max(1)).enumerate() {
            for (c, &value) in frame.iter().enumerate() {
                matrix.data[c * n_samples + s] = value as f64;
            }
        }
        Ok(matrix)
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn row(&self, channel: usize) -> &[f64] {
        let start = channel * self.n_samples;
        &self.data[start..start + self.n_samples]
    }

    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn row_mut(&mut self, channel: usize) -> &mut [f64] {
        let start = channel * self.n_samples;
        &mut self.data[start..start + self.n_samples]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_channels).map(move |c| self.row(c))
    }

    pub fn get(&self, channel: usize, sample: usize) -> Option<f64> {
        if channel < self.n_channels && sample < self.n_samples {
            Some(self.data[channel * self.n_samples + sample])
        } else {
            None
        }
    }

    /// Row-major backing storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(|r| r.to_vec()).collect()
    }
}

/// Recoverable data problem found while decoding. The decode still succeeds.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeWarning {
    /// More than one distinct reference electrode among the checked channels.
    MixedReferences { references: Vec<String> },
    /// Unit missing from the scale table; the listed channels were left unscaled.
    UnrecognizedUnit { unit: String, channels: Vec<usize> },
    /// "Amplifier disconnected" trigger without a matching reconnection.
    UnmatchedDisconnect { sample: u64 },
    /// "Amplifier reconnected" trigger without a matching disconnection.
    UnmatchedReconnect { sample: u64 },
    /// Paired reconnection that precedes its disconnection.
    ReversedDisconnect { start: u64, stop: u64 },
    /// Impedance check whose value count differs from the channel count.
    ImpedanceCountMismatch { sample: u64, values: usize, channels: usize },
    /// Span reaching past the last sample of the recording.
    AnnotationOutOfRange {
        label: String,
        onset_sample: u64,
        end_sample: u64,
        n_samples: u64,
    },
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::MixedReferences { references } => write!(
                f,
                "All channels are not referenced to the same electrode ({})",
                references.join(", ")
            ),
            DecodeWarning::UnrecognizedUnit { unit, channels } => write!(
                f,
                "Unit {:?} not recognized, not scaling {} channel(s)",
                unit,
                channels.len()
            ),
            DecodeWarning::UnmatchedDisconnect { sample } => write!(
                f,
                "Amplifier disconnection at sample {} has no matching reconnection, ignored",
                sample
            ),
            DecodeWarning::UnmatchedReconnect { sample } => write!(
                f,
                "Amplifier reconnection at sample {} has no matching disconnection, ignored",
                sample
            ),
            DecodeWarning::ReversedDisconnect { start, stop } => write!(
                f,
                "Amplifier reconnection at sample {} precedes disconnection at sample {}, ignored",
                stop, start
            ),
            DecodeWarning::ImpedanceCountMismatch { sample, values, channels } => write!(
                f,
                "Impedance check at sample {} has {} value(s) for {} channel(s)",
                sample, values, channels
            ),
            DecodeWarning::AnnotationOutOfRange {
                label,
                onset_sample,
                end_sample,
                n_samples,
            } => write!(
                f,
                "Annotation {:?} [{}, {}) extends beyond the recording ({} samples)",
                label, onset_sample, end_sample, n_samples
            ),
        }
    }
}

/// Fully decoded recording.
#[derive(Debug, Clone)]
pub struct Recording {
    pub channels: Vec<ChannelDescriptor>,
    pub sample_frequency: f64,
    pub samples: SampleMatrix,      // 伏特
    pub spans: Vec<AnnotationSpan>, // 样本单位
    pub annotations: Vec<Annotation>,
    pub impedances: ImpedanceReadings,
    pub start_time: Option<NaiveDateTime>,
}

impl Recording {
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn channel_types(&self) -> Vec<ChannelType> {
        self.channels.iter().map(|c| c.kind).collect()
    }

    pub fn n_samples(&self) -> usize {
        self.samples.n_samples()
    }

    /// Recording length in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.n_samples() as f64 / self.sample_frequency
    }

    /// Annotations as `(onset seconds, duration seconds, label)` triples.
    pub fn annotation_triples(&self) -> Vec<(f64, f64, &str)> {
        self.annotations
            .iter()
            .map(|a| (a.onset, a.duration, a.description.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_interleaved() {
        // 2 通道, 3 个样本
        let block = [1.0f32, 10.0, 2.0, 20.0, 3.0, 30.0];
        let m = SampleMatrix::from_interleaved(&block, 2, 3).unwrap();
        assert_eq!(m.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.row(1), &[10.0, 20.0, 30.0]);
        assert_eq!(m.get(1, 2), Some(30.0));
        assert_eq!(m.get(2, 0), None);
    }

    #[test]
    fn test_from_interleaved_size_mismatch() {
        let block = [1.0f32, 2.0, 3.0];
        match SampleMatrix::from_interleaved(&block, 2, 2) {
            Err(AntError::SampleBlockSize { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_from_rows_ragged() {
        assert!(SampleMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        let m = SampleMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.to_rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_rows_without_samples() {
        // 没有样本时每个通道仍有一行
        let m = SampleMatrix::from_rows(vec![vec![], vec![]]).unwrap();
        assert_eq!(m.n_channels(), 2);
        assert_eq!(m.rows().count(), 2);
        assert_eq!(m.to_rows(), vec![Vec::<f64>::new(), Vec::new()]);
    }

    #[test]
    fn test_span_to_annotation() {
        let span = AnnotationSpan::new(512, 256, "stim");
        let a = span.to_annotation(256.0);
        assert_eq!(a.onset, 2.0);
        assert_eq!(a.duration, 1.0);
        assert_eq!(a.description, "stim");
        assert_eq!(span.end_sample(), 768);
    }
}
