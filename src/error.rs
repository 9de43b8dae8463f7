use thiserror::Error;

/// Fatal conditions that abort a decode. No partial recording is produced.
#[derive(Debug, Error)]
pub enum AntError {
    #[error("Container reports no channels")]
    NoChannels,

    #[error("Container reports no samples")]
    NoSamples,

    #[error("Invalid sampling frequency: {0}")]
    InvalidSampleFrequency(f64),

    #[error("Invalid channel record {index}: {reason}")]
    InvalidChannel { index: usize, reason: String },

    #[error("Invalid trigger record {index}: {reason}")]
    InvalidTrigger { index: usize, reason: String },

    #[error("Sample block has {actual} values, expected {expected}")]
    SampleBlockSize { expected: usize, actual: usize },

    #[error("Got {units} units for {channels} channels")]
    UnitCountMismatch { units: usize, channels: usize },

    #[error("Invalid impedance value {value:?} at sample {sample}")]
    InvalidImpedance { sample: u64, value: String },

    #[error("Invalid channel pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Container error: {0}")]
    Container(String),
}

pub type Result<T> = std::result::Result<T, AntError>;
