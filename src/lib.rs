//! # ANT Neuro CNT decoding for Rust
//!
//! Turns the raw records of an ANT Neuro continuous EEG (`.cnt`) file into a
//! normalized recording: classified channels, samples in volts and
//! annotations in seconds.
//!
//! The binary parser itself is not part of this crate. Anything that can hand
//! out channel, sample and trigger records implements [`CntContainer`];
//! [`MemoryContainer`] is the in-memory implementation.
//!
//! ## Quick Start
//!
//! ```rust
//! use antio::{read_raw_ant, ChannelType, DecodeOptions, Result};
//!
//! fn main() -> Result<()> {
//!     # let mut cnt = antio::doctest_utils::create_full_demo_container()?;
//!     // `cnt` is any CntContainer
//!     let decoded = read_raw_ant(&mut cnt, &DecodeOptions::default())?;
//!     let recording = decoded.recording;
//!
//!     println!("Channels: {:?}", recording.channel_names());
//!     println!("Duration: {:.3} seconds", recording.duration());
//!     assert_eq!(recording.channel_types(), vec![ChannelType::Eeg, ChannelType::Misc]);
//!
//!     // Samples are in volts
//!     let fp1 = recording.samples.row(0);
//!     assert!((fp1[0] - 0.01).abs() < 1e-12);
//!
//!     // Impedance checks and amplifier disconnections become BAD_ annotations
//!     for annotation in &recording.annotations {
//!         println!(
//!             "{:>8.3}s {:>6.3}s {}",
//!             annotation.onset, annotation.duration, annotation.description
//!         );
//!     }
//!     assert_eq!(recording.impedances[&0], vec![1000.0, 1200.0]);
//!     Ok(())
//! }
//! ```
//!
//! ## Channel Types
//!
//! Channel names are matched against two optional regular expressions, EOG
//! first, then miscellaneous. A pattern must match the **whole** name:
//!
//! ```rust
//! use antio::channels::ChannelRules;
//! use antio::ChannelType;
//!
//! let rules = ChannelRules::from_patterns(Some("EOG"), Some(r"BIP\d+"))?;
//! assert_eq!(rules.classify_name("EOG"), ChannelType::Eog);
//! assert_eq!(rules.classify_name("EOG1x"), ChannelType::Eeg); // no full match
//! assert_eq!(rules.classify_name("BIP12"), ChannelType::Misc);
//! # Ok::<(), antio::AntError>(())
//! ```
//!
//! ## Warnings vs Errors
//!
//! A decode either fails with an [`AntError`] (empty recording, malformed
//! records, container failure) or succeeds with a possibly empty list of
//! [`DecodeWarning`]s: mixed references, unknown units, unpaired amplifier
//! disconnections, annotations past the end of the recording. Warnings are
//! also sent to the `log` facade.

pub mod error;
pub mod types;
pub mod utils;
pub mod container;
pub mod channels;
pub mod scaling;
pub mod triggers;
pub mod reader;

#[doc(hidden)]
pub mod doctest_utils; // For internal doctest support

// Re-export main types for convenience
pub use error::{AntError, Result};
pub use types::{
    Annotation, AnnotationSpan, ChannelDescriptor, ChannelType, DecodeWarning, ImpedanceReadings,
    RawChannel, RawTrigger, Recording, SampleMatrix,
};
pub use container::{CntContainer, MemoryContainer};
pub use scaling::UnitScaleTable;
pub use channels::ReferenceScope;
pub use reader::{read_raw_ant, AntReader, DecodeOptions, Decoded};

/// Library version
///
/// ```rust
/// let version = antio::version();
/// assert!(version.contains('.'));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
