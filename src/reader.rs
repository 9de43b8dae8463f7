use crate::channels::{self, ChannelRules, ReferenceScope};
use crate::container::CntContainer;
use crate::error::{AntError, Result};
use crate::scaling::{self, UnitScaleTable};
use crate::triggers;
use crate::types::{DecodeWarning, RawChannel, RawTrigger, Recording, SampleMatrix};

/// Default pattern marking bipolar channels as miscellaneous.
pub const DEFAULT_MISC_PATTERN: &str = r"BIP\d+";

/// Decoding options.
///
/// `eog` and `misc` are regular expressions matched against the whole channel
/// name. EOG is checked first. By default no channel is EOG and channels named
/// `BIP` followed by digits are miscellaneous.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    pub eog: Option<String>,
    pub misc: Option<String>,
    pub reference_scope: ReferenceScope,
    pub unit_table: UnitScaleTable,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            eog: None,
            misc: Some(DEFAULT_MISC_PATTERN.to_string()),
            reference_scope: ReferenceScope::default(),
            unit_table: UnitScaleTable::default(),
        }
    }
}

impl DecodeOptions {
    pub fn with_eog(mut self, pattern: Option<&str>) -> Self {
        self.eog = pattern.map(str::to_string);
        self
    }

    pub fn with_misc(mut self, pattern: Option<&str>) -> Self {
        self.misc = pattern.map(str::to_string);
        self
    }

    pub fn with_reference_scope(mut self, scope: ReferenceScope) -> Self {
        self.reference_scope = scope;
        self
    }

    pub fn with_unit_table(mut self, table: UnitScaleTable) -> Self {
        self.unit_table = table;
        self
    }
}

/// A successful decode and the recoverable problems met on the way.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub recording: Recording,
    pub warnings: Vec<DecodeWarning>,
}

impl Decoded {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Turns the raw records of a `.cnt` container into a [`Recording`].
///
/// The reader holds only immutable configuration, so one instance can decode
/// any number of files.
///
/// # Examples
///
/// ```rust
/// use antio::{AntReader, ChannelType, DecodeOptions};
///
/// # let mut cnt = antio::doctest_utils::create_demo_container()?;
/// let reader = AntReader::new(DecodeOptions::default())?;
/// let decoded = reader.decode(&mut cnt)?;
/// let recording = &decoded.recording;
///
/// println!("{} channels at {} Hz", recording.channels.len(), recording.sample_frequency);
/// assert_eq!(recording.channel_types(), vec![ChannelType::Eeg, ChannelType::Misc]);
///
/// for (onset, duration, label) in recording.annotation_triples() {
///     println!("{:.3}s (+{:.3}s): {}", onset, duration, label);
/// }
/// for warning in &decoded.warnings {
///     eprintln!("warning: {}", warning);
/// }
/// # Ok::<(), antio::AntError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AntReader {
    options: DecodeOptions,
    rules: ChannelRules,
}

impl AntReader {
    /// Compiles the channel patterns.
    ///
    /// # Errors
    ///
    /// * `AntError::InvalidPattern` - `eog` or `misc` is not a valid regex
    pub fn new(options: DecodeOptions) -> Result<Self> {
        let rules = ChannelRules::from_patterns(options.eog.as_deref(), options.misc.as_deref())?;
        Ok(AntReader { options, rules })
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decodes a whole container.
    ///
    /// Spans stay in samples until every component has run, then they are
    /// converted to seconds with the container sampling frequency.
    ///
    /// # Errors
    ///
    /// * `AntError::NoChannels` / `AntError::NoSamples` - empty recording
    /// * `AntError::InvalidSampleFrequency` - frequency not finite and positive
    /// * `AntError::InvalidChannel` / `AntError::InvalidTrigger` - malformed record
    /// * `AntError::SampleBlockSize` - sample block does not match the header
    /// * `AntError::InvalidImpedance` - non-numeric impedance value
    /// * any error returned by the container
    pub fn decode<C: CntContainer + ?Sized>(&self, cnt: &mut C) -> Result<Decoded> {
        let mut warnings = Vec::new();

        // 通道
        let raw_channels = read_channels(cnt)?;
        let sample_frequency = cnt.sample_frequency()?;
        if !sample_frequency.is_finite() || sample_frequency <= 0.0 {
            return Err(AntError::InvalidSampleFrequency(sample_frequency));
        }
        let (channels, check) =
            channels::classify(&raw_channels, &self.rules, self.options.reference_scope);
        if let Some(w) = check.warning() {
            log::warn!("{}", w);
            warnings.push(w);
        }

        // 数据
        let n_samples = cnt.sample_count()?;
        if n_samples == 0 {
            return Err(AntError::NoSamples);
        }
        log::debug!("Reading {} samples x {} channels", n_samples, channels.len());
        let block = cnt.samples(0, n_samples)?;
        let mut samples = SampleMatrix::from_interleaved(&block, channels.len(), n_samples)?;
        drop(block);
        let units: Vec<String> = channels.iter().map(|c| c.unit.clone()).collect();
        warnings.extend(scaling::scale(&mut samples, &units, &self.options.unit_table)?);

        // 触发器
        let raw_triggers = read_triggers(cnt)?;
        let classified = triggers::classify(&raw_triggers)?;
        warnings.extend(classified.warnings);
        for (&sample, values) in &classified.impedances {
            if values.len() != channels.len() {
                let w = DecodeWarning::ImpedanceCountMismatch {
                    sample,
                    values: values.len(),
                    channels: channels.len(),
                };
                log::warn!("{}", w);
                warnings.push(w);
            }
        }
        for span in &classified.spans {
            if span.onset_sample >= n_samples as u64 || span.end_sample() > n_samples as u64 {
                let w = DecodeWarning::AnnotationOutOfRange {
                    label: span.label.clone(),
                    onset_sample: span.onset_sample,
                    end_sample: span.end_sample(),
                    n_samples: n_samples as u64,
                };
                log::warn!("{}", w);
                warnings.push(w);
            }
        }

        let annotations = classified
            .spans
            .iter()
            .map(|s| s.to_annotation(sample_frequency))
            .collect();
        let start_time = cnt.start_time()?;

        log::info!(
            "Decoded {} channels, {} samples at {} Hz, {} annotations, {} warning(s)",
            channels.len(),
            n_samples,
            sample_frequency,
            classified.spans.len(),
            warnings.len()
        );

        Ok(Decoded {
            recording: Recording {
                channels,
                sample_frequency,
                samples,
                spans: classified.spans,
                annotations,
                impedances: classified.impedances,
                start_time,
            },
            warnings,
        })
    }
}

/// Decodes `cnt` with `options`.
///
/// # Examples
///
/// ```rust
/// use antio::{read_raw_ant, DecodeOptions};
///
/// # let mut cnt = antio::doctest_utils::create_demo_container()?;
/// let decoded = read_raw_ant(&mut cnt, &DecodeOptions::default().with_eog(Some("VEOG|HEOG")))?;
/// assert!(!decoded.has_warnings());
/// assert!((decoded.recording.samples.row(0)[0] - 0.01).abs() < 1e-12);
/// # Ok::<(), antio::AntError>(())
/// ```
pub fn read_raw_ant<C: CntContainer + ?Sized>(
    cnt: &mut C,
    options: &DecodeOptions,
) -> Result<Decoded> {
    AntReader::new(options.clone())?.decode(cnt)
}

fn read_channels<C: CntContainer + ?Sized>(cnt: &C) -> Result<Vec<RawChannel>> {
    let n_channels = cnt.channel_count()?;
    if n_channels == 0 {
        return Err(AntError::NoChannels);
    }

    (0..n_channels)
        .map(|index| {
            let ch = cnt.channel(index)?;
            if ch.name.trim().is_empty() {
                return Err(AntError::InvalidChannel {
                    index,
                    reason: "empty channel name".to_string(),
                });
            }
            Ok(ch)
        })
        .collect()
}

fn read_triggers<C: CntContainer + ?Sized>(cnt: &C) -> Result<Vec<RawTrigger>> {
    let n_triggers = cnt.trigger_count()?;
    log::debug!("Reading {} triggers", n_triggers);

    (0..n_triggers)
        .map(|index| {
            let trigger = cnt.trigger(index)?;
            let unlabelled = trigger.code.is_empty()
                && trigger.description.as_deref().map_or(true, str::is_empty)
                && trigger.condition.is_none();
            if unlabelled {
                return Err(AntError::InvalidTrigger {
                    index,
                    reason: "no code, description or condition".to_string(),
                });
            }
            Ok(trigger)
        })
        .collect()
}
