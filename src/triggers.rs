use crate::error::Result;
use crate::types::{AnnotationSpan, DecodeWarning, ImpedanceReadings, RawTrigger};
use crate::utils::{eq_lowercase, parse_impedance_values};

/// Label of the bad segment recorded during an impedance check.
pub const BAD_IMPEDANCE: &str = "BAD_impedance";
/// Label of the bad segment between an amplifier disconnection and reconnection.
pub const BAD_DISCONNECTION: &str = "BAD_disconnection";

const IMPEDANCE_DESCRIPTION: &str = "impedance";
const DISCONNECTED_CONDITION: &str = "amplifier disconnected";
const RECONNECTED_CONDITION: &str = "amplifier reconnected";

/// What a single trigger stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerKind {
    Impedance { sample: u64, duration: u64, values: Vec<f64> },
    DisconnectStart { sample: u64 },
    DisconnectStop { sample: u64 },
    Event(AnnotationSpan),
}

impl TriggerKind {
    /// Interprets one trigger. Branches are tried in order: impedance check,
    /// disconnection, reconnection, ordinary event.
    ///
    /// # Errors
    ///
    /// * `AntError::InvalidImpedance` - impedance string holds a non-numeric value
    pub fn from_trigger(trigger: &RawTrigger) -> Result<Self> {
        let condition = trigger.condition.as_deref();

        if eq_lowercase(trigger.description.as_deref(), IMPEDANCE_DESCRIPTION) {
            if let Some(impedance) = &trigger.impedance {
                if eq_lowercase(condition, DISCONNECTED_CONDITION)
                    || eq_lowercase(condition, RECONNECTED_CONDITION)
                {
                    log::info!(
                        "Trigger at sample {} is both an impedance check and a connectivity \
                         change, keeping the impedance check",
                        trigger.sample_index
                    );
                }
                return Ok(TriggerKind::Impedance {
                    sample: trigger.sample_index,
                    duration: trigger.duration,
                    values: parse_impedance_values(impedance, trigger.sample_index)?,
                });
            }
        }

        if eq_lowercase(condition, DISCONNECTED_CONDITION) {
            return Ok(TriggerKind::DisconnectStart { sample: trigger.sample_index });
        }
        if eq_lowercase(condition, RECONNECTED_CONDITION) {
            return Ok(TriggerKind::DisconnectStop { sample: trigger.sample_index });
        }

        let label = match trigger.description.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => trigger.code.as_str(),
        };
        Ok(TriggerKind::Event(AnnotationSpan::new(
            trigger.sample_index,
            trigger.duration,
            label,
        )))
    }
}

/// Result of [`classify`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerClassification {
    /// Impedance and event spans in trigger order, then disconnection spans.
    pub spans: Vec<AnnotationSpan>,
    pub impedances: ImpedanceReadings,
    pub warnings: Vec<DecodeWarning>,
}

#[derive(Default)]
struct Accumulator {
    spans: Vec<AnnotationSpan>,
    impedances: ImpedanceReadings,
    starts: Vec<u64>,
    stops: Vec<u64>,
}

impl Accumulator {
    fn push(mut self, kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::Impedance { sample, duration, values } => {
                if self.impedances.insert(sample, values).is_some() {
                    log::debug!("Impedance check at sample {} replaces an earlier one", sample);
                }
                self.spans.push(AnnotationSpan::new(sample, duration, BAD_IMPEDANCE));
            }
            TriggerKind::DisconnectStart { sample } => self.starts.push(sample),
            TriggerKind::DisconnectStop { sample } => self.stops.push(sample),
            TriggerKind::Event(span) => self.spans.push(span),
        }
        self
    }

    fn finish(self) -> TriggerClassification {
        let Accumulator { mut spans, impedances, starts, stops } = self;
        let mut warnings = Vec::new();

        for (&start, &stop) in starts.iter().zip(&stops) {
            if stop < start {
                warnings.push(DecodeWarning::ReversedDisconnect { start, stop });
                continue;
            }
            spans.push(AnnotationSpan::new(start, stop - start, BAD_DISCONNECTION));
        }

        // 多余的断开或重连事件直接丢弃
        let paired = starts.len().min(stops.len());
        warnings.extend(
            starts[paired..]
                .iter()
                .map(|&sample| DecodeWarning::UnmatchedDisconnect { sample }),
        );
        warnings.extend(
            stops[paired..]
                .iter()
                .map(|&sample| DecodeWarning::UnmatchedReconnect { sample }),
        );

        for w in &warnings {
            log::warn!("{}", w);
        }

        TriggerClassification { spans, impedances, warnings }
    }
}

/// Splits triggers into impedance spans, disconnection spans and events in a
/// single pass over the container order.
///
/// Disconnections and reconnections are paired by position. Unpaired or
/// reversed entries produce no span and are reported as warnings.
///
/// # Examples
///
/// ```rust
/// use antio::triggers::{classify, BAD_DISCONNECTION, BAD_IMPEDANCE};
/// use antio::RawTrigger;
///
/// let triggers = vec![
///     RawTrigger::new("1", 10).with_description("Impedance").with_impedance("5 7"),
///     RawTrigger::new("9001", 200),
///     RawTrigger::new("", 1000).with_condition("Amplifier disconnected"),
///     RawTrigger::new("", 5000).with_condition("Amplifier reconnected"),
/// ];
/// let result = classify(&triggers)?;
///
/// let labels: Vec<&str> = result.spans.iter().map(|s| s.label.as_str()).collect();
/// assert_eq!(labels, vec![BAD_IMPEDANCE, "9001", BAD_DISCONNECTION]);
/// assert_eq!(result.impedances[&10], vec![5.0, 7.0]);
/// assert!(result.warnings.is_empty());
/// # Ok::<(), antio::AntError>(())
/// ```
pub fn classify(triggers: &[RawTrigger]) -> Result<TriggerClassification> {
    let acc = triggers
        .iter()
        .map(TriggerKind::from_trigger)
        .try_fold(Accumulator::default(), |acc, kind| kind.map(|k| acc.push(k)))?;
    Ok(acc.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AntError;

    #[test]
    fn test_impedance_trigger() {
        for description in ["Impedance", "IMPEDANCE", "impedance"] {
            let triggers = vec![RawTrigger::new("1", 2048)
                .with_duration(512)
                .with_description(description)
                .with_impedance("1000 1200 900")];
            let result = classify(&triggers).unwrap();

            assert_eq!(result.impedances.len(), 1);
            assert_eq!(result.impedances[&2048], vec![1000.0, 1200.0, 900.0]);
            assert_eq!(result.spans, vec![AnnotationSpan::new(2048, 512, BAD_IMPEDANCE)]);
        }
    }

    #[test]
    fn test_impedance_description_without_values_is_event() {
        let triggers = vec![RawTrigger::new("1", 100).with_description("Impedance")];
        let result = classify(&triggers).unwrap();

        assert!(result.impedances.is_empty());
        assert_eq!(result.spans, vec![AnnotationSpan::new(100, 0, "Impedance")]);
    }

    #[test]
    fn test_invalid_impedance_is_fatal() {
        let triggers = vec![RawTrigger::new("1", 7)
            .with_description("impedance")
            .with_impedance("12 n/a")];
        match classify(&triggers) {
            Err(AntError::InvalidImpedance { sample, value }) => {
                assert_eq!(sample, 7);
                assert_eq!(value, "n/a");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_disconnection_pair() {
        let triggers = vec![
            RawTrigger::new("", 1000).with_condition("Amplifier Disconnected"),
            RawTrigger::new("", 5000).with_condition("amplifier reconnected"),
        ];
        let result = classify(&triggers).unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(result.spans, vec![AnnotationSpan::new(1000, 4000, BAD_DISCONNECTION)]);
        assert_eq!(result.spans[0].end_sample(), 5000);
    }

    #[test]
    fn test_unmatched_disconnect_is_dropped() {
        let triggers = vec![
            RawTrigger::new("", 1000).with_condition("amplifier disconnected"),
            RawTrigger::new("", 2000).with_condition("amplifier reconnected"),
            RawTrigger::new("", 8000).with_condition("amplifier disconnected"),
        ];
        let result = classify(&triggers).unwrap();

        assert_eq!(result.spans, vec![AnnotationSpan::new(1000, 1000, BAD_DISCONNECTION)]);
        assert_eq!(result.warnings, vec![DecodeWarning::UnmatchedDisconnect { sample: 8000 }]);
    }

    #[test]
    fn test_unmatched_reconnect_is_dropped() {
        let triggers = vec![RawTrigger::new("", 300).with_condition("amplifier reconnected")];
        let result = classify(&triggers).unwrap();

        assert!(result.spans.is_empty());
        assert_eq!(result.warnings, vec![DecodeWarning::UnmatchedReconnect { sample: 300 }]);
    }

    #[test]
    fn test_reversed_pair_is_dropped() {
        let triggers = vec![
            RawTrigger::new("", 100).with_condition("amplifier reconnected"),
            RawTrigger::new("", 900).with_condition("amplifier disconnected"),
        ];
        let result = classify(&triggers).unwrap();

        assert!(result.spans.is_empty());
        assert_eq!(
            result.warnings,
            vec![DecodeWarning::ReversedDisconnect { start: 900, stop: 100 }]
        );
    }

    #[test]
    fn test_event_label() {
        let triggers = vec![
            RawTrigger::new("9001", 10),
            RawTrigger::new("9002", 20).with_description(""),
            RawTrigger::new("9003", 30).with_duration(5).with_description("Stimulus"),
        ];
        let result = classify(&triggers).unwrap();

        assert_eq!(
            result.spans,
            vec![
                AnnotationSpan::new(10, 0, "9001"),
                AnnotationSpan::new(20, 0, "9002"),
                AnnotationSpan::new(30, 5, "Stimulus"),
            ]
        );
    }

    #[test]
    fn test_impedance_wins_over_condition() {
        let trigger = RawTrigger::new("1", 50)
            .with_description("Impedance")
            .with_impedance("3")
            .with_condition("amplifier disconnected");
        assert_eq!(
            TriggerKind::from_trigger(&trigger).unwrap(),
            TriggerKind::Impedance { sample: 50, duration: 0, values: vec![3.0] }
        );
    }

    #[test]
    fn test_disconnection_spans_after_events() {
        let triggers = vec![
            RawTrigger::new("", 10).with_condition("amplifier disconnected"),
            RawTrigger::new("A", 20),
            RawTrigger::new("", 30).with_condition("amplifier reconnected"),
            RawTrigger::new("B", 40),
        ];
        let result = classify(&triggers).unwrap();
        let labels: Vec<&str> = result.spans.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", BAD_DISCONNECTION]);
    }

    #[test]
    fn test_no_triggers() {
        assert_eq!(classify(&[]).unwrap(), TriggerClassification::default());
    }
}
