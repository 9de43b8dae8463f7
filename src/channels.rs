use regex::Regex;

use crate::error::Result;
use crate::types::{ChannelDescriptor, ChannelType, DecodeWarning, RawChannel};
use crate::utils::compile_fullmatch;

/// Which channels take part in the reference consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceScope {
    /// Every channel, bipolar ones included.
    #[default]
    All,
    /// Only channels classified as EEG.
    Eeg,
}

/// Outcome of the reference consistency check.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceCheck {
    /// No channel in scope.
    Empty,
    Uniform(String),
    /// Distinct references in order of first appearance.
    Mixed(Vec<String>),
}

impl ReferenceCheck {
    pub fn warning(&self) -> Option<DecodeWarning> {
        match self {
            ReferenceCheck::Mixed(references) => Some(DecodeWarning::MixedReferences {
                references: references.clone(),
            }),
            _ => None,
        }
    }
}

/// Ordered `(pattern, type)` rules. The first full match wins; names that
/// match nothing are EEG.
#[derive(Debug, Clone, Default)]
pub struct ChannelRules {
    rules: Vec<(Regex, ChannelType)>,
}

impl ChannelRules {
    pub fn new() -> Self {
        ChannelRules::default()
    }

    /// Builds the eog-then-misc rule table.
    ///
    /// # Errors
    ///
    /// * `AntError::InvalidPattern` - a pattern does not compile
    pub fn from_patterns(eog: Option<&str>, misc: Option<&str>) -> Result<Self> {
        let mut rules = ChannelRules::new();
        if let Some(p) = eog {
            rules = rules.with_rule(p, ChannelType::Eog)?;
        }
        if let Some(p) = misc {
            rules = rules.with_rule(p, ChannelType::Misc)?;
        }
        Ok(rules)
    }

    /// Appends a rule evaluated after the existing ones.
    pub fn with_rule(mut self, pattern: &str, kind: ChannelType) -> Result<Self> {
        self.rules.push((compile_fullmatch(pattern)?, kind));
        Ok(self)
    }

    pub fn classify_name(&self, name: &str) -> ChannelType {
        self.rules
            .iter()
            .find(|(re, _)| re.is_match(name))
            .map_or(ChannelType::Eeg, |(_, kind)| *kind)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Classifies raw channels in container order and checks that they share a
/// reference electrode.
///
/// # Examples
///
/// ```rust
/// use antio::channels::{classify, ChannelRules, ReferenceCheck, ReferenceScope};
/// use antio::{ChannelType, RawChannel};
///
/// let raw = vec![
///     RawChannel::new("Fp1", "uV", "CPz"),
///     RawChannel::new("BIP1", "uV", "CPz"),
/// ];
/// let rules = ChannelRules::from_patterns(None, Some(r"BIP\d+"))?;
/// let (channels, check) = classify(&raw, &rules, ReferenceScope::All);
///
/// assert_eq!(channels[0].kind, ChannelType::Eeg);
/// assert_eq!(channels[1].kind, ChannelType::Misc);
/// assert_eq!(channels[1].unit, "uv");
/// assert_eq!(check, ReferenceCheck::Uniform("CPz".to_string()));
/// # Ok::<(), antio::AntError>(())
/// ```
pub fn classify(
    raw: &[RawChannel],
    rules: &ChannelRules,
    scope: ReferenceScope,
) -> (Vec<ChannelDescriptor>, ReferenceCheck) {
    let channels: Vec<ChannelDescriptor> = raw
        .iter()
        .map(|ch| ChannelDescriptor {
            name: ch.name.clone(),
            unit: ch.unit.to_lowercase(),
            reference: ch.reference.clone(),
            kind: rules.classify_name(&ch.name),
        })
        .collect();

    let check = check_references(&channels, scope);
    match &check {
        ReferenceCheck::Uniform(reference) => {
            log::info!("All {} channels are referenced to {}.", channels.len(), reference);
        }
        ReferenceCheck::Mixed(references) => {
            log::debug!("Channel references: {:?}", references);
        }
        ReferenceCheck::Empty => {
            log::debug!("No channel in scope for the reference check");
        }
    }

    (channels, check)
}

pub fn check_references(channels: &[ChannelDescriptor], scope: ReferenceScope) -> ReferenceCheck {
    let mut distinct: Vec<String> = Vec::new();
    let in_scope = channels.iter().filter(|c| match scope {
        ReferenceScope::All => true,
        ReferenceScope::Eeg => c.kind == ChannelType::Eeg,
    });
    for ch in in_scope {
        if !distinct.contains(&ch.reference) {
            distinct.push(ch.reference.clone());
        }
    }

    match distinct.len() {
        0 => ReferenceCheck::Empty,
        1 => ReferenceCheck::Uniform(distinct.remove(0)),
        _ => ReferenceCheck::Mixed(distinct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(names: &[(&str, &str)]) -> Vec<RawChannel> {
        names.iter().map(|(n, r)| RawChannel::new(n, "uV", r)).collect()
    }

    #[test]
    fn test_order_and_count_preserved() {
        let input = raw(&[("Fp1", "CPz"), ("Fp2", "CPz"), ("BIP1", "CPz"), ("Oz", "CPz")]);
        let rules = ChannelRules::from_patterns(None, Some(r"BIP\d+")).unwrap();
        let (channels, _) = classify(&input, &rules, ReferenceScope::All);

        assert_eq!(channels.len(), input.len());
        let names: Vec<&str> = channels.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Fp1", "Fp2", "BIP1", "Oz"]);
    }

    #[test]
    fn test_fullmatch_required() {
        let input = raw(&[("EOG1x", "CPz")]);

        let rules = ChannelRules::from_patterns(Some("EOG"), None).unwrap();
        let (channels, _) = classify(&input, &rules, ReferenceScope::All);
        assert_eq!(channels[0].kind, ChannelType::Eeg);

        let rules = ChannelRules::from_patterns(Some("EOG.*"), None).unwrap();
        let (channels, _) = classify(&input, &rules, ReferenceScope::All);
        assert_eq!(channels[0].kind, ChannelType::Eog);
    }

    #[test]
    fn test_eog_checked_before_misc() {
        let rules = ChannelRules::from_patterns(Some("BIP.*"), Some(r"BIP\d+")).unwrap();
        assert_eq!(rules.classify_name("BIP3"), ChannelType::Eog);

        let rules = ChannelRules::from_patterns(None, Some(r"BIP\d+")).unwrap();
        assert_eq!(rules.classify_name("BIP3"), ChannelType::Misc);
        assert_eq!(rules.classify_name("BIPx"), ChannelType::Eeg);
    }

    #[test]
    fn test_no_rules_means_eeg() {
        let rules = ChannelRules::new();
        assert!(rules.is_empty());
        assert_eq!(rules.classify_name("VEOG"), ChannelType::Eeg);
    }

    #[test]
    fn test_units_lowercased() {
        let input = vec![RawChannel::new("Fp1", "uV", "CPz"), RawChannel::new("Fp2", "MV", "CPz")];
        let (channels, _) = classify(&input, &ChannelRules::new(), ReferenceScope::All);
        assert_eq!(channels[0].unit, "uv");
        assert_eq!(channels[1].unit, "mv");
    }

    #[test]
    fn test_mixed_references() {
        let input = raw(&[("Fp1", "CPz"), ("Fp2", "CPz"), ("BIP1", "")]);
        let rules = ChannelRules::from_patterns(None, Some(r"BIP\d+")).unwrap();

        let (_, check) = classify(&input, &rules, ReferenceScope::All);
        assert_eq!(check, ReferenceCheck::Mixed(vec!["CPz".to_string(), "".to_string()]));
        assert!(matches!(check.warning(), Some(DecodeWarning::MixedReferences { .. })));

        // 双极通道不参与 EEG 范围内的检查
        let (_, check) = classify(&input, &rules, ReferenceScope::Eeg);
        assert_eq!(check, ReferenceCheck::Uniform("CPz".to_string()));
        assert!(check.warning().is_none());
    }

    #[test]
    fn test_empty_scope() {
        let input = raw(&[("BIP1", "")]);
        let rules = ChannelRules::from_patterns(None, Some(r"BIP\d+")).unwrap();
        let (_, check) = classify(&input, &rules, ReferenceScope::Eeg);
        assert_eq!(check, ReferenceCheck::Empty);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(ChannelRules::from_patterns(Some("EOG["), None).is_err());
    }
}
