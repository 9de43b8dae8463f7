use std::collections::{BTreeMap, HashMap};

use crate::error::{AntError, Result};
use crate::types::{DecodeWarning, SampleMatrix};

/// Multiplicative factors from lowercase unit names to volts.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitScaleTable {
    factors: HashMap<String, f64>,
}

impl Default for UnitScaleTable {
    /// Microvolts only, which is what ANT amplifiers record.
    fn default() -> Self {
        UnitScaleTable::empty().with_unit("uv", 1e-6)
    }
}

impl UnitScaleTable {
    pub fn empty() -> Self {
        UnitScaleTable { factors: HashMap::new() }
    }

    /// Adds or replaces a unit. The name is lowercased.
    pub fn with_unit(mut self, unit: &str, factor: f64) -> Self {
        self.factors.insert(unit.to_lowercase(), factor);
        self
    }

    pub fn factor(&self, unit: &str) -> Option<f64> {
        self.factors.get(unit).copied()
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.factors.contains_key(unit)
    }
}

/// Rescales every channel row to volts in place.
///
/// Rows whose unit is missing from `table` are left untouched and reported
/// once per unit. Calling this twice scales twice.
///
/// # Errors
///
/// * `AntError::UnitCountMismatch` - `units` does not have one entry per row
///
/// # Examples
///
/// ```rust
/// use antio::scaling::{scale, UnitScaleTable};
/// use antio::SampleMatrix;
///
/// let mut samples = SampleMatrix::from_rows(vec![vec![1e4, 2e4], vec![5.0, 6.0]])?;
/// let units = vec!["uv".to_string(), "ohm".to_string()];
/// let warnings = scale(&mut samples, &units, &UnitScaleTable::default())?;
///
/// assert_eq!(samples.row(0), &[1e4 * 1e-6, 2e4 * 1e-6]);
/// assert_eq!(samples.row(1), &[5.0, 6.0]);
/// assert_eq!(warnings.len(), 1);
/// # Ok::<(), antio::AntError>(())
/// ```
pub fn scale(
    samples: &mut SampleMatrix,
    units: &[String],
    table: &UnitScaleTable,
) -> Result<Vec<DecodeWarning>> {
    if units.len() != samples.n_channels() {
        return Err(AntError::UnitCountMismatch {
            units: units.len(),
            channels: samples.n_channels(),
        });
    }

    // BTreeMap 使警告顺序稳定
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, unit) in units.iter().enumerate() {
        groups.entry(unit.as_str()).or_default().push(idx);
    }

    let mut warnings = Vec::new();
    for (unit, rows) in groups {
        match table.factor(unit) {
            Some(factor) => {
                log::debug!("Scaling {} channel(s) from {} by {}", rows.len(), unit, factor);
                for &row in &rows {
                    samples.row_mut(row).iter_mut().for_each(|v| *v *= factor);
                }
            }
            None => {
                log::warn!("Unit {} not recognized, not scaling.", unit);
                warnings.push(DecodeWarning::UnrecognizedUnit {
                    unit: unit.to_string(),
                    channels: rows,
                });
            }
        }
    }
    Ok(warnings)
}
