//! Reference ranking: orders the competing references of one entity by the
//! quality of their orbital solution.

use std::cmp::Ordering;

use exofile_core::units;
use ordered_float::OrderedFloat;

use crate::config::{MergeConfig, RankingKey};
use crate::model::{CandidateRow, EntityRows};

/// Sort key of one reference. Lower sorts first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankKey {
    /// The reference carries the source's default-solution flag.
    pub is_default: bool,
    /// One entry per configured ranking key; `None` when not computable.
    pub metrics: Vec<Option<OrderedFloat<f64>>>,
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .is_default
            .cmp(&self.is_default)
            .then_with(|| compare_metrics(&self.metrics, &other.metrics))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic; a present metric beats a missing one.
fn compare_metrics(a: &[Option<OrderedFloat<f64>>], b: &[Option<OrderedFloat<f64>>]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = match (x, y) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Distinct references of `rows`, best first.
///
/// Ties (equal or absent metrics) keep first-appearance order.
pub fn rank_references<'a>(rows: &EntityRows<'a>, config: &MergeConfig) -> Vec<&'a str> {
    let mut keyed: Vec<(RankKey, &'a str)> = rows
        .references()
        .into_iter()
        .map(|reference| (rank_key(rows, reference, config), reference))
        .collect();

    // Stable sort: ties stay in first-appearance order.
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, reference)| reference).collect()
}

/// Compute the sort key of `reference` from its rows.
pub fn rank_key(rows: &EntityRows<'_>, reference: &str, config: &MergeConfig) -> RankKey {
    let is_default = config
        .default_flag_column
        .as_deref()
        .map(|flag| rows.rows_for(reference).any(|c| is_flag_set(c, flag)))
        .unwrap_or(false);

    let metrics = config
        .ranking
        .keys
        .iter()
        .map(|key| {
            rows.rows_for(reference)
                .find_map(|c| metric(c, key, config.epoch_jd))
                .map(OrderedFloat)
        })
        .collect();

    RankKey { is_default, metrics }
}

fn is_flag_set(row: &CandidateRow<'_>, flag: &str) -> bool {
    let v = row.value(flag);
    match v.as_str() {
        Some(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "t" | "yes"),
        None => v.as_f64() == Some(1.0),
    }
}

/// Value of one ranking key for one row; smaller is better.
pub fn metric(row: &CandidateRow<'_>, key: &RankingKey, epoch_jd: Option<f64>) -> Option<f64> {
    match key {
        RankingKey::Uncertainty {
            column,
            err_suffix,
            relative,
        } => {
            let err = row.value(&format!("{column}{err_suffix}")).as_f64()?.abs();
            if *relative {
                let value = row.value(column).as_f64()?.abs();
                if value == 0.0 {
                    return None;
                }
                Some(err / value)
            } else {
                Some(err)
            }
        }
        RankingKey::Ephemeris {
            epoch_column,
            period_column,
            err_suffix,
        } => {
            let epoch_jd = epoch_jd?;
            let tmid = in_days(row, epoch_column)?;
            let tmid_err = in_days(row, &format!("{epoch_column}{err_suffix}"))?.abs();
            let period = in_days(row, period_column)?;
            let period_err = in_days(row, &format!("{period_column}{err_suffix}"))?.abs();
            if period <= 0.0 {
                return None;
            }
            let n_periods = ((epoch_jd - tmid) / period).abs();
            Some(tmid_err + n_periods * period_err)
        }
    }
}

/// Numeric cell converted to days when its column declares a time unit.
fn in_days(row: &CandidateRow<'_>, column: &str) -> Option<f64> {
    let value = row.value(column).as_f64()?;
    let factor = row
        .table
        .meta(column)
        .and_then(|m| m.unit.as_deref())
        .and_then(|u| units::conversion_factor(u, "day"))
        .unwrap_or(1.0);
    Some(value * factor)
}
