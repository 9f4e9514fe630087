use exofile_core::Value;

use crate::model::{CandidateRow, EntityRows};

/// A resolved cell and the reference it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<'a> {
    pub value: Value,
    pub reference: Option<&'a str>,
}

impl Resolved<'_> {
    pub fn missing() -> Self {
        Self {
            value: Value::Missing,
            reference: None,
        }
    }
}

/// First row, walking references best-first, that has a value for `column`.
///
/// Within one reference, rows are tried in input order.
pub fn best_row<'r, 'a>(
    rows: &'r EntityRows<'a>,
    ranking: &[&'a str],
    column: &str,
) -> Option<&'r CandidateRow<'a>> {
    ranking.iter().find_map(|&reference| {
        rows.rows_for(reference)
            .find(|c| c.value(column).is_present())
    })
}

/// Value of `column` from the best-ranked reference that has one.
///
/// A column no source defines resolves to missing.
pub fn resolve_column<'a>(rows: &EntityRows<'a>, ranking: &[&'a str], column: &str) -> Resolved<'a> {
    match best_row(rows, ranking, column) {
        Some(c) => Resolved {
            value: c.value(column).clone(),
            reference: Some(c.reference),
        },
        None => Resolved::missing(),
    }
}
