//! Consistency groups: related columns are filled from one reference first,
//! and only the remaining gaps are taken from the next references.

use std::collections::HashSet;

use exofile_core::Value;

use crate::config::MergeConfig;
use crate::model::EntityRows;

/// Columns resolved together for every entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    pub name: String,
    pub columns: Vec<String>,
    /// Declared in the config (as opposed to a value with its error columns).
    pub configured: bool,
}

/// How every output column is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub groups: Vec<GroupPlan>,
    /// Columns resolved one by one.
    pub plain: Vec<String>,
}

/// A cell chosen by [`fill_group`].
#[derive(Debug, Clone, PartialEq)]
pub struct Filled<'p, 'a> {
    pub column: &'p str,
    pub value: Value,
    pub reference: &'a str,
}

/// Error and reflink columns that travel with `column`.
fn siblings(column: &str, schema: &HashSet<&str>, config: &MergeConfig) -> Vec<String> {
    if !config.bundle_errors {
        return Vec::new();
    }
    let mut out = Vec::new();
    for set in &config.error_suffixes {
        let names: Vec<String> = set.iter().map(|s| format!("{column}{s}")).collect();
        if names.iter().all(|n| schema.contains(n.as_str())) {
            out.extend(names);
        }
    }
    let reflink = format!("{column}{}", config.reflink_suffix);
    if !config.reflink_suffix.is_empty() && schema.contains(reflink.as_str()) {
        out.push(reflink);
    }
    out
}

/// Partition the output columns into groups and plain columns.
///
/// `schema` is the ordered union of source columns. Key columns are left
/// out; the merger fills them itself.
pub fn build_plan(schema: &[String], config: &MergeConfig) -> MergePlan {
    let names: HashSet<&str> = schema.iter().map(String::as_str).collect();
    let mut claimed: HashSet<String> = HashSet::new();
    claimed.insert(config.entity_column.clone());
    claimed.insert(config.reference_column.clone());
    if let Some(flag) = &config.default_flag_column {
        claimed.insert(flag.clone());
    }

    let mut plan = MergePlan::default();

    for group in &config.groups {
        let mut columns = Vec::new();
        for column in &group.columns {
            if !names.contains(column.as_str()) {
                tracing::warn!(group = %group.name, %column, "group column not found in any source, ignored");
                continue;
            }
            for c in std::iter::once(column.clone()).chain(siblings(column, &names, config)) {
                if claimed.insert(c.clone()) {
                    columns.push(c);
                }
            }
        }
        if !columns.is_empty() {
            plan.groups.push(GroupPlan {
                name: group.name.clone(),
                columns,
                configured: true,
            });
        }
    }

    // Values with uncertainties form their own small group.
    let dependent: HashSet<String> = schema
        .iter()
        .flat_map(|c| siblings(c, &names, config))
        .collect();

    for column in schema {
        if claimed.contains(column) || dependent.contains(column) {
            continue;
        }
        let sibs = siblings(column, &names, config);
        if sibs.is_empty() {
            continue;
        }
        let mut columns = vec![column.clone()];
        columns.extend(sibs.into_iter().filter(|s| !claimed.contains(s)));
        for c in &columns {
            claimed.insert(c.clone());
        }
        plan.groups.push(GroupPlan {
            name: column.clone(),
            columns,
            configured: false,
        });
    }

    plan.plain = schema
        .iter()
        .filter(|c| !claimed.contains(*c))
        .cloned()
        .collect();

    plan
}

/// Fill one group for one entity.
///
/// References are walked best-first. The first reference with any value in
/// the group supplies everything it has; each following reference only fills
/// columns that are still missing. Returns the chosen cells in column order
/// of discovery; columns no reference provides are absent.
pub fn fill_group<'p, 'a>(
    rows: &EntityRows<'a>,
    ranking: &[&'a str],
    group: &'p GroupPlan,
) -> Vec<Filled<'p, 'a>> {
    let mut pending: Vec<&'p str> = group.columns.iter().map(String::as_str).collect();
    let mut out = Vec::new();

    for &reference in ranking {
        if pending.is_empty() {
            break;
        }
        pending.retain(|&column| {
            let found = rows
                .rows_for(reference)
                .map(|c| c.value(column))
                .find(|v| v.is_present());
            match found {
                Some(value) => {
                    out.push(Filled {
                        column,
                        value: value.clone(),
                        reference,
                    });
                    false
                }
                None => true,
            }
        });
    }

    out
}

/// Number of distinct references used by a filled group.
pub fn references_used(filled: &[Filled<'_, '_>]) -> usize {
    let mut seen: Vec<&str> = Vec::new();
    for f in filled {
        if !seen.contains(&f.reference) {
            seen.push(f.reference);
        }
    }
    seen.len()
}
