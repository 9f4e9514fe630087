use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::error::MergeError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything the merge needs besides the tables themselves.
///
/// Passed explicitly to [`crate::merge`]; there is no global default file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    /// Column holding the entity (planet) name.
    #[serde(default = "default_entity_column")]
    pub entity_column: String,
    /// Column holding the reference (publication) of each row.
    #[serde(default = "default_reference_column")]
    pub reference_column: String,
    /// Optional column flagging the archive's default solution (value 1).
    #[serde(default)]
    pub default_flag_column: Option<String>,
    /// Julian date at which ephemeris errors are projected.
    #[serde(default)]
    pub epoch_jd: Option<f64>,
    /// Suffix sets naming the uncertainty siblings of a value column.
    #[serde(default = "default_error_suffixes")]
    pub error_suffixes: Vec<Vec<String>>,
    /// Take a value and its uncertainties from the same reference.
    #[serde(default = "default_true")]
    pub bundle_errors: bool,
    /// Suffix of per-column reference link columns.
    #[serde(default = "default_reflink_suffix")]
    pub reflink_suffix: String,
    #[serde(default)]
    pub sanitize: SanitizeConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            entity_column: default_entity_column(),
            reference_column: default_reference_column(),
            default_flag_column: None,
            epoch_jd: None,
            error_suffixes: default_error_suffixes(),
            bundle_errors: true,
            reflink_suffix: default_reflink_suffix(),
            sanitize: SanitizeConfig::default(),
            ranking: RankingConfig::default(),
            groups: Vec::new(),
        }
    }
}

fn default_entity_column() -> String {
    "pl_name".into()
}

fn default_reference_column() -> String {
    "pl_refname".into()
}

fn default_error_suffixes() -> Vec<Vec<String>> {
    vec![vec!["err1".into(), "err2".into()], vec!["err".into()]]
}

fn default_reflink_suffix() -> String {
    "_reflink".into()
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Sanitize
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SanitizeConfig {
    /// Mask value and errors together when any of them is missing.
    /// Off by default: masking drops values present in a source.
    pub mask_incomplete_errors: bool,
    /// Mask value and errors when an error is exactly zero. Off by default.
    pub mask_zero_errors: bool,
    /// Reduce `<a href=...>Name</a>` references to `Name`.
    pub normalize_reflinks: bool,
    /// Rewrite legacy unit spellings (`days` → `day`, ...).
    pub correct_units: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            mask_incomplete_errors: false,
            mask_zero_errors: false,
            normalize_reflinks: true,
            correct_units: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Ordered ranking keys; the first key is the most significant.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankingConfig {
    #[serde(default = "default_ranking_keys")]
    pub keys: Vec<RankingKey>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            keys: default_ranking_keys(),
        }
    }
}

fn default_ranking_keys() -> Vec<RankingKey> {
    vec![
        RankingKey::Ephemeris {
            epoch_column: "pl_tranmid".into(),
            period_column: default_period_column(),
            err_suffix: default_err_suffix(),
        },
        RankingKey::Ephemeris {
            epoch_column: "pl_orbtper".into(),
            period_column: default_period_column(),
            err_suffix: default_err_suffix(),
        },
        RankingKey::Uncertainty {
            column: "pl_orbper".into(),
            err_suffix: default_err_suffix(),
            relative: false,
        },
    ]
}

/// One quality metric for a reference; smaller is better.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankingKey {
    /// Uncertainty reported for `column` (`column` + `err_suffix`).
    Uncertainty {
        column: String,
        #[serde(default = "default_err_suffix")]
        err_suffix: String,
        /// Divide by the value itself.
        #[serde(default)]
        relative: bool,
    },
    /// Error of an epoch (transit mid-time, periastron time) propagated to
    /// the configured `epoch_jd` using the period uncertainty.
    Ephemeris {
        epoch_column: String,
        #[serde(default = "default_period_column")]
        period_column: String,
        #[serde(default = "default_err_suffix")]
        err_suffix: String,
    },
}

fn default_err_suffix() -> String {
    "err1".into()
}

fn default_period_column() -> String {
    "pl_orbper".into()
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// Columns that should come from one reference whenever possible.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub name: String,
    pub columns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MergeConfig {
    pub fn from_toml(input: &str) -> Result<Self, MergeError> {
        let config: MergeConfig =
            toml::from_str(input).map_err(|e| MergeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MergeError> {
        if self.entity_column.trim().is_empty() {
            return Err(MergeError::ConfigValidation("entity_column is empty".into()));
        }
        if self.reference_column.trim().is_empty() {
            return Err(MergeError::ConfigValidation("reference_column is empty".into()));
        }
        if self.entity_column == self.reference_column {
            return Err(MergeError::ConfigValidation(
                "entity_column and reference_column must differ".into(),
            ));
        }

        if self.error_suffixes.iter().any(|set| set.is_empty() || set.iter().any(|s| s.is_empty())) {
            return Err(MergeError::ConfigValidation(
                "error_suffixes must not contain empty sets or empty suffixes".into(),
            ));
        }

        for key in &self.ranking.keys {
            let (column, suffix) = match key {
                RankingKey::Uncertainty { column, err_suffix, .. } => (column, err_suffix),
                RankingKey::Ephemeris { epoch_column, err_suffix, .. } => (epoch_column, err_suffix),
            };
            if column.is_empty() || suffix.is_empty() {
                return Err(MergeError::ConfigValidation(format!(
                    "ranking key {key:?} needs a column and an error suffix"
                )));
            }
        }

        let mut names = HashSet::new();
        let mut owner: HashMap<&str, &str> = HashMap::new();
        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(MergeError::ConfigValidation("group with empty name".into()));
            }
            if !names.insert(group.name.as_str()) {
                return Err(MergeError::ConfigValidation(format!(
                    "duplicate group '{}'",
                    group.name
                )));
            }
            if group.columns.is_empty() {
                return Err(MergeError::ConfigValidation(format!(
                    "group '{}' has no columns",
                    group.name
                )));
            }
            for column in &group.columns {
                if column == &self.entity_column || column == &self.reference_column {
                    return Err(MergeError::ConfigValidation(format!(
                        "group '{}': column '{column}' is a key column",
                        group.name
                    )));
                }
                if let Some(prev) = owner.insert(column.as_str(), group.name.as_str()) {
                    return Err(MergeError::ConfigValidation(format!(
                        "column '{column}' is in groups '{prev}' and '{}'",
                        group.name
                    )));
                }
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
entity_column = "pl_name"
reference_column = "pl_refname"
default_flag_column = "default_flag"
epoch_jd = 2460000.5

[sanitize]
mask_incomplete_errors = true

[[ranking.keys]]
kind = "ephemeris"
epoch_column = "pl_tranmid"

[[ranking.keys]]
kind = "uncertainty"
column = "pl_orbper"
relative = true

[[groups]]
name = "orbit"
columns = ["pl_orbper", "pl_orbeccen"]

[[groups]]
name = "star"
columns = ["st_teff", "st_rad"]
"#;

    #[test]
    fn parse_full() {
        let config = MergeConfig::from_toml(FULL).unwrap();
        assert_eq!(config.default_flag_column.as_deref(), Some("default_flag"));
        assert_eq!(config.epoch_jd, Some(2460000.5));
        assert!(config.sanitize.mask_incomplete_errors);
        assert!(!config.sanitize.mask_zero_errors);
        assert!(config.sanitize.normalize_reflinks);
        assert_eq!(config.groups.len(), 2);
        assert_eq!(
            config.ranking.keys[0],
            RankingKey::Ephemeris {
                epoch_column: "pl_tranmid".into(),
                period_column: "pl_orbper".into(),
                err_suffix: "err1".into(),
            }
        );
        assert_eq!(
            config.ranking.keys[1],
            RankingKey::Uncertainty {
                column: "pl_orbper".into(),
                err_suffix: "err1".into(),
                relative: true,
            }
        );
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = MergeConfig::from_toml("").unwrap();
        assert_eq!(config.entity_column, "pl_name");
        assert_eq!(config.reference_column, "pl_refname");
        assert!(config.bundle_errors);
        assert_eq!(config.ranking.keys.len(), 3);
        assert_eq!(config.error_suffixes.len(), 2);
    }

    #[test]
    fn reject_overlapping_groups() {
        let input = r#"
[[groups]]
name = "a"
columns = ["pl_orbper"]

[[groups]]
name = "b"
columns = ["pl_orbper", "pl_rade"]
"#;
        let err = MergeConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'pl_orbper' is in groups 'a' and 'b'"));
    }

    #[test]
    fn reject_duplicate_group_names() {
        let input = r#"
[[groups]]
name = "a"
columns = ["x"]

[[groups]]
name = "a"
columns = ["y"]
"#;
        let err = MergeConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate group 'a'"));
    }

    #[test]
    fn reject_empty_group() {
        let input = r#"
[[groups]]
name = "a"
columns = []
"#;
        assert!(MergeConfig::from_toml(input).is_err());
    }

    #[test]
    fn reject_key_column_in_group() {
        let input = r#"
[[groups]]
name = "a"
columns = ["pl_name"]
"#;
        let err = MergeConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("key column"));
    }

    #[test]
    fn reject_unknown_ranking_kind() {
        let input = r#"
[[ranking.keys]]
kind = "vibes"
column = "pl_orbper"
"#;
        assert!(matches!(
            MergeConfig::from_toml(input),
            Err(MergeError::ConfigParse(_))
        ));
    }

    #[test]
    fn reject_same_key_columns() {
        let input = r#"
entity_column = "id"
reference_column = "id"
"#;
        assert!(MergeConfig::from_toml(input).is_err());
    }
}
