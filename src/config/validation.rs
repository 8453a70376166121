//! Config validation
//!
//! Pass 1 reads the raw TOML as a `toml::Value` and warns about keys the
//! drought config does not know, with an edit-distance suggestion.
//! Pass 2 runs after serde and checks that values are usable for a run:
//! errors for values no run can use, warnings for merely suspicious ones.

use chrono::Datelike;
use std::collections::BTreeSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `DroughtConfig`.
///
/// Maintained by hand to match the struct hierarchy in drought_config.rs.
/// Any new field added to `DroughtConfig` must be added here too.
pub fn known_config_keys() -> BTreeSet<&'static str> {
    let keys: &[&str] = &[
        // [baseline]
        "baseline",
        "baseline.start_year",
        "baseline.end_year",
        // [filter]
        "filter",
        "filter.initial_date",
        "filter.end_date",
        "filter.region_subset",
        "filter.max_raw_value",
        // [change]
        "change",
        "change.max_gw_change",
        "change.min_coverage_fraction",
        // [scoring]
        "scoring",
        "scoring.cum_percentile_mode",
        // [regional]
        "regional",
        "regional.stat_kinds",
        // [input]
        "input",
        "input.station_id_column",
        "input.region_column",
        "input.date_column",
        "input.value_column",
        "input.station_join_column",
        // [output]
        "output",
        "output.directory",
        "output.wells_file",
        "output.regional_file",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Dotted paths of every key in a `toml::Value` tree, tables included.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let Some(table) = value.as_table() else {
        return Vec::new();
    };
    table
        .iter()
        .flat_map(|(k, v)| {
            let path = if prefix.is_empty() { k.clone() } else { format!("{prefix}.{k}") };
            let nested = walk_toml_keys(v, &path);
            std::iter::once(path).chain(nested)
        })
        .collect()
}

// ============================================================================
// Suggestions
// ============================================================================

/// Largest edit distance still offered as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Levenshtein edit distance, single-row dynamic programme.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitute = diag + usize::from(ca != *cb);
            diag = row[j + 1];
            row[j + 1] = substitute.min(row[j] + 1).min(diag + 1);
        }
    }
    row[b.len()]
}

fn section_of(key: &str) -> &str {
    key.split_once('.').map_or(key, |(section, _)| section)
}

/// Closest known key to `unknown`, if one is within edit distance 3.
///
/// Equal distances prefer a key in the same section, then the
/// alphabetically first key.
pub fn suggest_correction(unknown: &str, known: &BTreeSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), section_of(k) != section_of(unknown), *k))
        .filter(|(dist, ..)| *dist <= MAX_SUGGESTION_DISTANCE)
        .min()
        .map(|(.., k)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Warnings for every key in `raw_toml` that `DroughtConfig` does not know.
///
/// An unknown section is reported once; its own keys are not listed.
/// Unparseable input yields no warnings: serde reports it on the real load.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .filter(|key| !key.contains('.') || known.contains(section_of(key)))
        .map(|key| {
            let message = match key.split_once('.') {
                Some((section, leaf)) => format!("Unknown key '{leaf}' in [{section}]"),
                None => format!("Unknown config section '[{key}]'"),
            };
            ValidationWarning {
                suggestion: suggest_correction(&key, &known),
                message,
                field: key,
            }
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed `DroughtConfig`.
///
/// Returns (errors, warnings). Errors are values the pipeline cannot run
/// with; warnings are suspicious but not fatal.
pub fn validate_ranges(config: &super::DroughtConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let input = &config.input;
    for (name, value) in [
        ("input.station_id_column", &input.station_id_column),
        ("input.region_column", &input.region_column),
        ("input.date_column", &input.date_column),
        ("input.value_column", &input.value_column),
        ("input.station_join_column", &input.station_join_column),
        ("output.wells_file", &config.output.wells_file),
        ("output.regional_file", &config.output.regional_file),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("{name} must not be blank"));
        }
    }

    // Baseline window should overlap the analysed years, otherwise every
    // percentile comes out missing.
    let first_year = config.filter.initial_date.year();
    let last_year = config.end_date().year();
    let baseline = &config.baseline;
    if baseline.end_year < first_year || baseline.start_year > last_year {
        warnings.push(ValidationWarning {
            field: "baseline".to_string(),
            message: format!(
                "baseline window {}-{} does not overlap analysis years {first_year}-{last_year}; all percentiles will be missing",
                baseline.start_year, baseline.end_year
            ),
            suggestion: None,
        });
    }

    let max_change = config.change.max_gw_change;
    if max_change.is_finite() && max_change > 100.0 {
        warnings.push(ValidationWarning {
            field: "change.max_gw_change".to_string(),
            message: format!(
                "max_gw_change = {max_change:.1} ft is outside typical range (1-100 ft); outliers will pass"
            ),
            suggestion: None,
        });
    }

    let coverage = config.change.min_coverage_fraction;
    if coverage > 0.9 && coverage <= 1.0 {
        warnings.push(ValidationWarning {
            field: "change.min_coverage_fraction".to_string(),
            message: format!(
                "min_coverage_fraction = {coverage:.2} requires nearly complete records; most wells will be excluded"
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DroughtConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("baseline", "baseline"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("max_gw_chnage", "max_gw_change"), 2);
        assert_eq!(levenshtein("end_yar", "end_year"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [change]
            max_gw_change = 25.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"change".to_string()));
        assert!(keys.contains(&"change.max_gw_change".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[baseline]
end_yaer = 2020
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("end_yaer"));
        assert_eq!(warnings[0].suggestion.as_deref(), Some("baseline.end_year"));
    }

    #[test]
    fn test_unknown_section_reported_once() {
        let toml_str = r#"
[basline]
start_year = 1991
end_year = 2020
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "basline");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("baseline"));
    }

    #[test]
    fn test_suggestion_prefers_same_section() {
        // one edit from both; alphabetical order alone would pick "aa.key"
        let known: BTreeSet<&str> = ["aa.key", "ab.kez"].into_iter().collect();
        assert_eq!(suggest_correction("ab.key", &known).as_deref(), Some("ab.kez"));
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_defaults_have_clean_ranges() {
        let config = DroughtConfig::default();
        let (errors, warnings) = validate_ranges(&config);
        assert!(errors.is_empty(), "Defaults should produce no errors: {:?}", errors);
        assert!(warnings.is_empty(), "Defaults should produce no warnings: {:?}", warnings);
    }

    #[test]
    fn test_blank_column_is_error() {
        let mut config = DroughtConfig::default();
        config.input.region_column = "  ".to_string();
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("input.region_column")));
    }

    #[test]
    fn test_baseline_outside_analysis_range_warns() {
        let mut config = DroughtConfig::default();
        config.baseline.start_year = 1950;
        config.baseline.end_year = 1960;
        let (_, warnings) = validate_ranges(&config);
        assert!(warnings.iter().any(|w| w.field == "baseline"));
    }
}
