use serde_json::Value;

use crate::audit::audit_document;
use crate::features::{EXPECTED_FEATURES, available_feature_names};
use crate::model::{Quality, Severity, ValidationResult};
use crate::schema::{DataFormat, classify_document, partial_sections};

// Full structural validation of one parsed race document: classification,
// feature detection, and the edge-case audit folded into a single report.
// Always returns a result; a document that matches nothing comes back as a
// critical report, never as an error.
pub fn validate_race_data_structure(value: &Value) -> ValidationResult {
    if !value.is_object() {
        return ValidationResult {
            is_valid: false,
            data_format: DataFormat::Unknown,
            errors: vec!["document is not a JSON object".to_string()],
            warnings: Vec::new(),
            available_features: Vec::new(),
            completeness: 0,
            severity: Severity::Critical,
            quality: Quality::Poor,
            can_proceed: false,
            edge_cases: Vec::new(),
        };
    }

    let variant = classify_document(value);
    let data_format = variant.format();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut partial_recognized = false;

    if data_format == DataFormat::Unknown {
        let sections = partial_sections(value);
        partial_recognized = sections.any();
        if partial_recognized {
            for (name, found) in [
                ("race_strategy_by_car", sections.strategy),
                ("enhanced_strategy_analysis", sections.enhanced_analysis),
                ("fastest_by_car_number", sections.fastest_laps),
            ] {
                if found {
                    warnings.push(format!("unrecognized format but section present: {name}"));
                } else {
                    warnings.push(format!("missing expected section: {name}"));
                }
            }
        } else {
            errors.push("document matches no known race-analysis format".to_string());
        }
    }

    let available_features = available_feature_names(&variant);
    let completeness =
        ((available_features.len() as f64 / EXPECTED_FEATURES.len() as f64) * 100.0).round() as u32;

    let edge_cases = audit_document(&variant);
    for issue in &edge_cases {
        warnings.push(format!("{}: {}", issue.kind.as_str(), issue.description));
    }

    let (quality, mut severity) =
        score_quality(errors.len(), warnings.len(), available_features.len());

    // A partial match is degraded, not hopeless.
    if severity == Severity::Critical && partial_recognized && errors.is_empty() {
        severity = Severity::Moderate;
    }

    let can_proceed = !(severity == Severity::Critical && !errors.is_empty());
    let is_valid = errors.is_empty() && severity != Severity::Critical;

    ValidationResult {
        is_valid,
        data_format,
        errors,
        warnings,
        available_features,
        completeness,
        severity,
        quality,
        can_proceed,
        edge_cases,
    }
}

// Fixed lookup: quality and severity move together as a monotone function of
// error count, warning count, and feature coverage.
fn score_quality(errors: usize, warnings: usize, features: usize) -> (Quality, Severity) {
    if features >= 8 && errors == 0 && warnings == 0 {
        (Quality::Excellent, Severity::Info)
    } else if features >= 6 && errors == 0 {
        (Quality::Good, Severity::Minor)
    } else if features >= 4 && errors <= 2 {
        (Quality::Fair, Severity::Moderate)
    } else {
        (Quality::Poor, Severity::Critical)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::model::{Quality, Severity};
    use crate::schema::DataFormat;

    use super::{score_quality, validate_race_data_structure};

    fn full_comprehensive() -> Value {
        json!({
            "race_strategy_by_car": [{
                "car_number": "57",
                "driver": "P. Ellis",
                "stints": [{
                    "stint_number": 1,
                    "lap_range": "1-3",
                    "laps": [
                        {"lap_time_fuel_corrected_sec": 100.1},
                        {"lap_time_fuel_corrected_sec": 100.4},
                        {"lap_time_fuel_corrected_sec": 100.2}
                    ]
                }],
                "pit_stop_details": [{"lap_number_entry": 3, "pit_time": "1:02.0"}],
                "driver_changes": [{"lap": 3, "from_driver": "P. Ellis", "to_driver": "R. Ward"}],
                "total_pit_time": "1:02.0"
            }],
            "enhanced_strategy_analysis": [{
                "car_number": "57",
                "fastest_lap": {"driver": "P. Ellis", "time": "1:40.1", "lap": 2}
            }],
            "fastest_by_car_number": [{
                "car_number": "57",
                "driver": "P. Ellis",
                "fastest_lap": {"time": "1:40.1", "lap": 2},
                "best_s1": {"time": "24.0", "lap": 2},
                "best_s2": {"time": "36.0", "lap": 2},
                "best_s3": {"time": "40.1", "lap": 2}
            }],
            "fastest_by_manufacturer": [{"manufacturer": "Mercedes-AMG"}]
        })
    }

    #[test]
    fn null_input_is_critical_and_cannot_proceed() {
        let result = validate_race_data_structure(&Value::Null);
        assert!(!result.is_valid);
        assert!(!result.can_proceed);
        assert_eq!(result.severity, Severity::Critical);
        assert_eq!(result.data_format, DataFormat::Unknown);
        assert_eq!(result.completeness, 0);
    }

    #[test]
    fn clean_comprehensive_document_scores_excellent_at_full_completeness() {
        let result = validate_race_data_structure(&full_comprehensive());
        assert_eq!(result.data_format, DataFormat::Comprehensive);
        assert!(result.errors.is_empty(), "unexpected errors: {:?}", result.errors);
        assert!(result.warnings.is_empty(), "unexpected warnings: {:?}", result.warnings);
        assert_eq!(result.completeness, 100);
        assert_eq!(result.quality, Quality::Excellent);
        assert_eq!(result.severity, Severity::Info);
        assert!(result.is_valid);
        assert!(result.can_proceed);
    }

    #[test]
    fn unknown_format_with_one_recognized_section_downgrades_to_moderate() {
        let doc = json!({
            "enhanced_strategy_analysis": [{"car_number": "3"}]
        });
        let result = validate_race_data_structure(&doc);
        assert_eq!(result.data_format, DataFormat::Unknown);
        assert!(result.errors.is_empty());
        assert_eq!(result.severity, Severity::Moderate);
        assert!(result.can_proceed);
        assert!(
            result
                .warnings
                .iter()
                .any(|warning| warning.contains("enhanced_strategy_analysis"))
        );
    }

    #[test]
    fn unknown_format_with_no_recognized_sections_is_critical() {
        let doc = json!({"weather": "dry", "attendance": 40000});
        let result = validate_race_data_structure(&doc);
        assert_eq!(result.severity, Severity::Critical);
        assert!(!result.can_proceed);
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn corrupted_laps_surface_as_warnings_and_lower_quality() {
        let mut doc = full_comprehensive();
        doc["race_strategy_by_car"][0]["stints"][0]["laps"][1]
            ["lap_time_fuel_corrected_sec"] = json!(-12.0);

        let result = validate_race_data_structure(&doc);
        assert!(result.errors.is_empty());
        assert!(
            result
                .warnings
                .iter()
                .any(|warning| warning.starts_with("data_corruption"))
        );
        assert_eq!(result.quality, Quality::Good);
        assert!(result.is_valid);
    }

    #[test]
    fn quality_table_is_monotone_in_its_inputs() {
        assert_eq!(score_quality(0, 0, 10), (Quality::Excellent, Severity::Info));
        assert_eq!(score_quality(0, 1, 10), (Quality::Good, Severity::Minor));
        assert_eq!(score_quality(0, 0, 7), (Quality::Good, Severity::Minor));
        assert_eq!(score_quality(1, 0, 7), (Quality::Fair, Severity::Moderate));
        assert_eq!(score_quality(2, 5, 4), (Quality::Fair, Severity::Moderate));
        assert_eq!(score_quality(3, 0, 9), (Quality::Poor, Severity::Critical));
        assert_eq!(score_quality(0, 0, 2), (Quality::Poor, Severity::Critical));
    }
}
