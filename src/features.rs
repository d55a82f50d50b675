use crate::model::FeatureAvailability;
use crate::schema::{RaceAnalysis, RaceDocumentVariant};

// The validator scores completeness against this fixed list; the seven-flag
// detector covers the event categories, the last three are section-level
// signals the quality score also expects.
pub const EXPECTED_FEATURES: [&str; 10] = [
    "race_start",
    "pit_stops",
    "driver_changes",
    "fastest_laps",
    "fastest_sectors",
    "anomaly_detection",
    "enhanced_analysis",
    "manufacturer_pace",
    "stint_timelines",
    "pit_timing",
];

// Each flag is a structural presence check, evaluated independently; deep
// validation of the section contents is the auditor's job.
pub fn detect_features(variant: &RaceDocumentVariant) -> FeatureAvailability {
    let analysis = variant.analysis();

    FeatureAvailability {
        race_start: has_cars(analysis),
        pit_stops: has_pit_stops(analysis),
        driver_changes: has_driver_changes(analysis),
        fastest_laps: has_fastest_laps(analysis),
        fastest_sectors: has_fastest_sectors(analysis),
        anomalies: has_lap_timings(analysis),
        enhanced_analysis: !analysis.enhanced_strategy_analysis.is_empty(),
    }
}

pub fn available_feature_names(variant: &RaceDocumentVariant) -> Vec<String> {
    let analysis = variant.analysis();
    let flags = detect_features(variant);

    let present = [
        ("race_start", flags.race_start),
        ("pit_stops", flags.pit_stops),
        ("driver_changes", flags.driver_changes),
        ("fastest_laps", flags.fastest_laps),
        ("fastest_sectors", flags.fastest_sectors),
        ("anomaly_detection", flags.anomalies),
        ("enhanced_analysis", flags.enhanced_analysis),
        (
            "manufacturer_pace",
            !analysis.fastest_by_manufacturer.is_empty(),
        ),
        ("stint_timelines", has_lap_timings(analysis)),
        ("pit_timing", has_pit_timing(analysis)),
    ];

    present
        .into_iter()
        .filter(|(_, available)| *available)
        .map(|(name, _)| name.to_string())
        .collect()
}

fn has_cars(analysis: &RaceAnalysis) -> bool {
    !analysis.race_strategy_by_car.is_empty() || !analysis.fastest_by_car_number.is_empty()
}

fn has_pit_stops(analysis: &RaceAnalysis) -> bool {
    analysis
        .race_strategy_by_car
        .iter()
        .any(|car| !car.pit_stop_details.is_empty() || !car.pit_stops.is_empty())
}

fn has_driver_changes(analysis: &RaceAnalysis) -> bool {
    analysis
        .race_strategy_by_car
        .iter()
        .any(|car| !car.driver_changes.is_empty())
}

fn has_fastest_laps(analysis: &RaceAnalysis) -> bool {
    analysis
        .fastest_by_car_number
        .iter()
        .any(|car| car.fastest_lap.is_some())
        || analysis
            .enhanced_strategy_analysis
            .iter()
            .any(|car| car.fastest_lap.is_some())
}

fn has_fastest_sectors(analysis: &RaceAnalysis) -> bool {
    analysis
        .fastest_by_car_number
        .iter()
        .any(|car| car.best_s1.is_some() || car.best_s2.is_some() || car.best_s3.is_some())
}

fn has_lap_timings(analysis: &RaceAnalysis) -> bool {
    analysis
        .race_strategy_by_car
        .iter()
        .any(|car| car.stints.iter().any(|stint| !stint.laps.is_empty()))
}

fn has_pit_timing(analysis: &RaceAnalysis) -> bool {
    analysis.race_strategy_by_car.iter().any(|car| {
        car.total_pit_time.is_some()
            || car
                .pit_stop_details
                .iter()
                .any(|stop| stop.pit_time.is_some() || stop.stationary_time.is_some())
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::schema::classify_document;

    use super::{EXPECTED_FEATURES, available_feature_names, detect_features};

    fn full_document() -> serde_json::Value {
        json!({
            "race_strategy_by_car": [{
                "car_number": "57",
                "driver": "Example Driver",
                "stints": [{
                    "stint_number": 1,
                    "lap_range": "1-20",
                    "laps": [
                        {"lap_in_stint": 1, "lap_time_fuel_corrected_sec": 99.5, "flag": "GREEN"}
                    ]
                }],
                "pit_stop_details": [{"lap_number_entry": 20, "pit_time": "1:05.2"}],
                "driver_changes": [{"lap": 20, "from_driver": "A", "to_driver": "B"}],
                "total_pit_time": "3:10.5"
            }],
            "enhanced_strategy_analysis": [{
                "car_number": "57",
                "fastest_lap": {"driver": "A", "time": "1:38.1", "lap": 14}
            }],
            "fastest_by_car_number": [{
                "car_number": "57",
                "driver": "A",
                "fastest_lap": {"time": "1:38.1", "lap": 14},
                "best_s1": {"time": "29.1", "lap": 12},
                "best_s2": {"time": "34.5", "lap": 14},
                "best_s3": {"time": "33.9", "lap": 14}
            }],
            "fastest_by_manufacturer": [{"manufacturer": "BMW", "time": "1:38.1"}]
        })
    }

    #[test]
    fn full_document_lights_every_flag_and_feature() {
        let variant = classify_document(&full_document());
        let flags = detect_features(&variant);

        assert!(flags.race_start);
        assert!(flags.pit_stops);
        assert!(flags.driver_changes);
        assert!(flags.fastest_laps);
        assert!(flags.fastest_sectors);
        assert!(flags.anomalies);
        assert!(flags.enhanced_analysis);

        let names = available_feature_names(&variant);
        assert_eq!(names.len(), EXPECTED_FEATURES.len());
    }

    #[test]
    fn sector_flag_requires_at_least_one_populated_sector_best() {
        let doc = json!({
            "race_strategy_by_car": [],
            "fastest_by_car_number": [
                {"car_number": "3", "fastest_lap": {"time": "1:40.0", "lap": 5}},
                {"car_number": "4", "best_s2": {"time": "35.0", "lap": 8}}
            ]
        });
        let flags = detect_features(&classify_document(&doc));
        assert!(flags.fastest_sectors);

        let doc = json!({
            "race_strategy_by_car": [],
            "fastest_by_car_number": [
                {"car_number": "3", "fastest_lap": {"time": "1:40.0", "lap": 5}}
            ]
        });
        let flags = detect_features(&classify_document(&doc));
        assert!(!flags.fastest_sectors);
    }

    #[test]
    fn pit_flag_accepts_either_schema_shape() {
        let comprehensive = json!({
            "race_strategy_by_car": [{"car_number": "1", "pit_stop_details": [{"lap_number_entry": 9}]}]
        });
        assert!(detect_features(&classify_document(&comprehensive)).pit_stops);

        let simple = json!({
            "race_strategy_by_car": [{"car_number": "1", "pit_stops": [{"lap": 9}]}]
        });
        assert!(detect_features(&classify_document(&simple)).pit_stops);

        let empty = json!({
            "race_strategy_by_car": [{"car_number": "1", "pit_stop_details": []}]
        });
        assert!(!detect_features(&classify_document(&empty)).pit_stops);
    }

    #[test]
    fn detection_is_idempotent_over_an_unchanged_document() {
        let variant = classify_document(&full_document());
        assert_eq!(detect_features(&variant), detect_features(&variant));
        assert_eq!(
            available_feature_names(&variant),
            available_feature_names(&variant)
        );
    }
}
