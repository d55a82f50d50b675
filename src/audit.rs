use crate::model::{EdgeCaseIssue, EdgeCaseKind, Severity};
use crate::schema::{CarStrategy, RaceDocumentVariant};

// Corruption bound for the audit scan. Wider than the anomaly detector's
// clean-lap envelope: the auditor only reports laps that cannot be real,
// while the baseline filter also discards merely implausible ones.
pub const CORRUPT_LAP_MIN_SEC: f64 = 0.0;
pub const CORRUPT_LAP_MAX_SEC: f64 = 1000.0;

// Scans the whole document for known pathological patterns. Issues repeat
// once per affected car/stint/lap and are never deduplicated.
pub fn audit_document(variant: &RaceDocumentVariant) -> Vec<EdgeCaseIssue> {
    let analysis = variant.analysis();
    let mut issues = Vec::new();

    for car in &analysis.race_strategy_by_car {
        let car_label = car
            .car_number
            .clone()
            .unwrap_or_else(|| "unknown".to_string());

        if car.stints.is_empty() {
            issues.push(EdgeCaseIssue {
                kind: EdgeCaseKind::DnsDnf,
                severity: Severity::Moderate,
                description: format!("car #{car_label} has no recorded stints (possible DNS/DNF)"),
                fallback: "render the car without stint-derived events".to_string(),
                affected_features: vec![
                    "stint_timelines".to_string(),
                    "anomaly_detection".to_string(),
                ],
            });
        }

        for stint in &car.stints {
            let stint_label = stint
                .stint_number
                .map(|number| number.to_string())
                .unwrap_or_else(|| "?".to_string());

            if stint.laps.is_empty() {
                issues.push(EdgeCaseIssue {
                    kind: EdgeCaseKind::IncompleteStint,
                    severity: Severity::Minor,
                    description: format!(
                        "car #{car_label} stint {stint_label} has no lap records"
                    ),
                    fallback: "exclude the stint from pace statistics".to_string(),
                    affected_features: vec![
                        "anomaly_detection".to_string(),
                        "stint_timelines".to_string(),
                    ],
                });
            }

            for (index, lap) in stint.laps.iter().enumerate() {
                let Some(time) = lap.lap_time_fuel_corrected_sec else {
                    continue;
                };
                if time <= CORRUPT_LAP_MIN_SEC || time >= CORRUPT_LAP_MAX_SEC {
                    issues.push(EdgeCaseIssue {
                        kind: EdgeCaseKind::DataCorruption,
                        severity: Severity::Moderate,
                        description: format!(
                            "car #{car_label} stint {stint_label} lap {} has a corrupted time ({time:.1}s)",
                            index + 1
                        ),
                        fallback: "drop the lap from statistics and keep the rest of the stint"
                            .to_string(),
                        affected_features: vec![
                            "anomaly_detection".to_string(),
                            "stint_timelines".to_string(),
                        ],
                    });
                }
            }
        }

        issues.extend(orphaned_changes(car, &car_label));
    }

    for entry in &analysis.fastest_by_car_number {
        let missing: Vec<&str> = [
            ("S1", entry.best_s1.is_none()),
            ("S2", entry.best_s2.is_none()),
            ("S3", entry.best_s3.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            let car_label = entry
                .car_number
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            issues.push(EdgeCaseIssue {
                kind: EdgeCaseKind::MissingSectors,
                severity: Severity::Minor,
                description: format!(
                    "car #{car_label} fastest-lap entry is missing sector bests: {}",
                    missing.join(", ")
                ),
                fallback: "emit sector events only for the populated sectors".to_string(),
                affected_features: vec!["fastest_sectors".to_string()],
            });
        }
    }

    issues
}

// A driver change whose lap matches no pit-stop entry lap cannot be placed
// inside a stop window.
fn orphaned_changes(car: &CarStrategy, car_label: &str) -> Vec<EdgeCaseIssue> {
    let pit_laps: Vec<u32> = car
        .pit_stop_details
        .iter()
        .filter_map(|stop| stop.lap_number_entry)
        .chain(car.pit_stops.iter().filter_map(|stop| stop.lap))
        .collect();

    car.driver_changes
        .iter()
        .filter_map(|change| {
            let lap = change.lap?;
            if pit_laps.contains(&lap) {
                return None;
            }
            Some(EdgeCaseIssue {
                kind: EdgeCaseKind::OrphanedChange,
                severity: Severity::Minor,
                description: format!(
                    "car #{car_label} driver change at lap {lap} matches no pit-stop entry lap"
                ),
                fallback: "keep the change event but mark its lap as unverified".to_string(),
                affected_features: vec!["driver_changes".to_string()],
            })
        })
        .collect()
}
