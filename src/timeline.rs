use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value, json};

use crate::anomaly::detect_stint_anomalies;
use crate::model::{EventCategory, TimelineEvent, UNKNOWN_DRIVER, UNKNOWN_MANUFACTURER};
use crate::schema::{CarFastest, CarStrategy, LapMark, RaceAnalysis, RaceDocumentVariant};
use crate::util::format_lap_time;

// Driver attribution for comprehensive pit stops needs stint-boundary
// reasoning that this layer does not implement; the placeholder is a known
// limitation carried through from the upstream exports.
pub const PIT_DRIVER_PLACEHOLDER: &str = "Driver TBD";

// Ordered resolution tiers for the driver on the grid at lap zero. Kept as a
// named enum so each tier can be exercised independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDriverTier {
    FirstChangeFromDriver,
    FastestLapDriver,
    StrategyDriver,
    Sentinel,
}

impl StartDriverTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstChangeFromDriver => "first_change_from_driver",
            Self::FastestLapDriver => "fastest_lap_driver",
            Self::StrategyDriver => "strategy_driver",
            Self::Sentinel => "sentinel",
        }
    }
}

pub fn resolve_start_driver(
    car: &CarStrategy,
    fastest: Option<&CarFastest>,
) -> (String, StartDriverTier) {
    if let Some(from) = car
        .driver_changes
        .first()
        .and_then(|change| change.from_driver.clone())
    {
        return (from, StartDriverTier::FirstChangeFromDriver);
    }

    if let Some(driver) = fastest.and_then(|entry| entry.driver.clone()) {
        return (driver, StartDriverTier::FastestLapDriver);
    }

    if let Some(driver) = car.driver.clone() {
        return (driver, StartDriverTier::StrategyDriver);
    }

    (UNKNOWN_DRIVER.to_string(), StartDriverTier::Sentinel)
}

fn fastest_entry<'a>(analysis: &'a RaceAnalysis, car_number: &str) -> Option<&'a CarFastest> {
    analysis
        .fastest_by_car_number
        .iter()
        .find(|entry| entry.car_number.as_deref() == Some(car_number))
}

fn car_team(car: Option<&CarStrategy>, fastest: Option<&CarFastest>) -> String {
    car.and_then(|entry| entry.team.clone())
        .or_else(|| fastest.and_then(|entry| entry.team.clone()))
        .unwrap_or_default()
}

fn car_manufacturer(car: Option<&CarStrategy>, fastest: Option<&CarFastest>) -> String {
    car.and_then(|entry| entry.manufacturer.clone())
        .or_else(|| fastest.and_then(|entry| entry.manufacturer.clone()))
        .unwrap_or_else(|| UNKNOWN_MANUFACTURER.to_string())
}

pub fn extract_race_start_events(variant: &RaceDocumentVariant) -> Vec<TimelineEvent> {
    let analysis = variant.analysis();
    let mut events = Vec::new();

    if !analysis.race_strategy_by_car.is_empty() {
        for car in &analysis.race_strategy_by_car {
            let Some(car_number) = car.car_number.clone() else {
                continue;
            };
            let fastest = fastest_entry(analysis, &car_number);
            let (driver, tier) = resolve_start_driver(car, fastest);

            let mut details = Map::new();
            details.insert("resolvedBy".to_string(), json!(tier.as_str()));
            // Only the simple export carries a grid field.
            details.insert("gridPosition".to_string(), json!(car.grid_position));

            events.push(TimelineEvent {
                id: format!("race_start-{car_number}-0"),
                lap: 0,
                category: EventCategory::RaceStart,
                car_number: car_number.clone(),
                driver: driver.clone(),
                team: car_team(Some(car), fastest),
                manufacturer: car_manufacturer(Some(car), fastest),
                description: format!("Race start: {driver} in car #{car_number}"),
                time: None,
                details,
            });
        }
    } else {
        // No strategy section; enumerate cars from the fastest-lap section.
        for entry in &analysis.fastest_by_car_number {
            let Some(car_number) = entry.car_number.clone() else {
                continue;
            };
            let (driver, tier) = match entry.driver.clone() {
                Some(driver) => (driver, StartDriverTier::FastestLapDriver),
                None => (UNKNOWN_DRIVER.to_string(), StartDriverTier::Sentinel),
            };

            let mut details = Map::new();
            details.insert("resolvedBy".to_string(), json!(tier.as_str()));
            details.insert("gridPosition".to_string(), Value::Null);

            events.push(TimelineEvent {
                id: format!("race_start-{car_number}-0"),
                lap: 0,
                category: EventCategory::RaceStart,
                car_number: car_number.clone(),
                driver: driver.clone(),
                team: car_team(None, Some(entry)),
                manufacturer: car_manufacturer(None, Some(entry)),
                description: format!("Race start: {driver} in car #{car_number}"),
                time: None,
                details,
            });
        }
    }

    events
}

pub fn extract_pit_stop_events(variant: &RaceDocumentVariant) -> Vec<TimelineEvent> {
    let analysis = variant.analysis();
    let mut events = Vec::new();

    for car in &analysis.race_strategy_by_car {
        let Some(car_number) = car.car_number.clone() else {
            continue;
        };
        let fastest = fastest_entry(analysis, &car_number);
        let team = car_team(Some(car), fastest);
        let manufacturer = car_manufacturer(Some(car), fastest);

        if !car.pit_stop_details.is_empty() {
            // Comprehensive shape: rich per-stop records, driver unresolved.
            for (index, stop) in car.pit_stop_details.iter().enumerate() {
                let lap = stop.lap_number_entry.unwrap_or(0);
                let sequence = index + 1;

                let mut details = Map::new();
                details.insert("sequence".to_string(), json!(sequence));
                details.insert("lapExit".to_string(), json!(stop.lap_number_exit));
                details.insert("stationaryTime".to_string(), json!(stop.stationary_time));

                events.push(TimelineEvent {
                    id: format!("pit_stop-{car_number}-{lap}-{sequence}"),
                    lap,
                    category: EventCategory::PitStop,
                    car_number: car_number.clone(),
                    driver: PIT_DRIVER_PLACEHOLDER.to_string(),
                    team: team.clone(),
                    manufacturer: manufacturer.clone(),
                    description: format!("Pit stop {sequence} at lap {lap}"),
                    time: stop.pit_time.clone(),
                    details,
                });
            }
        } else {
            for (index, stop) in car.pit_stops.iter().enumerate() {
                let lap = stop.lap.unwrap_or(0);
                let sequence = index + 1;
                let driver = car
                    .driver
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_DRIVER.to_string());

                let mut details = Map::new();
                details.insert("sequence".to_string(), json!(sequence));

                events.push(TimelineEvent {
                    id: format!("pit_stop-{car_number}-{lap}-{sequence}"),
                    lap,
                    category: EventCategory::PitStop,
                    car_number: car_number.clone(),
                    driver,
                    team: team.clone(),
                    manufacturer: manufacturer.clone(),
                    description: format!("Pit stop {sequence} at lap {lap}"),
                    time: stop.time.clone(),
                    details,
                });
            }
        }
    }

    events.sort_by_key(|event| event.lap);
    events
}

pub fn extract_driver_change_events(variant: &RaceDocumentVariant) -> Vec<TimelineEvent> {
    let analysis = match variant {
        // The simple export has no driver-change records at all.
        RaceDocumentVariant::Simple(_) => return Vec::new(),
        RaceDocumentVariant::Comprehensive(analysis) | RaceDocumentVariant::Unknown(analysis) => {
            analysis
        }
    };

    let mut events = Vec::new();
    for car in &analysis.race_strategy_by_car {
        let Some(car_number) = car.car_number.clone() else {
            continue;
        };
        let fastest = fastest_entry(analysis, &car_number);

        for (index, change) in car.driver_changes.iter().enumerate() {
            let lap = change.lap.unwrap_or(0);
            let from = change
                .from_driver
                .clone()
                .unwrap_or_else(|| UNKNOWN_DRIVER.to_string());
            let to = change
                .to_driver
                .clone()
                .unwrap_or_else(|| UNKNOWN_DRIVER.to_string());

            let mut details = Map::new();
            details.insert("fromDriver".to_string(), json!(from));
            details.insert("toDriver".to_string(), json!(to));
            details.insert("sequence".to_string(), json!(index + 1));

            events.push(TimelineEvent {
                id: format!("driver_change-{car_number}-{lap}-{}", index + 1),
                lap,
                category: EventCategory::DriverChange,
                car_number: car_number.clone(),
                driver: to.clone(),
                team: car_team(Some(car), fastest),
                manufacturer: car_manufacturer(Some(car), fastest),
                description: format!("Driver change: {from} to {to}"),
                time: None,
                details,
            });
        }
    }

    events.sort_by_key(|event| event.lap);
    events
}

pub fn extract_fastest_lap_events(variant: &RaceDocumentVariant) -> Vec<TimelineEvent> {
    let analysis = variant.analysis();

    // The comprehensive export ranks fastest laps per driver in the enhanced
    // section; prefer the earliest lap per driver from there.
    let prefer_enhanced = matches!(variant, RaceDocumentVariant::Comprehensive(_))
        && analysis
            .enhanced_strategy_analysis
            .iter()
            .any(|entry| entry.fastest_lap.is_some());

    let mut events = if prefer_enhanced {
        fastest_laps_from_enhanced(analysis)
    } else {
        fastest_laps_per_car(analysis)
    };

    events.sort_by_key(|event| event.lap);
    events
}

fn fastest_laps_from_enhanced(analysis: &RaceAnalysis) -> Vec<TimelineEvent> {
    let mut earliest_by_driver: HashMap<String, (String, LapMark)> = HashMap::new();

    for entry in &analysis.enhanced_strategy_analysis {
        let (Some(car_number), Some(mark)) = (entry.car_number.clone(), entry.fastest_lap.clone())
        else {
            continue;
        };
        let Some(driver) = mark.driver.clone() else {
            continue;
        };
        let lap = mark.lap.unwrap_or(u32::MAX);

        match earliest_by_driver.get(&driver) {
            Some((_, existing)) if existing.lap.unwrap_or(u32::MAX) <= lap => {}
            _ => {
                earliest_by_driver.insert(driver, (car_number, mark));
            }
        }
    }

    let mut entries: Vec<(String, (String, LapMark))> = earliest_by_driver.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    entries
        .into_iter()
        .map(|(driver, (car_number, mark))| {
            let lap = mark.lap.unwrap_or(0);
            let fastest = fastest_entry(analysis, &car_number);
            let strategy = analysis
                .race_strategy_by_car
                .iter()
                .find(|car| car.car_number.as_deref() == Some(car_number.as_str()));

            let mut details = Map::new();
            details.insert("source".to_string(), json!("enhanced_ranking"));

            TimelineEvent {
                id: format!("fastest_lap-{car_number}-{lap}"),
                lap,
                category: EventCategory::FastestLap,
                car_number,
                driver: driver.clone(),
                team: car_team(strategy, fastest),
                manufacturer: car_manufacturer(strategy, fastest),
                description: format!("Fastest lap by {driver}"),
                time: mark.time,
                details,
            }
        })
        .collect()
}

fn fastest_laps_per_car(analysis: &RaceAnalysis) -> Vec<TimelineEvent> {
    let mut events = Vec::new();

    for entry in &analysis.fastest_by_car_number {
        let (Some(car_number), Some(mark)) = (entry.car_number.clone(), entry.fastest_lap.clone())
        else {
            continue;
        };
        let lap = mark.lap.unwrap_or(0);
        let driver = mark
            .driver
            .clone()
            .or_else(|| entry.driver.clone())
            .unwrap_or_else(|| UNKNOWN_DRIVER.to_string());
        let strategy = analysis
            .race_strategy_by_car
            .iter()
            .find(|car| car.car_number.as_deref() == Some(car_number.as_str()));

        let mut details = Map::new();
        details.insert("source".to_string(), json!("per_car"));

        events.push(TimelineEvent {
            id: format!("fastest_lap-{car_number}-{lap}"),
            lap,
            category: EventCategory::FastestLap,
            car_number: car_number.clone(),
            driver: driver.clone(),
            team: car_team(strategy, Some(entry)),
            manufacturer: car_manufacturer(strategy, Some(entry)),
            description: format!("Fastest lap by {driver}"),
            time: mark.time,
            details,
        });
    }

    events
}

pub fn extract_fastest_sector_events(variant: &RaceDocumentVariant) -> Vec<TimelineEvent> {
    let analysis = match variant {
        // The simple export has no structured sector bests.
        RaceDocumentVariant::Simple(_) => return Vec::new(),
        RaceDocumentVariant::Comprehensive(analysis) | RaceDocumentVariant::Unknown(analysis) => {
            analysis
        }
    };

    let mut events = Vec::new();
    for entry in &analysis.fastest_by_car_number {
        let Some(car_number) = entry.car_number.clone() else {
            continue;
        };
        let driver = entry
            .driver
            .clone()
            .unwrap_or_else(|| UNKNOWN_DRIVER.to_string());
        let sectors = [(1u8, &entry.best_s1), (2, &entry.best_s2), (3, &entry.best_s3)];

        for (sector, mark) in sectors {
            let Some(mark) = mark else {
                continue;
            };
            let lap = mark.lap.unwrap_or(0);

            let mut details = Map::new();
            details.insert("sector".to_string(), json!(sector));

            events.push(TimelineEvent {
                id: format!("fastest_sector-{car_number}-{lap}-s{sector}"),
                lap,
                category: EventCategory::FastestSector,
                car_number: car_number.clone(),
                driver: driver.clone(),
                team: car_team(None, Some(entry)),
                manufacturer: car_manufacturer(None, Some(entry)),
                description: format!("Fastest S{sector} for car #{car_number}"),
                time: mark.time.clone(),
                details,
            });
        }
    }

    // Stable by lap, so same-lap entries keep S1 -> S2 -> S3 order.
    events.sort_by_key(|event| event.lap);
    events
}

pub fn extract_anomalous_lap_events(
    variant: &RaceDocumentVariant,
    threshold_pct: f64,
) -> Vec<TimelineEvent> {
    let analysis = variant.analysis();
    let mut events = Vec::new();

    for car in &analysis.race_strategy_by_car {
        let Some(car_number) = car.car_number.clone() else {
            continue;
        };
        let fastest = fastest_entry(analysis, &car_number);
        let driver = car
            .driver
            .clone()
            .or_else(|| fastest.and_then(|entry| entry.driver.clone()))
            .unwrap_or_else(|| UNKNOWN_DRIVER.to_string());
        let team = car_team(Some(car), fastest);
        let manufacturer = car_manufacturer(Some(car), fastest);

        for (stint_index, stint) in car.stints.iter().enumerate() {
            // Positional ordinal, not the recorded stint number: two stints
            // can resolve an anomaly to the same race lap (e.g. when one
            // falls back to 1-based indexing), and the id must stay unique.
            let stint_ordinal = stint_index + 1;
            for (index, anomaly) in detect_stint_anomalies(stint, threshold_pct)
                .into_iter()
                .enumerate()
            {
                let mut details = Map::new();
                details.insert("stintNumber".to_string(), json!(stint.stint_number));
                details.insert("cause".to_string(), json!(anomaly.cause.as_str()));
                details.insert(
                    "deviationPct".to_string(),
                    json!((anomaly.deviation_pct * 10.0).round() / 10.0),
                );
                details.insert("medianSec".to_string(), json!(anomaly.median_sec));
                details.insert("thresholdPct".to_string(), json!(threshold_pct));
                details.insert("flaggedStint".to_string(), json!(anomaly.flagged_stint));

                events.push(TimelineEvent {
                    id: format!(
                        "anomalous_lap-{car_number}-{}-st{stint_ordinal}-{}",
                        anomaly.race_lap,
                        index + 1
                    ),
                    lap: anomaly.race_lap,
                    category: EventCategory::AnomalousLap,
                    car_number: car_number.clone(),
                    driver: driver.clone(),
                    team: team.clone(),
                    manufacturer: manufacturer.clone(),
                    description: format!(
                        "Anomalous lap: +{:.1}% vs stint median ({})",
                        anomaly.deviation_pct,
                        anomaly.cause.as_str()
                    ),
                    time: Some(format_lap_time(anomaly.time_sec)),
                    details,
                });
            }
        }
    }

    events.sort_by_key(|event| event.lap);
    events
}

pub fn extract_all_events_with_threshold(
    variant: &RaceDocumentVariant,
    threshold_pct: f64,
) -> Vec<TimelineEvent> {
    let mut events = Vec::new();
    events.extend(extract_race_start_events(variant));
    events.extend(extract_pit_stop_events(variant));
    events.extend(extract_driver_change_events(variant));
    events.extend(extract_fastest_lap_events(variant));
    events.extend(extract_fastest_sector_events(variant));
    events.extend(extract_anomalous_lap_events(variant, threshold_pct));

    let mut seen = HashSet::new();
    events.retain(|event| seen.insert(event.id.clone()));

    // Stable sort preserves each extractor's deterministic inner ordering.
    events.sort_by_key(|event| (event.lap, event.category.priority()));
    events
}

pub fn extract_all_events_for_car(
    variant: &RaceDocumentVariant,
    car_number: &str,
    threshold_pct: f64,
) -> Vec<TimelineEvent> {
    let mut events = extract_all_events_with_threshold(variant, threshold_pct);
    events.retain(|event| event.car_number == car_number);
    events
}
