use serde::{Deserialize, Serialize};

use crate::schema::Stint;

// Laps outside this envelope are structurally corrupted and excluded from the
// baseline. The edge-case auditor applies a wider bound on purpose; the two
// thresholds are distinct, named constants rather than one shared value.
pub const CLEAN_LAP_MIN_SEC: f64 = 0.0;
pub const CLEAN_LAP_MAX_SEC: f64 = 200.0;
pub const MIN_CLEAN_LAP_SAMPLE: usize = 3;
pub const DEFAULT_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyCause {
    Mistake,
    Traffic,
    PaceDrop,
    Overtaken,
}

impl AnomalyCause {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mistake => "mistake",
            Self::Traffic => "traffic",
            Self::PaceDrop => "pace_drop",
            Self::Overtaken => "overtaken",
        }
    }

    // Coarse heuristic keyed off deviation alone, first match wins. It is a
    // labeling convention, not a measured diagnosis.
    pub fn from_deviation_pct(deviation_pct: f64) -> Self {
        if deviation_pct > 15.0 {
            Self::Mistake
        } else if deviation_pct > 10.0 {
            Self::Traffic
        } else if deviation_pct > 7.0 {
            Self::PaceDrop
        } else {
            Self::Overtaken
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LapAnomaly {
    pub race_lap: u32,
    pub time_sec: f64,
    pub median_sec: f64,
    pub deviation_pct: f64,
    pub cause: AnomalyCause,
    pub flagged_stint: bool,
}

// Per-stint scan: build a robust baseline from clean laps, then flag every
// lap in the full list that exceeds median * (1 + pct/100).
pub fn detect_stint_anomalies(stint: &Stint, threshold_pct: f64) -> Vec<LapAnomaly> {
    let mut clean: Vec<f64> = stint
        .laps
        .iter()
        .filter_map(|lap| lap.lap_time_fuel_corrected_sec)
        .filter(|time| *time > CLEAN_LAP_MIN_SEC && *time < CLEAN_LAP_MAX_SEC)
        .collect();

    if clean.len() < MIN_CLEAN_LAP_SAMPLE {
        return Vec::new();
    }

    clean.sort_by(|a, b| a.total_cmp(b));
    let median = lower_median(&clean);
    let threshold = median * (1.0 + threshold_pct / 100.0);
    let flagged_stint = stint.laps.iter().any(|lap| !lap.is_green());
    let range_start = stint.lap_range.as_deref().and_then(parse_lap_range_start);

    let mut anomalies = Vec::new();
    for (index, lap) in stint.laps.iter().enumerate() {
        let Some(time) = lap.lap_time_fuel_corrected_sec else {
            continue;
        };
        if time <= threshold {
            continue;
        }

        let race_lap = match range_start {
            Some(start) => start + index as u32,
            None => index as u32 + 1,
        };

        let deviation_pct = (time - median) / median * 100.0;
        anomalies.push(LapAnomaly {
            race_lap,
            time_sec: time,
            median_sec: median,
            deviation_pct,
            cause: AnomalyCause::from_deviation_pct(deviation_pct),
            flagged_stint,
        });
    }

    anomalies
}

// Lower-middle element, no interpolation for even sample sizes.
fn lower_median(sorted: &[f64]) -> f64 {
    sorted[(sorted.len() - 1) / 2]
}

pub fn parse_lap_range_start(range: &str) -> Option<u32> {
    range
        .split('-')
        .next()
        .map(str::trim)
        .and_then(|start| start.parse().ok())
}

#[cfg(test)]
mod tests {
    use crate::schema::{Stint, StintLap};

    use super::{
        AnomalyCause, DEFAULT_THRESHOLD_PCT, detect_stint_anomalies, lower_median,
        parse_lap_range_start,
    };

    fn stint_with_times(lap_range: Option<&str>, times: &[f64]) -> Stint {
        Stint {
            stint_number: Some(1),
            lap_range: lap_range.map(str::to_string),
            laps: times
                .iter()
                .map(|time| StintLap {
                    lap_time_fuel_corrected_sec: Some(*time),
                    ..StintLap::default()
                })
                .collect(),
        }
    }

    #[test]
    fn thirty_percent_outlier_is_flagged_as_a_mistake() {
        let stint = stint_with_times(Some("1-5"), &[100.0, 100.0, 100.0, 100.0, 130.0]);
        let anomalies = detect_stint_anomalies(&stint, DEFAULT_THRESHOLD_PCT);

        assert_eq!(anomalies.len(), 1);
        let anomaly = &anomalies[0];
        assert_eq!(anomaly.median_sec, 100.0);
        assert_eq!(anomaly.race_lap, 5);
        assert!((anomaly.deviation_pct - 30.0).abs() < 1e-9);
        assert_eq!(anomaly.cause, AnomalyCause::Mistake);
        assert!(!anomaly.flagged_stint);
    }

    #[test]
    fn fewer_than_three_clean_laps_skips_the_stint() {
        let stint = stint_with_times(Some("1-4"), &[100.0, 400.0, 250.0, 500.0]);
        assert!(detect_stint_anomalies(&stint, DEFAULT_THRESHOLD_PCT).is_empty());

        let stint = stint_with_times(None, &[100.0, 101.0]);
        assert!(detect_stint_anomalies(&stint, DEFAULT_THRESHOLD_PCT).is_empty());
    }

    #[test]
    fn corrupted_laps_are_excluded_from_the_baseline_but_rescanned() {
        // The 300s lap is outside the clean envelope, so the median comes
        // from the four plausible laps; the rescan still reports it.
        let stint = stint_with_times(Some("10-14"), &[100.0, 100.0, 100.0, 100.0, 300.0]);
        let anomalies = detect_stint_anomalies(&stint, DEFAULT_THRESHOLD_PCT);

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].median_sec, 100.0);
        assert_eq!(anomalies[0].race_lap, 14);
        assert_eq!(anomalies[0].cause, AnomalyCause::Mistake);
    }

    #[test]
    fn cause_tiers_follow_the_first_match_ordering() {
        assert_eq!(AnomalyCause::from_deviation_pct(30.0), AnomalyCause::Mistake);
        assert_eq!(AnomalyCause::from_deviation_pct(12.0), AnomalyCause::Traffic);
        assert_eq!(AnomalyCause::from_deviation_pct(8.0), AnomalyCause::PaceDrop);
        assert_eq!(AnomalyCause::from_deviation_pct(6.0), AnomalyCause::Overtaken);
    }

    #[test]
    fn race_lap_falls_back_to_stint_index_when_the_range_is_unparseable() {
        let stint = stint_with_times(Some("laps?"), &[100.0, 100.0, 100.0, 120.0]);
        let anomalies = detect_stint_anomalies(&stint, DEFAULT_THRESHOLD_PCT);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].race_lap, 4);
    }

    #[test]
    fn flagged_stints_are_still_scanned_and_marked() {
        let mut stint = stint_with_times(Some("1-4"), &[100.0, 100.0, 100.0, 115.0]);
        stint.laps[1].flag = Some("YELLOW".to_string());

        let anomalies = detect_stint_anomalies(&stint, DEFAULT_THRESHOLD_PCT);
        assert_eq!(anomalies.len(), 1);
        assert!(anomalies[0].flagged_stint);
        assert_eq!(anomalies[0].cause, AnomalyCause::Traffic);
    }

    #[test]
    fn lower_median_takes_the_lower_middle_without_interpolation() {
        assert_eq!(lower_median(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(lower_median(&[1.0, 2.0, 3.0, 4.0]), 2.0);
        assert_eq!(lower_median(&[7.0]), 7.0);
    }

    #[test]
    fn lap_range_start_parses_loosely() {
        assert_eq!(parse_lap_range_start("12-25"), Some(12));
        assert_eq!(parse_lap_range_start(" 3 - 9"), Some(3));
        assert_eq!(parse_lap_range_start("whole race"), None);
    }
}
