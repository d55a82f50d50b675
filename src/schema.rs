use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// The two export shapes seen in the wild share `race_strategy_by_car`; the
// comprehensive shape additionally carries enhanced analysis and both
// fastest-lap sections. Everything is optional so a partial or malformed
// document decodes to empty sections instead of failing outright.

#[derive(Debug, Clone, Default)]
pub struct RaceAnalysis {
    pub race_strategy_by_car: Vec<CarStrategy>,
    pub enhanced_strategy_analysis: Vec<CarEnhanced>,
    pub fastest_by_car_number: Vec<CarFastest>,
    pub fastest_by_manufacturer: Vec<ManufacturerFastest>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CarStrategy {
    #[serde(deserialize_with = "de_identifier")]
    pub car_number: Option<String>,
    pub driver: Option<String>,
    pub team: Option<String>,
    pub manufacturer: Option<String>,
    // Simple-format only; the comprehensive export has no grid field.
    pub grid_position: Option<u32>,
    pub stints: Vec<Stint>,
    pub pit_stop_details: Vec<PitStopDetail>,
    pub pit_stops: Vec<SimplePitStop>,
    pub driver_changes: Vec<DriverChange>,
    pub total_pit_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Stint {
    pub stint_number: Option<u32>,
    pub lap_range: Option<String>,
    pub laps: Vec<StintLap>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StintLap {
    pub lap_in_stint: Option<u32>,
    pub lap_time: Option<String>,
    pub lap_time_fuel_corrected_sec: Option<f64>,
    pub flag: Option<String>,
}

impl StintLap {
    pub fn is_green(&self) -> bool {
        match self.flag.as_deref() {
            None => true,
            Some(flag) => flag.eq_ignore_ascii_case("green") || flag.eq_ignore_ascii_case("gf"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PitStopDetail {
    pub lap_number_entry: Option<u32>,
    pub lap_number_exit: Option<u32>,
    pub pit_time: Option<String>,
    pub stationary_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SimplePitStop {
    pub lap: Option<u32>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DriverChange {
    pub lap: Option<u32>,
    pub from_driver: Option<String>,
    pub to_driver: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CarFastest {
    #[serde(deserialize_with = "de_identifier")]
    pub car_number: Option<String>,
    pub driver: Option<String>,
    pub team: Option<String>,
    pub manufacturer: Option<String>,
    pub fastest_lap: Option<LapMark>,
    pub best_s1: Option<LapMark>,
    pub best_s2: Option<LapMark>,
    pub best_s3: Option<LapMark>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LapMark {
    pub time: Option<String>,
    pub lap: Option<u32>,
    pub driver: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ManufacturerFastest {
    pub manufacturer: Option<String>,
    #[serde(deserialize_with = "de_identifier")]
    pub car_number: Option<String>,
    pub driver: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CarEnhanced {
    #[serde(deserialize_with = "de_identifier")]
    pub car_number: Option<String>,
    pub drivers: Vec<String>,
    pub fastest_lap: Option<LapMark>,
    pub avg_green_pace_fuel_corrected_sec: Option<f64>,
    pub consistency_sec: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct InsightsDocument {
    pub executive_summary: Option<String>,
    pub marketing_angles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SocialDocument {
    pub posts: Vec<SocialPost>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SocialPost {
    pub text: Option<String>,
}

// Upstream pipelines emit car numbers as either strings or bare numbers.
fn de_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    Comprehensive,
    Simple,
    Unknown,
}

impl DataFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::Simple => "simple",
            Self::Unknown => "unknown",
        }
    }
}

// Closed classification of an input document, produced once and consumed by
// the extractors via exhaustive matching. `Unknown` still carries whatever
// sections decoded so best-effort extraction stays possible.
#[derive(Debug, Clone)]
pub enum RaceDocumentVariant {
    Comprehensive(RaceAnalysis),
    Simple(RaceAnalysis),
    Unknown(RaceAnalysis),
}

impl RaceDocumentVariant {
    pub fn format(&self) -> DataFormat {
        match self {
            Self::Comprehensive(_) => DataFormat::Comprehensive,
            Self::Simple(_) => DataFormat::Simple,
            Self::Unknown(_) => DataFormat::Unknown,
        }
    }

    pub fn analysis(&self) -> &RaceAnalysis {
        match self {
            Self::Comprehensive(analysis) | Self::Simple(analysis) | Self::Unknown(analysis) => {
                analysis
            }
        }
    }
}

// Key sections individually recognized during a best-effort partial scan of
// an unknown-format document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PartialSections {
    pub strategy: bool,
    pub enhanced_analysis: bool,
    pub fastest_laps: bool,
}

impl PartialSections {
    pub fn any(&self) -> bool {
        self.strategy || self.enhanced_analysis || self.fastest_laps
    }
}

fn has_section(value: &Value, key: &str) -> bool {
    value
        .get(key)
        .is_some_and(|section| !section.is_null())
}

pub fn classify_value(value: &Value) -> DataFormat {
    if !value.is_object() {
        return DataFormat::Unknown;
    }

    let strategy = has_section(value, "race_strategy_by_car");
    let enhanced = has_section(value, "enhanced_strategy_analysis");
    let fastest_car = has_section(value, "fastest_by_car_number");
    let fastest_manufacturer = has_section(value, "fastest_by_manufacturer");

    if strategy && enhanced && fastest_car && fastest_manufacturer {
        DataFormat::Comprehensive
    } else if strategy && (fastest_car || enhanced) {
        DataFormat::Simple
    } else {
        DataFormat::Unknown
    }
}

pub fn partial_sections(value: &Value) -> PartialSections {
    PartialSections {
        strategy: has_section(value, "race_strategy_by_car"),
        enhanced_analysis: has_section(value, "enhanced_strategy_analysis"),
        fastest_laps: has_section(value, "fastest_by_car_number"),
    }
}

// Decode is deliberately lossy: a section or record that fails to decode is
// dropped rather than sinking the document.
fn decode_section<T: serde::de::DeserializeOwned>(value: &Value, key: &str) -> Vec<T> {
    match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        _ => Vec::new(),
    }
}

pub fn decode_analysis(value: &Value) -> RaceAnalysis {
    RaceAnalysis {
        race_strategy_by_car: decode_section(value, "race_strategy_by_car"),
        enhanced_strategy_analysis: decode_section(value, "enhanced_strategy_analysis"),
        fastest_by_car_number: decode_section(value, "fastest_by_car_number"),
        fastest_by_manufacturer: decode_section(value, "fastest_by_manufacturer"),
    }
}

pub fn classify_document(value: &Value) -> RaceDocumentVariant {
    let analysis = decode_analysis(value);
    match classify_value(value) {
        DataFormat::Comprehensive => RaceDocumentVariant::Comprehensive(analysis),
        DataFormat::Simple => RaceDocumentVariant::Simple(analysis),
        DataFormat::Unknown => RaceDocumentVariant::Unknown(analysis),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{DataFormat, PartialSections, classify_document, classify_value, partial_sections};

    fn comprehensive_value() -> Value {
        json!({
            "race_strategy_by_car": [{"car_number": "7", "stints": []}],
            "enhanced_strategy_analysis": [{"car_number": "7"}],
            "fastest_by_car_number": [{"car_number": "7"}],
            "fastest_by_manufacturer": [{"manufacturer": "Porsche"}]
        })
    }

    #[test]
    fn classify_requires_all_four_sections_for_comprehensive() {
        assert_eq!(classify_value(&comprehensive_value()), DataFormat::Comprehensive);

        let mut missing_one = comprehensive_value();
        missing_one
            .as_object_mut()
            .expect("fixture is an object")
            .remove("fastest_by_manufacturer");
        assert_eq!(classify_value(&missing_one), DataFormat::Simple);
    }

    #[test]
    fn classify_accepts_strategy_plus_one_companion_as_simple() {
        let doc = json!({
            "race_strategy_by_car": [],
            "fastest_by_car_number": []
        });
        assert_eq!(classify_value(&doc), DataFormat::Simple);

        let doc = json!({
            "race_strategy_by_car": [],
            "enhanced_strategy_analysis": []
        });
        assert_eq!(classify_value(&doc), DataFormat::Simple);
    }

    #[test]
    fn classify_never_fails_on_null_or_non_object_input() {
        assert_eq!(classify_value(&Value::Null), DataFormat::Unknown);
        assert_eq!(classify_value(&json!([1, 2, 3])), DataFormat::Unknown);
        assert_eq!(classify_value(&json!("race")), DataFormat::Unknown);
        assert_eq!(classify_value(&json!({"laps": 3})), DataFormat::Unknown);
    }

    #[test]
    fn classify_document_carries_decoded_sections_into_the_variant() {
        let variant = classify_document(&comprehensive_value());
        assert_eq!(variant.format(), DataFormat::Comprehensive);
        assert_eq!(variant.analysis().race_strategy_by_car.len(), 1);
        assert_eq!(
            variant.analysis().race_strategy_by_car[0].car_number.as_deref(),
            Some("7")
        );
    }

    #[test]
    fn numeric_car_numbers_decode_as_strings() {
        let doc = json!({
            "race_strategy_by_car": [{"car_number": 44}],
            "fastest_by_car_number": [{"car_number": 44}]
        });
        let variant = classify_document(&doc);
        assert_eq!(
            variant.analysis().race_strategy_by_car[0].car_number.as_deref(),
            Some("44")
        );
    }

    #[test]
    fn corrupt_sections_decode_to_empty_defaults() {
        let doc = json!({
            "race_strategy_by_car": "not-an-array",
            "fastest_by_car_number": [{"car_number": "7"}]
        });
        let variant = classify_document(&doc);
        assert!(variant.analysis().race_strategy_by_car.is_empty());
        assert_eq!(variant.analysis().fastest_by_car_number.len(), 1);
    }

    #[test]
    fn partial_scan_reports_individually_recognized_sections() {
        let doc = json!({"enhanced_strategy_analysis": []});
        let sections = partial_sections(&doc);
        assert!(!sections.strategy);
        assert!(sections.enhanced_analysis);
        assert!(!sections.fastest_laps);
        assert!(sections.any());

        let empty: PartialSections = partial_sections(&Value::Null);
        assert!(!empty.any());
    }
}
