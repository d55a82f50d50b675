use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::DataFormat;

pub const UNKNOWN_MANUFACTURER: &str = "Unknown";
pub const UNKNOWN_DRIVER: &str = "Unknown Driver";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    RaceStart,
    PitStop,
    DriverChange,
    FastestLap,
    FastestSector,
    AnomalousLap,
}

impl EventCategory {
    // Fixed rank used to break ties between events on the same lap.
    pub fn priority(self) -> u8 {
        match self {
            Self::RaceStart => 1,
            Self::PitStop => 2,
            Self::DriverChange => 3,
            Self::FastestLap => 4,
            Self::FastestSector => 5,
            Self::AnomalousLap => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RaceStart => "race_start",
            Self::PitStop => "pit_stop",
            Self::DriverChange => "driver_change",
            Self::FastestLap => "fastest_lap",
            Self::FastestSector => "fastest_sector",
            Self::AnomalousLap => "anomalous_lap",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub lap: u32,
    pub category: EventCategory,
    pub car_number: String,
    pub driver: String,
    pub team: String,
    pub manufacturer: String,
    pub description: String,
    pub time: Option<String>,
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureAvailability {
    pub race_start: bool,
    pub pit_stops: bool,
    pub driver_changes: bool,
    pub fastest_laps: bool,
    pub fastest_sectors: bool,
    pub anomalies: bool,
    pub enhanced_analysis: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Minor,
    Moderate,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeCaseKind {
    DnsDnf,
    IncompleteStint,
    OrphanedChange,
    MissingSectors,
    DataCorruption,
}

impl EdgeCaseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DnsDnf => "dns_dnf",
            Self::IncompleteStint => "incomplete_stint",
            Self::OrphanedChange => "orphaned_change",
            Self::MissingSectors => "missing_sectors",
            Self::DataCorruption => "data_corruption",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeCaseIssue {
    pub kind: EdgeCaseKind,
    pub severity: Severity,
    pub description: String,
    pub fallback: String,
    pub affected_features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub data_format: DataFormat,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub available_features: Vec<String>,
    pub completeness: u32,
    pub severity: Severity,
    pub quality: Quality,
    pub can_proceed: bool,
    pub edge_cases: Vec<EdgeCaseIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Car,
    Driver,
    Manufacturer,
    Team,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRelationship {
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    pub identifier: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefEntity {
    pub kind: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReference {
    pub source: RefEntity,
    pub target: RefEntity,
    pub relationship: DataRelationship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetSource {
    Preloaded,
    Uploaded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub display_name: String,
    pub source: DatasetSource,
    pub created_at: String,
    pub updated_at: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetFile {
    pub filename: String,
    pub size_bytes: u64,
    // Computed for uploads; existence probes of preloaded files skip hashing.
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetFiles {
    pub race_analysis: Option<DatasetFile>,
    pub insights: Option<DatasetFile>,
    pub social: Option<DatasetFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub metadata: DatasetMetadata,
    pub files: DatasetFiles,
}

impl Dataset {
    // A dataset is usable once the race-analysis slot is populated; insights
    // and social are optional enhancements.
    pub fn is_complete(&self) -> bool {
        self.files.race_analysis.is_some()
    }
}
