use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::model::{Dataset, DatasetFile, DatasetFiles, DatasetMetadata, DatasetSource};
use crate::util::{ensure_directory, now_utc_string, sha256_bytes, utc_compact_string};
use crate::validation::validate_race_data_structure;

const DB_SCHEMA_VERSION: &str = "0.1.0";
pub const DB_FILENAME: &str = "pitwall_datasets.sqlite";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSlot {
    RaceAnalysis,
    Insights,
    Social,
}

impl FileSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RaceAnalysis => "race_analysis",
            Self::Insights => "insights",
            Self::Social => "social",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "race_analysis" => Some(Self::RaceAnalysis),
            "insights" => Some(Self::Insights),
            "social" => Some(Self::Social),
            _ => None,
        }
    }
}

// The preloaded catalog is injected at construction instead of living in a
// module-level constant, so deployments can ship their own dataset sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub datasets: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub display_name: String,
    pub directory: PathBuf,
    pub race_file: String,
    #[serde(default)]
    pub insights_file: Option<String>,
    #[serde(default)]
    pub social_file: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct LoadOutcome {
    pub success: bool,
    pub dataset: Option<Dataset>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LoadOutcome {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            dataset: None,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }
}

pub struct DatasetManager {
    catalog: CatalogConfig,
    connection: Connection,
}

impl DatasetManager {
    pub fn open(catalog: CatalogConfig, cache_root: &Path) -> Result<Self> {
        ensure_directory(cache_root)?;
        let db_path = cache_root.join(DB_FILENAME);
        let connection = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self {
            catalog,
            connection,
        })
    }

    #[cfg(test)]
    fn in_memory(catalog: CatalogConfig) -> Self {
        let connection = Connection::open_in_memory().expect("in-memory store opens");
        configure_connection(&connection).expect("store pragmas apply");
        ensure_schema(&connection).expect("store schema applies");
        Self {
            catalog,
            connection,
        }
    }

    pub fn get_all_datasets(&self) -> Result<Vec<Dataset>> {
        let mut datasets = Vec::new();

        for entry in &self.catalog.datasets {
            match probe_catalog_entry(entry) {
                Some(dataset) => datasets.push(dataset),
                None => {
                    warn!(name = %entry.name, "preloaded dataset missing its race-analysis file");
                }
            }
        }

        datasets.extend(self.stored_datasets()?);
        Ok(datasets)
    }

    // I/O and parse failures surface as errors in the outcome, never as a
    // panic or a Rust error; previously stored datasets are untouched.
    pub fn load_dataset(&self, id: &str) -> LoadOutcome {
        if let Some(name) = id.strip_prefix("preloaded_") {
            let Some(entry) = self
                .catalog
                .datasets
                .iter()
                .find(|entry| entry.name == name)
            else {
                return LoadOutcome::failure(format!("unknown preloaded dataset: {name}"));
            };
            return self.load_preloaded(entry);
        }

        if id.starts_with("uploaded_") {
            return match self.load_uploaded(id) {
                Ok(outcome) => outcome,
                Err(err) => LoadOutcome::failure(format!("failed to read dataset store: {err}")),
            };
        }

        LoadOutcome::failure(format!("unrecognized dataset id: {id}"))
    }

    // All-or-nothing: any invalid file rejects the whole upload and nothing
    // is persisted.
    pub fn upload_files(
        &self,
        display_name: &str,
        files: &[(FileSlot, UploadFile)],
    ) -> LoadOutcome {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut accepted: Vec<(FileSlot, &UploadFile, Value)> = Vec::new();

        for (slot, file) in files {
            match validate_upload(*slot, file) {
                Ok(value) => accepted.push((*slot, file, value)),
                Err(reason) => errors.push(format!("{}: {reason}", file.filename)),
            }
        }

        if files.is_empty() {
            errors.push("no files supplied".to_string());
        }
        if !errors.is_empty() {
            return LoadOutcome {
                success: false,
                dataset: None,
                errors,
                warnings,
            };
        }

        let has_race = accepted
            .iter()
            .any(|(slot, _, _)| *slot == FileSlot::RaceAnalysis);
        if !has_race {
            warnings.push(
                "no race-analysis file supplied; dataset will be stored incomplete".to_string(),
            );
        }

        let id = format!("uploaded_{}", utc_compact_string(Utc::now()));
        match self.persist_upload(&id, display_name, &accepted) {
            Ok(dataset) => {
                info!(id = %dataset.id, files = accepted.len(), "stored uploaded dataset");
                LoadOutcome {
                    success: true,
                    dataset: Some(dataset),
                    errors,
                    warnings,
                }
            }
            Err(err) => LoadOutcome::failure(format!("failed to persist upload: {err}")),
        }
    }

    // Preloaded datasets are immutable; deleting one is always refused.
    pub fn delete_dataset(&self, id: &str) -> Result<bool> {
        if id.starts_with("preloaded_") {
            return Ok(false);
        }

        self.connection
            .execute("DELETE FROM dataset_files WHERE dataset_id = ?1", [id])
            .context("failed to delete dataset files")?;
        let removed = self
            .connection
            .execute("DELETE FROM datasets WHERE dataset_id = ?1", [id])
            .context("failed to delete dataset row")?;

        Ok(removed > 0)
    }

    fn load_preloaded(&self, entry: &CatalogEntry) -> LoadOutcome {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut files = DatasetFiles::default();

        let race_path = entry.directory.join(&entry.race_file);
        match read_json_file(&race_path) {
            Ok((value, file)) => {
                let report = validate_race_data_structure(&value);
                if !report.can_proceed {
                    errors.extend(report.errors);
                } else {
                    warnings.extend(report.warnings);
                }
                files.race_analysis = Some(file);
            }
            Err(err) => errors.push(format!("{}: {err}", entry.race_file)),
        }

        for (slot, filename) in [
            (FileSlot::Insights, entry.insights_file.as_ref()),
            (FileSlot::Social, entry.social_file.as_ref()),
        ] {
            let Some(filename) = filename else {
                continue;
            };
            let path = entry.directory.join(filename);
            if !path.exists() {
                continue;
            }
            match read_json_file(&path) {
                Ok((value, file)) => {
                    if let Err(reason) = check_content_markers(slot, &value) {
                        warnings.push(format!("{filename}: {reason}"));
                    }
                    match slot {
                        FileSlot::Insights => files.insights = Some(file),
                        FileSlot::Social => files.social = Some(file),
                        FileSlot::RaceAnalysis => {}
                    }
                }
                Err(err) => warnings.push(format!("{filename}: {err}")),
            }
        }

        let success = errors.is_empty() && files.race_analysis.is_some();
        let dataset = Dataset {
            id: format!("preloaded_{}", entry.name),
            metadata: preloaded_metadata(entry),
            files,
        };

        LoadOutcome {
            success,
            dataset: Some(dataset),
            errors,
            warnings,
        }
    }

    fn load_uploaded(&self, id: &str) -> Result<LoadOutcome> {
        let Some(mut dataset) = self.stored_dataset_row(id)? else {
            return Ok(LoadOutcome::failure(format!("dataset not found: {id}")));
        };

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let mut statement = self.connection.prepare(
            "SELECT slot, filename, size_bytes, sha256, content
             FROM dataset_files WHERE dataset_id = ?1 ORDER BY slot",
        )?;
        let rows = statement.query_map([id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        for row in rows {
            let (slot_label, filename, size_bytes, sha256, content) = row?;
            let Some(slot) = FileSlot::from_label(&slot_label) else {
                warnings.push(format!("{filename}: unknown slot {slot_label}"));
                continue;
            };

            let file = DatasetFile {
                filename: filename.clone(),
                size_bytes: size_bytes.max(0) as u64,
                sha256: Some(sha256),
            };

            match serde_json::from_str::<Value>(&content) {
                Ok(value) => {
                    if slot == FileSlot::RaceAnalysis {
                        let report = validate_race_data_structure(&value);
                        if !report.can_proceed {
                            errors.extend(report.errors);
                        } else {
                            warnings.extend(report.warnings);
                        }
                    } else if let Err(reason) = check_content_markers(slot, &value) {
                        warnings.push(format!("{filename}: {reason}"));
                    }
                }
                Err(err) => errors.push(format!("{filename}: stored content unreadable: {err}")),
            }

            match slot {
                FileSlot::RaceAnalysis => dataset.files.race_analysis = Some(file),
                FileSlot::Insights => dataset.files.insights = Some(file),
                FileSlot::Social => dataset.files.social = Some(file),
            }
        }

        let success = errors.is_empty() && dataset.files.race_analysis.is_some();
        if !success && errors.is_empty() {
            errors.push("dataset has no race-analysis file".to_string());
        }

        Ok(LoadOutcome {
            success,
            dataset: Some(dataset),
            errors,
            warnings,
        })
    }

    fn persist_upload(
        &self,
        id: &str,
        display_name: &str,
        files: &[(FileSlot, &UploadFile, Value)],
    ) -> Result<Dataset> {
        let now = now_utc_string();
        self.connection
            .execute(
                "INSERT INTO datasets(dataset_id, display_name, created_at, updated_at, tags)
                 VALUES(?1, ?2, ?3, ?3, ?4)",
                params![id, display_name, now, "[]"],
            )
            .context("failed to insert dataset row")?;

        let mut dataset_files = DatasetFiles::default();
        for (slot, file, value) in files {
            let content =
                serde_json::to_string(value).context("failed to re-serialize upload content")?;
            let sha256 = sha256_bytes(&file.content);
            self.connection
                .execute(
                    "INSERT INTO dataset_files(dataset_id, slot, filename, size_bytes, sha256, content)
                     VALUES(?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(dataset_id, slot) DO UPDATE SET
                       filename=excluded.filename,
                       size_bytes=excluded.size_bytes,
                       sha256=excluded.sha256,
                       content=excluded.content",
                    params![
                        id,
                        slot.as_str(),
                        file.filename,
                        file.content.len() as i64,
                        sha256,
                        content
                    ],
                )
                .context("failed to insert dataset file row")?;

            let stored = DatasetFile {
                filename: file.filename.clone(),
                size_bytes: file.content.len() as u64,
                sha256: Some(sha256),
            };
            match slot {
                FileSlot::RaceAnalysis => dataset_files.race_analysis = Some(stored),
                FileSlot::Insights => dataset_files.insights = Some(stored),
                FileSlot::Social => dataset_files.social = Some(stored),
            }
        }

        Ok(Dataset {
            id: id.to_string(),
            metadata: DatasetMetadata {
                display_name: display_name.to_string(),
                source: DatasetSource::Uploaded,
                created_at: now.clone(),
                updated_at: now,
                tags: Vec::new(),
            },
            files: dataset_files,
        })
    }

    fn stored_datasets(&self) -> Result<Vec<Dataset>> {
        let mut statement = self
            .connection
            .prepare("SELECT dataset_id FROM datasets ORDER BY created_at")?;
        let ids: Vec<String> = statement
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<_>>()?;

        let mut datasets = Vec::new();
        for id in ids {
            if let Ok(outcome) = self.load_uploaded(&id) {
                if let Some(dataset) = outcome.dataset {
                    datasets.push(dataset);
                }
            }
        }
        Ok(datasets)
    }

    fn stored_dataset_row(&self, id: &str) -> Result<Option<Dataset>> {
        let row = self
            .connection
            .query_row(
                "SELECT display_name, created_at, updated_at, tags
                 FROM datasets WHERE dataset_id = ?1",
                [id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .context("failed to query dataset row")?;

        Ok(row.map(|(display_name, created_at, updated_at, tags)| Dataset {
            id: id.to_string(),
            metadata: DatasetMetadata {
                display_name,
                source: DatasetSource::Uploaded,
                created_at,
                updated_at,
                tags: serde_json::from_str(&tags).unwrap_or_default(),
            },
            files: DatasetFiles::default(),
        }))
    }
}

// Ordered checks: extension and size are rejected before any content
// parsing happens.
pub fn validate_upload(slot: FileSlot, file: &UploadFile) -> std::result::Result<Value, String> {
    if !file.filename.to_lowercase().ends_with(".json") {
        return Err("only .json files are accepted".to_string());
    }
    if file.content.is_empty() {
        return Err("file is empty".to_string());
    }
    if file.content.len() > MAX_UPLOAD_BYTES {
        return Err(format!(
            "file exceeds the {}MB upload limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        ));
    }

    let value: Value = serde_json::from_slice(&file.content)
        .map_err(|err| format!("invalid JSON: {err}"))?;
    check_content_markers(slot, &value)?;
    Ok(value)
}

fn check_content_markers(slot: FileSlot, value: &Value) -> std::result::Result<(), String> {
    match slot {
        FileSlot::RaceAnalysis => {
            let has_cars = ["race_strategy_by_car", "fastest_by_car_number"]
                .iter()
                .any(|key| {
                    value
                        .get(key)
                        .and_then(Value::as_array)
                        .is_some_and(|cars| !cars.is_empty())
                });
            if has_cars {
                Ok(())
            } else {
                Err("race analysis must contain a non-empty car array".to_string())
            }
        }
        FileSlot::Insights => {
            let has_summary = value
                .get("executive_summary")
                .is_some_and(Value::is_string);
            let has_angles = value
                .get("marketing_angles")
                .is_some_and(Value::is_array);
            if has_summary && has_angles {
                Ok(())
            } else {
                Err("insights must contain a summary string and an angles array".to_string())
            }
        }
        FileSlot::Social => {
            let has_posts = value
                .get("posts")
                .and_then(Value::as_array)
                .is_some_and(|posts| !posts.is_empty());
            if has_posts {
                Ok(())
            } else {
                Err("social must contain a non-empty posts array".to_string())
            }
        }
    }
}

fn probe_catalog_entry(entry: &CatalogEntry) -> Option<Dataset> {
    let race_path = entry.directory.join(&entry.race_file);
    if !race_path.exists() {
        return None;
    }

    let mut files = DatasetFiles::default();
    files.race_analysis = probe_file(&race_path);
    if let Some(filename) = &entry.insights_file {
        files.insights = probe_file(&entry.directory.join(filename));
    }
    if let Some(filename) = &entry.social_file {
        files.social = probe_file(&entry.directory.join(filename));
    }

    Some(Dataset {
        id: format!("preloaded_{}", entry.name),
        metadata: preloaded_metadata(entry),
        files,
    })
}

fn probe_file(path: &Path) -> Option<DatasetFile> {
    let metadata = fs::metadata(path).ok()?;
    Some(DatasetFile {
        filename: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size_bytes: metadata.len(),
        sha256: None,
    })
}

fn preloaded_metadata(entry: &CatalogEntry) -> DatasetMetadata {
    DatasetMetadata {
        display_name: entry.display_name.clone(),
        source: DatasetSource::Preloaded,
        created_at: String::new(),
        updated_at: String::new(),
        tags: entry.tags.clone(),
    }
}

fn read_json_file(path: &Path) -> Result<(Value, DatasetFile)> {
    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let file = DatasetFile {
        filename: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size_bytes: raw.len() as u64,
        sha256: Some(sha256_bytes(&raw)),
    };
    Ok((value, file))
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS datasets (
          dataset_id TEXT PRIMARY KEY,
          display_name TEXT NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          tags TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS dataset_files (
          dataset_id TEXT NOT NULL,
          slot TEXT NOT NULL,
          filename TEXT NOT NULL,
          size_bytes INTEGER NOT NULL,
          sha256 TEXT NOT NULL,
          content TEXT NOT NULL,
          PRIMARY KEY(dataset_id, slot),
          FOREIGN KEY(dataset_id) REFERENCES datasets(dataset_id)
        );
        ",
    )?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::util::write_json_pretty;

    use super::{
        CatalogConfig, CatalogEntry, DatasetManager, FileSlot, MAX_UPLOAD_BYTES, UploadFile,
        validate_upload,
    };

    fn upload(filename: &str, content: &[u8]) -> UploadFile {
        UploadFile {
            filename: filename.to_string(),
            content: content.to_vec(),
        }
    }

    fn race_json() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "race_strategy_by_car": [{
                "car_number": "57",
                "driver": "P. Ellis",
                "stints": [{"stint_number": 1, "lap_range": "1-3", "laps": [
                    {"lap_time_fuel_corrected_sec": 100.0},
                    {"lap_time_fuel_corrected_sec": 100.1},
                    {"lap_time_fuel_corrected_sec": 100.2}
                ]}]
            }],
            "fastest_by_car_number": [{"car_number": "57", "fastest_lap": {"time": "1:40.0", "lap": 2}}]
        }))
        .expect("race fixture serializes")
    }

    #[test]
    fn non_json_extension_is_rejected_before_content_parsing() {
        // Content is not even valid UTF-8; the extension check must fire first.
        let result = validate_upload(FileSlot::RaceAnalysis, &upload("race.txt", &[0xFF, 0xFE]));
        assert_eq!(result.unwrap_err(), "only .json files are accepted");
    }

    #[test]
    fn empty_json_file_is_rejected_as_empty() {
        let result = validate_upload(FileSlot::RaceAnalysis, &upload("race.json", b""));
        assert_eq!(result.unwrap_err(), "file is empty");
    }

    #[test]
    fn oversized_file_is_rejected_by_the_size_limit() {
        let content = vec![b'x'; MAX_UPLOAD_BYTES + 1];
        let result = validate_upload(FileSlot::RaceAnalysis, &upload("race.json", &content));
        assert!(result.unwrap_err().contains("upload limit"));
    }

    #[test]
    fn content_markers_are_checked_per_slot() {
        let race = validate_upload(
            FileSlot::RaceAnalysis,
            &upload("race.json", br#"{"race_strategy_by_car": []}"#),
        );
        assert!(race.unwrap_err().contains("non-empty car array"));

        let insights = validate_upload(
            FileSlot::Insights,
            &upload(
                "insights.json",
                br#"{"executive_summary": "ok", "marketing_angles": []}"#,
            ),
        );
        assert!(insights.is_ok());

        let social = validate_upload(FileSlot::Social, &upload("social.json", br#"{"posts": []}"#));
        assert!(social.unwrap_err().contains("non-empty posts array"));
    }

    #[test]
    fn upload_load_delete_cycle_round_trips_through_the_store() {
        let manager = DatasetManager::in_memory(CatalogConfig::default());

        let outcome = manager.upload_files(
            "Test Upload",
            &[(FileSlot::RaceAnalysis, upload("race.json", &race_json()))],
        );
        assert!(outcome.success, "upload failed: {:?}", outcome.errors);
        let dataset = outcome.dataset.expect("upload returns the dataset");
        let stamp = dataset
            .id
            .strip_prefix("uploaded_")
            .expect("uploaded ids carry the uploaded_ prefix");
        // Compact UTC form, e.g. 20260830T120000Z.
        assert_eq!(stamp.len(), 16);
        assert!(stamp.ends_with('Z'));
        assert!(dataset.is_complete());

        let loaded = manager.load_dataset(&dataset.id);
        assert!(loaded.success, "load failed: {:?}", loaded.errors);
        assert!(
            loaded
                .dataset
                .expect("load returns the dataset")
                .is_complete()
        );

        let all = manager.get_all_datasets().expect("listing succeeds");
        assert_eq!(all.len(), 1);

        assert!(manager.delete_dataset(&dataset.id).expect("delete runs"));
        assert!(!manager.delete_dataset(&dataset.id).expect("delete runs"));
        assert!(
            manager
                .get_all_datasets()
                .expect("listing succeeds")
                .is_empty()
        );
    }

    #[test]
    fn upload_with_any_invalid_file_persists_nothing() {
        let manager = DatasetManager::in_memory(CatalogConfig::default());
        let outcome = manager.upload_files(
            "Broken",
            &[
                (FileSlot::RaceAnalysis, upload("race.json", &race_json())),
                (FileSlot::Social, upload("social.txt", b"{}")),
            ],
        );
        assert!(!outcome.success);
        assert!(outcome.errors.iter().any(|error| error.contains("social.txt")));
        assert!(
            manager
                .get_all_datasets()
                .expect("listing succeeds")
                .is_empty()
        );
    }

    #[test]
    fn preloaded_datasets_are_probed_listed_and_immutable() {
        let dir = tempfile::tempdir().expect("tempdir creates");
        let race_path = dir.path().join("race.json");
        let race_value: serde_json::Value =
            serde_json::from_slice(&race_json()).expect("race fixture parses");
        write_json_pretty(&race_path, &race_value).expect("race fixture writes");

        let catalog = CatalogConfig {
            datasets: vec![
                CatalogEntry {
                    name: "demo".to_string(),
                    display_name: "Demo Race".to_string(),
                    directory: dir.path().to_path_buf(),
                    race_file: "race.json".to_string(),
                    insights_file: None,
                    social_file: None,
                    tags: vec!["demo".to_string()],
                },
                CatalogEntry {
                    name: "absent".to_string(),
                    display_name: "Missing".to_string(),
                    directory: dir.path().to_path_buf(),
                    race_file: "nope.json".to_string(),
                    insights_file: None,
                    social_file: None,
                    tags: Vec::new(),
                },
            ],
        };

        let manager = DatasetManager::in_memory(catalog);
        let all = manager.get_all_datasets().expect("listing succeeds");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "preloaded_demo");

        let loaded = manager.load_dataset("preloaded_demo");
        assert!(loaded.success, "load failed: {:?}", loaded.errors);

        assert!(!manager.delete_dataset("preloaded_demo").expect("delete runs"));
        let missing = manager.load_dataset("preloaded_absent");
        assert!(!missing.success);
    }

    #[test]
    fn unrecognized_ids_fail_without_an_error_escape() {
        let manager = DatasetManager::in_memory(CatalogConfig::default());
        let outcome = manager.load_dataset("something_else");
        assert!(!outcome.success);
        assert!(!outcome.errors.is_empty());

        let outcome = manager.load_dataset("uploaded_12345");
        assert!(!outcome.success);
    }
}
