use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::cache::BoundedCache;
use crate::cli::ValidateArgs;
use crate::model::ValidationResult;
use crate::util::{now_utc_string, sha256_bytes, utc_compact_string, write_json_pretty};
use crate::validation::validate_race_data_structure;

const CACHE_MAX_ENTRIES: usize = 64;
const CACHE_MAX_AGE: Duration = Duration::from_secs(300);

#[derive(Debug, Serialize)]
struct ValidationReportManifest {
    manifest_version: u32,
    generated_at: String,
    inputs: Vec<InputReport>,
    notes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct InputReport {
    path: String,
    sha256: String,
    result: ValidationResult,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let report_path = args.report_path.clone().unwrap_or_else(|| {
        args.cache_root.join("manifests").join(format!(
            "validation_{}.json",
            utc_compact_string(Utc::now())
        ))
    });

    // Repeated inputs with identical content validate once.
    let mut cache: BoundedCache<String, ValidationResult> =
        BoundedCache::new(CACHE_MAX_ENTRIES, CACHE_MAX_AGE);
    let mut inputs = Vec::new();

    for path in &args.inputs {
        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let sha256 = sha256_bytes(&raw);

        let result = match cache.get(&sha256) {
            Some(cached) => cached,
            None => {
                let value: Value = serde_json::from_slice(&raw).unwrap_or(Value::Null);
                let result = validate_race_data_structure(&value);
                cache.set(sha256.clone(), result.clone());
                result
            }
        };

        info!(
            path = %path.display(),
            format = result.data_format.as_str(),
            quality = result.quality.as_str(),
            severity = result.severity.as_str(),
            completeness = result.completeness,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            edge_cases = result.edge_cases.len(),
            "validated document"
        );
        if !result.can_proceed {
            warn!(path = %path.display(), "document cannot be rendered, not even degraded");
        }

        inputs.push(InputReport {
            path: path.display().to_string(),
            sha256,
            result,
        });
    }

    let manifest = ValidationReportManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        inputs,
        notes: vec![
            "Unparseable input files are validated as null documents rather than rejected."
                .to_string(),
        ],
    };
    write_json_pretty(&report_path, &manifest)?;
    info!(path = %report_path.display(), "wrote validation report");

    Ok(())
}
