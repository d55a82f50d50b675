use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

// Seconds to the "M:SS.mmm" display form used across the analysis exports.
pub fn format_lap_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00.000".to_string();
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let remainder = seconds - (minutes as f64) * 60.0;
    format!("{minutes}:{remainder:06.3}")
}

#[cfg(test)]
mod tests {
    use super::{format_lap_time, sha256_bytes};

    #[test]
    fn format_lap_time_renders_minutes_and_millis() {
        assert_eq!(format_lap_time(95.421), "1:35.421");
        assert_eq!(format_lap_time(59.9), "0:59.900");
        assert_eq!(format_lap_time(120.0), "2:00.000");
    }

    #[test]
    fn format_lap_time_clamps_non_physical_values() {
        assert_eq!(format_lap_time(-3.0), "0:00.000");
        assert_eq!(format_lap_time(f64::NAN), "0:00.000");
    }

    #[test]
    fn sha256_bytes_is_stable() {
        assert_eq!(sha256_bytes(b"pitwall"), sha256_bytes(b"pitwall"));
        assert_ne!(sha256_bytes(b"a"), sha256_bytes(b"b"));
    }
}
