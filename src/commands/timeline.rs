use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::cli::TimelineArgs;
use crate::commands::read_json_value;
use crate::features::detect_features;
use crate::model::{FeatureAvailability, TimelineEvent};
use crate::schema::classify_document;
use crate::timeline::{extract_all_events_for_car, extract_all_events_with_threshold};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

#[derive(Debug, Serialize)]
struct TimelineManifest {
    manifest_version: u32,
    generated_at: String,
    input: String,
    data_format: &'static str,
    car_filter: Option<String>,
    threshold_pct: f64,
    features: FeatureAvailability,
    event_count: usize,
    events: Vec<TimelineEvent>,
}

pub fn run(args: TimelineArgs) -> Result<()> {
    let value = read_json_value(&args.input)?;
    let variant = classify_document(&value);
    let features = detect_features(&variant);

    let events = match &args.car {
        Some(car) => extract_all_events_for_car(&variant, car, args.threshold_pct),
        None => extract_all_events_with_threshold(&variant, args.threshold_pct),
    };

    info!(
        input = %args.input.display(),
        format = variant.format().as_str(),
        events = events.len(),
        car = args.car.as_deref().unwrap_or("all"),
        "extracted timeline"
    );

    let output = args.output.clone().unwrap_or_else(|| {
        args.cache_root.join("manifests").join(format!(
            "timeline_{}.json",
            utc_compact_string(Utc::now())
        ))
    });

    let manifest = TimelineManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        input: args.input.display().to_string(),
        data_format: variant.format().as_str(),
        car_filter: args.car.clone(),
        threshold_pct: args.threshold_pct,
        features,
        event_count: events.len(),
        events,
    };
    write_json_pretty(&output, &manifest)?;
    info!(path = %output.display(), "wrote timeline manifest");

    Ok(())
}
