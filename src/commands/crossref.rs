use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::CrossrefArgs;
use crate::commands::read_json_value;
use crate::crossref::build_cross_references;
use crate::model::CrossReference;
use crate::schema::{InsightsDocument, SocialDocument, classify_document};
use crate::util::{now_utc_string, utc_compact_string, write_json_pretty};

#[derive(Debug, Serialize)]
struct CrossrefManifest {
    manifest_version: u32,
    generated_at: String,
    race_input: String,
    insights_input: Option<String>,
    social_input: Option<String>,
    reference_count: usize,
    references: Vec<CrossReference>,
}

pub fn run(args: CrossrefArgs) -> Result<()> {
    let race_value = read_json_value(&args.race)?;
    let variant = classify_document(&race_value);

    let insights: Option<InsightsDocument> = match &args.insights {
        Some(path) => {
            let value = read_json_value(path)?;
            Some(serde_json::from_value(value).unwrap_or_default())
        }
        None => None,
    };
    let social: Option<SocialDocument> = match &args.social {
        Some(path) => {
            let value = read_json_value(path)?;
            Some(serde_json::from_value(value).unwrap_or_default())
        }
        None => None,
    };

    if insights.is_none() && social.is_none() {
        warn!("no auxiliary documents supplied; nothing to cross-reference");
    }

    let references = build_cross_references(&variant, insights.as_ref(), social.as_ref());
    info!(
        race = %args.race.display(),
        references = references.len(),
        "computed cross-references"
    );

    let output = args.output.clone().unwrap_or_else(|| {
        args.cache_root.join("manifests").join(format!(
            "crossref_{}.json",
            utc_compact_string(Utc::now())
        ))
    });

    let manifest = CrossrefManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        race_input: args.race.display().to_string(),
        insights_input: args.insights.as_ref().map(|path| path.display().to_string()),
        social_input: args.social.as_ref().map(|path| path.display().to_string()),
        reference_count: references.len(),
        references,
    };
    write_json_pretty(&output, &manifest)?;
    info!(path = %output.display(), "wrote cross-reference manifest");

    Ok(())
}
