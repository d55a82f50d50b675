use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::anomaly::DEFAULT_THRESHOLD_PCT;

#[derive(Parser, Debug)]
#[command(
    name = "pitwall",
    version,
    about = "Race telemetry normalization, validation, and cross-reference tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Validate(ValidateArgs),
    Timeline(TimelineArgs),
    Crossref(CrossrefArgs),
    Dataset(DatasetArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = ".cache/pitwall")]
    pub cache_root: PathBuf,

    #[arg(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct TimelineArgs {
    #[arg(long, default_value = ".cache/pitwall")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub car: Option<String>,

    #[arg(long, default_value_t = DEFAULT_THRESHOLD_PCT)]
    pub threshold_pct: f64,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CrossrefArgs {
    #[arg(long, default_value = ".cache/pitwall")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub race: PathBuf,

    #[arg(long)]
    pub insights: Option<PathBuf>,

    #[arg(long)]
    pub social: Option<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    #[arg(long, default_value = ".cache/pitwall")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[command(subcommand)]
    pub action: DatasetAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DatasetAction {
    List,
    Load {
        id: String,
    },
    Upload {
        #[arg(long)]
        race: Option<PathBuf>,

        #[arg(long)]
        insights: Option<PathBuf>,

        #[arg(long)]
        social: Option<PathBuf>,

        #[arg(long, default_value = "Uploaded dataset")]
        name: String,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/pitwall")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,
}
