use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use sleep_report::data::loader::write_csv;
use sleep_report::data::pipeline::{prepare, PreparedData, Sources, DEFAULT_UNIVERSITY_URL};
use sleep_report::data::summary::summarize;
use sleep_report::report::charts::build_charts;
use sleep_report::report::selection::{
    CaffeineView, SleepStage, StageFilter, StageSelection, WidgetState,
};

/// Prepare the sleep efficiency datasets and the report's chart data.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Local efficiency dataset (.csv, .json or .parquet) with an `ID` column
    #[arg(long, env = "SLEEP_EFFICIENCY_PATH", default_value = "sleep_efficiency.csv")]
    efficiency: PathBuf,

    /// URL of the university sleep study CSV
    #[arg(long, env = "SLEEP_STUDY_URL", default_value = DEFAULT_UNIVERSITY_URL)]
    university_url: String,

    /// Timeout for the dataset download, in seconds
    #[arg(long, env = "SLEEP_FETCH_TIMEOUT", default_value_t = 30)]
    timeout_secs: u64,

    /// Print shape, dtypes and descriptive statistics of both tables
    #[arg(long)]
    summary: bool,

    /// Write the prepared tables and chart data into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Stages shown in the caffeine stage-time chart (deep, light, rem)
    #[arg(long, value_delimiter = ',', default_value = "deep,light,rem")]
    stages: Vec<SleepStage>,

    /// Stage shown in the smoking percentage chart (all, deep, light, rem)
    #[arg(long, default_value = "all")]
    smoking_stage: StageFilter,

    /// Stage shown in the alcohol percentage chart (all, deep, light, rem)
    #[arg(long, default_value = "all")]
    alcohol_stage: StageFilter,

    /// Active caffeine chart (efficiency, stages)
    #[arg(long, default_value = "efficiency")]
    caffeine_view: CaffeineView,
}

impl Args {
    fn widgets(&self) -> WidgetState {
        WidgetState {
            smoking_stages: self.smoking_stage,
            alcohol_stages: self.alcohol_stage,
            caffeine_view: self.caffeine_view,
            caffeine_stages: self.stages.iter().copied().collect::<StageSelection>(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let sources = Sources {
        efficiency_path: args.efficiency.clone(),
        university_url: args.university_url.clone(),
        fetch_timeout: Duration::from_secs(args.timeout_secs),
    };
    let data = prepare(&sources).context("preparing report data")?;

    if args.summary {
        println!("{}", summarize("efficiency", data.efficiency()));
        println!("{}", summarize("university", data.university()));
    }

    let widgets = args.widgets();
    if widgets.caffeine_stages.is_empty() {
        warn!("no sleep stage selected for the caffeine chart");
    }

    if let Some(dir) = &args.export_dir {
        export(&data, &widgets, dir)?;
    }
    Ok(())
}

fn export(data: &PreparedData, widgets: &WidgetState, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    for (name, table) in [
        ("efficiency_prepared.csv", data.efficiency()),
        ("university_normalized.csv", data.university()),
    ] {
        let path = dir.join(name);
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        write_csv(table, BufWriter::new(file))
            .with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {}", path.display());
    }

    let charts = build_charts(data, widgets).context("building charts")?;
    let path = dir.join("charts.json");
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &charts)
        .with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {} charts to {}", charts.len(), path.display());
    Ok(())
}
