use anyhow::{bail, Context, Result};
use clap::Parser;
use fragplot::config::VisualizationConfig;
use fragplot::data::Dataset;
use fragplot::{compute_render_plan_with_options, parser, RenderOptions};
use log::{debug, info};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "fragplot")]
#[command(about = "Compute chart render plans from fragment records", long_about = None)]
struct Args {
    /// Pipeline DSL string (e.g., 'aes(x: length, color: region) | histogram(bins: 40)')
    dsl: Option<String>,

    /// Records file (JSON array or .csv); `-` reads stdin
    #[arg(short, long, default_value = "-")]
    data: String,

    /// Treat the records as CSV regardless of file extension
    #[arg(long)]
    csv: bool,

    /// Visualization config as a JSON file, instead of a DSL string
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Canvas height in pixels
    #[arg(long, default_value_t = 600.0)]
    height: f64,

    /// Padding between facet cells in pixels
    #[arg(long, default_value_t = 20.0)]
    padding: f64,

    /// Pretty-print the JSON plan
    #[arg(long)]
    pretty: bool,
}

fn load_config(args: &Args) -> Result<VisualizationConfig> {
    match (&args.dsl, &args.config) {
        (Some(_), Some(_)) => bail!("pass either a DSL string or --config, not both"),
        (Some(dsl), None) => parser::parse_config(dsl).context("Failed to parse DSL"),
        (None, Some(path)) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            VisualizationConfig::from_json_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))
        }
        (None, None) => bail!("no visualization given: pass a DSL string or --config"),
    }
}

fn load_records(args: &Args) -> Result<Dataset> {
    let is_csv = args.csv
        || Path::new(&args.data)
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));

    let mut text = String::new();
    if args.data == "-" {
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read records from stdin")?;
    } else {
        text = fs::read_to_string(&args.data)
            .with_context(|| format!("Failed to read records from {}", args.data))?;
    }

    let dataset = if is_csv {
        Dataset::from_csv(text.as_bytes()).context("Failed to parse CSV records")?
    } else {
        Dataset::from_json_str(&text).context("Failed to parse JSON records")?
    };
    Ok(dataset)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();

    let config = load_config(&args)?;
    let dataset = load_records(&args)?;
    info!("loaded {} records", dataset.len());

    let options = RenderOptions { width: args.width, height: args.height, padding: args.padding };
    let plan = compute_render_plan_with_options(&dataset.records, &config, &options)
        .context("Failed to compute render plan")?;
    debug!("plan has {} facets, {} diagnostics", plan.facets.len(), plan.diagnostics.len());

    let json = if args.pretty {
        serde_json::to_string_pretty(&plan)
    } else {
        serde_json::to_string(&plan)
    }
    .context("Failed to serialize render plan")?;

    // Write the plan to stdout
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).context("Failed to write plan to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
