use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use treemap_core::config::RenderConfig;
use treemap_core::dataset::{Dataset, Request};
use treemap_core::export;
use treemap_core::fetch::AnyFetcher;
use treemap_core::session::Session;
use treemap_core::TilingMode;

#[derive(Parser, Debug)]
#[command(name = "treemap-cli", about = "Render a hierarchical JSON dataset as a treemap")]
struct Args {
    /// JSON document to render (path, file:// or http(s) URL)
    input: Option<String>,
    /// Render one of the published datasets, from --data-dir when the file
    /// is there and from its published URL otherwise
    #[arg(long, conflicts_with = "input")]
    dataset: Option<Dataset>,
    /// Directory holding local copies of the published dataset files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Document shown before the input; its layout seeds a resquarified switch
    #[arg(long)]
    previous: Option<String>,
    /// JSON render configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the tiling mode from the configuration
    #[arg(long)]
    tiling: Option<TilingMode>,
    /// Output SVG path
    #[arg(long)]
    svg: Option<PathBuf>,
    /// Output JSON layout path
    #[arg(short, long)]
    json: Option<PathBuf>,
    /// Output CSV layout path
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Seconds to wait for each load
    #[arg(long, default_value_t = 30)]
    timeout: u64,
    /// Log layout decisions
    #[arg(short, long)]
    verbose: bool,
}

fn dataset_request(dataset: Dataset, data_dir: &Path) -> Request {
    if data_dir.join(dataset.file_name()).is_file() {
        dataset.request(Some(data_dir))
    } else {
        dataset.request(None)
    }
}

/// A dataset name resolves to its local copy or published URL; anything
/// else is a location.
fn request_for(location: &str, data_dir: &Path) -> Request {
    match location.parse::<Dataset>() {
        Ok(dataset) => dataset_request(dataset, data_dir),
        Err(_) => Request::for_location(location),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            RenderConfig::from_json_str(&text)?
        }
        None => RenderConfig::default(),
    };
    if let Some(tiling) = args.tiling {
        config.layout.tiling = tiling;
    }

    let request = match (&args.input, args.dataset) {
        (Some(input), _) => request_for(input, &args.data_dir),
        (None, Some(dataset)) => dataset_request(dataset, &args.data_dir),
        (None, None) => bail!("nothing to render: pass an input file or --dataset"),
    };

    let timeout = Duration::from_secs(args.timeout);
    let fetcher = Arc::new(AnyFetcher::with_timeout(timeout));
    let mut session = Session::new(config, fetcher);

    if let Some(previous) = &args.previous {
        session.switch_to(request_for(previous, &args.data_dir));
        session
            .wait(timeout)
            .with_context(|| format!("loading previous document {previous}"))?;
    }
    let location = request.location.clone();
    session.switch_to(request);
    session
        .wait(timeout)
        .with_context(|| format!("loading {location}"))?;

    let Some(view) = session.view() else {
        bail!("no layout produced for {location}");
    };

    if let Some(path) = &args.svg {
        let svg = export::to_svg(view, session.config())?;
        std::fs::write(path, svg).with_context(|| format!("writing {}", path.display()))?;
        info!("wrote svg to {}", path.display());
    }
    if let Some(path) = &args.json {
        let json = export::to_json(&view.tree);
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("wrote json to {}", path.display());
    }
    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        export::to_csv(&view.tree, std::io::BufWriter::new(file))?;
        info!("wrote csv to {}", path.display());
    }

    println!(
        "{}: {} tiles in {} categories",
        view.request.title,
        view.tree.leaves().count(),
        view.palette.len()
    );
    Ok(())
}
