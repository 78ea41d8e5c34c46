mod app;
mod atlas;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use log::info;

use app::{ExplorerApp, LayoutMode, LoadRequest};
use atlas::{SummaryStats, fetch_named_graph, load_graph_file};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory searched for named graph files.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Named graph in the data directory to open on startup.
    #[arg(long, conflicts_with = "file")]
    graph: Option<String>,

    /// Graph JSON file to open on startup.
    #[arg(long)]
    file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LayoutMode::Force)]
    layout: LayoutMode,

    /// Print summary statistics as JSON and exit without opening a window.
    #[arg(long)]
    check: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args())
        })
        .init();
}

fn run_check(args: &Args) -> anyhow::Result<()> {
    let graph = match (&args.file, &args.graph) {
        (Some(path), _) => load_graph_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        (None, Some(name)) => fetch_named_graph(&args.data_dir, name)?,
        (None, None) => bail!("--check needs --file or --graph"),
    };

    let stats = SummaryStats::compute(&graph);
    info!(
        "{} nodes, {} links, {} dropped",
        graph.node_count(),
        graph.edge_count(),
        graph.dropped_links
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.check {
        return run_check(&args);
    }

    let initial = match (args.file.clone(), args.graph.clone()) {
        (Some(path), _) => Some(LoadRequest::Path(path)),
        (None, Some(name)) => Some(LoadRequest::Named {
            data_dir: args.data_dir.clone(),
            name,
        }),
        (None, None) => None,
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1440.0, 920.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let data_dir = args.data_dir.clone();
    let layout = args.layout;
    eframe::run_native(
        "Atlas Explorer",
        options,
        Box::new(move |cc| Ok(Box::new(ExplorerApp::new(cc, data_dir, initial, layout)))),
    )
    .map_err(|error| anyhow::anyhow!("failed to start the window: {error}"))
}
