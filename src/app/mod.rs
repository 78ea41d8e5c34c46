use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};
use log::{debug, info, warn};

use crate::atlas::{
    AtlasGraph, EdgeType, LoadError, NodeType, SummaryStats, fetch_named_graph,
    list_graph_files, load_graph_bytes, load_graph_file,
};

mod filter;
mod graph;
mod highlight;
mod layout;
mod render_utils;
mod ui;

pub use layout::LayoutMode;

use self::filter::FilterState;
use self::layout::Simulation;

pub enum LoadRequest {
    Path(PathBuf),
    Named { data_dir: PathBuf, name: String },
    Bytes { label: String, bytes: Vec<u8> },
}

impl LoadRequest {
    fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Named { name, .. } => name.clone(),
            Self::Bytes { label, .. } => label.clone(),
        }
    }

    fn run(self) -> Result<AtlasGraph, LoadError> {
        match self {
            Self::Path(path) => load_graph_file(&path),
            Self::Named { data_dir, name } => fetch_named_graph(&data_dir, &name),
            Self::Bytes { label, bytes } => load_graph_bytes(&label, &bytes),
        }
    }
}

struct LoadedGraph {
    label: String,
    graph: AtlasGraph,
}

type LoadOutcome = Result<LoadedGraph, String>;

struct LoadPanel {
    data_dir: PathBuf,
    query: String,
    available: Vec<String>,
    chosen: Option<String>,
}

impl LoadPanel {
    fn new(data_dir: PathBuf) -> Self {
        let available = list_graph_files(&data_dir);
        Self {
            data_dir,
            query: String::new(),
            available,
            chosen: None,
        }
    }

    fn refresh(&mut self) {
        self.available = list_graph_files(&self.data_dir);
    }
}

pub struct ExplorerApp {
    model: Box<ViewModel>,
    pending: Option<Receiver<LoadOutcome>>,
    notice: Option<String>,
    load_panel: LoadPanel,
}

struct ViewModel {
    graph: AtlasGraph,
    source_label: Option<String>,
    summary: SummaryStats,
    filter: FilterState,
    mode: LayoutMode,
    // Index into `graph.nodes`.
    selected: Option<usize>,
    pan: Vec2,
    zoom: f32,
    drag: Option<DragState>,
    canvas_size: Vec2,
    graph_dirty: bool,
    graph_cache: Option<RenderGraph>,
}

#[derive(Clone, Copy)]
enum DragState {
    Node(usize),
    Canvas,
}

struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    render_index_by_graph: HashMap<usize, usize>,
    // Edge indices leaving / entering each render node.
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    simulation: Simulation,
    screen_positions: Vec<Pos2>,
    screen_radii: Vec<f32>,
}

struct RenderNode {
    graph_index: usize,
    node_type: NodeType,
    radius: f32,
}

struct RenderEdge {
    source: usize,
    target: usize,
    edge_type: EdgeType,
}

struct HighlightState {
    nodes: HashSet<usize>,
    edges: HashSet<usize>,
}

impl ExplorerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        data_dir: PathBuf,
        initial: Option<LoadRequest>,
        mode: LayoutMode,
    ) -> Self {
        let mut model = Box::new(ViewModel::new(AtlasGraph::default(), None));
        model.mode = mode;

        let mut app = Self {
            model,
            pending: None,
            notice: None,
            load_panel: LoadPanel::new(data_dir),
        };
        if let Some(request) = initial {
            app.request_load(request);
        }
        app
    }

    fn spawn_load(request: LoadRequest) -> Receiver<LoadOutcome> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let label = request.label();
            let result = request
                .run()
                .map(|graph| LoadedGraph {
                    label: label.clone(),
                    graph,
                })
                .map_err(|error| {
                    warn!("load of {label} failed: {error}");
                    error.to_string()
                });
            let _ = tx.send(result);
        });

        rx
    }

    fn request_load(&mut self, request: LoadRequest) {
        if self.pending.is_some() {
            debug!("ignoring load of {}: another load is in flight", request.label());
            return;
        }
        info!("loading {}", request.label());
        self.pending = Some(Self::spawn_load(request));
    }

    fn poll_pending(&mut self) {
        let Some(rx) = self.pending.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(Ok(loaded)) => {
                let mode = self.model.mode;
                let mut model = Box::new(ViewModel::new(loaded.graph, Some(loaded.label)));
                model.mode = mode;
                self.model = model;
                self.notice = None;
                self.load_panel.refresh();
            }
            Ok(Err(message)) => {
                self.notice = Some(message);
            }
            Err(TryRecvError::Empty) => {
                self.pending = Some(rx);
            }
            Err(TryRecvError::Disconnected) => {
                self.notice = Some("Background load worker disconnected".to_owned());
            }
        }
    }

    fn take_dropped_file(ctx: &Context) -> Option<LoadRequest> {
        let dropped = ctx.input(|input| input.raw.dropped_files.first().cloned())?;
        if let Some(path) = dropped.path {
            return Some(LoadRequest::Path(path));
        }
        dropped.bytes.map(|bytes| LoadRequest::Bytes {
            label: dropped.name,
            bytes: bytes.to_vec(),
        })
    }

    fn draw_notice(&mut self, ctx: &Context) {
        let Some(message) = &self.notice else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("Could not load graph")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message.as_str());
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.notice = None;
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_pending();

        if let Some(request) = Self::take_dropped_file(ctx) {
            self.request_load(request);
        }

        let is_loading = self.pending.is_some();
        if let Some(request) = self.model.show(ctx, &mut self.load_panel, is_loading) {
            self.request_load(request);
        }
        self.draw_notice(ctx);

        if self.pending.is_some() {
            ctx.request_repaint();
        }
    }
}
