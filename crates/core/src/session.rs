use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::color::Palette;
use crate::config::RenderConfig;
use crate::dataset::Request;
use crate::error::{Result, TreemapError};
use crate::fetch::Fetcher;
use crate::hierarchy::build;
use crate::legend::{legend, LegendEntry};
use crate::loader::{LoadMsg, Loader};
use crate::model::{RawNode, Tree};
use crate::stability::LayoutMemory;
use crate::treemap::layout;

/// Everything a renderer needs for one dataset.
#[derive(Debug, Clone)]
pub struct View {
    pub request: Request,
    pub tree: Tree,
    pub palette: Palette,
    pub legend: Vec<LegendEntry>,
}

/// Holds the dataset currently on screen and drives switches between
/// datasets. Only the most recent switch can change what is shown; a
/// failed load leaves the previous view in place.
pub struct Session {
    config: RenderConfig,
    loader: Loader,
    generation: u64,
    pending: Option<u64>,
    view: Option<View>,
    memory: Option<LayoutMemory>,
}

impl Session {
    pub fn new(config: RenderConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            loader: Loader::new(fetcher),
            generation: 0,
            pending: None,
            view: None,
            memory: None,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn memory(&self) -> Option<&LayoutMemory> {
        self.memory.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    fn supersede(&mut self) -> u64 {
        self.generation += 1;
        self.pending = None;
        self.loader.supersede(self.generation);
        self.generation
    }

    /// Start loading `request` in the background. Returns its generation.
    pub fn switch_to(&mut self, request: Request) -> u64 {
        let generation = self.supersede();
        tracing::debug!("switching to {} (generation {})", request.location, generation);
        self.pending = Some(generation);
        self.loader.spawn(generation, request);
        generation
    }

    /// Fetch and show `request` on the calling thread.
    pub fn load_now(&mut self, request: Request) -> Result<&View> {
        self.supersede();
        let raw = self.loader.fetch_now(&request)?;
        self.apply(request, &raw)
    }

    /// Show an already parsed document.
    pub fn show(&mut self, request: Request, raw: &RawNode) -> Result<&View> {
        self.supersede();
        self.apply(request, raw)
    }

    /// Apply whatever finished since the last call. `Ok(true)` when the view
    /// changed; an error when the current load failed.
    pub fn poll(&mut self) -> Result<bool> {
        let rx = self.loader.receiver().clone();
        let mut applied = false;
        while let Ok(msg) = rx.try_recv() {
            match self.handle(msg) {
                Some(Ok(())) => applied = true,
                Some(Err(e)) => return Err(e),
                None => {}
            }
        }
        Ok(applied)
    }

    /// Block until the current load resolves or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Result<()> {
        if self.pending.is_none() {
            return Ok(());
        }
        let deadline = Instant::now() + timeout;
        let rx = self.loader.receiver().clone();
        loop {
            let left = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(left) {
                Ok(msg) => {
                    if let Some(result) = self.handle(msg) {
                        return result;
                    }
                }
                Err(_) => {
                    return Err(TreemapError::fetch(
                        "session",
                        format!("no result within {timeout:?}"),
                    ))
                }
            }
        }
    }

    fn handle(&mut self, msg: LoadMsg) -> Option<Result<()>> {
        if msg.generation() != self.generation || self.pending.is_none() {
            tracing::warn!(
                "ignoring stale load (generation {}, current {})",
                msg.generation(),
                self.generation
            );
            return None;
        }
        self.pending = None;
        Some(match msg {
            LoadMsg::Loaded { request, raw, .. } => self.apply(request, &raw).map(|_| ()),
            LoadMsg::Failed { request, error, .. } => {
                tracing::warn!("load of {} failed: {}", request.location, error);
                Err(error)
            }
        })
    }

    fn apply(&mut self, request: Request, raw: &RawNode) -> Result<&View> {
        let result = build(raw).and_then(|mut tree| {
            let memory = layout(
                &mut tree,
                self.config.treemap_area(),
                &self.config.layout,
                self.memory.as_ref(),
            )?;
            Ok((tree, memory))
        });
        let (tree, memory) = match result {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("keeping previous view, {} failed: {}", request.location, e);
                return Err(e);
            }
        };

        let palette = Palette::from_tree(&tree);
        let legend = legend(&palette, &self.config.legend);
        tracing::info!(
            "showing '{}' ({} leaves, {} categories)",
            request.title,
            tree.leaves().count(),
            palette.len()
        );
        self.memory = Some(memory);
        Ok(self.view.insert(View {
            request,
            tree,
            palette,
            legend,
        }))
    }
}
