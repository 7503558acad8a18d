use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::dataset::Request;
use crate::error::{Result, TreemapError};
use crate::fetch::Fetcher;
use crate::model::RawNode;

#[derive(Debug)]
pub enum LoadMsg {
    Loaded {
        generation: u64,
        request: Request,
        raw: RawNode,
    },
    Failed {
        generation: u64,
        request: Request,
        error: TreemapError,
    },
}

impl LoadMsg {
    pub fn generation(&self) -> u64 {
        match self {
            LoadMsg::Loaded { generation, .. } | LoadMsg::Failed { generation, .. } => *generation,
        }
    }
}

/// Runs each fetch on its own worker thread and reports on a channel.
/// Requests are tagged with a generation; a worker whose generation has
/// been superseded before it finishes drops its result.
pub struct Loader {
    fetcher: Arc<dyn Fetcher>,
    latest: Arc<AtomicU64>,
    tx: Sender<LoadMsg>,
    rx: Receiver<LoadMsg>,
}

impl Loader {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            fetcher,
            latest: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
        }
    }

    pub fn receiver(&self) -> &Receiver<LoadMsg> {
        &self.rx
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::Relaxed)
    }

    /// Mark `generation` as the newest request; older workers will drop
    /// their results.
    pub fn supersede(&self, generation: u64) {
        self.latest.fetch_max(generation, Ordering::Relaxed);
    }

    /// Fetch on the calling thread.
    pub fn fetch_now(&self, request: &Request) -> Result<RawNode> {
        self.fetcher.fetch(&request.location)
    }

    pub fn spawn(&self, generation: u64, request: Request) {
        self.supersede(generation);
        let fetcher = self.fetcher.clone();
        let latest = self.latest.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = fetcher.fetch(&request.location);
            if latest.load(Ordering::Relaxed) != generation {
                tracing::debug!("dropping superseded load of {}", request.location);
                return;
            }
            let msg = match result {
                Ok(raw) => LoadMsg::Loaded {
                    generation,
                    request,
                    raw,
                },
                Err(error) => LoadMsg::Failed {
                    generation,
                    request,
                    error,
                },
            };
            let _ = tx.send(msg);
        });
    }
}
