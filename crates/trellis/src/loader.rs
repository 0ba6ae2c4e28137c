//! Background loading into a shared graph.
//!
//! A [`Loader`] owns a dedicated worker thread that fetches node data from a
//! [`DataSource`] and inserts it into a [`SharedGraph`]. Requests travel over
//! a bounded channel; every handled request produces a [`LoadEvent`] on a
//! second channel. Layouts never lock anything themselves: the scheduler runs
//! them through [`SharedGraph::with_exclusive`], which holds the graph lock
//! for the whole run.

use std::{
    sync::{
        Arc, Mutex,
        mpsc::{self, Receiver, SyncSender, TryRecvError},
    },
    thread::{self, JoinHandle},
};

use log::{debug, info, warn};

use trellis_core::attribute::Attributes;

use crate::{
    error::{LayoutError, TrellisError},
    layout::{Layout, LayoutContext},
    structure::{Graph, NodeId},
};

/// Default capacity of the request queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// A graph shared between the loader thread and the layout scheduler.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<Mutex<Graph>>,
}

impl SharedGraph {
    pub fn new(graph: Graph) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Runs `f` while holding the graph lock.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Loader`] when a previous holder panicked.
    pub fn with_exclusive<R>(&self, f: impl FnOnce(&mut Graph) -> R) -> Result<R, TrellisError> {
        let mut graph = self
            .inner
            .lock()
            .map_err(|_| TrellisError::Loader("graph lock poisoned".to_string()))?;
        Ok(f(&mut graph))
    }

    /// Runs one layout pass with exclusive access to the graph.
    pub fn run_layout(
        &self,
        layout: &mut dyn Layout,
        ctx: &LayoutContext,
    ) -> Result<(), TrellisError> {
        self.with_exclusive(|graph| layout.run(graph, ctx))?
            .map_err(TrellisError::from)
    }

    /// Consumes the handle, returning the graph if no other handle is alive.
    pub fn try_into_inner(self) -> Result<Graph, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex
                .into_inner()
                .map_err(|poisoned| Self::new(poisoned.into_inner())),
            Err(inner) => Err(Self { inner }),
        }
    }
}

/// Supplies node data on demand.
///
/// Called from the loader thread without the graph lock held.
pub trait DataSource: Send + 'static {
    /// Attributes of the children of the node described by `parent`.
    ///
    /// # Errors
    ///
    /// A message describing why the data could not be fetched.
    fn children(&mut self, parent: &Attributes) -> Result<Vec<Attributes>, String>;
}

impl<F> DataSource for F
where
    F: FnMut(&Attributes) -> Result<Vec<Attributes>, String> + Send + 'static,
{
    fn children(&mut self, parent: &Attributes) -> Result<Vec<Attributes>, String> {
        self(parent)
    }
}

/// Work item for the loader thread.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadRequest {
    /// Fetch the children of a node and attach them below it
    Children(NodeId),
    /// Remove every descendant of a node
    Unload(NodeId),
    /// Stop the worker after the requests queued before it
    Shutdown,
}

/// Notification about a handled request.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    Loaded { parent: NodeId, nodes: Vec<NodeId> },
    Unloaded { node: NodeId, removed: usize },
    Failed { request: LoadRequest, reason: String },
}

/// Handle to the loader thread.
pub struct Loader {
    requests: Option<SyncSender<LoadRequest>>,
    events: Receiver<LoadEvent>,
    worker: Option<JoinHandle<()>>,
}

impl Loader {
    /// Starts a worker feeding `graph` from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Io`] when the thread cannot be spawned.
    pub fn spawn(
        graph: SharedGraph,
        source: impl DataSource,
        capacity: usize,
    ) -> Result<Self, TrellisError> {
        let (request_tx, request_rx) = mpsc::sync_channel(capacity.max(1));
        let (event_tx, event_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("trellis-loader".to_string())
            .spawn(move || work(graph, source, request_rx, event_tx))?;
        info!(capacity = capacity; "Loader started");

        Ok(Self {
            requests: Some(request_tx),
            events: event_rx,
            worker: Some(worker),
        })
    }

    /// Queues a request, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Loader`] when the worker has stopped.
    pub fn request(&self, request: LoadRequest) -> Result<(), TrellisError> {
        self.requests
            .as_ref()
            .ok_or_else(|| TrellisError::Loader("loader is shut down".to_string()))?
            .send(request)
            .map_err(|_| TrellisError::Loader("loader worker has stopped".to_string()))
    }

    /// Returns the next event without waiting.
    pub fn try_event(&self) -> Option<LoadEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Waits for the next event; `None` once the worker is gone.
    pub fn next_event(&self) -> Option<LoadEvent> {
        self.events.recv().ok()
    }

    /// Drains the events that are already available.
    pub fn drain_events(&self) -> Vec<LoadEvent> {
        self.events.try_iter().collect()
    }

    /// Lets the worker finish its queue and waits for it.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Loader`] when the worker panicked.
    pub fn shutdown(mut self) -> Result<Vec<LoadEvent>, TrellisError> {
        self.stop()?;
        Ok(self.drain_events())
    }

    fn stop(&mut self) -> Result<(), TrellisError> {
        if let Some(requests) = self.requests.take()
            && let Err(err) = requests.send(LoadRequest::Shutdown)
        {
            warn!(err:% = err; "Loader worker already stopped");
        }
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| TrellisError::Loader("loader worker panicked".to_string())),
            None => Ok(()),
        }
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(err:% = err; "Loader did not stop cleanly");
        }
    }
}

fn work(
    graph: SharedGraph,
    mut source: impl DataSource,
    requests: Receiver<LoadRequest>,
    events: mpsc::Sender<LoadEvent>,
) {
    for request in requests {
        let event = match request {
            LoadRequest::Shutdown => break,
            LoadRequest::Children(parent) => load_children(&graph, &mut source, parent),
            LoadRequest::Unload(node) => unload(&graph, node),
        }
        .unwrap_or_else(|reason| LoadEvent::Failed {
            request: request.clone(),
            reason,
        });
        debug!(event:? = event; "Load request handled");
        if let Err(err) = events.send(event) {
            warn!(event:? = err.0; "Load event dropped, no listener");
        }
    }
    info!("Loader stopped");
}

fn load_children(
    graph: &SharedGraph,
    source: &mut impl DataSource,
    parent: NodeId,
) -> Result<LoadEvent, String> {
    let attributes = graph
        .with_exclusive(|g| g.attributes(parent).cloned())
        .map_err(|err| err.to_string())?
        .ok_or_else(|| LayoutError::NodeNotFound(parent).to_string())?;

    // fetch without the lock so layouts keep running
    let children = source.children(&attributes)?;

    graph
        .with_exclusive(|g| {
            if !g.contains(parent) {
                return Err(format!("node {parent} was removed while loading"));
            }
            let mut nodes = Vec::with_capacity(children.len());
            for attributes in children {
                let node = g.add_node_with(attributes);
                nodes.push(node);
                if let Err(err) = g.add_child(parent, node) {
                    discard(g, &nodes);
                    return Err(err.to_string());
                }
            }
            Ok(LoadEvent::Loaded { parent, nodes })
        })
        .map_err(|err| err.to_string())?
}

/// Removes the nodes of a failed load, newest first.
fn discard(graph: &mut Graph, nodes: &[NodeId]) {
    for node in nodes.iter().rev() {
        if let Err(err) = graph.remove_node(*node) {
            warn!(node:% = node, err:% = err; "Failed to discard loaded node");
        }
    }
}

fn unload(graph: &SharedGraph, node: NodeId) -> Result<LoadEvent, String> {
    graph
        .with_exclusive(|g| {
            if !g.contains(node) {
                return Err(LayoutError::NodeNotFound(node).to_string());
            }
            let below: Vec<NodeId> = g.pre_order(node).skip(1).collect();
            for descendant in below.iter().rev() {
                g.remove_node(*descendant).map_err(|err| err.to_string())?;
            }
            Ok(LoadEvent::Unloaded {
                node,
                removed: below.len(),
            })
        })
        .map_err(|err| err.to_string())?
}
