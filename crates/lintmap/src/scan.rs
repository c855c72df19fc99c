//! Background scanning and reconciliation.
//!
//! A scan runs the [`Extractor`] on a worker thread and sends the result back
//! over a channel. The thread that owns the [`Canvas`] drains the channel
//! with [`ScanPipeline::poll`] or [`ScanPipeline::wait_timeout`] and
//! reconciles the diagram with the new class graph:
//!
//! 1. keep class descriptors only, measure each title
//! 2. lay out the class graph
//! 3. drop every connector
//! 4. evict classes that disappeared, update surviving ones in place and
//!    register new ones
//! 5. rebuild connectors and refresh the surface
//!
//! Every request gets a run id. A result whose run has been superseded by a
//! newer request is discarded unread.

use std::{
    fmt,
    path::PathBuf,
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
    thread,
    time::{Duration, Instant},
};

use indexmap::IndexMap;
use log::{debug, info, warn};

use lintmap_core::{
    identifier::EntityKey,
    semantic::{CancellationToken, ClassDescriptor, ExtractError, Extraction, ExtractionError, Extractor},
};

use crate::{
    LintmapError,
    canvas::Canvas,
    config::{AppConfig, NodeStyle},
    connection::ConnectionBuilder,
    context::ExclusionList,
    layout::{Engine, LayoutNode, measure_title},
    registry::{ClassNode, Registry},
};

/// Called with every successfully reconciled scan.
pub type CompletionCallback = Box<dyn FnMut(&ScanOutcome) + Send>;

/// Where the pipeline is in its scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    /// At least one requested run has not reported yet.
    Scanning,
    Reconciling,
    /// The last reported run failed. The next poll or request moves the
    /// pipeline on.
    Failed,
}

/// Summary of one reconciled scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    pub run: u64,
    /// Classes registered for the first time.
    pub added: usize,
    /// Classes that kept their identity and were refreshed in place.
    pub updated: usize,
    pub removed: usize,
    pub connectors: usize,
    /// Associations whose endpoints are not on the diagram.
    pub skipped_associations: usize,
    /// Modules that could not be processed.
    pub errors: Vec<ExtractionError>,
}

struct ScanMessage {
    run: u64,
    result: Result<Extraction, ExtractError>,
}

/// Runs extractions in the background and applies them to a canvas.
pub struct ScanPipeline {
    extractor: Arc<dyn Extractor>,
    registry: Registry,
    engine: Engine,
    node_style: NodeStyle,
    sender: Sender<ScanMessage>,
    receiver: Receiver<ScanMessage>,
    state: ScanState,
    latest_run: u64,
    token: Option<CancellationToken>,
    on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for ScanPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanPipeline")
            .field("state", &self.state)
            .field("latest_run", &self.latest_run)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl ScanPipeline {
    pub fn new(extractor: Arc<dyn Extractor>, registry: Registry, config: &AppConfig) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            extractor,
            registry,
            engine: Engine::from_config(config.layout()),
            node_style: config.node().clone(),
            sender,
            receiver,
            state: ScanState::Idle,
            latest_run: 0,
            token: None,
            on_complete: None,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Id of the most recent request, `0` before the first one.
    pub fn latest_run(&self) -> u64 {
        self.latest_run
    }

    /// Installs the callback run after each successful reconciliation.
    pub fn on_complete(&mut self, callback: impl FnMut(&ScanOutcome) + Send + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Starts a scan of `project_paths` on a worker thread.
    ///
    /// Earlier runs still in flight keep running, but their results will be
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns [`LintmapError::Io`] if the worker thread cannot be spawned.
    pub fn request_scan(
        &mut self,
        project_paths: &[PathBuf],
        exclusions: &ExclusionList,
    ) -> Result<u64, LintmapError> {
        let run = self.latest_run + 1;
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let extractor = Arc::clone(&self.extractor);
        let sender = self.sender.clone();
        let paths = project_paths.to_vec();
        let exclude_paths = exclusions.paths().to_vec();

        thread::Builder::new()
            .name(format!("lintmap-scan-{run}"))
            .spawn(move || {
                let result = extractor.extract(&paths, &exclude_paths, &worker_token);
                if sender.send(ScanMessage { run, result }).is_err() {
                    debug!(run; "Scan pipeline dropped before the result arrived");
                }
            })?;

        self.latest_run = run;
        self.token = Some(token);
        self.state = ScanState::Scanning;
        info!(run, paths = project_paths.len(); "Scan requested");
        Ok(run)
    }

    /// Cancels the most recent run.
    pub fn cancel(&self) {
        if let Some(token) = &self.token {
            debug!(run = self.latest_run; "Cancelling scan");
            token.cancel();
        }
    }

    /// Reconciles the newest result if one has arrived, without blocking.
    pub fn poll(&mut self, canvas: &mut Canvas) -> Option<Result<ScanOutcome, LintmapError>> {
        if self.state == ScanState::Failed {
            self.state = ScanState::Idle;
        }
        while let Ok(message) = self.receiver.try_recv() {
            if let Some(result) = self.handle(canvas, message) {
                return Some(result);
            }
        }
        None
    }

    /// Like [`poll`](Self::poll) but waits up to `timeout` for the newest
    /// result.
    pub fn wait_timeout(
        &mut self,
        canvas: &mut Canvas,
        timeout: Duration,
    ) -> Option<Result<ScanOutcome, LintmapError>> {
        if self.state != ScanState::Scanning {
            return self.poll(canvas);
        }
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let message = self.receiver.recv_timeout(remaining).ok()?;
            if let Some(result) = self.handle(canvas, message) {
                return Some(result);
            }
        }
    }

    fn handle(
        &mut self,
        canvas: &mut Canvas,
        message: ScanMessage,
    ) -> Option<Result<ScanOutcome, LintmapError>> {
        if message.run != self.latest_run {
            debug!(run = message.run, latest = self.latest_run; "Discarding superseded scan result");
            return None;
        }

        self.token = None;
        self.state = ScanState::Reconciling;
        let run = message.run;
        let result = message
            .result
            .map_err(LintmapError::from)
            .and_then(|extraction| self.reconcile(canvas, run, extraction));

        match &result {
            Ok(outcome) => {
                self.state = ScanState::Idle;
                info!(
                    run,
                    added = outcome.added,
                    updated = outcome.updated,
                    removed = outcome.removed,
                    connectors = outcome.connectors,
                    errors = outcome.errors.len();
                    "Scan reconciled"
                );
                if let Some(callback) = self.on_complete.as_mut() {
                    callback(outcome);
                }
            }
            Err(err) => {
                self.state = ScanState::Failed;
                warn!(run, err:% = err; "Scan failed");
            }
        }
        Some(result)
    }

    fn reconcile(
        &self,
        canvas: &mut Canvas,
        run: u64,
        extraction: Extraction,
    ) -> Result<ScanOutcome, LintmapError> {
        let Extraction {
            classes,
            associations,
            errors,
        } = extraction;

        let mut classes_by_key: IndexMap<EntityKey, ClassDescriptor> = IndexMap::new();
        for class in classes.into_iter().filter(ClassDescriptor::is_class) {
            if let Some(previous) = classes_by_key.insert(class.key().clone(), class) {
                warn!(key:% = previous.key(); "Class reported twice, keeping the latest");
            }
        }

        let nodes: Vec<LayoutNode> = classes_by_key
            .values()
            .map(|class| {
                LayoutNode::new(
                    class.key().clone(),
                    measure_title(class.title(), &self.node_style),
                )
            })
            .collect();
        let edges: Vec<(EntityKey, EntityKey)> = associations
            .iter()
            .map(|association| (association.head().clone(), association.tail().clone()))
            .collect();
        let layout = self.engine.calculate(&nodes, &edges)?;

        canvas.clear_connectors(&self.registry)?;

        let evicted = self.registry.retain(|key| classes_by_key.contains_key(key));
        for node in &evicted {
            canvas.remove_box(&self.registry, node.key())?;
        }

        let mut outcome = ScanOutcome {
            run,
            removed: evicted.len(),
            errors,
            ..ScanOutcome::default()
        };

        for node in &nodes {
            let (Some(bounds), Some(class)) = (layout.bounds(&node.key), classes_by_key.get(&node.key))
            else {
                continue;
            };
            let center = bounds.center();
            let refreshed = self.registry.update(&node.key, |existing| {
                existing.set_title(class.title());
                existing.set_line(class.line_number());
                existing.set_size(node.size);
                existing.set_position(center);
            });
            if refreshed {
                outcome.updated += 1;
            } else {
                let mut fresh =
                    ClassNode::new(node.key.clone(), class.title(), class.line_number(), node.size);
                fresh.set_position(center);
                self.registry.register(node.key.clone(), fresh);
                outcome.added += 1;
            }
            canvas.place_box(&node.key, bounds)?;
        }

        for association in &associations {
            match ConnectionBuilder::connect(canvas, &self.registry, association) {
                Ok(_) => outcome.connectors += 1,
                Err(LintmapError::UnknownEndpoint(key)) => {
                    warn!(key:% = key; "Skipping association to a class that is not on the diagram");
                    outcome.skipped_associations += 1;
                }
                Err(err) => return Err(err),
            }
        }

        canvas.refresh(&self.registry)?;
        Ok(outcome)
    }
}
