//! High-level inventory collection API

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

use crate::error::InventoryError;
use crate::source::DataSource;
use crate::types::Inventory;

/// Shared cancellation flag for every collection worker
///
/// Cloning yields a handle onto the same flag. Once cancelled it stays
/// cancelled.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Create a new, not yet cancelled signal
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Cancel every worker observing this signal
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the signal has fired
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the signal fires
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // Sender lives as long as any handle, so this never resolves
            std::future::pending::<()>().await;
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a multi-target collection
///
/// Successful inventories arrive in completion order, not target order.
#[derive(Debug, Default)]
pub struct CollectionReport {
    /// Inventories of targets that completed
    pub inventories: Vec<Inventory>,
    /// Terminal errors of targets that failed, each naming its target
    pub errors: Vec<InventoryError>,
}

impl CollectionReport {
    /// Total resources across successful targets
    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.inventories.iter().map(Inventory::len).sum()
    }

    /// Whether no target completed
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.inventories.is_empty()
    }

    /// Merge successful inventories, reporting failures as warnings
    ///
    /// # Errors
    /// Returns the first target error if every target failed, or
    /// `NoResources` if the merged inventory is empty.
    pub fn into_inventory(self) -> Result<Inventory, InventoryError> {
        for err in &self.errors {
            warn!(error = %err, "target collection failed");
        }

        if self.inventories.is_empty()
            && let Some(first) = self.errors.into_iter().next()
        {
            return Err(first);
        }

        let merged = merge_inventories(self.inventories);
        if merged.is_empty() {
            return Err(InventoryError::NoResources);
        }
        Ok(merged)
    }
}

/// Result delivered by one collection worker
struct TargetResult {
    target: String,
    result: Result<Inventory, InventoryError>,
}

/// Inventory collector
///
/// Runs data sources, alone or concurrently, under a shared cancel signal.
#[derive(Debug, Clone, Default)]
pub struct Collector {
    cancel: CancelSignal,
}

impl Collector {
    /// Create a new collector with its own cancel signal
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an externally owned cancel signal
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle onto the signal governing this collector's workers
    #[must_use]
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// Collect from a single data source
    ///
    /// # Errors
    /// Returns the source's terminal error wrapped with its name and target,
    /// or `Cancelled` if the cancel signal fires first.
    #[instrument(skip(self, source), fields(source = source.name(), target = source.target()))]
    pub async fn collect_from_source(
        &self,
        source: &dyn DataSource,
    ) -> Result<Inventory, InventoryError> {
        run_source(source, &self.cancel).await
    }

    /// Collect from many targets concurrently
    ///
    /// One task per target. A failing target never affects its siblings;
    /// its error lands in the report next to the other targets' inventories.
    #[instrument(skip(self, sources), fields(targets = sources.len()))]
    pub async fn collect_from_targets(
        &self,
        sources: Vec<Arc<dyn DataSource>>,
    ) -> CollectionReport {
        info!("collecting from targets");

        let (tx, mut rx) = mpsc::channel::<TargetResult>(sources.len().max(1));
        let mut handles = Vec::with_capacity(sources.len());

        for source in sources {
            let tx = tx.clone();
            let cancel = self.cancel.clone();
            let name = source.name().to_string();
            let target = source.target().to_string();

            let worker_target = target.clone();
            let handle = tokio::spawn(async move {
                let result = run_source(source.as_ref(), &cancel).await;
                // Receiver outlives every worker
                let _ = tx
                    .send(TargetResult {
                        target: worker_target,
                        result,
                    })
                    .await;
            });
            handles.push((name, target, handle));
        }
        drop(tx);

        let mut report = CollectionReport::default();
        while let Some(TargetResult { target, result }) = rx.recv().await {
            match result {
                Ok(inventory) => {
                    debug!(%target, resources = inventory.len(), "target completed");
                    report.inventories.push(inventory);
                }
                Err(e) => {
                    debug!(%target, error = %e, "target failed");
                    report.errors.push(e);
                }
            }
        }

        // A panicked worker never sends; surface it from its join handle
        for (name, target, handle) in handles {
            if let Err(e) = handle.await {
                report
                    .errors
                    .push(InventoryError::TaskFailed(e.to_string()).in_source(name, target));
            }
        }

        info!(
            succeeded = report.inventories.len(),
            failed = report.errors.len(),
            resources = report.resource_count(),
            "collection completed"
        );

        report
    }
}

/// Run one source to completion or cancellation
async fn run_source(
    source: &dyn DataSource,
    cancel: &CancelSignal,
) -> Result<Inventory, InventoryError> {
    let name = source.name();
    let target = source.target();

    if cancel.is_cancelled() {
        return Err(InventoryError::Cancelled {
            target: target.to_string(),
        }
        .in_source(name, target));
    }

    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(InventoryError::Cancelled {
            target: target.to_string(),
        }),
        collected = source.collect() => collected,
    };

    match result {
        Ok(resources) => {
            info!(source = name, target, count = resources.len(), "collected resources");
            Ok(Inventory::from_resources(resources))
        }
        Err(e) => Err(e.in_source(name, target)),
    }
}

/// Concatenate inventories in the order given
///
/// No deduplication and no conflict resolution.
pub fn merge_inventories(inventories: impl IntoIterator<Item = Inventory>) -> Inventory {
    let mut merged = Inventory::new();
    for inventory in inventories {
        merged.append(inventory);
    }
    merged
}
