//! Background timers driving the sync orchestrators.
//!
//! - catalog: once at start if nothing is cached, then hourly
//! - reference data: once at start (only syncs when stale), then daily
//! - inventory: the current working set every minute, and immediately
//!   whenever the working set changes
//!
//! Stopping a scheduler prevents future firings only; a sync that is already
//! running finishes before its task exits.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};

use crate::config;
use crate::sync::{CatalogSync, InventorySync, InventorySyncResult, ReferenceSync, SyncResult};

#[derive(Debug, Clone, Copy)]
pub struct SchedulerIntervals {
    pub catalog: Duration,
    pub reference: Duration,
    pub inventory: Duration,
}

impl Default for SchedulerIntervals {
    fn default() -> Self {
        Self {
            catalog: config::CATALOG_SYNC_INTERVAL,
            reference: config::REFERENCE_SYNC_INTERVAL,
            inventory: config::INVENTORY_SYNC_INTERVAL,
        }
    }
}

pub struct SyncScheduler {
    catalog: CatalogSync,
    inventory: InventorySync,
    reference: ReferenceSync,
    intervals: SchedulerIntervals,
}

impl SyncScheduler {
    pub fn new(catalog: CatalogSync, inventory: InventorySync, reference: ReferenceSync) -> Self {
        Self {
            catalog,
            inventory,
            reference,
            intervals: SchedulerIntervals::default(),
        }
    }

    pub fn with_intervals(mut self, intervals: SchedulerIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    /// Spawn the three timer tasks on the current tokio runtime.
    ///
    /// Must be called from within a runtime. Dropping the returned handle
    /// stops the timers the same way [`SchedulerHandle::stop`] does.
    pub fn start(self, working_set: Vec<u64>) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (working_set_tx, working_set_rx) = watch::channel(working_set);

        let tasks = vec![
            tokio::spawn(run_catalog(
                self.catalog,
                self.intervals.catalog,
                shutdown_rx.clone(),
            )),
            tokio::spawn(run_reference(
                self.reference,
                self.intervals.reference,
                shutdown_rx.clone(),
            )),
            tokio::spawn(run_inventory(
                self.inventory,
                self.intervals.inventory,
                working_set_rx,
                shutdown_rx,
            )),
        ];

        tracing::info!(
            catalog = ?self.intervals.catalog,
            reference = ?self.intervals.reference,
            inventory = ?self.intervals.inventory,
            "auto-sync started"
        );

        SchedulerHandle {
            shutdown: shutdown_tx,
            working_set: working_set_tx,
            tasks,
        }
    }
}

/// Controls a running [`SyncScheduler`].
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    working_set: watch::Sender<Vec<u64>>,
    tasks: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Replace the inventory working set. A changed set is synced right away.
    pub fn set_working_set(&self, product_ids: Vec<u64>) {
        self.working_set.send_if_modified(|current| {
            if *current == product_ids {
                false
            } else {
                *current = product_ids;
                true
            }
        });
    }

    pub fn working_set(&self) -> Vec<u64> {
        self.working_set.borrow().clone()
    }

    /// Prevent any further firings.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Stop and wait for every task to exit, including any sync in flight.
    pub async fn shutdown(self) {
        self.stop();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "sync task ended abnormally");
            }
        }
        tracing::info!("auto-sync stopped");
    }
}

async fn run_catalog(catalog: CatalogSync, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let has_products = catalog
        .stored_products()
        .map(|products| !products.is_empty())
        .unwrap_or(false);
    if !has_products && !*shutdown.borrow() {
        tracing::info!("no cached products - running initial sync");
        log_catalog(&catalog.sync_products().await);
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => log_catalog(&catalog.sync_products().await),
        }
    }
}

async fn run_reference(
    reference: ReferenceSync,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    if !*shutdown.borrow() {
        if let Err(e) = reference.get().await {
            tracing::warn!(error = %e, "initial static data sync failed");
        }
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                if let Err(e) = reference.sync_all().await {
                    tracing::warn!(error = %e, "scheduled static data sync failed");
                }
            }
        }
    }
}

async fn run_inventory(
    inventory: InventorySync,
    period: Duration,
    mut working_set: watch::Receiver<Vec<u64>>,
    mut shutdown: watch::Receiver<bool>,
) {
    // First tick completes immediately.
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            changed = working_set.changed() => {
                if changed.is_err() {
                    break;
                }
                tracing::debug!("working set changed - syncing inventory now");
                ticker.reset();
            }
            _ = ticker.tick() => {}
        }
        if *shutdown.borrow() {
            break;
        }

        let ids = working_set.borrow_and_update().clone();
        if ids.is_empty() {
            continue;
        }
        log_inventory(&inventory.sync_inventory(&ids).await);
    }
}

fn log_catalog(result: &SyncResult) {
    match &result.error {
        None => tracing::info!(total = result.products.len(), "product sync: {}", result.message),
        Some(failure) => tracing::warn!(kind = ?failure.kind, "product sync failed: {}", failure.message),
    }
}

fn log_inventory(result: &InventorySyncResult) {
    match &result.error {
        None => tracing::debug!(updated = result.products_updated, "inventory sync: {}", result.message),
        Some(failure) => tracing::warn!(kind = ?failure.kind, "inventory sync failed: {}", failure.message),
    }
}
