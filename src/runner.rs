//! Runs cycles against the collaborators and the history file.
//!
//! The runner owns the process-wide RNG, seeded once from the OS when the
//! runner is built, so consecutive cycles draw from one stream.

use chrono::NaiveDateTime;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::catalog::{self, Catalog};
use crate::config::EngineConfig;
use crate::cycle::{CycleOutcome, run_cycle};
use crate::error::Result;
use crate::history::HistoryStore;
use crate::pinning::{Notifier, Pinner, format_pin_message};

/// Pin/notify counts for one executed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinReport {
    pub pinned: usize,
    pub failed: usize,
}

pub struct CycleRunner {
    config: EngineConfig,
    store: HistoryStore,
    catalog: Box<dyn Catalog>,
    pinner: Box<dyn Pinner>,
    notifier: Option<Box<dyn Notifier>>,
    rng: StdRng,
}

impl std::fmt::Debug for CycleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleRunner")
            .field("history", &self.store.path())
            .finish_non_exhaustive()
    }
}

impl CycleRunner {
    pub fn new(config: EngineConfig, store: HistoryStore, catalog: Box<dyn Catalog>, pinner: Box<dyn Pinner>) -> Self {
        Self {
            config,
            store,
            catalog,
            pinner,
            notifier: None,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Replace the RNG, e.g. with a seeded one for reproducible runs.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Compute selections without pinning or touching history.
    pub fn preview(&mut self, now: NaiveDateTime) -> CycleOutcome {
        let snapshot = catalog::snapshot(self.catalog.as_ref(), &self.config.library_names);
        run_cycle(&self.config, &snapshot, self.store.records(), now, &mut self.rng)
    }

    /// Run one full cycle: evict expired history, select, reset and pin each
    /// library, notify, then persist history.
    ///
    /// Pin and notification failures are logged per title and never stop the
    /// cycle. Only a failure to write history is returned as an error.
    pub fn run_once(&mut self, now: NaiveDateTime) -> Result<(CycleOutcome, PinReport)> {
        let recent = self.store.recently_pinned(self.config.cooldown, now)?;
        log::info!("{} titles are still in their cool-down window", recent.len());

        let outcome = self.preview(now);
        let mut report = PinReport::default();

        for selection in &outcome.selections {
            if let Err(e) = self.pinner.reset(&selection.library, &self.config.explicit_exclusions) {
                log::error!("Failed to unpin collections in library '{}': {}", selection.library, e);
            }

            for collection in &selection.collections {
                match self.pinner.pin(&selection.library, collection) {
                    Ok(()) => {
                        report.pinned += 1;
                        log::info!("Collection '{}' pinned successfully.", collection.title);
                        if let Some(notifier) = &self.notifier {
                            let message = format_pin_message(&collection.title, collection.item_count);
                            if let Err(e) = notifier.notify(&message) {
                                log::warn!("Failed to send pin notification for '{}': {}", collection.title, e);
                            }
                        }
                    }
                    Err(e) => {
                        report.failed += 1;
                        log::error!("Error while pinning collection: {}. Error: {}", collection.title, e);
                    }
                }
            }
        }

        self.store.replace(outcome.history.clone())?;
        if let Some(record) = &outcome.recorded {
            log::info!("Recorded {} pinned titles in history", record.titles.len());
        }

        Ok((outcome, report))
    }
}
