//! Inventory Auditor
//!
//! Turns inventory events and successive snapshots into audit log entries.

use std::fmt::Display;

use jiff::Timestamp;
use tracing::{debug, info, warn};

use crate::{
    audit::{AuditError, AuditLogEntry, AuditPayload, AuditSink},
    ids::AuditEntryId,
    inventory::{InventoryEvent, InventorySnapshot, diff},
};

/// Module name recorded when none is configured.
pub const DEFAULT_MODULE: &str = "inventory";

/// What an observed fetch did to the log.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Observation {
    /// First snapshot; accepted as the baseline without recording anything.
    Baseline {
        /// Rows in the baseline
        rows: usize,
    },

    /// Snapshot diffed against the baseline and accepted.
    Reconciled {
        /// Entries recorded for new rows
        added: usize,

        /// Entries recorded for vanished rows
        removed: usize,
    },

    /// Fetch failed; one error entry recorded and the baseline kept.
    FetchFailed,
}

/// Records inventory changes to an [`AuditSink`].
///
/// Holds the last accepted snapshot so a data layer without change events can still be audited by
/// diffing each fetch against it.
#[derive(Debug)]
pub struct InventoryAuditor<S> {
    sink: S,
    module: String,
    baseline: Option<InventorySnapshot>,
    next_id: u64,
}

impl<S: AuditSink> InventoryAuditor<S> {
    /// Create an auditor with no baseline, recording under [`DEFAULT_MODULE`].
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            module: DEFAULT_MODULE.to_string(),
            baseline: None,
            next_id: 1,
        }
    }

    /// Record entries under a different module name.
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    /// Module name recorded on entries.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Last accepted snapshot.
    pub fn baseline(&self) -> Option<&InventorySnapshot> {
        self.baseline.as_ref()
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consume the auditor and return the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Replace the baseline without diffing, e.g. after the admin switched page or filter.
    pub fn rebase(&mut self, snapshot: InventorySnapshot) {
        debug!(page = snapshot.context.page, rows = snapshot.len(), "rebased inventory baseline");

        self.baseline = Some(snapshot);
    }

    /// Observe the result of fetching a listing.
    ///
    /// A failed fetch records one `Error` entry and keeps the baseline. The first successful fetch
    /// becomes the baseline. Later fetches are diffed against it: one `Add` entry per new row, one
    /// `Delete` entry per vanished row, and the fetch replaces the baseline.
    ///
    /// # Errors
    ///
    /// - [`AuditError::Diff`]: the snapshot comes from a different query than the baseline. Nothing
    ///   is recorded and the baseline is kept.
    /// - [`AuditError::Description`]: an entry could not be encoded.
    pub fn observe<E: Display>(
        &mut self,
        fetch: Result<InventorySnapshot, E>,
        now: Timestamp,
    ) -> Result<Observation, AuditError> {
        let current = match fetch {
            Ok(snapshot) => snapshot,
            Err(error) => {
                let message = error.to_string();

                warn!(error = %message, "inventory fetch failed");

                let context = self.baseline.as_ref().map(|s| s.context.clone());
                self.append(AuditPayload::Error { message, context }, now)?;

                return Ok(Observation::FetchFailed);
            }
        };

        let Some(previous) = &self.baseline else {
            let rows = current.len();
            self.baseline = Some(current);

            return Ok(Observation::Baseline { rows });
        };

        let changes = diff(previous, &current).inspect_err(|error| {
            warn!(%error, "refusing to diff inventory snapshots");
        })?;

        let added = changes.added.len();
        let removed = changes.removed.len();

        for event in changes.into_events() {
            self.record(event, now)?;
        }

        self.baseline = Some(current);

        Ok(Observation::Reconciled { added, removed })
    }

    /// Record one event as one entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Description`] if the entry could not be encoded.
    pub fn record(
        &mut self,
        event: InventoryEvent,
        now: Timestamp,
    ) -> Result<AuditEntryId, AuditError> {
        self.append(AuditPayload::from(event), now)
    }

    fn append(&mut self, payload: AuditPayload, now: Timestamp) -> Result<AuditEntryId, AuditError> {
        let description = serde_json::to_string(&payload)?;

        let id = AuditEntryId::new(self.next_id);
        self.next_id += 1;

        let entry = AuditLogEntry {
            id,
            action: payload.action(),
            description,
            module: self.module.clone(),
            timestamp: now,
        };

        info!(entry = %id, action = %entry.action, module = %entry.module, "recorded audit entry");

        self.sink.append(entry);

        Ok(id)
    }
}
