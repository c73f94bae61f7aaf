//! Persistence service: debounced write-back of chart edits.
//!
//! DESIGN
//! ======
//! Every mutation updates the in-memory chart at once and records an entry
//! in `PendingWrites`, keyed by entity. Repeated edits of the same entity
//! coalesce into one entry. A background task ticks every `write_tick`;
//! once the map has been quiet for `write_debounce`, it drains the map,
//! snapshots the affected rows under the lock, drops the lock, and writes
//! everything in one transaction. A drag that emits a move per pointer event
//! therefore costs a single upsert.
//!
//! ERROR HANDLING
//! ==============
//! A failed flush is logged and its batch dropped. There are no retries and
//! local state is never rolled back; the next edit of an entity writes its
//! full row again.

use std::collections::HashMap;
use std::time::Duration;

use canvas::doc::{ChartDoc, Connection, DecorativeLine, Person, Sector};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::state::AppState;

// =============================================================================
// PENDING WRITES
// =============================================================================

/// Entity table. Declaration order is the upsert order (parents first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Sector,
    Person,
    Connection,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityKey {
    #[must_use]
    pub fn sector(id: Uuid) -> Self {
        Self { kind: EntityKind::Sector, id }
    }

    #[must_use]
    pub fn person(id: Uuid) -> Self {
        Self { kind: EntityKind::Person, id }
    }

    #[must_use]
    pub fn connection(id: Uuid) -> Self {
        Self { kind: EntityKind::Connection, id }
    }

    #[must_use]
    pub fn line(id: Uuid) -> Self {
        Self { kind: EntityKind::Line, id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Upsert,
    Delete,
}

/// Coalescing map of writes not yet flushed.
#[derive(Debug, Default)]
pub struct PendingWrites {
    ops: HashMap<EntityKey, WriteOp>,
    last_touched: Option<Instant>,
}

impl PendingWrites {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that an entity's row must be written. A pending delete wins.
    pub fn mark_upsert(&mut self, key: EntityKey) {
        self.ops.entry(key).or_insert(WriteOp::Upsert);
        self.last_touched = Some(Instant::now());
    }

    /// Record that an entity's row must be removed. Supersedes any upsert.
    pub fn mark_delete(&mut self, key: EntityKey) {
        self.ops.insert(key, WriteOp::Delete);
        self.last_touched = Some(Instant::now());
    }

    #[cfg(test)]
    #[must_use]
    pub fn op(&self, key: &EntityKey) -> Option<WriteOp> {
        self.ops.get(key).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// True once `window` has elapsed since the last mark.
    #[must_use]
    pub fn is_quiet(&self, now: Instant, window: Duration) -> bool {
        self.last_touched
            .is_none_or(|t| now.saturating_duration_since(t) >= window)
    }

    /// Empty the map into a batch, upserts and deletes each sorted by table then id.
    pub fn drain(&mut self) -> WriteBatch {
        let mut batch = WriteBatch::default();
        for (key, op) in self.ops.drain() {
            match op {
                WriteOp::Upsert => batch.upserts.push(key),
                WriteOp::Delete => batch.deletes.push(key),
            }
        }
        batch.upserts.sort();
        batch.deletes.sort();
        self.last_touched = None;
        batch
    }
}

/// Keys drained from `PendingWrites`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    pub upserts: Vec<EntityKey>,
    pub deletes: Vec<EntityKey>,
}

impl WriteBatch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.upserts.len() + self.deletes.len()
    }

    /// Resolve keys into full rows. Upserts of entities that no longer exist are skipped.
    #[must_use]
    pub fn rows(&self, doc: &ChartDoc) -> FlushRows {
        let mut rows = FlushRows::default();
        for key in &self.upserts {
            match key.kind {
                EntityKind::Sector => rows.sectors.extend(doc.sector(&key.id).cloned()),
                EntityKind::Person => rows.people.extend(doc.person(&key.id).cloned()),
                EntityKind::Connection => rows.connections.extend(doc.connection(&key.id).cloned()),
                EntityKind::Line => rows.lines.extend(doc.line(&key.id).cloned()),
            }
        }
        for key in &self.deletes {
            let ids = match key.kind {
                EntityKind::Sector => &mut rows.deleted_sectors,
                EntityKind::Person => &mut rows.deleted_people,
                EntityKind::Connection => &mut rows.deleted_connections,
                EntityKind::Line => &mut rows.deleted_lines,
            };
            ids.push(key.id);
        }
        rows
    }
}

/// Row snapshots handed to `db::flush_writes`, taken under the chart lock.
#[derive(Debug, Default, Clone)]
pub struct FlushRows {
    pub sectors: Vec<Sector>,
    pub people: Vec<Person>,
    pub connections: Vec<Connection>,
    pub lines: Vec<DecorativeLine>,
    pub deleted_sectors: Vec<Uuid>,
    pub deleted_people: Vec<Uuid>,
    pub deleted_connections: Vec<Uuid>,
    pub deleted_lines: Vec<Uuid>,
}

impl FlushRows {
    #[must_use]
    pub fn len(&self) -> usize {
        self.sectors.len()
            + self.people.len()
            + self.connections.len()
            + self.lines.len()
            + self.deleted_sectors.len()
            + self.deleted_people.len()
            + self.deleted_connections.len()
            + self.deleted_lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// BACKGROUND TASK
// =============================================================================

/// Spawn the background write-back task. Returns a handle for shutdown.
///
/// The loop stops on the first change to `shutdown` or when its sender is dropped.
/// It checks only between ticks, so a flush already in progress always
/// finishes; await the handle before calling `flush_now`.
pub fn spawn_persistence_task(state: AppState, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    let tick = state.config.write_tick;
    info!(
        tick_ms = tick.as_millis(),
        debounce_ms = state.config.write_debounce.as_millis(),
        "chart write-back configured"
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if let Some(rows) = take_ready_rows(&state, Instant::now()).await {
                write_rows(&state, &rows).await;
            }
        }
        info!("chart write-back stopped");
    })
}

/// Flush everything pending regardless of the debounce window.
/// Used at shutdown. Returns the number of rows written or deleted.
pub async fn flush_now(state: &AppState) -> usize {
    let rows = {
        let mut chart = state.chart.write().await;
        if chart.pending.is_empty() {
            return 0;
        }
        info!(pending = chart.pending.len(), "flushing pending chart writes");
        let batch = chart.pending.drain();
        batch.rows(&chart.doc)
    };
    write_rows(state, &rows).await;
    rows.len()
}

/// Drain pending writes if the chart has been quiet long enough.
pub(crate) async fn take_ready_rows(state: &AppState, now: Instant) -> Option<FlushRows> {
    // PHASE: SNAPSHOT UNDER LOCK
    // WHY: clone rows while holding the lock, then write lock-free.
    let mut chart = state.chart.write().await;
    if chart.pending.is_empty() || !chart.pending.is_quiet(now, state.config.write_debounce) {
        return None;
    }
    let batch = chart.pending.drain();
    debug!(count = batch.len(), upserts = batch.upserts.len(), "draining pending chart writes");
    Some(batch.rows(&chart.doc))
}

async fn write_rows(state: &AppState, rows: &FlushRows) {
    match crate::db::flush_writes(&state.pool, rows).await {
        Ok(()) => debug!(count = rows.len(), "chart writes flushed"),
        Err(e) => error!(error = %e, count = rows.len(), "chart flush failed; dropping batch"),
    }
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
