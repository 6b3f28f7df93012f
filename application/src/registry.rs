//! Session registry: the only state shared between concurrent generations.
//!
//! Maps a [`SessionId`] to the cancellation token of the generation that is
//! currently streaming for it. Three operations mutate the map:
//!
//! - [`SessionRegistry::register`] inserts, or fails with [`AlreadyActive`]
//! - [`SessionRegistry::cancel`] removes and triggers the token (a stop)
//! - [`SessionRegistry::release`] removes without triggering (a cleanup)
//!
//! `cancel` and `release` both remove, so when a stop races a stream that is
//! finishing on its own, exactly one of them observes the entry. The loser
//! sees nothing to remove and does nothing.
//!
//! Each registration gets a generation number. `release` only removes the
//! entry carrying its own number, so a generation that is still finalizing
//! after being stopped cannot evict a newer generation for the same session.

use chatrelay_domain::SessionId;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// A start was rejected because the session already has a generation streaming.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Session {0} already has an active generation")]
pub struct AlreadyActive(pub SessionId);

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// An active generation was found and cancelled.
    Stopped,
    /// Nothing was streaming for the session.
    NotFound,
}

impl StopOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, StopOutcome::Stopped)
    }
}

#[derive(Debug)]
struct ActiveEntry {
    generation: u64,
    token: CancellationToken,
}

/// Concurrency-safe map of the sessions that are currently streaming.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: DashMap<SessionId, ActiveEntry>,
    next_generation: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as the active generation for `session_id`.
    ///
    /// The returned [`Registration`] releases the entry when it is released
    /// explicitly or dropped, whichever comes first.
    pub fn register(
        self: &Arc<Self>,
        session_id: SessionId,
        token: CancellationToken,
    ) -> Result<Registration, AlreadyActive> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;

        match self.entries.entry(session_id.clone()) {
            Entry::Occupied(_) => {
                debug!(session_id = %session_id, "Rejected start: generation already active");
                Err(AlreadyActive(session_id))
            }
            Entry::Vacant(vacant) => {
                vacant.insert(ActiveEntry {
                    generation,
                    token: token.clone(),
                });
                trace!(session_id = %session_id, generation, "Registered generation");
                Ok(Registration {
                    registry: Arc::clone(self),
                    session_id,
                    generation,
                    token,
                    released: false,
                })
            }
        }
    }

    /// Stop the active generation for `session_id`, if any.
    ///
    /// The entry is removed before the token is triggered, so the
    /// generation's own release observes that it lost the race.
    pub fn cancel(&self, session_id: &SessionId) -> StopOutcome {
        match self.entries.remove(session_id) {
            Some((_, entry)) => {
                entry.token.cancel();
                debug!(
                    session_id = %session_id,
                    generation = entry.generation,
                    "Cancelled generation"
                );
                StopOutcome::Stopped
            }
            None => StopOutcome::NotFound,
        }
    }

    /// Remove the entry for `session_id` if it still belongs to `generation`.
    ///
    /// Does not trigger cancellation. Returns `true` if this call removed
    /// the entry and `false` if it was already gone.
    pub fn release(&self, session_id: &SessionId, generation: u64) -> bool {
        let removed = self
            .entries
            .remove_if(session_id, |_, entry| entry.generation == generation)
            .is_some();
        trace!(session_id = %session_id, generation, removed, "Released generation");
        removed
    }

    /// Cancel every active generation. Returns how many were stopped.
    pub fn cancel_all(&self) -> usize {
        let ids = self.active_sessions();
        ids.iter()
            .filter(|id| self.cancel(id).is_stopped())
            .count()
    }

    pub fn is_active(&self, session_id: &SessionId) -> bool {
        self.entries.contains_key(session_id)
    }

    /// Snapshot of the active session ids, sorted.
    pub fn active_sessions(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.entries.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ownership of one registry entry for the lifetime of a generation.
///
/// Dropping a `Registration` without calling [`release`](Registration::release)
/// still removes the entry, so a panicking or aborted generation cannot
/// leave its session stuck as active.
#[derive(Debug)]
pub struct Registration {
    registry: Arc<SessionRegistry>,
    session_id: SessionId,
    generation: u64,
    token: CancellationToken,
    released: bool,
}

impl Registration {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token triggered by a stop request for this generation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Remove this generation's entry.
    ///
    /// Returns `true` if the entry was still present, `false` if a stop
    /// request removed it first.
    pub fn release(mut self) -> bool {
        self.released = true;
        self.registry.release(&self.session_id, self.generation)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if !self.released {
            self.registry.release(&self.session_id, self.generation);
        }
    }
}
