//! Keyed session store backing pagination.
//!
//! Each session token maps to the last submitted query model and its
//! projected records, so a "next page" request can re-run the same query with
//! only the page number changed. Entries expire a fixed TTL after their last
//! write; the store is internally synchronized and safe to share across
//! request handlers.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::query::QueryModel;
use crate::results::DisplayRecord;

/// How long a session survives without a new search.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
struct Slot {
    model: QueryModel,
    records: Vec<DisplayRecord>,
    written: Instant,
}

/// Session-keyed cache of the last query and its results.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Store the query and projected records for a token, refreshing its
    /// expiry and dropping any other expired sessions.
    pub fn put(&self, token: &str, model: QueryModel, records: Vec<DisplayRecord>) {
        let mut slots = self.lock();
        let ttl = self.ttl;
        slots.retain(|_, slot| slot.written.elapsed() < ttl);
        slots.insert(
            token.to_string(),
            Slot {
                model,
                records,
                written: Instant::now(),
            },
        );
    }

    /// The last query model stored for a token, if the session is live.
    #[must_use]
    pub fn model(&self, token: &str) -> Option<QueryModel> {
        self.live(token, |slot| slot.model.clone())
    }

    /// The cached display record for a document id within a session.
    #[must_use]
    pub fn record(&self, token: &str, id: &str) -> Option<DisplayRecord> {
        self.live(token, |slot| {
            slot.records.iter().find(|r| r.id == id).cloned()
        })
        .flatten()
    }

    fn live<T>(&self, token: &str, read: impl FnOnce(&Slot) -> T) -> Option<T> {
        let mut slots = self.lock();
        match slots.get(token) {
            Some(slot) if slot.written.elapsed() < self.ttl => Some(read(slot)),
            Some(_) => {
                slots.remove(token);
                None
            }
            None => None,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
