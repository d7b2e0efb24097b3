use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::residents::ResidentId;

/// Tracks which residents and officers currently hold an open chat session.
pub trait PresenceRegistry: Send + Sync {
    fn connect(&self, who: &ResidentId);
    fn disconnect(&self, who: &ResidentId);
    fn is_online(&self, who: &ResidentId) -> bool;
    fn online(&self) -> Vec<ResidentId>;
}

/// Presence held in this process only. A second instance sees its own sessions.
///
/// Sessions are counted so a user with two open tabs stays online until both close.
#[derive(Debug, Default)]
pub struct InMemoryPresence {
    sessions: Mutex<BTreeMap<ResidentId, usize>>,
}

impl InMemoryPresence {
    fn with_sessions<T>(&self, f: impl FnOnce(&mut BTreeMap<ResidentId, usize>) -> T) -> T {
        let mut guard = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl PresenceRegistry for InMemoryPresence {
    fn connect(&self, who: &ResidentId) {
        self.with_sessions(|sessions| *sessions.entry(who.clone()).or_insert(0) += 1);
    }

    fn disconnect(&self, who: &ResidentId) {
        self.with_sessions(|sessions| {
            if let Some(count) = sessions.get_mut(who) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    sessions.remove(who);
                }
            }
        });
    }

    fn is_online(&self, who: &ResidentId) -> bool {
        self.with_sessions(|sessions| sessions.contains_key(who))
    }

    fn online(&self) -> Vec<ResidentId> {
        self.with_sessions(|sessions| sessions.keys().cloned().collect())
    }
}
