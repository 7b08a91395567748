use crate::rule::{Candidate, Rule};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

struct StoreState {
    ordered: Vec<Arc<Rule>>,
    by_parent_hash: HashMap<u64, Vec<Arc<Rule>>>,
    done: bool,
}

/// The result store (§4.4): an append-only ordered list plus a dedup index
/// keyed by `alternative_parent_hash`, both behind one mutex. A single
/// condition variable wakes the consumer thread.
pub struct ResultStore {
    state: Mutex<StoreState>,
    published: Condvar,
}

impl ResultStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                ordered: Vec::new(),
                by_parent_hash: HashMap::new(),
                done: false,
            }),
            published: Condvar::new(),
        }
    }

    /// Rules already published under this candidate's dedup hash, fetched
    /// under the result lock so skyline pruning sees every ancestor
    /// published so far (§4.3 step 2b).
    pub fn parents_for_hash(&self, hash: u64) -> Vec<Arc<Rule>> {
        self.state
            .lock()
            .unwrap()
            .by_parent_hash
            .get(&hash)
            .cloned()
            .unwrap_or_default()
    }

    /// Publishes `rule`. The dedup bucket is a genuine collection from its
    /// very first insert (§9 second open question) — never a bare rule —
    /// so a later duplicate is always caught by the `structurally_equal`
    /// scan below. A structural duplicate is an invariant violation and
    /// aborts the process with a diagnostic (§7).
    pub fn publish(&self, rule: Candidate) -> Arc<Rule> {
        let hash = rule.alternative_parent_hash();
        let rule = Arc::new(rule);
        let mut state = self.state.lock().unwrap();
        match state.by_parent_hash.get_mut(&hash) {
            None => {
                state.by_parent_hash.insert(hash, vec![rule.clone()]);
            }
            Some(bucket) => {
                if bucket.iter().any(|r| r.structurally_equal(&rule)) {
                    log::error!(
                        "duplicate rule publication detected for hash {hash}: {:?}",
                        rule.head()
                    );
                    drop(state);
                    std::process::abort();
                }
                bucket.push(rule.clone());
            }
        }
        state.ordered.push(rule.clone());
        drop(state);
        self.published.notify_all();
        rule
    }

    /// Blocks until at least one rule has been published beyond
    /// `last_consumed`, or `terminate()` has been called. Returns the new
    /// rules (possibly empty, if `done` was already set) and whether the
    /// store is done.
    pub fn wait_for_new(&self, last_consumed: usize) -> (Vec<Arc<Rule>>, bool) {
        let mut state = self.state.lock().unwrap();
        while state.ordered.len() == last_consumed && !state.done {
            state = self.published.wait(state).unwrap();
        }
        let new_items = state.ordered[last_consumed..].to_vec();
        (new_items, state.done)
    }

    /// Signals the consumer that no further rules will be published.
    pub fn terminate(&self) {
        let mut state = self.state.lock().unwrap();
        state.done = true;
        drop(state);
        self.published.notify_all();
    }

    /// A snapshot of every published rule in publication order, used by the
    /// driver when `real_time` is disabled.
    pub fn snapshot(&self) -> Vec<Arc<Rule>> {
        self.state.lock().unwrap().ordered.clone()
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}
