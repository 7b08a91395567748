use crate::assistant::Assistant;
use crate::config::MiningConfig;
use crate::pruning;
use crate::queue::{Dequeued, WorkQueue};
use crate::rule::{Candidate, DANGLING};
use crate::store::ResultStore;

/// Runs one worker's loop (§4.3) until the queue proves quiescence. Spawned
/// once per configured thread by [`crate::engine::mine`]; never touches the
/// KB directly — every KB-dependent decision is delegated to `assistant`.
pub fn run(
    queue: &WorkQueue,
    store: &ResultStore,
    assistant: &dyn Assistant,
    config: &MiningConfig,
) {
    loop {
        let mut candidate = match queue.dequeue() {
            Dequeued::Candidate(c) => c,
            Dequeued::Terminated => {
                queue.decrement_active_workers();
                return;
            }
        };

        if let Some(published) = decide_output(&mut candidate, store, assistant, config) {
            store.publish(published);
        }

        if pruning::should_refine(&candidate, config) {
            refine(&candidate, queue, assistant, config);
        }
    }
}

/// Step 2: the output decision. Returns the candidate (with its final
/// confidence fields filled in) if it clears every gate, otherwise `None`.
fn decide_output(
    candidate: &mut Candidate,
    store: &ResultStore,
    assistant: &dyn Assistant,
    config: &MiningConfig,
) -> Option<Candidate> {
    if !assistant.should_output(candidate) {
        return None;
    }
    if !assistant.compute_confidence_bounds(candidate) {
        log::debug!(
            "candidate dropped by support/head-coverage gate: {:?}",
            candidate.head()
        );
        return None;
    }
    let hash = candidate.alternative_parent_hash();
    let parents = store.parents_for_hash(hash);
    assistant.set_additional_parents(candidate, &parents);

    assistant.compute_confidence_metrics(candidate);

    if !pruning::is_output_eligible(candidate, &parents, config, assistant) {
        log::debug!(
            "candidate dropped by confidence/skyline gate: {:?}",
            candidate.head()
        );
        return None;
    }
    Some(candidate.clone())
}

/// Step 4: operator application and enqueueing, gating dangling children on
/// the reserved depth slot (§4.3 step 4, §4.6).
fn refine(candidate: &Candidate, queue: &WorkQueue, assistant: &dyn Assistant, config: &MiningConfig) {
    let threshold = pruning::count_threshold(candidate, assistant, config);
    let children = match assistant.apply_operators(candidate, threshold) {
        Ok(children) => children,
        Err(err) => {
            log::warn!("operator application failed, dropping candidate: {err}");
            return;
        }
    };

    let admits_dangling = pruning::admits_dangling(candidate.real_length, config);
    let mut to_enqueue = Vec::new();
    for (key, rules) in children {
        if key == DANGLING && !admits_dangling {
            continue;
        }
        to_enqueue.extend(rules);
    }
    queue.enqueue_all(to_enqueue);
}
