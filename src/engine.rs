use crate::assistant::Assistant;
use crate::config::MiningConfig;
use crate::consumer;
use crate::error::MiningError;
use crate::queue::{QueueStats, WorkQueue};
use crate::seed;
use crate::sink::RuleSink;
use crate::store::ResultStore;
use crate::worker;
use std::collections::HashSet;
use std::sync::Arc;

/// Summary statistics returned once `mine()` has run to quiescence; the
/// rules themselves have already reached the sink by then.
#[derive(Debug, Clone, Copy)]
pub struct MiningReport {
    pub rules_emitted: usize,
    pub queue_stats: QueueStats,
}

/// Runs the full data flow (§2): Seed Generation → Work Queue → Worker Pool
/// → Result Store → Rule Consumer → sink. Blocks until the pool reaches
/// quiescence and every emitted rule has reached the sink.
pub fn mine(
    assistant: &(dyn Assistant + Sync),
    config: &MiningConfig,
    target_relations: Option<&HashSet<u32>>,
    sink: &(dyn RuleSink + Sync),
) -> Result<MiningReport, MiningError> {
    config.validate()?;

    let queue = Arc::new(WorkQueue::new(config.n_threads));
    let store = Arc::new(ResultStore::new());

    let seeds = seed::seed_rules(assistant, target_relations, config.min_initial_support);
    queue.enqueue_all(seeds);

    std::thread::scope(|scope| {
        let consumer_join = config.real_time.then(|| {
            let store = store.clone();
            scope.spawn(move || consumer::run(&store, sink, assistant))
        });

        let worker_handles: Vec<_> = (0..config.n_threads)
            .map(|_| {
                let queue = queue.clone();
                let store = store.clone();
                scope.spawn(move || worker::run(&queue, &store, assistant, config))
            })
            .collect();

        for handle in worker_handles {
            handle.join().expect("mining worker thread panicked");
        }

        store.terminate();

        if let Some(handle) = consumer_join {
            handle.join().expect("rule consumer thread panicked");
        }
    });

    if !config.real_time {
        consumer::drain_all(&store, sink, assistant);
    }

    Ok(MiningReport {
        rules_emitted: store.snapshot().len(),
        queue_stats: queue.stats(),
    })
}
