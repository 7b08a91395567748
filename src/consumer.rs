use crate::assistant::Assistant;
use crate::sink::RuleSink;
use crate::store::ResultStore;
use std::sync::Arc;

/// Drains the result store to the sink in publication order (§4.5).
/// Started only when `real_time` is enabled; otherwise the driver emits the
/// final snapshot itself once mining completes.
pub fn run(store: &ResultStore, sink: &dyn RuleSink, assistant: &dyn Assistant) {
    log::info!("rule consumer starting");
    if let Err(err) = sink.write_header(&assistant.header()) {
        log::error!("failed to write rule sink header: {err}");
        return;
    }

    let mut last_consumed = 0;
    loop {
        let (new_rules, done) = store.wait_for_new(last_consumed);
        for rule in &new_rules {
            emit(sink, assistant, rule);
        }
        last_consumed += new_rules.len();
        if done {
            break;
        }
    }

    log::info!("rule consumer terminating after {last_consumed} rules");
    if let Err(err) = sink.flush() {
        log::error!("failed to flush rule sink: {err}");
    }
}

/// Emits every rule from a finished store in one pass, used when
/// `real_time` is disabled (§4.5, §8 scenario 6).
pub fn drain_all(store: &ResultStore, sink: &dyn RuleSink, assistant: &dyn Assistant) {
    if let Err(err) = sink.write_header(&assistant.header()) {
        log::error!("failed to write rule sink header: {err}");
        return;
    }
    for rule in store.snapshot() {
        emit(sink, assistant, &rule);
    }
    if let Err(err) = sink.flush() {
        log::error!("failed to flush rule sink: {err}");
    }
}

fn emit(sink: &dyn RuleSink, assistant: &dyn Assistant, rule: &Arc<crate::rule::Rule>) {
    let formatted = assistant.format(rule);
    if let Err(err) = sink.write_rule(&formatted) {
        log::error!("failed to write rule to sink: {err}");
    }
}
