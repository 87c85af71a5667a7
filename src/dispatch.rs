//! Holds records until the panel exists, then flushes them once, in order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::model::LogRecord;

/// Receives records once the dispatcher is ready.
pub trait RecordSink: Send + Sync {
    fn accept(&self, record: LogRecord);
}

enum Phase {
    Buffering(VecDeque<LogRecord>),
    /// Flushing the buffer; records logged meanwhile join its tail.
    Draining(VecDeque<LogRecord>),
    Ready,
}

pub struct Dispatcher {
    phase: Mutex<Phase>,
    sink: Arc<dyn RecordSink>,
}

impl Dispatcher {
    pub fn new(sink: Arc<dyn RecordSink>) -> Self {
        Self {
            phase: Mutex::new(Phase::Buffering(VecDeque::new())),
            sink,
        }
    }

    pub fn dispatch(&self, record: LogRecord) {
        let Ok(mut phase) = self.phase.lock() else {
            return;
        };
        if let Phase::Buffering(queue) | Phase::Draining(queue) = &mut *phase {
            queue.push_back(record);
            return;
        }
        drop(phase);
        self.sink.accept(record);
    }

    /// One-way transition to ready. The first call drains the buffer in
    /// FIFO order; any later call is a no-op.
    pub fn mark_ready(&self) {
        {
            let Ok(mut phase) = self.phase.lock() else {
                return;
            };
            let Phase::Buffering(queue) = &mut *phase else {
                return;
            };
            let queue = std::mem::take(queue);
            tracing::debug!(buffered = queue.len(), "flushing buffered console records");
            *phase = Phase::Draining(queue);
        }
        loop {
            let next = {
                let Ok(mut phase) = self.phase.lock() else {
                    return;
                };
                let popped = match &mut *phase {
                    Phase::Draining(queue) => queue.pop_front(),
                    _ => return,
                };
                match popped {
                    Some(record) => record,
                    None => {
                        *phase = Phase::Ready;
                        return;
                    }
                }
            };
            self.sink.accept(next);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase
            .lock()
            .map(|phase| matches!(*phase, Phase::Ready))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogKind, Payload};
    use std::sync::OnceLock;

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<String>>,
        /// Logs one extra record through the dispatcher on the first accept.
        reenter: OnceLock<Arc<Dispatcher>>,
    }

    impl Collect {
        fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl RecordSink for Collect {
        fn accept(&self, record: LogRecord) {
            let Payload::Text(text) = record.payload else { panic!("text payloads only") };
            self.seen.lock().unwrap().push(text);
            if let Some(dispatcher) = self.reenter.get() {
                if self.seen.lock().unwrap().len() == 1 {
                    dispatcher.dispatch(info("logged during drain"));
                }
            }
        }
    }

    fn info(text: &str) -> LogRecord {
        LogRecord::from_call(LogKind::Info, &[text.into()])
    }

    #[test]
    fn buffers_until_ready_then_flushes_in_order() {
        let sink = Arc::new(Collect::default());
        let dispatcher = Dispatcher::new(sink.clone());
        for n in 0..5 {
            dispatcher.dispatch(info(&format!("early {n}")));
        }
        assert!(sink.seen().is_empty());
        assert!(!dispatcher.is_ready());

        dispatcher.mark_ready();
        dispatcher.dispatch(info("late"));

        assert!(dispatcher.is_ready());
        assert_eq!(sink.seen(), ["early 0", "early 1", "early 2", "early 3", "early 4", "late"]);
    }

    #[test]
    fn second_ready_signal_is_a_no_op() {
        let sink = Arc::new(Collect::default());
        let dispatcher = Dispatcher::new(sink.clone());
        dispatcher.dispatch(info("once"));
        dispatcher.mark_ready();
        dispatcher.mark_ready();
        assert_eq!(sink.seen(), ["once"]);
    }

    #[test]
    fn records_logged_during_drain_follow_the_buffer() {
        let sink = Arc::new(Collect::default());
        let dispatcher = Arc::new(Dispatcher::new(sink.clone()));
        let _ = sink.reenter.set(Arc::clone(&dispatcher));

        dispatcher.dispatch(info("first"));
        dispatcher.dispatch(info("second"));
        dispatcher.mark_ready();

        assert_eq!(sink.seen(), ["first", "second", "logged during drain"]);
        assert!(dispatcher.is_ready());
    }

    #[test]
    fn ready_with_empty_buffer_forwards_directly() {
        let sink = Arc::new(Collect::default());
        let dispatcher = Dispatcher::new(sink.clone());
        dispatcher.mark_ready();
        dispatcher.dispatch(info("direct"));
        assert_eq!(sink.seen(), ["direct"]);
    }
}
