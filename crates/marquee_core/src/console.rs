//! On-screen log console service
//!
//! [`LogConsole`] is a bounded ring of log lines shared by clones. The
//! [`ConsoleLayer`] feeds it from `tracing`, so GPU failures and degraded
//! draws show up on the TV without any extra plumbing at the call sites.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// One console line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

struct ConsoleInner {
    lines: VecDeque<LogLine>,
    capacity: usize,
    /// Bumped on every change so views can skip re-rendering
    revision: u64,
}

/// Bounded, shareable log sink
#[derive(Clone)]
pub struct LogConsole {
    inner: Arc<Mutex<ConsoleInner>>,
}

impl LogConsole {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ConsoleInner {
                lines: VecDeque::with_capacity(capacity.min(1024)),
                capacity: capacity.max(1),
                revision: 0,
            })),
        }
    }

    fn inner(&self) -> MutexGuard<'_, ConsoleInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a line, dropping the oldest one when full
    pub fn push(&self, level: Level, target: impl Into<String>, message: impl Into<String>) {
        let mut inner = self.inner();
        if inner.lines.len() == inner.capacity {
            inner.lines.pop_front();
        }
        inner.lines.push_back(LogLine {
            level,
            target: target.into(),
            message: message.into(),
        });
        inner.revision += 1;
    }

    /// The last `count` lines, oldest first
    pub fn tail(&self, count: usize) -> Vec<LogLine> {
        let inner = self.inner();
        let skip = inner.lines.len().saturating_sub(count);
        inner.lines.iter().skip(skip).cloned().collect()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.inner().lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner().lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn revision(&self) -> u64 {
        self.inner().revision
    }

    pub fn clear(&self) {
        let mut inner = self.inner();
        inner.lines.clear();
        inner.revision += 1;
    }

    /// A `tracing` layer forwarding events at `min_level` or more severe
    pub fn layer(&self, min_level: Level) -> ConsoleLayer {
        ConsoleLayer {
            console: self.clone(),
            min_level,
        }
    }
}

impl fmt::Debug for LogConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner();
        f.debug_struct("LogConsole")
            .field("lines", &inner.lines.len())
            .field("capacity", &inner.capacity)
            .field("revision", &inner.revision)
            .finish()
    }
}

/// `tracing_subscriber` layer writing into a [`LogConsole`]
pub struct ConsoleLayer {
    console: LogConsole,
    min_level: Level,
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.record_debug(field, &value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            if !self.fields.is_empty() {
                self.fields.push(' ');
            }
            self.fields.push_str(&format!("{}={:?}", field.name(), value));
        }
    }
}

impl<S: Subscriber> Layer<S> for ConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // Level ordering: ERROR is the "smallest"
        if *metadata.level() > self.min_level {
            return;
        }
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = if visitor.fields.is_empty() {
            visitor.message
        } else {
            format!("{} {}", visitor.message, visitor.fields)
        };
        self.console
            .push(*metadata.level(), metadata.target(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_ring_drops_oldest() {
        let console = LogConsole::new(2);
        console.push(Level::INFO, "t", "one");
        console.push(Level::INFO, "t", "two");
        console.push(Level::INFO, "t", "three");

        let messages: Vec<_> = console.lines().into_iter().map(|l| l.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(console.revision(), 3);
    }

    #[test]
    fn test_tail() {
        let console = LogConsole::new(10);
        for i in 0..5 {
            console.push(Level::DEBUG, "t", format!("line {}", i));
        }
        let tail = console.tail(2);
        assert_eq!(tail[0].message, "line 3");
        assert_eq!(tail[1].message, "line 4");
        assert_eq!(console.tail(100).len(), 5);
    }

    #[test]
    fn test_layer_filters_by_level() {
        let console = LogConsole::new(16);
        let subscriber = tracing_subscriber::registry().with(console.layer(Level::WARN));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("ignored");
            tracing::warn!("texture skipped");
            tracing::error!(program = "tile", "compile failed");
        });

        let lines = console.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].level, Level::WARN);
        assert_eq!(lines[0].message, "texture skipped");
        assert_eq!(lines[1].message, "compile failed program=\"tile\"");
    }
}
