// Persistent log sink: a `tracing_subscriber::Layer` that, for each
// event at or above a configured level, spawns a detached task to insert a
// `LogRecord` into the catalog. Failures to persist are swallowed (eprintln!
// only) to avoid recursing back into the tracing pipeline on a database
// hiccup. Grounded on the span-visitor idiom used by the pack's own
// catalog-backed log forwarder, simplified: no span correlation, just the
// event's own fields.

use std::fmt::Write as _;
use std::sync::Arc;

use qbank_catalog::Repository;
use qbank_common::types::NewLogRecord;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

pub struct PersistentLogLayer {
    repo: Arc<Repository>,
    min_level: Level,
}

impl PersistentLogLayer {
    pub fn new(repo: Arc<Repository>, min_level: Level) -> Self {
        Self { repo, min_level }
    }
}

impl<S> Layer<S> for PersistentLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.min_level {
            return;
        }

        let mut message = String::new();
        event.record(&mut MessageVisitor(&mut message));

        let record = NewLogRecord {
            level: metadata.level().to_string(),
            logger_name: metadata.target().to_string(),
            message,
        };

        let repo = Arc::clone(&self.repo);
        tokio::spawn(async move {
            if let Err(e) = repo.insert_log(record).await {
                eprintln!("qbank-server: failed to persist log record: {e}");
            }
        });
    }
}

/// Extracts the formatted `message` field from an event. Other fields are
/// ignored here; they're already visible in stdout via the fmt subscriber
/// layered alongside this one.
struct MessageVisitor<'a>(&'a mut String);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{value:?}");
        }
    }
}
