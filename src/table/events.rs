//! Operation event stream
//!
//! Every table operation can describe itself as a `TableEvent`. The
//! table forwards events to an injected `EventSink` while its `verbose`
//! flag is on; the default sink hands them to the `log` facade. External
//! loggers and renderers hang off this stream, the core carries no other
//! reporting surface.

use serde::Serialize;

use crate::data::RowId;

/// What just happened, with enough payload to drive a logger
#[derive(Debug, Clone, Serialize)]
pub enum TableEvent {
    Insert {
        count: usize,
    },
    Update {
        row_id: RowId,
        changed: Vec<String>,
    },
    Remove {
        row_id: RowId,
    },
    Query {
        criteria: Vec<String>,
        /// Winning index signature; `None` means full scan
        signature: Option<String>,
        cost: f64,
        matched: usize,
    },
    IndexBuilt {
        signature: String,
        rows: usize,
    },
    IndexDropped {
        signature: String,
    },
    Dropped,
}

/// Injected logging hook; one per table, no process-wide state
pub trait EventSink {
    fn emit(&self, event: &TableEvent);
}

/// Default sink: forwards to `log::debug!`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &TableEvent) {
        match event {
            TableEvent::Insert { count } => log::debug!("insert: {} row(s)", count),
            TableEvent::Update { row_id, changed } => {
                log::debug!("update: row {} changed {:?}", row_id, changed)
            }
            TableEvent::Remove { row_id } => log::debug!("remove: row {}", row_id),
            TableEvent::Query { criteria, signature, cost, matched } => log::debug!(
                "query: {:?} via {} (cost {:.2}) -> {} row(s)",
                criteria,
                signature.as_deref().unwrap_or("full scan"),
                cost,
                matched
            ),
            TableEvent::IndexBuilt { signature, rows } => {
                log::debug!("index built: {} over {} row(s)", signature, rows)
            }
            TableEvent::IndexDropped { signature } => {
                log::debug!("index dropped: {}", signature)
            }
            TableEvent::Dropped => log::debug!("table dropped"),
        }
    }
}
