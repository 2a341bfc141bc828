//! Operation history of tables.
//!
//! Turns the ordered entries of a table's log into [`OperationRecord`]s with
//! running totals, and drives discovery, reading and aggregation for every
//! table under a path.

pub mod aggregate;
mod collect;
mod record;

pub use aggregate::{aggregate, aggregate_from, opening_totals, Accumulator, Totals};
pub(crate) use collect::{run_on_pool, validate_root};
pub use collect::{collect_history, get_table_history, HistoryRequest, Page, DEFAULT_LIMIT};
pub use record::{OperationRecord, TableHistory};
