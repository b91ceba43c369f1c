//! Run summary document, JSON export, and console table.
mod console;
mod summary;
mod writer;


pub use console::render_table;
pub use summary::{RunSummary, RunTotals};
pub use writer::{read_summary, write_summary};
