//! logrig logs - logger handles and the file sinks behind them
//!
//! A [`LoggerHandle`] is the named endpoint callers write to. Its settings
//! decide whether lines go to stderr or to a rotating file in the log
//! directory; rotated files are optionally gzipped and pruned by retention.

mod format;
mod handle;
mod retention;
mod writer;

pub use format::{render_fields, render_line, Fields};
pub use handle::{LoggerHandle, PreparedConfig};
pub use retention::{clean_rotated, clean_rotated_at};
pub use writer::FileSink;
