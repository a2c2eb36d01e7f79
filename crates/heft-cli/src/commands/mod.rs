//! Command implementations. Each module exposes an `execute` function
//! taking the parsed arguments.

pub mod export_sizes;
pub mod exports;
pub mod stats;
pub(crate) mod utils;

pub use export_sizes::execute as export_sizes_execute;
pub use exports::execute as exports_execute;
pub use stats::execute as stats_execute;
