//! CLI subcommand implementations.

pub mod around;
pub mod gaps;
pub mod ids;
pub mod segment;
pub mod util;
