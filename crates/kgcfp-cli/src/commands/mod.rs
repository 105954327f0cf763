//! Command implementations.

pub mod clear;
pub mod extract;
pub mod import;
pub mod search;
pub mod stats;

pub use self::clear::execute_clear;
pub use self::extract::execute_extract;
pub use self::import::execute_import;
pub use self::search::execute_search;
pub use self::stats::execute_stats;
