//! One handler module per subcommand

pub mod analyze;
pub mod mapop;
pub mod stat;
pub mod upperbound;

pub use analyze::execute_analyze;
pub use mapop::{execute_map_op, MapOp};
pub use stat::execute_stat;
pub use upperbound::execute_upperbound;
