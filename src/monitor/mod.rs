pub mod controller;
pub mod loop_worker;

pub use controller::{recover_interrupted, MonitorController};
pub use loop_worker::{monitor_loop, MonitorDeps};
