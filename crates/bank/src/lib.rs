//! Storage for tracebank: the reasoning bank and per-run trajectory artifacts.

pub mod atomic;
pub mod file_bank;
pub mod noop;
pub mod trajectory_log;

pub use atomic::write_atomic;
pub use file_bank::FileBank;
pub use noop::NoopBank;
pub use trajectory_log::TrajectoryLog;
