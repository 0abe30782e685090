pub mod autoscroll;
pub mod lifecycle;
pub mod milestone;
pub mod scheduler;
pub mod sizing;
