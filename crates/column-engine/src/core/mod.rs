pub mod clock;
pub mod context;
pub mod rng;
pub mod tracker;
