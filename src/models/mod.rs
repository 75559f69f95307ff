pub mod attendance;
pub mod break_interval;
pub mod location;
pub mod session;
