pub mod compare;
pub mod monitoring;
pub mod session;
pub mod snapshot;
