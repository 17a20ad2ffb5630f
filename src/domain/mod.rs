pub mod comparison;
pub mod error;
pub mod fingerprint;
pub mod outcome;
pub mod perf;
pub mod ports;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod scope;
pub mod snapshot;
pub mod value_objects;
