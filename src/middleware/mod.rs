//! Server-side request instrumentation.

pub mod tower;

pub use self::tower::{TraceLayer, TraceService};
