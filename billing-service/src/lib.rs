pub mod billing;
pub mod config;
pub mod history;
pub mod observability;
pub mod pipeline;
pub mod report;
pub mod service;
pub mod sinks;
pub mod sources;
pub mod transform;
pub mod validation;

pub use pipeline::{Envelope, Pipeline};
pub use service::{BillingService, Submission};
