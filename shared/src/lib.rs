pub mod messages;
pub mod metrics;
pub mod models;
