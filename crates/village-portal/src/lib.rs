pub mod chat;
pub mod clock;
pub mod config;
pub mod error;
pub mod health_records;
pub mod identity;
pub mod notifications;
pub mod repository;
pub mod residents;
pub mod telemetry;
#[cfg(test)]
pub(crate) mod test_support;
pub mod workflows;
