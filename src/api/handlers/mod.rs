pub mod certs;
pub mod health;
pub mod metrics;
