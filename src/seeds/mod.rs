//! Database seeding functionality
//!
//! Populates the loopback connector and a test credential so the gateway
//! can be exercised against the running service.

pub mod connector;

pub use connector::seed_loopback;
