// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod config;
pub mod engine;
pub mod lockout;
pub mod model;
pub mod scoring;
pub mod standings;
pub mod store;
pub mod sync;
pub mod visibility;
