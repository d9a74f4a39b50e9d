pub mod config;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod handlers;
pub mod job;
pub mod query;
pub mod scheduler;
pub mod scoring;
pub mod store;
