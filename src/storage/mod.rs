//! SQLite storage module for crash and weather data.
//!
//! Provides the relational store shared by all ingestion streams:
//! crash records, per-case details, weather days, and the county and
//! intersection-type dimension tables.

pub mod repository;
pub mod schema;

pub use repository::CrashRepository;
pub use schema::create_tables;
