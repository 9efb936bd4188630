//! Data layer for the expense dashboard.
//!
//! Loads transaction tables from CSV and JSON files, generates synthetic
//! samples, aggregates normalized tables and assembles the dashboard report.

pub mod aggregator;
pub mod analysis;
pub mod reader;
pub mod sample;

pub use expense_core as core;
