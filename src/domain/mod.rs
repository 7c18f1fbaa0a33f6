//! Core domain types and logic.

pub mod observation;
pub mod schema;
pub mod dataset;
pub mod filter;
pub mod smoothing;
pub mod correlation;
pub mod chart;
pub mod panels;
pub mod controller;
pub mod settings;
pub mod error;
