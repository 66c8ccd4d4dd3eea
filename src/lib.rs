//! Delivery fleet dispatch simulation, trip mileage tracking and driver
//! earnings tools.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod fleet;
pub mod geo;
pub mod input;
pub mod intelligence;
pub mod logging;
pub mod notifications;
pub mod planner;
pub mod shift;
pub mod tracking;
pub mod triage;
pub mod ui;
pub mod voice;
