//! Clinical readout calendar for a basket of biotech holdings.

pub mod api;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
