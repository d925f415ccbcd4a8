// src/core/mod.rs — Candidate-set minimization engine

pub mod ddmin;
pub mod halving;
pub mod report;
pub mod round;
pub mod search;
pub mod store;
pub mod types;
