// src/lib.rs — move-trimmer library root

pub mod cli;
pub mod core;
pub mod infra;
pub mod oracle;
pub mod util;
