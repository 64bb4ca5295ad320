// src/lib.rs — Library root for genstream

pub mod backend;
pub mod cli;
pub mod infra;
pub mod session;
pub mod stream;
pub mod util;
