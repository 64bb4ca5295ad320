// src/stream/mod.rs — Byte stream decoding and per-session timing

pub mod event;
pub mod parser;
pub mod telemetry;
pub mod watchdog;

pub use event::StreamEvent;
pub use parser::ChunkParser;
