//! Infrastructure adapters: metric transport.

pub mod telegraf;

pub use telegraf::{encode_line, TelegrafSink};
