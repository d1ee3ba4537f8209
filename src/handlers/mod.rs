//! Transport-facing handlers.

pub mod dispatch;
