//! Step definitions for dispatch acceptance scenarios.

pub mod dispatch;
