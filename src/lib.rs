//! Delivery dispatch
//!
//! The dispatch subsystem of a multi-tenant commerce platform: lets a
//! driver or courier claim a delivery, verify pickup and drop-off with
//! one-time codes, and move the delivery through its lifecycle while
//! guaranteeing at most one transporter holds it at a time.

pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod interfaces;
pub mod storage;
pub mod utils;
