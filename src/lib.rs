//! leadscope: a dashboard client for a remote lead-scoring service.
//!
//! The library holds the client contract and the dashboard controllers; the
//! `leadscope` binary wraps them in a CLI and an embedded web server.

pub mod batch;
pub mod calls;
pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod features;
pub mod form;
pub mod segment;
pub mod stats;
pub mod telemetry;
pub mod web;
