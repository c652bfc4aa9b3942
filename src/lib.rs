//! Batch PDF processing: merge, split, rasterize to JPG, and compress.
//!
//! A [`job::JobController`] accepts one [`job::JobRequest`] at a time, runs
//! the requested operation on the tokio runtime, and streams
//! [`job::JobEvent`]s back through a [`job::JobHandle`]. Per-file failures
//! are collected rather than aborting the batch, and the job can be
//! cancelled between items.

pub mod cli;
pub mod config;
pub mod document;
pub mod encode;
mod error;
pub use error::*;
pub mod group;
pub mod io;
pub mod job;
mod ops;
pub mod output;
pub mod render;
pub mod tool;
pub mod utils;
