//! Core types and trait definitions for the Surge trend tracker.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the item/snapshot data model, the [`store::TimeSeriesStore`] abstraction
//! and the [`detector::TrendDetector`] that ranks items by growth.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod category;
pub mod criteria;
pub mod detector;
pub mod error;
pub mod item;
pub mod store;

pub use error::{Error, Result};
