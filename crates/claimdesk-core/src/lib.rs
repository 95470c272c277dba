//! Core types and lookup tables for the Claimdesk claims portal.
//!
//! This crate has no HTTP or database dependencies.
//! The store, gateway, portal, proxy and CLI crates all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod claim;
pub mod error;
pub mod extraction;
pub mod store;
pub mod trigger;
pub mod user;
pub mod workflow;

pub use error::{Error, Result};
