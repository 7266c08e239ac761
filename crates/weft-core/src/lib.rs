//! Weft Core
//!
//! This crate contains the ambient utilities shared by the Weft component engine.

pub mod alloc;
pub mod config;
pub mod logging;
