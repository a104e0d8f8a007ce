//! Pantry inventory, personal recipes and a community recipe feed, with
//! AI-assisted recipe generation.
//!
//! Shared by the `pantrychef` CLI, the `pantrychef-server` HTTP API and the
//! `pantrychef-admin` tool.

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod matching;
pub mod mealdb;
pub mod models;
pub mod server;
pub mod storage;
pub mod units;

pub use error::{Error, Result};
