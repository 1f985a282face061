//! GitHub webhook event recorder.
//!
//! Receives push and pull request webhooks, normalizes them into a small
//! event schema, stores them, and serves them back over a JSON API.

pub mod config;
pub mod persistence;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub mod test_utils;
