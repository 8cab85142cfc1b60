//! Integration tests for Packline
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod auth_bootstrap;
pub mod cli_smoke;
pub mod offline_replay;
pub mod packout_flow;
