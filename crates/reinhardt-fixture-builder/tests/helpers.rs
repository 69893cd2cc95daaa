//! Shared targets and fixtures for reinhardt-fixture-builder tests.

#![allow(dead_code)]

#[path = "helpers/requests.rs"]
pub mod requests;

#[path = "helpers/fixtures.rs"]
pub mod fixtures;
