//! Scenario step definitions
//!
//! Each step is a plain function over a [`RunContext`](crate::context::RunContext).
//! Steps that touch the platform are async and take a
//! [`PlatformClient`](crate::client::PlatformClient).
//!
//! - [`configuration`]: declare the container, artifacts, playbooks and variables
//! - [`interaction`]: create, run and refresh resources on the platform
//! - [`validation`]: assert on the collected results
//! - [`misc`]: waiting and debugging helpers

pub mod configuration;
pub mod interaction;
pub mod misc;
pub mod validation;
