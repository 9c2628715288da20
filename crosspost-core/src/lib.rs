#![doc = "crosspost-core: core logic library for crosspost."]

//! This crate contains all policy, data-model and pipeline logic for crosspost.
//! Platform HTTP clients and credential handling live in the CLI crate, not here.
//! Begin new modules as submodules below.
//!
//! # Usage
//! Add this as a dependency for shared compliance, lifecycle, config and pipeline code.

pub mod compliance;
pub mod config;
pub mod contract;
pub mod lifecycle;
pub mod media;
pub mod pipeline;
