#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hurricane-exposure statistics engine.
//!
//! Given a registry of fixed points with service lifespans and a
//! time-ordered archive of tropical-cyclone observations, the engine
//! determines which storm passages geometrically affected each point,
//! classifies every affecting passage by Saffir-Simpson category, and
//! accumulates lifetime and year-by-year exposure statistics.
//!
//! The engine is a single deterministic batch pass. The radius model and
//! distance metric are pluggable strategies selected by
//! [`EngineConfig`](storm_exposure_exposure_models::EngineConfig); the
//! R-tree [`index::PointIndex`] prunes candidate points per observation
//! before the exact distance test.

pub mod accumulator;
pub mod distance;
pub mod engine;
pub mod index;
pub mod progress;
pub mod radius;

pub use engine::{BatchOutcome, BatchSummary, ExposureEngine};
