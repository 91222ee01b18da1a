//! Particle advection over sparse quadrilateral reservoir grids.
//!
//! A dataset of integer-scaled cells is decoded into layers
//! ([`layers`]), one layer becomes a [`grid::Grid`] of [`cell::Cell`]s
//! wrapped in a [`field::Field`], and particles seeded by a
//! [`generator::ParticleGenerator`] are stepped through it by
//! [`animation::FlowAnimation`] to produce streamline trails.

pub mod animation;
pub mod cell;
pub mod config;
pub mod error;
pub mod field;
pub mod flow_map;
pub mod generator;
pub mod grid;
pub mod layers;
pub mod math;
pub mod particle;
pub mod scale_bar;

pub use error::{FlowError, Result};
