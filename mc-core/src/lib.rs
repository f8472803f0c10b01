#![warn(clippy::all)]
#![warn(missing_docs)]

//! Batch/generation/particle eigenvalue driver for a Monte Carlo neutron
//! transport code.
//!
//! The [`driver`] module ties together a deterministic skip-ahead [`rng`],
//! fixed-capacity particle [`bank`]s, the fission-bank [`merge`] and
//! [`sync`] steps that make up one generation, the [`diagnostics`] computed
//! from the source distribution, and the cross-batch [`keff`] statistics.
//! The physics of a single particle history lives behind the
//! [`transport::TransportKernel`] trait so that the driver itself never
//! depends on a specific cross-section model.

pub mod bank;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod keff;
pub mod material;
pub mod merge;
pub mod particle;
pub mod rng;
pub mod sync;
pub mod transport;

pub use error::{Error, Result};
