//! # fm-sampler: configuration sampling for feature models
//!
//! **`fm-sampler`** generates valid configurations of a feature model given as a propositional
//! formula in CNF. It is meant for product-line testing, where one wants a small set of products
//! that still exercises every combination of a few features.
//!
//! ## Key Features
//!
//! - **Several policies**: enumerate all configurations, draw random ones, or build pairwise and
//!   t-wise covering arrays.
//! - **Steerable search**: the built-in DPLL [`Solver`][crate::solver::Solver] delegates every
//!   branching polarity to a [`PhaseSelection`][crate::phase::PhaseSelection] and reports each
//!   assignment and retraction back to it.
//! - **Lazy and cancellable**: a run is an iterator of configurations that checks a
//!   [`Monitor`][crate::monitor::Monitor] between solver episodes.
//! - **Reproducible**: all randomness flows from explicit seeds.
//! - **1-Based Indexing**: variables are 1-indexed as in DIMACS.
//!
//! ## Basic Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fm_sampler::config::{Algorithm, GeneratorConfig};
//! use fm_sampler::dimacs;
//! use fm_sampler::generator::ConfigurationGenerator;
//! use fm_sampler::monitor::NullMonitor;
//!
//! // Root is mandatory, Gui and Cli exclude each other.
//! let input = "c 1 Root\nc 2 Gui\nc 3 Cli\np cnf 3 2\n1 0\n-2 -3 0\n";
//! let cnf = Arc::new(dimacs::parse(input.as_bytes()).unwrap());
//!
//! let generator = GeneratorConfig::new(Algorithm::PairWise).build(cnf.clone()).unwrap();
//! let configs: Vec<_> = generator.generate(NullMonitor).collect();
//!
//! assert!(configs.iter().all(|c| cnf.is_satisfied_by(c)));
//! ```
//!
//! ## Core Components
//!
//! - **[`cnf`]**, **[`types`]**, **[`literal_set`]**: the constraint and assignment model.
//! - **[`solver`]**: the search engine.
//! - **[`phase`]**: phase selection strategies, including the sample-following one.
//! - **[`generator`]**: the generation policies and the shared run driver.
//! - **[`config`]**: algorithm selection and parameters.
//! - **[`dimacs`]**, **[`csv`]**: input and output.

pub mod bitset;
pub mod cnf;
pub mod config;
pub mod csv;
pub mod dimacs;
pub mod error;
pub mod generator;
pub mod interaction;
pub mod literal_set;
pub mod monitor;
pub mod phase;
pub mod solver;
pub mod types;

pub use error::{Error, Result};
