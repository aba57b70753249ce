//! Precomputation of a **potentially visible set (PVS)** over a graph of convex
//! clusters joined by polygonal portals.
//!
//! For every cluster the PVS answers "which clusters could a viewer standing
//! anywhere in here possibly see?". It is computed in two passes:
//!
//! 1. a cheap conservative [might-see](base) pass per portal, and
//! 2. an exact [portal flow](flow) that walks chains of portals, clipping each
//!    one against the planes separating the ones before it.
//!
//! The per-portal results are then [aggregated and compressed](pvs) per cluster.
//!
//! ```no_run
//! use portalvis::{ClusterId, PortalGraph, VisOptions, calc_vis};
//! use nalgebra::Point3;
//!
//! let mut graph = PortalGraph::new(2);
//! graph.add_portal(
//!     vec![
//!         Point3::new(4.0, 0.0, 0.0),
//!         Point3::new(4.0, 4.0, 0.0),
//!         Point3::new(4.0, 4.0, 4.0),
//!         Point3::new(4.0, 0.0, 4.0),
//!     ],
//!     ClusterId(0),
//!     ClusterId(1),
//! )?;
//! let output = calc_vis(&mut graph, &VisOptions::default())?;
//! assert!(output.cluster_sees(ClusterId(0), ClusterId(1)));
//! # Ok::<(), portalvis::VisError>(())
//! ```
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//! - **parallel**: use rayon worker pools for the base and flow passes
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod errors;
pub mod float_types;
pub mod plane;
pub mod sphere;
pub mod winding;
pub mod graph;
pub mod predicates;
pub mod passage;
pub mod base;
pub mod stats;
pub mod state;
pub mod flow;
pub mod pvs;
pub mod threads;
pub mod options;
pub mod vis;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use errors::VisError;
pub use graph::{ClusterId, ClusterSet, PortalGraph, PortalId};
pub use options::VisOptions;
pub use stats::VisStats;
pub use vis::{VisOutput, calc_vis};
