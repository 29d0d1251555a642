//! Voyage calculator looks up precomputed voyage statistics for a shipping route and draws the
//! route on a map, optionally over an atmospheric pressure layer.
//! Date: 2025-06-12
//! Note that the statistics are precomputed, nothing here simulates the voyage itself.

// Internal modules
pub mod error;
pub use crate::error::{Error, Result};
pub mod voyages;
pub use crate::voyages::*;      // Voyage table, selection and lookup
pub mod routes;
pub use crate::routes::*;       // Route waypoints
pub mod contours;
pub use crate::contours::*;     // Pressure contours
pub mod maps;
pub use crate::maps::*;         // Map state selection
pub mod figures;
pub use crate::figures::*;      // plotly.js figures
pub mod dashboard;
pub use crate::dashboard::*;
pub mod server;
