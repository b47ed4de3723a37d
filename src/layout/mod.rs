//! Layout engine for virtualized rows.
//!
//! This module handles:
//! - Row size measurements and estimates
//! - Cumulative row offsets over the current logical order
//! - Viewport state (scroll position, extent, overscan)
//! - Binary search for the rendered range at a scroll position

mod measure;
mod viewport;
mod virtualizer;

pub use measure::{MeasurementCache, MIN_ROW_SIZE};
pub use viewport::{Align, Viewport};
pub use virtualizer::{VirtualRange, VirtualRow, Virtualizer};
