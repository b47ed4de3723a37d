//! simview - virtualized tables for simulation replications
//!
//! Filters, sorts and lays out large row sets so a host only ever mounts the
//! rows near the viewport:
//! - Global text search plus per-column predicates
//! - Stable single-column sort with missing values last
//! - Estimated row sizes refined by measurement, without scroll jumps
//! - CSV / JSON export of the filtered + sorted order
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { ReplicationTableView } from 'simview';
//! await init();
//! const view = new ReplicationTableView(results, { overscan: 5, viewportExtent: 600 });
//! view.set_column_condition('effect_size>0');
//! view.toggle_sort('p_value');
//! const { renderedRows, paddingTop, paddingBottom } = view.frame();
//! ```
//!
//! # Usage (Rust)
//!
//! ```
//! use simview::{load_replications, Replication, RowDataset, Table, TableConfig};
//!
//! let rows = load_replications(r#"[{"p_value": 0.01, "effect_size": 0.8,
//!     "confidence_interval": [0.2, 1.4], "s_value": 6.6, "significant": true}]"#)?;
//! let mut table = Table::new(
//!     RowDataset::new(rows),
//!     Replication::columns(),
//!     TableConfig::default().with_viewport_extent(400.0),
//! )?;
//! table.toggle_sort("effect_size");
//! assert_eq!(table.frame().rendered_rows.len(), 1);
//! # Ok::<(), simview::SimviewError>(())
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod layout;
pub mod sort;
pub mod table;
pub mod types;
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use config::TableConfig;
pub use error::{Result, SimviewError};
pub use layout::{Align, Viewport, VirtualRange};
pub use table::{Frame, RenderedRow, Table, TablePhase};
pub use viewer::ReplicationTableView;

pub use types::*;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
