//! Data types for the table engine.

mod column;
mod dataset;
mod replication;
mod state;
mod value;

pub use column::*;
pub use dataset::*;
pub use replication::*;
pub use state::*;
pub use value::*;
