//! Market data types and per-symbol state

mod state;
mod types;

pub use state::SymbolState;
pub use types::Bar;
