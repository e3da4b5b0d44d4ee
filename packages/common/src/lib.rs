//! Types shared by every Chroma crate: shader stages and line/column helpers.

pub mod error;
pub mod stage;
pub mod text;

pub use error::*;
pub use stage::*;
pub use text::*;
