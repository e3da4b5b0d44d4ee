//! # Chroma Assets
//!
//! Binary assets (images embedded in notes, channel textures) keyed by a
//! stable id, each exposed to the running session through a transient
//! handle.
//!
//! ## Ids vs handles
//!
//! - [`AssetId`] is what documents and archives store.
//! - [`AssetHandle`] is what a renderer or rich-text view dereferences. It
//!   belongs to one table generation and is never written to disk.
//!
//! Removing an asset revokes its handle. Replacing the whole table
//! ([`AssetTable::replace_all`]) revokes every handle before new ones are
//! issued, and handles of different generations never collide.

mod error;
mod id;
mod mime;
mod table;

pub use error::{AssetError, AssetResult};
pub use id::{AssetHandle, AssetId, HANDLE_SCHEME};
pub use mime::{extension_for_mime, is_image_mime, mime_for_extension, sniff_mime};
pub use table::{AssetRecord, AssetTable};
