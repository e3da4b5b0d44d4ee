//! # Chroma Markdown
//!
//! Project notes are stored as markdown and shown as HTML. Images inside
//! notes are stored as `image:<id>` links and shown through the live asset
//! handle, so the rich-text view can display them.
//!
//! ```text
//! storage (markdown, image:<id>) ──to_display──► display (HTML, blob:chroma/…)
//!                                ◄──to_storage──
//! ```
//!
//! The markdown engine itself is behind [`Converter`]; [`BasicConverter`]
//! covers the subset notes use.

mod bridge;
mod converter;
mod html;
mod references;

pub use bridge::{BridgeOptions, DisplayText, MarkdownBridge, StorageText};
pub use converter::{BasicConverter, Converter};
pub use references::{
    image_reference, parse_image_reference, rewrite_html_sources, rewrite_link_targets,
    storage_references, IMAGE_SCHEME,
};
