use crate::converter::{BasicConverter, Converter};
use crate::references::{
    find_handles, image_reference, parse_image_reference, rewrite_html_sources,
    rewrite_link_targets, IMAGE_SCHEME,
};
use chroma_assets::{AssetHandle, AssetTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeOptions {
    /// Fixed text the converter appends to its markdown output; stripped
    /// (every repetition) when converting back to storage form.
    pub trailer: Option<String>,
}

/// Display-form HTML plus the references that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayText {
    pub html: String,
    pub unresolved: Vec<String>,
}

/// Storage-form markdown plus the references that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageText {
    pub text: String,
    pub unresolved: Vec<String>,
}

/// Converts section text between its stored and displayed forms.
#[derive(Debug, Clone, Default)]
pub struct MarkdownBridge<C = BasicConverter> {
    converter: C,
    options: BridgeOptions,
}

impl MarkdownBridge<BasicConverter> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Converter> MarkdownBridge<C> {
    pub fn with_converter(converter: C, options: BridgeOptions) -> Self {
        Self { converter, options }
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// Storage markdown to HTML with `image:<id>` swapped for live handles
    pub fn to_display(&self, storage: &str, assets: &AssetTable) -> DisplayText {
        let mut unresolved = Vec::new();

        let markdown = rewrite_link_targets(storage, |target| {
            if !target.starts_with(IMAGE_SCHEME) {
                return None;
            }
            match parse_image_reference(target).and_then(|id| assets.handle_of(&id).ok()) {
                Some(handle) => Some(handle.to_string()),
                None => {
                    unresolved.push(target.to_string());
                    None
                }
            }
        });

        if !unresolved.is_empty() {
            debug!(count = unresolved.len(), "Unresolved references in section");
        }

        DisplayText {
            html: self.converter.markdown_to_html(&markdown),
            unresolved,
        }
    }

    /// Display HTML back to storage markdown with handles swapped for
    /// `image:<id>`
    pub fn to_storage(&self, display: &str, assets: &AssetTable) -> StorageText {
        let mut unresolved = Vec::new();

        let html = rewrite_html_sources(display, |value| {
            if !AssetHandle::is_handle(value) {
                return None;
            }
            match assets.resolve_by_handle(value) {
                Ok(id) => Some(image_reference(id)),
                Err(_) => {
                    unresolved.push(value.to_string());
                    None
                }
            }
        });

        let text = self.strip_trailer(&self.converter.html_to_markdown(&html));

        // Handles must never be persisted silently
        for handle in find_handles(&text) {
            if !unresolved.iter().any(|known| known == handle) {
                unresolved.push(handle.to_string());
            }
        }

        StorageText { text, unresolved }
    }

    fn strip_trailer(&self, markdown: &str) -> String {
        let mut text = markdown.trim_end();
        if let Some(trailer) = self.options.trailer.as_deref().map(str::trim) {
            if !trailer.is_empty() {
                while let Some(rest) = text.strip_suffix(trailer) {
                    text = rest.trim_end();
                }
            }
        }
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_in_code_span_round_trips() {
        let mut assets = AssetTable::new();
        let (id, _) = assets.add(vec![1u8, 2, 3], "image/png", None);
        let storage = format!("Embed with `![a](image:{})` syntax", id);

        let bridge = MarkdownBridge::new();
        let display = bridge.to_display(&storage, &assets);
        assert!(!display.html.contains("blob:chroma/"));

        let back = bridge.to_storage(&display.html, &assets);
        assert_eq!(back.text, storage);
        assert!(back.unresolved.is_empty());
    }

    #[test]
    fn test_handle_typed_as_text_is_reported() {
        let mut assets = AssetTable::new();
        let (_, handle) = assets.add(vec![1u8], "image/png", None);

        let bridge = MarkdownBridge::new();
        let html = format!("<p>copied <code>{}</code></p>", handle);
        let back = bridge.to_storage(&html, &assets);

        assert_eq!(back.unresolved, vec![handle.to_string()]);
    }

    #[test]
    fn test_to_display_swaps_known_ids() {
        let mut assets = AssetTable::new();
        let (id, handle) = assets.add(vec![1u8, 2, 3], "image/png", None);

        let bridge = MarkdownBridge::new();
        let display = bridge.to_display(&format!("![pic](image:{})", id), &assets);

        assert_eq!(
            display.html,
            format!("<p><img src=\"{}\" alt=\"pic\"></p>", handle)
        );
        assert!(display.unresolved.is_empty());
    }

    #[test]
    fn test_non_image_links_untouched() {
        let assets = AssetTable::new();
        let bridge = MarkdownBridge::new();
        let display = bridge.to_display("[site](https://example.com)", &assets);
        assert!(display.unresolved.is_empty());

        let storage = bridge.to_storage(&display.html, &assets);
        assert_eq!(storage.text, "[site](https://example.com)");
        assert!(storage.unresolved.is_empty());
    }

    #[test]
    fn test_trailer_stripped_every_repetition() {
        let bridge = MarkdownBridge::with_converter(
            BasicConverter,
            BridgeOptions {
                trailer: Some("<!-- end -->".into()),
            },
        );
        assert_eq!(
            bridge.strip_trailer("text\n\n<!-- end -->\n<!-- end -->\n"),
            "text"
        );
        assert_eq!(bridge.strip_trailer("text"), "text");
    }

    #[test]
    fn test_options_from_json() {
        let options: BridgeOptions = serde_json::from_str(r#"{"trailer":"--"}"#).unwrap();
        assert_eq!(options.trailer.as_deref(), Some("--"));
        let options: BridgeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, BridgeOptions::default());
    }
}
