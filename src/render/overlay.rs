use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::annotation::{RecognitionResult, UNKNOWN_NAME};
use crate::error::RenderError;

use super::highlight::{EntryHandle, HighlightLinks, HoverTarget, OverlayHandle};
use super::transform::{DisplayTransform, ImageDimensions};

/// A labelled box positioned in display coordinates.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OverlayBox {
    #[serde(skip)]
    pub handle: OverlayHandle,
    pub id: String,
    pub label: String,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// One line of the recognized-names list.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ListEntry {
    #[serde(skip)]
    pub handle: EntryHandle,
    pub id: String,
    pub text: String,
}

/// Overlays and list entries for one batch of results, in input order.
#[derive(Serialize, Debug, Clone, Default)]
pub struct RenderedAnnotations {
    pub overlays: Vec<OverlayBox>,
    pub entries: Vec<ListEntry>,
    #[serde(skip)]
    links: HighlightLinks,
}

impl RenderedAnnotations {
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn links(&self) -> &HighlightLinks {
        &self.links
    }

    pub fn hover_enter(&mut self, target: HoverTarget) {
        self.links.enter(target);
    }

    pub fn hover_leave(&mut self, target: HoverTarget) {
        self.links.leave(target);
    }

    pub fn is_overlay_highlighted(&self, handle: OverlayHandle) -> bool {
        self.links.is_overlay_highlighted(handle)
    }

    pub fn is_entry_highlighted(&self, handle: EntryHandle) -> bool {
        self.links.is_entry_highlighted(handle)
    }

    pub fn overlay_for_id(&self, id: &str) -> Option<&OverlayBox> {
        let (overlay, _) = self.links.pair_for_id(id)?;
        self.overlays.get(overlay.index())
    }

    pub fn entry_for_id(&self, id: &str) -> Option<&ListEntry> {
        let (_, entry) = self.links.pair_for_id(id)?;
        self.entries.get(entry.index())
    }
}

/// Scales every result into display space and pairs it with a list entry.
///
/// An empty batch is never an error, even when the image dimensions are unknown.
pub fn render(
    results: &[RecognitionResult],
    native: ImageDimensions,
    rendered: ImageDimensions,
) -> Result<RenderedAnnotations, RenderError> {
    if results.is_empty() {
        return Ok(RenderedAnnotations::default());
    }
    let transform = DisplayTransform::new(native, rendered)?;
    debug!(
        "rendering {} annotation(s), scale {:.4}x{:.4}",
        results.len(),
        transform.scale_x,
        transform.scale_y
    );

    let links = HighlightLinks::new(results.iter().map(|result| result.id.clone()));
    let labels = entry_labels(results);

    let mut overlays = Vec::with_capacity(results.len());
    let mut entries = Vec::with_capacity(results.len());
    for ((result, text), (overlay, entry)) in results.iter().zip(labels).zip(links.handles()) {
        let scaled = transform.apply(&result.face_box);
        overlays.push(OverlayBox {
            handle: overlay,
            id: result.id.clone(),
            label: result.name.clone(),
            left: scaled.left,
            top: scaled.top,
            width: scaled.width,
            height: scaled.height,
        });
        entries.push(ListEntry { handle: entry, id: result.id.clone(), text });
    }

    Ok(RenderedAnnotations { overlays, entries, links })
}

/// List text per result. Unknown faces are told apart by an id fragment, or by the
/// whole id when two of them share a fragment.
fn entry_labels(results: &[RecognitionResult]) -> Vec<String> {
    let fragment_counts = results
        .iter()
        .filter(|result| result.is_unknown())
        .map(|result| result.id_fragment())
        .counts();

    results
        .iter()
        .map(|result| {
            if !result.is_unknown() {
                return result.name.clone();
            }
            let fragment = result.id_fragment();
            if fragment_counts.get(fragment).copied().unwrap_or(0) > 1 {
                format!("{UNKNOWN_NAME} ({})", result.id)
            } else {
                format!("{UNKNOWN_NAME} ({fragment})")
            }
        })
        .collect()
}
