use ab_glyph::{Font, FontRef, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::warn;

use super::overlay::{OverlayBox, RenderedAnnotations};

static LABEL_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const LABEL_PADDING: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub color: Rgba<u8>,
    pub highlight_color: Rgba<u8>,
    pub thickness: u32,
    /// Pixel height of the name tab text; `0.0` draws boxes only.
    pub label_scale: f32,
    pub label_text_color: Rgba<u8>,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        OverlayStyle {
            color: Rgba([0, 255, 0, 255]),
            highlight_color: Rgba([255, 200, 0, 255]),
            thickness: 2,
            label_scale: 14.0,
            label_text_color: Rgba([0, 0, 0, 255]),
        }
    }
}

/// Draws every overlay box onto `image`, which must be at the rendered size,
/// with its display name on a tab above the box (inside it when the box touches the top).
pub fn draw_overlays(image: &mut RgbaImage, annotations: &RenderedAnnotations, style: &OverlayStyle) {
    let font = if style.label_scale > 0.0 {
        match FontRef::try_from_slice(LABEL_FONT) {
            Ok(font) => Some(font),
            Err(err) => {
                warn!("label font unusable, drawing boxes only: {}", err);
                None
            }
        }
    } else {
        None
    };

    for overlay in &annotations.overlays {
        let color = if annotations.is_overlay_highlighted(overlay.handle) {
            style.highlight_color
        } else {
            style.color
        };
        draw_box(image, overlay, color, style.thickness.max(1));
        if let Some(font) = &font {
            draw_label(image, overlay, font, color, style);
        }
    }
}

fn draw_box(image: &mut RgbaImage, overlay: &OverlayBox, color: Rgba<u8>, thickness: u32) {
    let (image_width, image_height) = image.dimensions();
    let x0 = overlay.left.round().max(0.0) as i64;
    let y0 = overlay.top.round().max(0.0) as i64;
    let x1 = ((overlay.left + overlay.width).round() as i64).min(image_width as i64 - 1);
    let y1 = ((overlay.top + overlay.height).round() as i64).min(image_height as i64 - 1);

    for t in 0..thickness as i64 {
        let (left, top, right, bottom) = (x0 + t, y0 + t, x1 - t, y1 - t);
        if left > right || top > bottom {
            break;
        }
        let rect = Rect::at(left as i32, top as i32)
            .of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
        draw_hollow_rect_mut(image, rect, color);
    }
}

fn draw_label(image: &mut RgbaImage, overlay: &OverlayBox, font: &FontRef, color: Rgba<u8>, style: &OverlayStyle) {
    if overlay.label.is_empty() {
        return;
    }
    let scale = PxScale::from(style.label_scale);
    let (text_width, _) = text_size(scale, font, &overlay.label);
    let line_height = font.as_scaled(scale).height().ceil() as u32;
    let tab_width = text_width + 2 * LABEL_PADDING;
    let tab_height = line_height + 2 * LABEL_PADDING;

    let left = overlay.left.round().max(0.0) as i32;
    let box_top = overlay.top.round().max(0.0) as i32;
    let top = if box_top >= tab_height as i32 { box_top - tab_height as i32 } else { box_top };

    draw_filled_rect_mut(image, Rect::at(left, top).of_size(tab_width, tab_height), color);
    draw_text_mut(
        image,
        style.label_text_color,
        left + LABEL_PADDING as i32,
        top + LABEL_PADDING as i32,
        scale,
        font,
        &overlay.label,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{FaceBox, RecognitionResult};
    use crate::render::{render, HoverTarget};

    fn annotations() -> RenderedAnnotations {
        let results = vec![
            RecognitionResult {
                id: "face-0".into(),
                name: "A".into(),
                face_box: FaceBox { left: 10.0, top: 10.0, width: 20.0, height: 20.0 },
            },
            RecognitionResult {
                id: "face-1".into(),
                name: "B".into(),
                face_box: FaceBox { left: 60.0, top: 60.0, width: 30.0, height: 30.0 },
            },
        ];
        // native 200x200 shown at 100x100
        render(&results, (200, 200).into(), (100, 100).into()).unwrap()
    }

    fn boxes_only() -> OverlayStyle {
        OverlayStyle { label_scale: 0.0, ..OverlayStyle::default() }
    }

    #[test]
    fn corners_are_painted() {
        let style = boxes_only();
        let mut image = RgbaImage::new(100, 100);
        draw_overlays(&mut image, &annotations(), &style);

        assert_eq!(image.get_pixel(5, 5), &style.color);
        assert_eq!(image.get_pixel(15, 5), &style.color);
        assert_eq!(image.get_pixel(5, 15), &style.color);
        assert_eq!(image.get_pixel(15, 15), &style.color);
        // interior stays clear
        assert_eq!(image.get_pixel(10, 10), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn highlighted_pair_uses_highlight_color() {
        let style = boxes_only();
        let mut rendered = annotations();
        let handle = rendered.overlays[1].handle;
        rendered.hover_enter(HoverTarget::Overlay(handle));

        let mut image = RgbaImage::new(100, 100);
        draw_overlays(&mut image, &rendered, &style);
        assert_eq!(image.get_pixel(30, 30), &style.highlight_color);
        assert_eq!(image.get_pixel(5, 5), &style.color);
    }

    #[test]
    fn boxes_past_the_edge_are_clipped() {
        let results = vec![RecognitionResult {
            id: "face-0".into(),
            name: "Edge".into(),
            face_box: FaceBox { left: 90.0, top: 90.0, width: 50.0, height: 50.0 },
        }];
        let rendered = render(&results, (100, 100).into(), (100, 100).into()).unwrap();
        let style = OverlayStyle { thickness: 1, ..boxes_only() };
        let mut image = RgbaImage::new(100, 100);
        draw_overlays(&mut image, &rendered, &style);
        assert_eq!(image.get_pixel(99, 99), &style.color);
        assert_eq!(image.get_pixel(90, 90), &style.color);
    }

    fn single(top: f64, name: &str) -> RenderedAnnotations {
        let results = vec![RecognitionResult {
            id: "face-0".into(),
            name: name.into(),
            face_box: FaceBox { left: 20.0, top, width: 40.0, height: 40.0 },
        }];
        render(&results, (100, 100).into(), (100, 100).into()).unwrap()
    }

    #[test]
    fn name_tab_sits_above_the_box() {
        let style = OverlayStyle::default();
        let mut image = RgbaImage::new(100, 100);
        draw_overlays(&mut image, &single(40.0, "Ann"), &style);

        // left edge of the tab, one row above the box
        assert_eq!(image.get_pixel(20, 39), &style.color);
        assert_eq!(image.get_pixel(20, 20), &style.color);
        let text_pixels = (21..60)
            .flat_map(|x| (20..40).map(move |y| (x, y)))
            .filter(|&(x, y)| image.get_pixel(x, y) != &style.color && image.get_pixel(x, y) != &Rgba([0, 0, 0, 0]))
            .count();
        assert!(text_pixels > 0, "label text was not drawn");
        // nothing left of the tab
        assert_eq!(image.get_pixel(10, 39), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn name_tab_moves_inside_at_the_top_edge() {
        let style = OverlayStyle::default();
        let mut image = RgbaImage::new(100, 100);
        draw_overlays(&mut image, &single(0.0, "Ann"), &style);

        // interior below the border, above the glyphs, is covered by the tab
        assert_eq!(image.get_pixel(30, 2), &style.color);
        assert_eq!(image.get_pixel(30, 30), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn highlighted_tab_uses_highlight_color() {
        let style = OverlayStyle::default();
        let mut rendered = single(40.0, "Ann");
        let handle = rendered.overlays[0].handle;
        rendered.hover_enter(HoverTarget::Overlay(handle));

        let mut image = RgbaImage::new(100, 100);
        draw_overlays(&mut image, &rendered, &style);
        assert_eq!(image.get_pixel(20, 39), &style.highlight_color);
    }

    #[test]
    fn zero_label_scale_draws_boxes_only() {
        let mut image = RgbaImage::new(100, 100);
        draw_overlays(&mut image, &single(40.0, "Ann"), &boxes_only());
        assert_eq!(image.get_pixel(20, 39), &Rgba([0, 0, 0, 0]));
        assert_eq!(image.get_pixel(20, 40), &boxes_only().color);
    }
}
