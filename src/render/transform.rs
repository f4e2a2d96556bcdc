use serde::{Deserialize, Serialize};

use crate::annotation::FaceBox;
use crate::error::RenderError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub const fn new(width: u32, height: u32) -> ImageDimensions {
        ImageDimensions { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for ImageDimensions {
    fn from((width, height): (u32, u32)) -> Self {
        ImageDimensions { width, height }
    }
}

/// Native-to-rendered scale factors. Horizontal and vertical are independent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl DisplayTransform {
    pub fn new(native: ImageDimensions, rendered: ImageDimensions) -> Result<DisplayTransform, RenderError> {
        if native.is_empty() {
            return Err(RenderError::DimensionUnavailable { width: native.width, height: native.height });
        }
        Ok(DisplayTransform {
            scale_x: rendered.width as f64 / native.width as f64,
            scale_y: rendered.height as f64 / native.height as f64,
        })
    }

    pub fn apply(&self, face_box: &FaceBox) -> FaceBox {
        FaceBox {
            left: face_box.left * self.scale_x,
            top: face_box.top * self.scale_y,
            width: face_box.width * self.scale_x,
            height: face_box.height * self.scale_y,
        }
    }
}

/// Box the image is laid out in. A zero bound leaves that axis unconstrained.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLayout {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for DisplayLayout {
    fn default() -> Self {
        DisplayLayout { max_width: 1024, max_height: 768 }
    }
}

impl DisplayLayout {
    /// Rendered size for an image: shrink to fit, keep aspect ratio, never enlarge.
    pub fn fit(&self, native: ImageDimensions) -> ImageDimensions {
        if native.is_empty() {
            return native;
        }
        let axis_scale = |bound: u32, size: u32| {
            if bound == 0 { 1.0 } else { bound as f64 / size as f64 }
        };
        let scale = axis_scale(self.max_width, native.width)
            .min(axis_scale(self.max_height, native.height))
            .min(1.0);
        if scale >= 1.0 {
            return native;
        }
        ImageDimensions {
            width: ((native.width as f64 * scale).round() as u32).max(1),
            height: ((native.height as f64 * scale).round() as u32).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_rendered_over_native() {
        let transform = DisplayTransform::new((1000, 500).into(), (500, 250).into()).unwrap();
        assert_eq!(transform.scale_x, 0.5);
        assert_eq!(transform.scale_y, 0.5);
    }

    #[test]
    fn non_uniform_scaling_is_kept() {
        let transform = DisplayTransform::new((100, 100).into(), (200, 50).into()).unwrap();
        let scaled = transform.apply(&FaceBox { left: 10.0, top: 10.0, width: 20.0, height: 40.0 });
        assert_eq!(scaled, FaceBox { left: 20.0, top: 5.0, width: 40.0, height: 20.0 });
    }

    #[test]
    fn zero_native_dimension_is_unavailable() {
        for native in [(0, 480), (640, 0), (0, 0)] {
            let err = DisplayTransform::new(native.into(), (320, 240).into()).unwrap_err();
            assert!(matches!(err, RenderError::DimensionUnavailable { .. }));
        }
    }

    #[test]
    fn fit_shrinks_and_keeps_aspect() {
        let layout = DisplayLayout { max_width: 800, max_height: 600 };
        assert_eq!(layout.fit((1600, 900).into()), ImageDimensions::new(800, 450));
        assert_eq!(layout.fit((600, 1200).into()), ImageDimensions::new(300, 600));
    }

    #[test]
    fn fit_never_enlarges() {
        let layout = DisplayLayout { max_width: 800, max_height: 600 };
        assert_eq!(layout.fit((320, 240).into()), ImageDimensions::new(320, 240));
    }

    #[test]
    fn zero_bound_is_unconstrained() {
        let layout = DisplayLayout { max_width: 500, max_height: 0 };
        assert_eq!(layout.fit((1000, 4000).into()), ImageDimensions::new(500, 2000));
        let unbounded = DisplayLayout { max_width: 0, max_height: 0 };
        assert_eq!(unbounded.fit((1000, 4000).into()), ImageDimensions::new(1000, 4000));
    }
}
