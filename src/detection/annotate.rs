use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detection::DetectError;
use crate::detection::font;
use crate::models::{BoxXyxy, Detection, RawDetection};

/// Color for class index 0 (helmet worn).
pub const SAFE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// Color for every other class index.
pub const UNSAFE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

pub const BOX_THICKNESS: u32 = 2;
pub const LABEL_SCALE: u32 = 2;
/// Gap between a box's bottom edge and the top of its label.
pub const LABEL_OFFSET: i32 = 6;

/// Two-way color convention: class 0 versus everything else.
pub fn class_color(class_index: usize) -> Rgb<u8> {
    if class_index == 0 { SAFE_COLOR } else { UNSAFE_COLOR }
}

/// Burns boxes and label text into a copy of an image.
#[derive(Debug, Clone)]
pub struct Annotator {
    class_labels: Vec<String>,
}

impl Annotator {
    pub fn new(class_labels: Vec<String>) -> Self {
        Self { class_labels }
    }

    pub fn class_labels(&self) -> &[String] {
        &self.class_labels
    }

    /// Resolve a raw engine box against the class label table.
    pub fn resolve(&self, raw: &RawDetection) -> Result<Detection, DetectError> {
        let class_label = self
            .class_labels
            .get(raw.class_index)
            .ok_or(DetectError::ClassIndex {
                index: raw.class_index,
                table_len: self.class_labels.len(),
            })?;
        Ok(Detection {
            class_index: raw.class_index,
            class_label: class_label.clone(),
            confidence: raw.confidence,
            bbox: BoxXyxy::from_xyxy(raw.xyxy),
        })
    }

    /// Annotate `image` with every detection.
    ///
    /// All labels are resolved before anything is drawn, so an unknown class
    /// index yields an error and no image at all.
    pub fn render(
        &self,
        image: &RgbImage,
        raw: &[RawDetection],
    ) -> Result<(RgbImage, Vec<Detection>), DetectError> {
        let detections = raw
            .iter()
            .map(|r| self.resolve(r))
            .collect::<Result<Vec<_>, _>>()?;

        let mut canvas = image.clone();
        for detection in &detections {
            draw_detection(&mut canvas, detection);
        }
        Ok((canvas, detections))
    }
}

fn draw_detection(canvas: &mut RgbImage, detection: &Detection) {
    let color = class_color(detection.class_index);
    let bbox = clamp_to_canvas(detection.bbox, canvas.dimensions());

    for t in 0..BOX_THICKNESS {
        let inset = t as i32;
        let width = bbox.width().saturating_sub(2 * t);
        let height = bbox.height().saturating_sub(2 * t);
        if width == 0 || height == 0 {
            break;
        }
        let x = bbox.x1.saturating_add(inset);
        let y = bbox.y1.saturating_add(inset);
        draw_hollow_rect_mut(canvas, Rect::at(x, y).of_size(width, height), color);
    }

    // Label placement uses the unclamped box so off-canvas labels stay off-canvas.
    font::draw_text(
        canvas,
        &detection.label(),
        detection.bbox.x1,
        detection.bbox.y2.saturating_add(LABEL_OFFSET),
        LABEL_SCALE,
        color,
    );
}

/// Pull box edges in to just outside the canvas, so every outline line that
/// lies off-canvas stays off-canvas while coordinates remain small.
fn clamp_to_canvas(bbox: BoxXyxy, (width, height): (u32, u32)) -> BoxXyxy {
    let margin = BOX_THICKNESS as i32;
    let max_x = i32::try_from(width).unwrap_or(i32::MAX).saturating_add(margin - 1);
    let max_y = i32::try_from(height).unwrap_or(i32::MAX).saturating_add(margin - 1);
    BoxXyxy {
        x1: bbox.x1.clamp(-margin, max_x),
        y1: bbox.y1.clamp(-margin, max_y),
        x2: bbox.x2.clamp(-margin, max_x),
        y2: bbox.y2.clamp(-margin, max_y),
    }
}
