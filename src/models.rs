use image::RgbImage;
use serde::{Deserialize, Serialize};

/// One box as reported by a detection engine, before label resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_index: usize,
    pub confidence: f32,
    /// Corners as `[x1, y1, x2, y2]` in pixel coordinates.
    pub xyxy: [f32; 4],
}

/// Axis-aligned box in integer pixel coordinates, `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxXyxy {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoxXyxy {
    /// Truncates toward zero and orders the corners.
    pub fn from_xyxy(xyxy: [f32; 4]) -> Self {
        let [ax, ay, bx, by] = xyxy.map(|v| v as i32);
        Self {
            x1: ax.min(bx),
            y1: ay.min(by),
            x2: ax.max(bx),
            y2: ay.max(by),
        }
    }

    pub fn width(&self) -> u32 {
        self.x2.abs_diff(self.x1).saturating_add(1)
    }

    pub fn height(&self) -> u32 {
        self.y2.abs_diff(self.y1).saturating_add(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_index: usize,
    pub class_label: String,
    pub confidence: f32,
    pub bbox: BoxXyxy,
}

impl Detection {
    /// Human-readable summary, e.g. `"helmet 0.87"`.
    pub fn label(&self) -> String {
        format!("{} {:.2}", self.class_label, self.confidence)
    }
}

/// Output of one pipeline call. Never persisted.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Annotated image in display (RGB) channel order.
    pub annotated_image: RgbImage,
    /// One label string per engine box, in emission order.
    pub detections: Vec<String>,
    pub objects: Vec<Detection>,
}
