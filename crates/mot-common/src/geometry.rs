use serde::{Deserialize, Serialize};

/// An axis-aligned 2D bounding box, center-form.
///
/// `valid` records whether the box passed its producer's own sanity checks; a box with
/// `valid == false` carries whatever coordinates it was given and should not be trusted by a
/// downstream consumer. When `valid`, `w > 0`, `h > 0`, and the derived corners are ordered
/// (`x_min <= x_max`, `y_min <= y_max`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub confidence: f32,
    pub class_id: u32,
    pub valid: bool,
}

impl BoundingBox2D {
    /// Build a box from center coordinates, validating the shape invariant.
    #[must_use]
    pub fn new(x: f32, y: f32, w: f32, h: f32, confidence: f32, class_id: u32) -> Self {
        let valid = w > 0.0 && h > 0.0 && x.is_finite() && y.is_finite();
        Self {
            x,
            y,
            w,
            h,
            confidence,
            class_id,
            valid,
        }
    }

    #[must_use]
    pub fn x_min(&self) -> f32 {
        self.x - self.w / 2.0
    }

    #[must_use]
    pub fn x_max(&self) -> f32 {
        self.x + self.w / 2.0
    }

    #[must_use]
    pub fn y_min(&self) -> f32 {
        self.y - self.h / 2.0
    }

    #[must_use]
    pub fn y_max(&self) -> f32 {
        self.y + self.h / 2.0
    }

    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// Euclidean distance between this box's center and `other`'s.
    #[must_use]
    pub fn center_distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Undo a letterbox (aspect-preserving, zero-padded resize) mapping applied before
    /// detection: `x <- (x - padding_cols) / r`, `w <- w / r`, and likewise for `y`/`h`.
    #[must_use]
    pub fn invert_letterbox(&self, scale: f32, padding_cols: f32, padding_rows: f32) -> Self {
        Self {
            x: (self.x - padding_cols) / scale,
            y: (self.y - padding_rows) / scale,
            w: self.w / scale,
            h: self.h / scale,
            confidence: self.confidence,
            class_id: self.class_id,
            valid: self.valid,
        }
    }
}

/// A 3D bounding box in the camera frame, center-form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    pub d: f32,
    pub h: f32,
    pub confidence: f32,
    pub class_id: u32,
    pub valid: bool,
}

impl BoundingBox3D {
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32, w: f32, d: f32, h: f32, confidence: f32, class_id: u32) -> Self {
        let valid = w > 0.0 && d > 0.0 && h > 0.0 && x.is_finite() && y.is_finite() && z.is_finite();
        Self {
            x,
            y,
            z,
            w,
            d,
            h,
            confidence,
            class_id,
            valid,
        }
    }

    /// An invalid placeholder, used when localization fails but the 2D detection still stands.
    #[must_use]
    pub fn invalid(class_id: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 0.0,
            d: 0.0,
            h: 0.0,
            confidence: 0.0,
            class_id,
            valid: false,
        }
    }
}
