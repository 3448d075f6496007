use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// One raw text observation from the recognizer.
///
/// Corners run clockwise from the top-left. Confidence is a fraction in
/// `[0, 1]` and is clamped on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub text: String,
    pub confidence: f64,
    pub quad: [Point; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Detection {
    pub fn new(text: impl Into<String>, confidence: f64, quad: [Point; 4]) -> Self {
        Self {
            text: text.into(),
            confidence: clamp_fraction(confidence),
            quad,
            color: None,
        }
    }

    /// Axis-aligned detection from an `x, y, w, h` rectangle.
    pub fn from_rect(text: impl Into<String>, confidence: f64, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self::new(
            text,
            confidence,
            [
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
            ],
        )
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn top_left(&self) -> Point {
        self.quad[0]
    }

    /// Midpoint of the top-left and bottom-right corners
    pub fn center(&self) -> Point {
        Point::new(
            (self.quad[0].x + self.quad[2].x) / 2.0,
            (self.quad[0].y + self.quad[2].y) / 2.0,
        )
    }

    /// Bounding rectangle as (x_min, y_min, x_max, y_max)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let x_min = self.quad.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let x_max = self.quad.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let y_min = self.quad.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let y_max = self.quad.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        (x_min, y_min, x_max, y_max)
    }

    pub fn width(&self) -> f64 {
        let (x_min, _, x_max, _) = self.bounds();
        x_max - x_min
    }

    pub fn height(&self) -> f64 {
        let (_, y_min, _, y_max) = self.bounds();
        y_max - y_min
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Intersection over union of the two bounding rectangles
    pub fn iou(&self, other: &Detection) -> f64 {
        let (x1_min, y1_min, x1_max, y1_max) = self.bounds();
        let (x2_min, y2_min, x2_max, y2_max) = other.bounds();

        let inter_x_min = x1_min.max(x2_min);
        let inter_y_min = y1_min.max(y2_min);
        let inter_x_max = x1_max.min(x2_max);
        let inter_y_max = y1_max.min(y2_max);

        if inter_x_max <= inter_x_min || inter_y_max <= inter_y_min {
            return 0.0;
        }

        let inter_area = (inter_x_max - inter_x_min) * (inter_y_max - inter_y_min);
        let union_area = self.area() + other.area() - inter_area;

        if union_area <= 0.0 {
            return 0.0;
        }

        inter_area / union_area
    }

    /// Shift every corner by an offset. Used to bring region-local readings
    /// back into full-canvas coordinates.
    pub fn translated(mut self, dx: f64, dy: f64) -> Self {
        for point in self.quad.iter_mut() {
            point.x += dx;
            point.y += dy;
        }
        self
    }
}

pub(crate) fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_clamps_confidence() {
        assert_eq!(Detection::from_rect("a", 1.7, 0.0, 0.0, 1.0, 1.0).confidence, 1.0);
        assert_eq!(Detection::from_rect("a", -0.2, 0.0, 0.0, 1.0, 1.0).confidence, 0.0);
        assert_eq!(Detection::from_rect("a", f64::NAN, 0.0, 0.0, 1.0, 1.0).confidence, 0.0);
    }

    #[test]
    fn test_detection_center_and_extent() {
        let det = Detection::from_rect("Power", 0.9, 100.0, 200.0, 80.0, 20.0);
        assert_eq!(det.center(), Point::new(140.0, 210.0));
        assert_eq!(det.width(), 80.0);
        assert_eq!(det.height(), 20.0);
        assert_eq!(det.top_left(), Point::new(100.0, 200.0));
    }

    #[test]
    fn test_detection_iou() {
        let a = Detection::from_rect("a", 1.0, 0.0, 0.0, 10.0, 10.0);
        let b = Detection::from_rect("b", 1.0, 5.0, 0.0, 10.0, 10.0);
        let c = Detection::from_rect("c", 1.0, 20.0, 20.0, 10.0, 10.0);

        // 50 / (100 + 100 - 50)
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(a.iou(&c), 0.0, "Disjoint boxes have zero IoU");
    }

    #[test]
    fn test_detection_translated() {
        let det = Detection::from_rect("12", 0.9, 5.0, 5.0, 10.0, 10.0).translated(100.0, 50.0);
        assert_eq!(det.top_left(), Point::new(105.0, 55.0));
        assert_eq!(det.center(), Point::new(110.0, 60.0));
    }
}
