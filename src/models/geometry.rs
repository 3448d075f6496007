use serde::{Deserialize, Serialize};

/// Pixel rectangle handed to the recognizer for a region re-scan.
/// Serialized as `[x, y, w, h]` on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct CropBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CropBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a crop box from bounds (x1, y1, x2, y2)
    pub fn from_bounds(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, String> {
        if x2 <= x1 {
            return Err("x2 must be greater than x1".to_string());
        }
        if y2 <= y1 {
            return Err("y2 must be greater than y1".to_string());
        }

        Ok(Self {
            x: x1,
            y: y1,
            width: x2.abs_diff(x1),
            height: y2.abs_diff(y1),
        })
    }

    /// Build from floating point geometry, rounding to whole pixels.
    /// Negative extents collapse to zero.
    pub fn from_f64(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: x.round() as i32,
            y: y.round() as i32,
            width: width.max(0.0).round() as u32,
            height: height.max(0.0).round() as u32,
        }
    }

    /// Right edge, saturating at `i32::MAX` for boxes read far off the canvas
    pub fn x2(&self) -> i32 {
        self.x.saturating_add(extent(self.width))
    }

    pub fn y2(&self) -> i32 {
        self.y.saturating_add(extent(self.height))
    }

    /// Clip the box to an image of the given size. Returns `None` when nothing
    /// of the box remains on the canvas.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<CropBox> {
        let x1 = self.x.max(0);
        let y1 = self.y.max(0);
        let x2 = self.x2().min(image_width as i32);
        let y2 = self.y2().min(image_height as i32);

        CropBox::from_bounds(x1, y1, x2, y2).ok()
    }
}

impl From<[i32; 4]> for CropBox {
    fn from(raw: [i32; 4]) -> Self {
        Self::new(raw[0], raw[1], raw[2].max(0) as u32, raw[3].max(0) as u32)
    }
}

impl From<CropBox> for [i32; 4] {
    fn from(crop: CropBox) -> Self {
        [crop.x, crop.y, extent(crop.width), extent(crop.height)]
    }
}

fn extent(side: u32) -> i32 {
    i32::try_from(side).unwrap_or(i32::MAX)
}

/// Denoising filter the recognizer applies to a region before re-reading it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    HighContrastBinary,
    InvertedBinary,
    WhiteIsolation,
    Sharpen,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::HighContrastBinary => "HighContrastBinary",
            Strategy::InvertedBinary => "InvertedBinary",
            Strategy::WhiteIsolation => "WhiteIsolation",
            Strategy::Sharpen => "Sharpen",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_from_bounds_valid() {
        let crop = CropBox::from_bounds(100, 100, 300, 250).unwrap();
        assert_eq!(crop, CropBox::new(100, 100, 200, 150));
    }

    #[test]
    fn test_far_off_box_clamps_without_overflow() {
        let crop = CropBox::from_f64(3.0e9, 10.0, 4.0e9, 50.0);
        assert_eq!(crop.x, i32::MAX);
        assert_eq!(crop.x2(), i32::MAX, "Right edge saturates");
        assert_eq!(crop.clamp_to(1000, 1000), None, "Nothing of it lies on the canvas");

        let wide = CropBox::from_f64(-10.0, 0.0, 1.0e10, 50.0);
        assert_eq!(wide.clamp_to(1000, 1000), Some(CropBox::new(0, 0, 1000, 50)));
    }

    #[test]
    fn test_crop_from_bounds_invalid() {
        let result = CropBox::from_bounds(300, 100, 100, 250);
        assert_eq!(result.unwrap_err(), "x2 must be greater than x1");

        let result = CropBox::from_bounds(100, 250, 300, 100);
        assert_eq!(result.unwrap_err(), "y2 must be greater than y1");
    }

    #[test]
    fn test_crop_from_f64_rounds_and_floors_extent() {
        let crop = CropBox::from_f64(10.4, 19.6, 50.5, -3.0);
        assert_eq!(crop.x, 10);
        assert_eq!(crop.y, 20);
        assert_eq!(crop.width, 51);
        assert_eq!(crop.height, 0, "Negative extent collapses");
        assert_eq!(crop.clamp_to(1000, 1000), None);
    }

    #[test]
    fn test_crop_clamp_to_canvas() {
        let crop = CropBox::new(-20, 900, 200, 300);
        let clamped = crop.clamp_to(1920, 1080).unwrap();
        assert_eq!(clamped, CropBox::new(0, 900, 180, 180));

        let outside = CropBox::new(2000, 10, 50, 50);
        assert!(outside.clamp_to(1920, 1080).is_none(), "Off-canvas box should vanish");
    }

    #[test]
    fn test_strategy_wire_names() {
        assert_eq!(serde_json::to_string(&Strategy::WhiteIsolation).unwrap(), "\"WhiteIsolation\"");
        assert_eq!(Strategy::HighContrastBinary.to_string(), "HighContrastBinary");
    }

    #[test]
    fn test_crop_serializes_as_xywh_array() {
        let crop = CropBox::new(10, 20, 30, 40);
        let json = serde_json::to_string(&crop).unwrap();
        assert_eq!(json, "[10,20,30,40]");

        let parsed: CropBox = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, crop);
    }
}
