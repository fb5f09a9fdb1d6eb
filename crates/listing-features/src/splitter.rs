//! Decomposition of compound fields into numeric sub-features.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static RESOLUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*[x×]\s*(\d+)").expect("Invalid regex: resolution")
});

/// Parse a `W x H` string such as `"1080 x 2400 piksel"` or `"1170×2532"`.
pub fn split_resolution(raw: &str) -> Option<(f64, f64)> {
    let caps = RESOLUTION.captures(raw)?;
    let width = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let height = caps.get(2)?.as_str().parse::<f64>().ok()?;
    Some((width, height))
}

/// Sub-features derived from a display resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolutionFeatures {
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Megapixels, `width * height / 1e6`
    pub pixel_count: Option<f64>,
    /// `width / height`
    pub aspect_ratio: Option<f64>,
}

impl ResolutionFeatures {
    /// Derive the ratios. Both are absent when either side is absent or the
    /// height is zero.
    pub fn derive(width: Option<f64>, height: Option<f64>) -> Self {
        let (pixel_count, aspect_ratio) = match (width, height) {
            (Some(w), Some(h)) if h != 0.0 => (Some(w * h / 1_000_000.0), Some(w / h)),
            _ => (None, None),
        };
        Self {
            width,
            height,
            pixel_count,
            aspect_ratio,
        }
    }

    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.and_then(split_resolution) {
            Some((w, h)) => Self::derive(Some(w), Some(h)),
            None => Self::default(),
        }
    }

    /// Values in output column order: width, height, pixel count, aspect ratio.
    pub fn values(&self) -> [Option<f64>; 4] {
        [self.width, self.height, self.pixel_count, self.aspect_ratio]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_resolution_formats() {
        assert_eq!(split_resolution("1080x2400"), Some((1080.0, 2400.0)));
        assert_eq!(split_resolution("1080 X 2400 piksel"), Some((1080.0, 2400.0)));
        assert_eq!(split_resolution("1170×2532"), Some((1170.0, 2532.0)));
        assert_eq!(split_resolution("Full HD+"), None);
        assert_eq!(split_resolution("1080"), None);
    }

    #[test]
    fn test_derive_scenario() {
        let features = ResolutionFeatures::from_raw(Some("1080x2400"));
        assert_eq!(features.width, Some(1080.0));
        assert_eq!(features.height, Some(2400.0));
        assert!((features.pixel_count.unwrap() - 2.592).abs() < 1e-12);
        assert!((features.aspect_ratio.unwrap() - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_derive_zero_height() {
        let features = ResolutionFeatures::derive(Some(1080.0), Some(0.0));
        assert_eq!(features.pixel_count, None);
        assert_eq!(features.aspect_ratio, None);
        assert_eq!(features.width, Some(1080.0));
    }

    #[test]
    fn test_derive_missing_side() {
        let features = ResolutionFeatures::derive(None, Some(2400.0));
        assert_eq!(features.pixel_count, None);
        assert_eq!(features.aspect_ratio, None);
        assert_eq!(ResolutionFeatures::from_raw(None), ResolutionFeatures::default());
    }
}
