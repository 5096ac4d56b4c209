//! Chart models

use serde::Serialize;

/// A single plotted coordinate: epoch milliseconds on x, event count on y
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: i64,
    pub y: f64,
}

/// Ordered plot coordinates for one classification, in payload order
pub type Series = Vec<PlotPoint>;

/// Visible range of the time axis, in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AxisWindow {
    pub min: i64,
    pub max: i64,
}

/// Everything the renderer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartState {
    pub low: Series,
    pub high: Series,
    pub window: AxisWindow,
}

impl ChartState {
    pub fn new(window: AxisWindow) -> Self {
        Self {
            low: Vec::new(),
            high: Vec::new(),
            window,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
}

/// How points of a dataset are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Straight segments
    Linear,
    /// Monotone cubic, never overshoots between samples
    Monotone,
}

/// Per-dataset presentation settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetConfig {
    pub label: String,
    /// Hex colour, `#RRGGBB`
    pub color: String,
    pub interpolation: Interpolation,
    pub tension: f64,
}

/// Static chart configuration, fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub low: DatasetConfig,
    pub high: DatasetConfig,
    pub width: u32,
    pub height: u32,
}

impl ChartConfig {
    pub const LOW_COLOR: &'static str = "#ED6D85";
    pub const HIGH_COLOR: &'static str = "#57A0E5";
    pub const TENSION: f64 = 0.4;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            kind: ChartKind::Line,
            low: DatasetConfig {
                label: "Low".to_string(),
                color: Self::LOW_COLOR.to_string(),
                interpolation: Interpolation::Monotone,
                tension: Self::TENSION,
            },
            high: DatasetConfig {
                label: "High".to_string(),
                color: Self::HIGH_COLOR.to_string(),
                interpolation: Interpolation::Monotone,
                tension: Self::TENSION,
            },
            width,
            height,
        }
    }
}

/// Parse a `#RRGGBB` colour into its components
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_dashboard_layout() {
        let config = ChartConfig::new(800, 600);
        assert_eq!(config.kind, ChartKind::Line);
        assert_eq!(config.low.label, "Low");
        assert_eq!(config.high.label, "High");
        assert_eq!(config.low.interpolation, Interpolation::Monotone);
        assert_eq!(config.high.tension, 0.4);
    }

    #[test]
    fn test_config_serializes_lowercase_enums() {
        let json = serde_json::to_value(ChartConfig::new(800, 600)).unwrap();
        assert_eq!(json["kind"], "line");
        assert_eq!(json["low"]["interpolation"], "monotone");
        assert_eq!(json["high"]["color"], "#57A0E5");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ED6D85"), Some((0xED, 0x6D, 0x85)));
        assert_eq!(parse_hex_color("#57a0e5"), Some((0x57, 0xA0, 0xE5)));
        assert_eq!(parse_hex_color("ED6D85"), None);
        assert_eq!(parse_hex_color("#ED6D8"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
    }
}
