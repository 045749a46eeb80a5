use egui::Color32;
use egui::Stroke;
use egui::Style;

use crate::chart::BarTone;
use crate::runs::RunStatus;

/// Colors shared by the graph and timeline widgets.
#[derive(Clone, Debug)]
pub struct CellGraphStyle {
    pub background: Color32,
    pub node_fill: Color32,
    pub outline: Color32,
    pub ink: Color32,
    pub edge: Color32,
    pub accent: Color32,
    pub success: Color32,
    pub error: Color32,
    pub rounding: f32,
}

impl From<&Style> for CellGraphStyle {
    fn from(style: &Style) -> Self {
        let visuals = &style.visuals;
        let background = visuals.panel_fill;
        let ink = visuals.text_color();
        Self {
            background,
            node_fill: blend(background, ink, 0.06),
            outline: blend(ink, background, 0.4),
            ink,
            edge: blend(ink, background, 0.55),
            accent: visuals.selection.stroke.color,
            success: blend(Color32::from_rgb(0x30, 0x84, 0x46), background, 0.1),
            error: blend(Color32::from_rgb(0xc1, 0x12, 0x1c), background, 0.1),
            rounding: 2.0,
        }
    }
}

impl CellGraphStyle {
    pub fn bar_fill(&self, tone: BarTone) -> Color32 {
        match tone {
            BarTone::Success => self.success,
            BarTone::Error => self.error,
        }
    }

    /// Row marker for the textual run list.
    pub fn status_icon(status: RunStatus) -> &'static str {
        match status {
            RunStatus::Queued => "…",
            RunStatus::Running => "▶",
            RunStatus::Success => "✔",
            RunStatus::Error => "✖",
        }
    }

    pub fn highlight_stroke(&self) -> Stroke {
        Stroke::new(2.0, self.accent)
    }
}

/// Per-widget style override.
pub trait Styled {
    type Style: Clone;
    fn styled(self, style: Self::Style) -> Self;
}

// Color utilities: simple sRGB linear interpolation for quick palette derivation
pub fn blend(a: Color32, b: Color32, t: f32) -> Color32 {
    let r = (a.r() as f32 * (1.0 - t) + b.r() as f32 * t).round() as u8;
    let g = (a.g() as f32 * (1.0 - t) + b.g() as f32 * t).round() as u8;
    let bch = (a.b() as f32 * (1.0 - t) + b.b() as f32 * t).round() as u8;
    Color32::from_rgb(r, g, bch)
}

const CATEGORICAL: &[Color32] = &[
    Color32::from_rgb(0xf7, 0xba, 0x0b), // signal yellow
    Color32::from_rgb(0xe2, 0x53, 0x03), // signal orange
    Color32::from_rgb(0x8d, 0x40, 0x8a), // signal violet
    Color32::from_rgb(0x15, 0x4e, 0xa1), // signal blue
    Color32::from_rgb(0x00, 0x89, 0xb6), // sky blue
    Color32::from_rgb(0x6d, 0xa3, 0x3d), // yellow green
    Color32::from_rgb(0x00, 0x84, 0x62), // signal green
    Color32::from_rgb(0x00, 0x8f, 0x85), // mint turquoise
];

/// Stable per-cell color for node stripes and timeline labels.
pub fn cell_color(cell: &str) -> Color32 {
    // FNV-1a, not cryptographic.
    let mut hash: u64 = 1469598103934665603;
    for byte in cell.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    CATEGORICAL[(hash % CATEGORICAL.len() as u64) as usize]
}
