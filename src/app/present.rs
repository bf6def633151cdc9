use std::ops::RangeInclusive;

use clap::ValueEnum;
use eframe::egui::Color32;
use thiserror::Error;

use crate::knowledge::{Node, NodeKind, Status};

use super::physics::COLLISION_PADDING;

pub(crate) const SCALE_RANGE: RangeInclusive<f32> = 0.5..=2.0;

const ROOT_RADIUS: f32 = 30.0;
const AREA_RADIUS: f32 = 22.0;
const LEAF_RADIUS: f32 = 14.0;
const CONNECTION_BONUS: usize = 2;
const MAX_CONNECTION_BONUS: usize = 10;
const LABEL_GAP: f32 = 6.0;

const MAX_DEPTH_BUCKET: u32 = 3;
const DEPTH_FADE: f32 = 0.22;
const MIN_DEPTH_OPACITY: f32 = 0.35;

pub(crate) const FALLBACK_COLOR: Color32 = Color32::from_rgb(128, 128, 128);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ViewMode {
    /// Colour by learning status.
    Status,
    /// Colour by area, fading with distance from the root.
    #[default]
    Category,
}

impl ViewMode {
    pub(crate) const ALL: [ViewMode; 2] = [ViewMode::Status, ViewMode::Category];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Status => "By status",
            Self::Category => "By category",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ColorError {
    #[error("colour `{0}` must start with `#`")]
    MissingHash(String),
    #[error("colour `{0}` must have 3 or 6 hex digits")]
    Length(String),
    #[error("colour `{0}` contains a non-hex digit")]
    Digit(String),
}

/// Parses `#rgb` or `#rrggbb`.
pub(crate) fn parse_hex_color(raw: &str) -> Result<Color32, ColorError> {
    let digits = raw
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| ColorError::MissingHash(raw.to_owned()))?;
    if !digits.chars().all(|digit| digit.is_ascii_hexdigit()) {
        return Err(ColorError::Digit(raw.to_owned()));
    }

    let channel = |hex: &str| {
        u8::from_str_radix(hex, 16).map_err(|_| ColorError::Digit(raw.to_owned()))
    };
    match digits.len() {
        3 => Ok(Color32::from_rgb(
            channel(&digits[0..1])? * 17,
            channel(&digits[1..2])? * 17,
            channel(&digits[2..3])? * 17,
        )),
        6 => Ok(Color32::from_rgb(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        _ => Err(ColorError::Length(raw.to_owned())),
    }
}

pub(crate) fn resolve_color(raw: &str) -> Color32 {
    parse_hex_color(raw).unwrap_or(FALLBACK_COLOR)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Palette {
    /// Root colour in every view mode.
    pub accent: Color32,
    pub understood: Color32,
    pub in_progress: Color32,
    pub pending: Color32,
}

impl Palette {
    pub(crate) fn with_accent(accent: Color32) -> Self {
        Self {
            accent,
            understood: Color32::from_rgb(34, 197, 94),
            in_progress: Color32::from_rgb(245, 158, 11),
            pending: Color32::from_rgb(100, 116, 139),
        }
    }

    pub(crate) fn status(&self, status: Status) -> Color32 {
        match status {
            Status::Understood => self.understood,
            Status::InProgress => self.in_progress,
            Status::Pending => self.pending,
        }
    }
}

pub(crate) fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        scale.clamp(*SCALE_RANGE.start(), *SCALE_RANGE.end())
    } else {
        1.0
    }
}

/// Opacity for a node `distance` hops from the root in the by-category view.
pub(crate) fn depth_opacity(distance: u32) -> f32 {
    let bucket = distance.min(MAX_DEPTH_BUCKET) as f32;
    (1.0 - (bucket * DEPTH_FADE)).max(MIN_DEPTH_OPACITY)
}

/// Fill colour of a node. `distance` is the node's (clamped) distance from the root.
pub(crate) fn color_for(node: &Node, mode: ViewMode, distance: u32, palette: &Palette) -> Color32 {
    match &node.kind {
        NodeKind::Root => palette.accent,
        NodeKind::Area(area) => resolve_color(&area.color),
        NodeKind::Content(_) | NodeKind::Journal(_) => match mode {
            ViewMode::Status => palette.status(node.status().unwrap_or_default()),
            ViewMode::Category => node
                .area()
                .map_or(FALLBACK_COLOR, |area| resolve_color(&area.color))
                .gamma_multiply(depth_opacity(distance)),
        },
    }
}

fn base_radius(node: &Node, connection_count: usize) -> f32 {
    match node.kind {
        NodeKind::Root => ROOT_RADIUS,
        NodeKind::Area(_) => AREA_RADIUS,
        NodeKind::Content(_) | NodeKind::Journal(_) => {
            let bonus = connection_count
                .saturating_mul(CONNECTION_BONUS)
                .min(MAX_CONNECTION_BONUS);
            LEAF_RADIUS + bonus as f32
        }
    }
}

pub(crate) fn radius_for(node: &Node, connection_count: usize, scale: f32) -> f32 {
    base_radius(node, connection_count) * clamp_scale(scale)
}

pub(crate) fn label_offset(radius: f32, scale: f32) -> f32 {
    radius + (LABEL_GAP * clamp_scale(scale))
}

pub(crate) fn collision_radius(radius: f32) -> f32 {
    radius + COLLISION_PADDING
}

pub(crate) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_premultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}
