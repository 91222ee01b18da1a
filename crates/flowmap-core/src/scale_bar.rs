use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};

/// Widest the bar may be, in pixels.
pub const MAX_WIDTH_PX: f64 = 400.0;
/// Largest number of alternating segments.
pub const MAX_SEGMENTS: u32 = 5;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleBarConfig {
    /// Initial zoom factor.
    pub initial_k: Option<f64>,
    /// Pixels per metre at zoom 1.
    pub meter_to_px: Option<f64>,
    /// Offset of the bar inside its parent.
    #[serde(default)]
    pub position: Option<[f64; 2]>,
}

/// One rectangle of the bar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleSegment {
    pub x: f64,
    pub width: f64,
    /// Alternates starting with filled (dark).
    pub filled: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScaleBarLayout {
    pub segments: Vec<ScaleSegment>,
    pub start_label: String,
    pub end_label: String,
    /// Total bar width in pixels.
    pub width: f64,
}

/// Metric scale bar that picks a unit and segment count so each segment
/// spans a whole number of units and the bar fits [`MAX_WIDTH_PX`].
#[derive(Clone, Debug, PartialEq)]
pub struct ScaleBar {
    position: DVec2,
    k: f64,
    meter_to_px: f64,
}

impl ScaleBar {
    pub fn new(config: &ScaleBarConfig) -> Result<Self> {
        Self::validate(config)?;
        Ok(Self {
            position: config.position.map_or(DVec2::ZERO, DVec2::from),
            k: config.initial_k.unwrap_or(1.0),
            meter_to_px: config.meter_to_px.unwrap_or(1.0),
        })
    }

    /// Check required keys before anything is built.
    pub fn validate(config: &ScaleBarConfig) -> Result<()> {
        let Some(k) = config.initial_k else {
            return Err(FlowError::InvalidConfig("Initial K value not provided"));
        };
        if !(k > 0.0) {
            return Err(FlowError::InvalidConfig("Initial K cannot be 0 or undefined"));
        }
        let Some(m) = config.meter_to_px else {
            return Err(FlowError::InvalidConfig("Meter to pixel ratio not provided"));
        };
        if !(m > 0.0) {
            return Err(FlowError::InvalidConfig("Meter to pixel ratio must be positive"));
        }
        Ok(())
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn set_k(&mut self, k: f64) -> Result<()> {
        if !(k > 0.0) {
            return Err(FlowError::InvalidConfig("Initial K cannot be 0 or undefined"));
        }
        self.k = k;
        Ok(())
    }

    pub fn layout(&self) -> ScaleBarLayout {
        let meter_to_px = self.k * self.meter_to_px;

        let (unit_scale, unit_suffix, unit) = if 1000.0 * meter_to_px < MAX_WIDTH_PX {
            (1000.0, "", " km")
        } else if 100.0 * meter_to_px < MAX_WIDTH_PX {
            (100.0, "00", " m")
        } else {
            (1.0, "", " m")
        };

        let mut count = 0;
        let mut per_segment = 1.0;
        let mut remainder = 1.0;
        for n in (1..=MAX_SEGMENTS).rev() {
            let fit = MAX_WIDTH_PX / meter_to_px / n as f64 / unit_scale;
            if fit % 1.0 < remainder && fit.floor() > 0.0 {
                per_segment = fit.floor();
                remainder = fit % 1.0;
                count = n;
            }
        }

        let segment_width = per_segment * unit_scale * meter_to_px;
        let segments = (0..count)
            .map(|n| ScaleSegment {
                x: n as f64 * segment_width,
                width: segment_width,
                filled: n % 2 == 0,
            })
            .collect();

        ScaleBarLayout {
            segments,
            start_label: format!("0{}", unit),
            end_label: format!("{}{}{}", per_segment * count as f64, unit_suffix, unit),
            width: segment_width * count as f64,
        }
    }
}
