//! Linear mapping between graph space and canvas space.
//!
//! Graph space is measured in math units with y growing upward. Canvas
//! space is measured in pixels with rows growing downward. Both axes are
//! scaled independently, so a unit circle may render as an ellipse.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::AxisRange;

/// Pixel dimensions of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    /// Surface width in pixels.
    #[serde(default = "default_width")]
    pub width: f64,
    /// Surface height in pixels.
    #[serde(default = "default_height")]
    pub height: f64,
    /// Inset between the surface edge and the plot area, on every side.
    #[serde(default = "default_padding")]
    pub padding: f64,
}

fn default_width() -> f64 {
    600.0
}

fn default_height() -> f64 {
    400.0
}

fn default_padding() -> f64 {
    40.0
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            padding: default_padding(),
        }
    }
}

impl Canvas {
    pub fn new(width: f64, height: f64, padding: f64) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    fn plot_width(&self) -> f64 {
        self.width - 2.0 * self.padding
    }

    fn plot_height(&self) -> f64 {
        self.height - 2.0 * self.padding
    }
}

/// A point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle of the plot area in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Bidirectional affine map between graph and canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    x_range: AxisRange,
    y_range: AxisRange,
    canvas: Canvas,
}

impl CoordinateMapper {
    /// Build a mapper, refusing degenerate ranges or a canvas with no
    /// drawable area.
    pub fn new(x_range: AxisRange, y_range: AxisRange, canvas: Canvas) -> Result<Self, ConfigError> {
        x_range.check('x')?;
        y_range.check('y')?;

        let usable = canvas.plot_width() > 0.0 && canvas.plot_height() > 0.0;
        if !usable || !canvas.padding.is_finite() || canvas.padding < 0.0 {
            return Err(ConfigError::InvalidCanvas {
                width: canvas.width,
                height: canvas.height,
                padding: canvas.padding,
            });
        }

        Ok(Self {
            x_range,
            y_range,
            canvas,
        })
    }

    pub fn x_range(&self) -> AxisRange {
        self.x_range
    }

    pub fn y_range(&self) -> AxisRange {
        self.y_range
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Map a graph-space point into canvas pixels.
    pub fn to_screen(&self, x: f64, y: f64) -> ScreenPoint {
        let c = &self.canvas;
        let px = c.padding + (x - self.x_range.min) / self.x_range.span() * c.plot_width();
        let py = c.height - c.padding - (y - self.y_range.min) / self.y_range.span() * c.plot_height();
        ScreenPoint::new(px, py)
    }

    /// Map canvas pixels back into graph space.
    pub fn to_graph(&self, px: f64, py: f64) -> (f64, f64) {
        let c = &self.canvas;
        let x = self.x_range.min + (px - c.padding) / c.plot_width() * self.x_range.span();
        let y = self.y_range.min + (c.height - c.padding - py) / c.plot_height() * self.y_range.span();
        (x, y)
    }

    /// Pixels per graph unit along each axis.
    pub fn scale(&self) -> (f64, f64) {
        (
            self.canvas.plot_width() / self.x_range.span(),
            self.canvas.plot_height() / self.y_range.span(),
        )
    }

    /// The plot area inside the padding.
    pub fn plot_bounds(&self) -> ScreenRect {
        let c = &self.canvas;
        ScreenRect {
            left: c.padding,
            top: c.padding,
            right: c.width - c.padding,
            bottom: c.height - c.padding,
        }
    }
}
