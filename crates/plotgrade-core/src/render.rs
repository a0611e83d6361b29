//! Rendering to drawable primitives.
//!
//! The engine does not draw. It turns a graph into an ordered list of
//! [`Primitive`]s with pre-mapped canvas coordinates; whatever surface
//! displays the graph only has to stroke lines, fill markers and place text.
//! Primitives are emitted back to front: grid, axes, text, function curves,
//! data lines and points, the correct-answer overlay, then the submitted
//! answer.

use serde::Serialize;

use crate::error::ConfigError;
use crate::grading::SubmittedAnswer;
use crate::mapper::{Canvas, CoordinateMapper, ScreenPoint, ScreenRect};
use crate::model::{Area, CorrectAnswer, GraphModel, LineKind};
use crate::sampler::{sample, DEFAULT_RESOLUTION};

/// Grid lines per axis above which the grid is not drawn.
pub const MAX_GRID_LINES: usize = 500;

const TICK_LABEL_OFFSET: f64 = 14.0;

/// Which overlays are drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderMode {
    /// Question editor: shows the correct answer.
    Authoring,
    /// Student view: shows the student's own answer, if any.
    Answer { submitted: Option<SubmittedAnswer> },
    /// Grader view: shows both.
    Review { submitted: Option<SubmittedAnswer> },
}

impl RenderMode {
    fn shows_correct(&self) -> bool {
        matches!(self, RenderMode::Authoring | RenderMode::Review { .. })
    }

    fn submitted(&self) -> Option<&SubmittedAnswer> {
        match self {
            RenderMode::Authoring => None,
            RenderMode::Answer { submitted } | RenderMode::Review { submitted } => submitted.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// Visual emphasis of a function curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    Normal,
    Correct,
    Submitted,
}

/// One drawable element in canvas coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    /// A grid line at a constant value of `axis`.
    GridLine {
        axis: Axis,
        from: ScreenPoint,
        to: ScreenPoint,
    },
    AxisLine {
        axis: Axis,
        from: ScreenPoint,
        to: ScreenPoint,
    },
    TickLabel {
        axis: Axis,
        position: ScreenPoint,
        text: String,
    },
    AxisLabel {
        axis: Axis,
        position: ScreenPoint,
        text: String,
    },
    Title {
        position: ScreenPoint,
        text: String,
    },
    /// One polyline segment of a sampled function.
    FunctionCurve {
        function_id: String,
        color: String,
        emphasis: Emphasis,
        points: Vec<ScreenPoint>,
    },
    DataLine {
        line_id: String,
        color: String,
        kind: LineKind,
        points: Vec<ScreenPoint>,
    },
    DataPoint {
        line_id: String,
        color: String,
        position: ScreenPoint,
        label: Option<String>,
    },
    /// The correct point with its tolerance drawn as an ellipse, since the
    /// axes may be scaled differently.
    CorrectPoint {
        position: ScreenPoint,
        radius_x: f64,
        radius_y: f64,
    },
    CorrectArea {
        rect: ScreenRect,
    },
    SubmittedPoint {
        position: ScreenPoint,
    },
    SubmittedArea {
        rect: ScreenRect,
    },
}

/// Produces primitives for a fixed canvas and sampling resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Renderer {
    pub canvas: Canvas,
    pub resolution: usize,
}

impl Renderer {
    pub fn new(canvas: Canvas, resolution: usize) -> Self {
        Self { canvas, resolution }
    }

    /// Render a graph. Fails only if the graph's ranges cannot be mapped
    /// onto the canvas.
    pub fn render(&self, model: &GraphModel, mode: &RenderMode) -> Result<Vec<Primitive>, ConfigError> {
        let mapper = model.mapper(self.canvas)?;
        let mut out = Vec::new();

        if model.show_grid {
            grid(model, &mapper, &mut out);
        }
        axes(model, &mapper, &mut out);
        labels(model, &mapper, &mut out);
        self.functions(model, mode, &mapper, &mut out);
        data(model, &mapper, &mut out);

        if mode.shows_correct() {
            if let Some(answer) = &model.answer {
                correct_overlay(answer, model.tolerance_radius, &mapper, &mut out);
            }
        }
        if let Some(submitted) = mode.submitted() {
            submitted_marker(submitted, &mapper, &mut out);
        }

        Ok(out)
    }

    fn functions(
        &self,
        model: &GraphModel,
        mode: &RenderMode,
        mapper: &CoordinateMapper,
        out: &mut Vec<Primitive>,
    ) {
        let correct_id = match (&model.answer, mode.shows_correct()) {
            (Some(CorrectAnswer::Function { id }), true) => Some(id.as_str()),
            _ => None,
        };
        let submitted_id = match mode.submitted() {
            Some(SubmittedAnswer::Function { id }) => Some(id.as_str()),
            _ => None,
        };

        for function in &model.functions {
            let emphasis = if correct_id == Some(function.id.as_str()) {
                Emphasis::Correct
            } else if submitted_id == Some(function.id.as_str()) {
                Emphasis::Submitted
            } else {
                Emphasis::Normal
            };

            for polyline in sample(function, model.x_range, model.y_range, self.resolution) {
                out.push(Primitive::FunctionCurve {
                    function_id: function.id.clone(),
                    color: function.color.clone(),
                    emphasis,
                    points: polyline
                        .points
                        .iter()
                        .map(|p| mapper.to_screen(p.x, p.y))
                        .collect(),
                });
            }
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Canvas::default(), DEFAULT_RESOLUTION)
    }
}

/// Render with the default sampling resolution.
pub fn render(model: &GraphModel, canvas: Canvas, mode: &RenderMode) -> Result<Vec<Primitive>, ConfigError> {
    Renderer::new(canvas, DEFAULT_RESOLUTION).render(model, mode)
}

/// Multiples of `step` inside `[min, max]`, or `None` if there are too many.
pub(crate) fn grid_values(min: f64, max: f64, step: f64) -> Option<Vec<f64>> {
    let first = (min / step).ceil();
    let last = (max / step).floor();
    let count = last - first + 1.0;
    if !count.is_finite() || count > MAX_GRID_LINES as f64 {
        return None;
    }
    let count = count.max(0.0) as usize;
    Some((0..count).map(|k| (first + k as f64) * step).collect())
}

fn grid(model: &GraphModel, mapper: &CoordinateMapper, out: &mut Vec<Primitive>) {
    let (x, y) = (model.x_range, model.y_range);

    match grid_values(x.min, x.max, model.grid_step) {
        Some(xs) => out.extend(xs.into_iter().map(|v| Primitive::GridLine {
            axis: Axis::X,
            from: mapper.to_screen(v, y.min),
            to: mapper.to_screen(v, y.max),
        })),
        None => tracing::warn!("grid step {} too dense for x-range, grid skipped", model.grid_step),
    }

    match grid_values(y.min, y.max, model.grid_step) {
        Some(ys) => out.extend(ys.into_iter().map(|v| Primitive::GridLine {
            axis: Axis::Y,
            from: mapper.to_screen(x.min, v),
            to: mapper.to_screen(x.max, v),
        })),
        None => tracing::warn!("grid step {} too dense for y-range, grid skipped", model.grid_step),
    }
}

/// Axes cross at the origin when it is visible, otherwise they hug the
/// nearest edge of the plot.
fn axes(model: &GraphModel, mapper: &CoordinateMapper, out: &mut Vec<Primitive>) {
    let (x, y) = (model.x_range, model.y_range);
    let x_axis_at = 0.0f64.clamp(y.min, y.max);
    let y_axis_at = 0.0f64.clamp(x.min, x.max);

    out.push(Primitive::AxisLine {
        axis: Axis::X,
        from: mapper.to_screen(x.min, x_axis_at),
        to: mapper.to_screen(x.max, x_axis_at),
    });
    out.push(Primitive::AxisLine {
        axis: Axis::Y,
        from: mapper.to_screen(y_axis_at, y.min),
        to: mapper.to_screen(y_axis_at, y.max),
    });

    if let Some(xs) = grid_values(x.min, x.max, model.grid_step) {
        for v in xs {
            let p = mapper.to_screen(v, x_axis_at);
            out.push(Primitive::TickLabel {
                axis: Axis::X,
                position: ScreenPoint::new(p.x, p.y + TICK_LABEL_OFFSET),
                text: format_tick(v),
            });
        }
    }
    if let Some(ys) = grid_values(y.min, y.max, model.grid_step) {
        for v in ys {
            let p = mapper.to_screen(y_axis_at, v);
            out.push(Primitive::TickLabel {
                axis: Axis::Y,
                position: ScreenPoint::new(p.x - TICK_LABEL_OFFSET, p.y),
                text: format_tick(v),
            });
        }
    }
}

fn labels(model: &GraphModel, mapper: &CoordinateMapper, out: &mut Vec<Primitive>) {
    let bounds = mapper.plot_bounds();
    let canvas = mapper.canvas();

    out.push(Primitive::AxisLabel {
        axis: Axis::X,
        position: ScreenPoint::new(bounds.right, canvas.height - canvas.padding / 4.0),
        text: model.x_label.clone(),
    });
    out.push(Primitive::AxisLabel {
        axis: Axis::Y,
        position: ScreenPoint::new(canvas.padding / 4.0, bounds.top),
        text: model.y_label.clone(),
    });
    if let Some(title) = &model.title {
        out.push(Primitive::Title {
            position: ScreenPoint::new(canvas.width / 2.0, canvas.padding / 2.0),
            text: title.clone(),
        });
    }
}

fn data(model: &GraphModel, mapper: &CoordinateMapper, out: &mut Vec<Primitive>) {
    for line in &model.lines {
        let points: Vec<ScreenPoint> = line.points.iter().map(|p| mapper.to_screen(p.x, p.y)).collect();

        if line.kind != LineKind::Scatter && points.len() >= 2 {
            out.push(Primitive::DataLine {
                line_id: line.id.clone(),
                color: line.color.clone(),
                kind: line.kind,
                points: points.clone(),
            });
        }
        for (position, point) in points.into_iter().zip(&line.points) {
            out.push(Primitive::DataPoint {
                line_id: line.id.clone(),
                color: line.color.clone(),
                position,
                label: point.label.clone(),
            });
        }
    }
}

fn screen_rect(area: &Area, mapper: &CoordinateMapper) -> ScreenRect {
    let a = mapper.to_screen(area.x1, area.y1);
    let b = mapper.to_screen(area.x2, area.y2);
    ScreenRect {
        left: a.x.min(b.x),
        top: a.y.min(b.y),
        right: a.x.max(b.x),
        bottom: a.y.max(b.y),
    }
}

fn correct_overlay(answer: &CorrectAnswer, tolerance: f64, mapper: &CoordinateMapper, out: &mut Vec<Primitive>) {
    match answer {
        CorrectAnswer::Point(p) => {
            let (sx, sy) = mapper.scale();
            out.push(Primitive::CorrectPoint {
                position: mapper.to_screen(p.x, p.y),
                radius_x: tolerance * sx,
                radius_y: tolerance * sy,
            });
        }
        CorrectAnswer::Area(area) => out.push(Primitive::CorrectArea {
            rect: screen_rect(area, mapper),
        }),
        // drawn as curve emphasis
        CorrectAnswer::Function { .. } => {}
    }
}

fn submitted_marker(submitted: &SubmittedAnswer, mapper: &CoordinateMapper, out: &mut Vec<Primitive>) {
    match submitted {
        SubmittedAnswer::Point(p) => out.push(Primitive::SubmittedPoint {
            position: mapper.to_screen(p.x, p.y),
        }),
        SubmittedAnswer::Area(area) => out.push(Primitive::SubmittedArea {
            rect: screen_rect(area, mapper),
        }),
        SubmittedAnswer::Function { .. } => {}
    }
}

/// Tick text without trailing zeros: `2`, `0.5`, `-1.25`.
fn format_tick(v: f64) -> String {
    let rounded = (v * 1e6).round() / 1e6 + 0.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        let text = format!("{rounded:.6}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
