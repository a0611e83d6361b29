//! Fixed-resolution sampling of plotted functions.
//!
//! A function is evaluated at evenly spaced x positions across the visible
//! range. Runs of samples that are defined and inside the visible y-range
//! become polylines; anything else (a pole, a domain gap, an excursion out
//! of frame) ends the current run, so asymptotes are never bridged by a
//! spurious connecting segment.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::model::{AxisRange, GraphFunction, GraphPoint};

/// Number of steps across the x-range used when nothing else is configured.
pub const DEFAULT_RESOLUTION: usize = 200;

/// Largest resolution accepted from configuration.
pub const MAX_RESOLUTION: usize = 10_000;

/// A contiguous run of graph-space samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<GraphPoint>,
}

impl Polyline {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Sample a function's expression over the visible ranges.
///
/// Walks `resolution` equal steps from `x_range.min` to `x_range.max`
/// inclusive. An expression that does not parse yields no polylines.
pub fn sample(
    function: &GraphFunction,
    x_range: AxisRange,
    y_range: AxisRange,
    resolution: usize,
) -> Vec<Polyline> {
    match Expr::parse(&function.expression) {
        Ok(expr) => sample_expr(&expr, x_range, y_range, resolution),
        Err(e) => {
            tracing::debug!(
                "not sampling function {} ('{}'): {e}",
                function.id,
                function.expression
            );
            Vec::new()
        }
    }
}

/// Sample an already-parsed expression.
pub fn sample_expr(
    expr: &Expr,
    x_range: AxisRange,
    y_range: AxisRange,
    resolution: usize,
) -> Vec<Polyline> {
    let steps = resolution.max(1);
    let mut polylines = Vec::new();
    let mut current: Vec<GraphPoint> = Vec::new();

    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = x_range.min + x_range.span() * t;

        match expr.eval(x) {
            Ok(y) if y_range.contains(y) => current.push(GraphPoint::new(x, y)),
            _ => close_run(&mut current, &mut polylines),
        }
    }
    close_run(&mut current, &mut polylines);

    polylines
}

fn close_run(current: &mut Vec<GraphPoint>, polylines: &mut Vec<Polyline>) {
    if current.len() >= 2 {
        polylines.push(Polyline {
            points: std::mem::take(current),
        });
    } else {
        current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(expression: &str) -> GraphFunction {
        GraphFunction {
            id: "f".into(),
            expression: expression.into(),
            color: "#000".into(),
            label: None,
        }
    }

    fn range(min: f64, max: f64) -> AxisRange {
        AxisRange::new(min, max)
    }

    #[test]
    fn continuous_function_is_one_polyline() {
        let lines = sample(&function("x / 2"), range(-4.0, 4.0), range(-10.0, 10.0), 200);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 201);
        assert_eq!(lines[0].points[0].x, -4.0);
        assert_eq!(lines[0].points[200].x, 4.0);
    }

    #[test]
    fn reciprocal_splits_at_pole() {
        let lines = sample(&function("1/x"), range(-5.0, 5.0), range(-10.0, 10.0), DEFAULT_RESOLUTION);
        assert!(lines.len() >= 2, "got {} polylines", lines.len());
        for line in &lines {
            let all_neg = line.points.iter().all(|p| p.x < 0.0);
            let all_pos = line.points.iter().all(|p| p.x > 0.0);
            assert!(all_neg || all_pos, "polyline crosses x = 0");
        }
    }

    #[test]
    fn out_of_frame_excursions_break_the_curve() {
        // x^2 - 4 is inside [-4, 0] only while |x| <= 2
        let lines = sample(&function("x^2 - 4"), range(-4.0, 4.0), range(-4.0, 0.0), 80);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].points.iter().all(|p| p.x.abs() <= 2.0));
    }

    #[test]
    fn domain_gap_yields_separate_runs() {
        let lines = sample(&function("sqrt(x^2 - 1)"), range(-3.0, 3.0), range(-1.0, 5.0), 60);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].points.iter().all(|p| p.x <= -1.0));
        assert!(lines[1].points.iter().all(|p| p.x >= 1.0));
    }

    #[test]
    fn isolated_samples_are_dropped() {
        // only x = 0 is in range on this coarse grid
        let lines = sample(&function("x^2"), range(-1.0, 1.0), range(-0.1, 0.1), 2);
        assert!(lines.is_empty());
    }

    #[test]
    fn invalid_expression_yields_nothing() {
        assert!(sample(&function("alert(1)"), range(-1.0, 1.0), range(-1.0, 1.0), 10).is_empty());
    }

    #[test]
    fn zero_resolution_is_one_step() {
        let lines = sample(&function("x"), range(0.0, 1.0), range(0.0, 1.0), 0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 2);
    }

    #[test]
    fn sampling_is_deterministic() {
        let f = function("tan(x)");
        let a = sample(&f, range(-6.0, 6.0), range(-5.0, 5.0), 200);
        let b = sample(&f, range(-6.0, 6.0), range(-5.0, 5.0), 200);
        assert_eq!(a, b);
        assert!(a.len() >= 4);
    }
}
