//! Graph data model.
//!
//! [`GraphModel`] is the validated, in-memory description of a graph.
//! [`GraphConfig`] is its flat persisted form, with the camelCase field
//! names the question bank stores. Every `GraphModel` deserializes through
//! `GraphConfig`, so legacy inference and invariant checks run exactly once,
//! at load time.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mapper::{Canvas, CoordinateMapper};

/// Closed interval of one axis, persisted as `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    /// Fails unless `min < max` and both bounds are finite.
    pub fn check(&self, axis: char) -> Result<(), ConfigError> {
        if self.min.is_finite() && self.max.is_finite() && self.min < self.max {
            Ok(())
        } else {
            Err(ConfigError::InvalidRange {
                axis,
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl From<[f64; 2]> for AxisRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<AxisRange> for [f64; 2] {
    fn from(range: AxisRange) -> Self {
        [range.min, range.max]
    }
}

/// A point in graph space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GraphPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, label: None }
    }

    /// A point snapped to one decimal place, as produced by canvas clicks.
    pub fn snapped(x: f64, y: f64) -> Self {
        Self::new(round_to_tenth(x), round_to_tenth(y))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn distance_to(&self, other: &GraphPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    fn check_finite(&self, owner: impl FnOnce() -> String) -> Result<(), ConfigError> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(ConfigError::NonFinitePoint {
                owner: owner(),
                x: self.x,
                y: self.y,
            })
        }
    }
}

fn round_to_tenth(v: f64) -> f64 {
    // `+ 0.0` folds -0.0 into 0.0
    (v * 10.0).round() / 10.0 + 0.0
}

/// A plotted function of `x`. The expression is kept as source text and
/// only parsed when sampled or probed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphFunction {
    pub id: String,
    pub expression: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// How a data line is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    #[default]
    Line,
    Curve,
    Scatter,
}

/// A polyline of authored data points, drawn in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLine {
    pub id: String,
    #[serde(default)]
    pub points: Vec<GraphPoint>,
    pub color: String,
    #[serde(default)]
    pub kind: LineKind,
}

/// Rectangle given by two opposite corners in any order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Area {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Corners as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.x1.min(self.x2),
            self.y1.min(self.y2),
            self.x1.max(self.x2),
            self.y1.max(self.y2),
        )
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Inclusive containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        x >= min_x && x <= max_x && y >= min_y && y <= max_y
    }

    pub fn intersection_area(&self, other: &Area) -> f64 {
        let (a_min_x, a_min_y, a_max_x, a_max_y) = self.bounds();
        let (b_min_x, b_min_y, b_max_x, b_max_y) = other.bounds();
        let w = a_max_x.min(b_max_x) - a_min_x.max(b_min_x);
        let h = a_max_y.min(b_max_y) - a_min_y.max(b_min_y);
        if w > 0.0 && h > 0.0 {
            w * h
        } else {
            0.0
        }
    }
}

/// Which grading rule applies to an interactive graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerType {
    Point,
    Function,
    Area,
}

impl fmt::Display for AnswerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerType::Point => write!(f, "point"),
            AnswerType::Function => write!(f, "function"),
            AnswerType::Area => write!(f, "area"),
        }
    }
}

impl FromStr for AnswerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "point" => Ok(AnswerType::Point),
            "function" | "fn" => Ok(AnswerType::Function),
            "area" | "region" => Ok(AnswerType::Area),
            other => Err(format!("unknown answer type: {other}")),
        }
    }
}

/// The author-defined correct answer of an interactive graph.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectAnswer {
    Point(GraphPoint),
    Function { id: String },
    Area(Area),
}

impl CorrectAnswer {
    pub fn answer_type(&self) -> AnswerType {
        match self {
            CorrectAnswer::Point(_) => AnswerType::Point,
            CorrectAnswer::Function { .. } => AnswerType::Function,
            CorrectAnswer::Area(_) => AnswerType::Area,
        }
    }
}

// ---------------------------------------------------------------------------
// Validated model
// ---------------------------------------------------------------------------

/// A validated graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphConfig", into = "GraphConfig")]
pub struct GraphModel {
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    pub x_label: String,
    pub y_label: String,
    pub title: Option<String>,
    pub show_grid: bool,
    pub grid_step: f64,
    pub lines: Vec<GraphLine>,
    pub functions: Vec<GraphFunction>,
    pub interactive: bool,
    pub answer: Option<CorrectAnswer>,
    /// Maximum graph-space distance for a point answer; 0 means exact.
    pub tolerance_radius: f64,
}

impl Default for GraphModel {
    fn default() -> Self {
        Self {
            x_range: default_range(),
            y_range: default_range(),
            x_label: default_x_label(),
            y_label: default_y_label(),
            title: None,
            show_grid: true,
            grid_step: default_grid_step(),
            lines: Vec::new(),
            functions: Vec::new(),
            interactive: false,
            answer: None,
            tolerance_radius: default_tolerance(),
        }
    }
}

impl GraphModel {
    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.x_range.check('x')?;
        self.y_range.check('y')?;

        if !(self.grid_step.is_finite() && self.grid_step > 0.0) {
            return Err(ConfigError::NonPositiveGridStep(self.grid_step));
        }
        if !(self.tolerance_radius.is_finite() && self.tolerance_radius >= 0.0) {
            return Err(ConfigError::NegativeTolerance(self.tolerance_radius));
        }

        for line in &self.lines {
            for point in &line.points {
                point.check_finite(|| format!("line '{}'", line.id))?;
            }
        }

        check_unique("line", self.lines.iter().map(|l| l.id.as_str()))?;
        check_unique("function", self.functions.iter().map(|f| f.id.as_str()))?;

        match &self.answer {
            Some(answer) => self.check_answer(answer),
            None if self.interactive => Err(ConfigError::NoCorrectAnswer),
            None => Ok(()),
        }
    }

    /// Check that an answer is consistent with this graph.
    pub fn check_answer(&self, answer: &CorrectAnswer) -> Result<(), ConfigError> {
        match answer {
            CorrectAnswer::Point(p) => p.check_finite(|| "correct answer".to_string()),
            CorrectAnswer::Function { id } => {
                if self.function(id).is_some() {
                    Ok(())
                } else {
                    Err(ConfigError::UnknownFunction(id.clone()))
                }
            }
            CorrectAnswer::Area(area) => {
                if area.area() > 0.0 && area.area().is_finite() {
                    Ok(())
                } else {
                    Err(ConfigError::DegenerateArea)
                }
            }
        }
    }

    pub fn answer_type(&self) -> Option<AnswerType> {
        self.answer.as_ref().map(CorrectAnswer::answer_type)
    }

    pub fn function(&self, id: &str) -> Option<&GraphFunction> {
        self.functions.iter().find(|f| f.id == id)
    }

    pub fn line(&self, id: &str) -> Option<&GraphLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Build a mapper from this graph's ranges onto the given canvas.
    pub fn mapper(&self, canvas: Canvas) -> Result<CoordinateMapper, ConfigError> {
        CoordinateMapper::new(self.x_range, self.y_range, canvas)
    }
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Persisted form
// ---------------------------------------------------------------------------

/// Flat persisted graph configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    #[serde(default = "default_range")]
    pub x_range: AxisRange,
    #[serde(default = "default_range")]
    pub y_range: AxisRange,
    #[serde(default = "default_x_label")]
    pub x_label: String,
    #[serde(default = "default_y_label")]
    pub y_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default = "default_true")]
    pub show_grid: bool,
    #[serde(default = "default_grid_step")]
    pub grid_step: f64,
    #[serde(default)]
    pub lines: Vec<GraphLine>,
    #[serde(default)]
    pub functions: Vec<GraphFunction>,
    #[serde(default)]
    pub is_interactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_type: Option<AnswerType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_point: Option<GraphPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_function_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_area: Option<Area>,
    #[serde(default = "default_tolerance")]
    pub tolerance_radius: f64,
}

fn default_range() -> AxisRange {
    AxisRange::new(-10.0, 10.0)
}

fn default_x_label() -> String {
    "x".to_string()
}

fn default_y_label() -> String {
    "y".to_string()
}

fn default_true() -> bool {
    true
}

fn default_grid_step() -> f64 {
    1.0
}

fn default_tolerance() -> f64 {
    0.5
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphModel::default().into()
    }
}

impl TryFrom<GraphConfig> for GraphModel {
    type Error = ConfigError;

    fn try_from(config: GraphConfig) -> Result<Self, Self::Error> {
        let answer = resolve_answer(
            config.answer_type,
            config.correct_point,
            config.correct_function_id,
            config.correct_area,
            config.is_interactive,
        )?;

        let model = GraphModel {
            x_range: config.x_range,
            y_range: config.y_range,
            x_label: config.x_label,
            y_label: config.y_label,
            title: config.title,
            show_grid: config.show_grid,
            grid_step: config.grid_step,
            lines: config.lines,
            functions: config.functions,
            interactive: config.is_interactive,
            answer,
            tolerance_radius: config.tolerance_radius,
        };
        model.validate()?;
        Ok(model)
    }
}

/// Turn the flat answer fields into a single tagged answer.
///
/// A bare `correctPoint` without `answerType` is legacy point mode. Stale
/// fields that disagree with the declared type are dropped on
/// non-interactive graphs and rejected on interactive ones.
fn resolve_answer(
    answer_type: Option<AnswerType>,
    point: Option<GraphPoint>,
    function_id: Option<String>,
    area: Option<Area>,
    interactive: bool,
) -> Result<Option<CorrectAnswer>, ConfigError> {
    let Some(declared) = answer_type else {
        return match (point, function_id, area) {
            (point, None, None) => Ok(point.map(CorrectAnswer::Point)),
            _ => Err(ConfigError::AmbiguousAnswer),
        };
    };

    let others = match declared {
        AnswerType::Point => function_id.is_some() || area.is_some(),
        AnswerType::Function => point.is_some() || area.is_some(),
        AnswerType::Area => point.is_some() || function_id.is_some(),
    };
    if interactive && others {
        return Err(ConfigError::ConflictingAnswers { declared });
    }

    let answer = match declared {
        AnswerType::Point => point.map(CorrectAnswer::Point),
        AnswerType::Function => function_id.map(|id| CorrectAnswer::Function { id }),
        AnswerType::Area => area.map(CorrectAnswer::Area),
    };
    answer
        .map(Some)
        .ok_or(ConfigError::MissingCorrectAnswer(declared))
}

impl From<GraphModel> for GraphConfig {
    fn from(model: GraphModel) -> Self {
        let answer_type = model.answer_type();
        let (mut correct_point, mut correct_function_id, mut correct_area) = (None, None, None);
        match model.answer {
            Some(CorrectAnswer::Point(p)) => correct_point = Some(p),
            Some(CorrectAnswer::Function { id }) => correct_function_id = Some(id),
            Some(CorrectAnswer::Area(a)) => correct_area = Some(a),
            None => {}
        }

        GraphConfig {
            x_range: model.x_range,
            y_range: model.y_range,
            x_label: model.x_label,
            y_label: model.y_label,
            title: model.title,
            show_grid: model.show_grid,
            grid_step: model.grid_step,
            lines: model.lines,
            functions: model.functions,
            is_interactive: model.interactive,
            answer_type,
            correct_point,
            correct_function_id,
            correct_area,
            tolerance_radius: model.tolerance_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parabola_question() -> GraphModel {
        GraphModel {
            functions: vec![GraphFunction {
                id: "f1".into(),
                expression: "x^2".into(),
                color: "#1f77b4".into(),
                label: Some("y = x²".into()),
            }],
            lines: vec![GraphLine {
                id: "l1".into(),
                points: vec![GraphPoint::new(0.0, 0.0), GraphPoint::new(1.0, 2.0).with_label("A")],
                color: "#d62728".into(),
                kind: LineKind::Scatter,
            }],
            title: Some("Vertex".into()),
            interactive: true,
            answer: Some(CorrectAnswer::Point(GraphPoint::new(2.0, 4.0))),
            ..Default::default()
        }
    }

    #[test]
    fn json_roundtrip_is_lossless() {
        let model = parabola_question();
        let json = serde_json::to_string(&model).unwrap();
        let back: GraphModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn persisted_form_uses_flat_camel_case_fields() {
        let json = serde_json::to_value(parabola_question()).unwrap();
        assert_eq!(json["xRange"], serde_json::json!([-10.0, 10.0]));
        assert_eq!(json["isInteractive"], true);
        assert_eq!(json["answerType"], "point");
        assert_eq!(json["correctPoint"]["x"], 2.0);
        assert_eq!(json["toleranceRadius"], 0.5);
        assert!(json.get("correctArea").is_none());
    }

    #[test]
    fn legacy_correct_point_implies_point_answer() {
        let json = r#"{
            "xRange": [-5, 5], "yRange": [-5, 5],
            "isInteractive": true,
            "correctPoint": {"x": 1, "y": 2},
            "toleranceRadius": 0.25
        }"#;
        let model: GraphModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.answer_type(), Some(AnswerType::Point));
        assert_eq!(model.answer, Some(CorrectAnswer::Point(GraphPoint::new(1.0, 2.0))));
    }

    #[test]
    fn interactive_without_answer_is_rejected() {
        let err = serde_json::from_str::<GraphModel>(r#"{"isInteractive": true}"#).unwrap_err();
        assert!(err.to_string().contains("no correct answer"), "{err}");
    }

    #[test]
    fn declared_type_without_field_is_rejected() {
        let config = GraphConfig {
            answer_type: Some(AnswerType::Area),
            ..Default::default()
        };
        assert_eq!(
            GraphModel::try_from(config),
            Err(ConfigError::MissingCorrectAnswer(AnswerType::Area))
        );
    }

    #[test]
    fn conflicting_answers_rejected_when_interactive() {
        let config = GraphConfig {
            is_interactive: true,
            answer_type: Some(AnswerType::Point),
            correct_point: Some(GraphPoint::new(0.0, 0.0)),
            correct_area: Some(Area::new(0.0, 0.0, 1.0, 1.0)),
            ..Default::default()
        };
        assert_eq!(
            GraphModel::try_from(config),
            Err(ConfigError::ConflictingAnswers {
                declared: AnswerType::Point
            })
        );
    }

    #[test]
    fn stale_fields_dropped_when_not_interactive() {
        let config = GraphConfig {
            answer_type: Some(AnswerType::Point),
            correct_point: Some(GraphPoint::new(0.0, 0.0)),
            correct_area: Some(Area::new(0.0, 0.0, 1.0, 1.0)),
            ..Default::default()
        };
        let model = GraphModel::try_from(config).unwrap();
        assert_eq!(model.answer_type(), Some(AnswerType::Point));
        let back = GraphConfig::from(model);
        assert!(back.correct_area.is_none());
    }

    #[test]
    fn untyped_area_is_ambiguous() {
        let config = GraphConfig {
            correct_area: Some(Area::new(0.0, 0.0, 1.0, 1.0)),
            ..Default::default()
        };
        assert_eq!(GraphModel::try_from(config), Err(ConfigError::AmbiguousAnswer));
    }

    #[test]
    fn range_and_grid_invariants() {
        let mut model = GraphModel::default();
        model.x_range = AxisRange::new(3.0, 3.0);
        assert!(matches!(model.validate(), Err(ConfigError::InvalidRange { axis: 'x', .. })));

        let mut model = GraphModel::default();
        model.grid_step = 0.0;
        assert_eq!(model.validate(), Err(ConfigError::NonPositiveGridStep(0.0)));

        let mut model = GraphModel::default();
        model.tolerance_radius = -0.1;
        assert_eq!(model.validate(), Err(ConfigError::NegativeTolerance(-0.1)));
    }

    #[test]
    fn points_must_be_finite() {
        let mut model = parabola_question();
        model.answer = Some(CorrectAnswer::Point(GraphPoint::new(f64::NAN, 0.0)));
        assert!(matches!(
            model.validate(),
            Err(ConfigError::NonFinitePoint { ref owner, .. }) if owner == "correct answer"
        ));

        let mut model = parabola_question();
        model.lines[0].points.push(GraphPoint::new(1.0, f64::INFINITY));
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("line 'l1'"), "{err}");
    }

    #[test]
    fn function_answer_must_exist() {
        let mut model = parabola_question();
        model.answer = Some(CorrectAnswer::Function { id: "missing".into() });
        assert_eq!(model.validate(), Err(ConfigError::UnknownFunction("missing".into())));

        model.answer = Some(CorrectAnswer::Function { id: "f1".into() });
        assert!(model.validate().is_ok());
    }

    #[test]
    fn area_answer_must_have_extent() {
        let mut model = parabola_question();
        model.answer = Some(CorrectAnswer::Area(Area::new(1.0, 1.0, 1.0, 4.0)));
        assert_eq!(model.validate(), Err(ConfigError::DegenerateArea));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut model = parabola_question();
        model.functions.push(model.functions[0].clone());
        assert_eq!(
            model.validate(),
            Err(ConfigError::DuplicateId {
                kind: "function",
                id: "f1".into()
            })
        );
    }

    #[test]
    fn area_geometry() {
        let a = Area::new(4.0, 3.0, 0.0, 0.0);
        assert_eq!(a.bounds(), (0.0, 0.0, 4.0, 3.0));
        assert_eq!(a.area(), 12.0);
        assert!(a.contains(4.0, 0.0));
        assert!(!a.contains(4.1, 0.0));
        assert_eq!(a.intersection_area(&Area::new(2.0, 1.0, 6.0, 6.0)), 4.0);
        assert_eq!(a.intersection_area(&Area::new(4.0, 0.0, 6.0, 6.0)), 0.0);
    }

    #[test]
    fn snapping_rounds_to_one_decimal() {
        let p = GraphPoint::snapped(2.3000000000000003, 4.0999999999);
        assert_eq!((p.x, p.y), (2.3, 4.1));
        let z = GraphPoint::snapped(-0.04, 0.0);
        assert_eq!(z.x.to_bits(), 0.0f64.to_bits());
    }

    #[test]
    fn answer_type_display_and_parse() {
        assert_eq!(AnswerType::Function.to_string(), "function");
        assert_eq!("AREA".parse::<AnswerType>().unwrap(), AnswerType::Area);
        assert!("circle".parse::<AnswerType>().is_err());
    }
}
