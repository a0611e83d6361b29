//! Grading of submitted graph answers.
//!
//! Each answer type has one metric and one pass rule:
//!
//! | Answer type | Metric | Correct when |
//! |-------------|--------|--------------|
//! | point | Euclidean distance to the correct point | `metric <= tolerance_radius` |
//! | function | `0` if the chosen id matches, else `1` | `metric == 0` |
//! | area | share of the correct area covered by the submission | decided by [`AreaPolicy`] |
//!
//! Grading is total: a submission of the wrong kind, or a graph with no
//! correct answer, is simply incorrect.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::mapper::{CoordinateMapper, ScreenPoint};
use crate::model::{AnswerType, Area, CorrectAnswer, GraphModel, GraphPoint};

/// A student's answer. Owned by the submission flow, never stored in the
/// graph itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SubmittedAnswer {
    Point(GraphPoint),
    Function { id: String },
    Area(Area),
}

impl SubmittedAnswer {
    /// A point answer from a canvas click, snapped to one decimal.
    pub fn point_from_click(mapper: &CoordinateMapper, px: f64, py: f64) -> Self {
        let (x, y) = mapper.to_graph(px, py);
        SubmittedAnswer::Point(GraphPoint::snapped(x, y))
    }

    /// An area answer from a canvas drag between two corners.
    pub fn area_from_drag(mapper: &CoordinateMapper, start: ScreenPoint, end: ScreenPoint) -> Self {
        let (x1, y1) = mapper.to_graph(start.x, start.y);
        let (x2, y2) = mapper.to_graph(end.x, end.y);
        let a = GraphPoint::snapped(x1, y1);
        let b = GraphPoint::snapped(x2, y2);
        SubmittedAnswer::Area(Area::new(a.x, a.y, b.x, b.y))
    }

    pub fn answer_type(&self) -> AnswerType {
        match self {
            SubmittedAnswer::Point(_) => AnswerType::Point,
            SubmittedAnswer::Function { .. } => AnswerType::Function,
            SubmittedAnswer::Area(_) => AnswerType::Area,
        }
    }
}

/// How much of the correct area a submitted rectangle must cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AreaPolicy {
    /// The submission must fully contain the correct area.
    #[default]
    Containment,
    /// The submission must cover at least `threshold` of the correct area.
    Overlap { threshold: f64 },
    /// The centre of the submission must lie inside the correct area.
    #[serde(rename = "centroid")]
    CentroidInside,
}

impl AreaPolicy {
    /// Reject overlap thresholds outside `[0, 1]`, NaN included.
    pub fn check(&self) -> Result<(), String> {
        match self {
            AreaPolicy::Overlap { threshold } if !(0.0..=1.0).contains(threshold) => {
                Err(format!("overlap threshold must be in [0, 1], got {threshold}"))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for AreaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaPolicy::Containment => write!(f, "containment"),
            AreaPolicy::Overlap { threshold } => write!(f, "overlap:{threshold}"),
            AreaPolicy::CentroidInside => write!(f, "centroid"),
        }
    }
}

impl FromStr for AreaPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.split_once(':') {
            None if lower == "containment" || lower == "contain" => Ok(AreaPolicy::Containment),
            None if lower == "centroid" => Ok(AreaPolicy::CentroidInside),
            Some(("overlap", threshold)) => {
                let threshold: f64 = threshold
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid overlap threshold: '{threshold}'"))?;
                let policy = AreaPolicy::Overlap { threshold };
                policy.check()?;
                Ok(policy)
            }
            _ => Err(format!("unknown area policy: {s}")),
        }
    }
}

/// Outcome of grading one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub correct: bool,
    /// Distance for points, 0/1 for functions, coverage for areas.
    /// Non-finite values are written as `null`.
    #[serde(deserialize_with = "metric_or_infinity")]
    pub metric: f64,
}

impl Verdict {
    /// The failing verdict with the worst metric of an answer type.
    fn worst(answer_type: Option<AnswerType>) -> Self {
        let metric = match answer_type {
            Some(AnswerType::Function) => 1.0,
            Some(AnswerType::Area) => 0.0,
            Some(AnswerType::Point) | None => f64::INFINITY,
        };
        Self {
            correct: false,
            metric,
        }
    }
}

fn metric_or_infinity<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

/// Grades submissions against a graph's correct answer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnswerValidator {
    pub area_policy: AreaPolicy,
}

impl AnswerValidator {
    pub fn new(area_policy: AreaPolicy) -> Self {
        Self { area_policy }
    }

    /// Grade one submission. Never fails and never changes the model.
    pub fn validate(&self, model: &GraphModel, submitted: &SubmittedAnswer) -> Verdict {
        let Some(answer) = &model.answer else {
            return Verdict::worst(None);
        };

        match (answer, submitted) {
            (CorrectAnswer::Point(correct), SubmittedAnswer::Point(point)) => {
                let metric = point.distance_to(correct);
                Verdict {
                    correct: metric <= model.tolerance_radius,
                    metric,
                }
            }
            (CorrectAnswer::Function { id }, SubmittedAnswer::Function { id: chosen }) => {
                let metric = if id == chosen { 0.0 } else { 1.0 };
                Verdict {
                    correct: metric == 0.0,
                    metric,
                }
            }
            (CorrectAnswer::Area(correct), SubmittedAnswer::Area(area)) => {
                self.grade_area(correct, area)
            }
            _ => Verdict::worst(Some(answer.answer_type())),
        }
    }

    fn grade_area(&self, correct: &Area, submitted: &Area) -> Verdict {
        let target = correct.area();
        let coverage = if target > 0.0 {
            correct.intersection_area(submitted) / target
        } else {
            0.0
        };

        let passed = match self.area_policy {
            AreaPolicy::Containment => coverage >= 1.0,
            AreaPolicy::Overlap { threshold } => coverage >= threshold,
            AreaPolicy::CentroidInside => {
                let (cx, cy) = submitted.center();
                correct.contains(cx, cy)
            }
        };

        Verdict {
            correct: passed,
            metric: coverage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::Canvas;
    use crate::model::{AxisRange, GraphFunction};

    fn point_question(x: f64, y: f64, tolerance: f64) -> GraphModel {
        GraphModel {
            interactive: true,
            answer: Some(CorrectAnswer::Point(GraphPoint::new(x, y))),
            tolerance_radius: tolerance,
            ..Default::default()
        }
    }

    fn area_question() -> GraphModel {
        GraphModel {
            interactive: true,
            answer: Some(CorrectAnswer::Area(Area::new(0.0, 0.0, 2.0, 2.0))),
            ..Default::default()
        }
    }

    fn submit_point(x: f64, y: f64) -> SubmittedAnswer {
        SubmittedAnswer::Point(GraphPoint::new(x, y))
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let model = point_question(0.0, 0.0, 2.0);
        let v = AnswerValidator::default();

        let on_edge = v.validate(&model, &submit_point(2.0, 0.0));
        assert!(on_edge.correct);
        assert_eq!(on_edge.metric, 2.0);
        assert!(v.validate(&model, &submit_point(0.0, -2.0)).correct);

        let outside = v.validate(&model, &submit_point(2.0001, 0.0));
        assert!(!outside.correct);
    }

    #[test]
    fn zero_tolerance_needs_exact_point() {
        let model = point_question(1.5, -0.5, 0.0);
        let v = AnswerValidator::default();
        assert!(v.validate(&model, &submit_point(1.5, -0.5)).correct);
        assert!(!v.validate(&model, &submit_point(1.5, -0.4)).correct);
    }

    #[test]
    fn clicked_point_near_vertex_is_correct() {
        let mut model = point_question(2.0, 4.0, 0.5);
        model.functions.push(GraphFunction {
            id: "f1".into(),
            expression: "x^2".into(),
            color: "#000".into(),
            label: None,
        });
        model.x_range = AxisRange::new(-10.0, 10.0);

        let verdict = AnswerValidator::default().validate(&model, &submit_point(2.3, 4.1));
        assert!(verdict.correct);
        assert!((verdict.metric - 0.1f64.sqrt()).abs() < 1e-9);
        assert!((verdict.metric - 0.3162).abs() < 1e-4);
    }

    #[test]
    fn function_answers_match_by_id() {
        let model = GraphModel {
            functions: vec![
                GraphFunction {
                    id: "a".into(),
                    expression: "x^2".into(),
                    color: "red".into(),
                    label: None,
                },
                GraphFunction {
                    id: "b".into(),
                    expression: "x*x".into(),
                    color: "blue".into(),
                    label: None,
                },
            ],
            interactive: true,
            answer: Some(CorrectAnswer::Function { id: "a".into() }),
            ..Default::default()
        };
        let v = AnswerValidator::default();

        let right = v.validate(&model, &SubmittedAnswer::Function { id: "a".into() });
        assert_eq!(right, Verdict { correct: true, metric: 0.0 });

        // same curve, different entry
        let equivalent = v.validate(&model, &SubmittedAnswer::Function { id: "b".into() });
        assert_eq!(equivalent, Verdict { correct: false, metric: 1.0 });
    }

    #[test]
    fn containment_requires_full_cover() {
        let model = area_question();
        let v = AnswerValidator::default();

        let covering = v.validate(&model, &SubmittedAnswer::Area(Area::new(3.0, 3.0, -1.0, -1.0)));
        assert_eq!(covering, Verdict { correct: true, metric: 1.0 });

        let exact = v.validate(&model, &SubmittedAnswer::Area(Area::new(0.0, 0.0, 2.0, 2.0)));
        assert!(exact.correct);

        let half = v.validate(&model, &SubmittedAnswer::Area(Area::new(0.0, 0.0, 1.0, 2.0)));
        assert_eq!(half, Verdict { correct: false, metric: 0.5 });
    }

    #[test]
    fn overlap_policy_uses_threshold() {
        let model = area_question();
        let v = AnswerValidator::new(AreaPolicy::Overlap { threshold: 0.5 });
        assert!(v.validate(&model, &SubmittedAnswer::Area(Area::new(0.0, 0.0, 1.0, 2.0))).correct);
        assert!(!v.validate(&model, &SubmittedAnswer::Area(Area::new(0.0, 0.0, 1.0, 1.0))).correct);
    }

    #[test]
    fn centroid_policy_checks_submission_centre() {
        let model = area_question();
        let v = AnswerValidator::new(AreaPolicy::CentroidInside);
        let small = v.validate(&model, &SubmittedAnswer::Area(Area::new(0.5, 0.5, 1.5, 1.5)));
        assert!(small.correct);
        assert_eq!(small.metric, 0.25);
        assert!(!v.validate(&model, &SubmittedAnswer::Area(Area::new(1.0, 1.0, 5.0, 5.0))).correct);
    }

    #[test]
    fn mismatched_kind_is_incorrect_with_worst_metric() {
        let v = AnswerValidator::default();
        let point = v.validate(&point_question(0.0, 0.0, 1.0), &SubmittedAnswer::Function { id: "f".into() });
        assert!(!point.correct);
        assert!(point.metric.is_infinite());

        let area = v.validate(&area_question(), &submit_point(1.0, 1.0));
        assert_eq!(area, Verdict { correct: false, metric: 0.0 });
    }

    #[test]
    fn graph_without_answer_is_never_correct() {
        let verdict = AnswerValidator::default().validate(&GraphModel::default(), &submit_point(0.0, 0.0));
        assert!(!verdict.correct);
    }

    #[test]
    fn grading_is_idempotent_and_pure() {
        let model = point_question(1.0, 1.0, 0.5);
        let before = model.clone();
        let v = AnswerValidator::default();
        let answer = submit_point(1.2, 1.3);
        let first = v.validate(&model, &answer);
        for _ in 0..5 {
            assert_eq!(v.validate(&model, &answer), first);
        }
        assert_eq!(model, before);
    }

    #[test]
    fn click_is_snapped_to_tenths() {
        let mapper = CoordinateMapper::new(
            AxisRange::new(-10.0, 10.0),
            AxisRange::new(-10.0, 10.0),
            Canvas::new(440.0, 440.0, 20.0),
        )
        .unwrap();
        // 20 px per unit
        let p = mapper.to_screen(2.3, 4.1);
        let answer = SubmittedAnswer::point_from_click(&mapper, p.x + 0.4, p.y - 0.4);
        assert_eq!(answer, submit_point(2.3, 4.1));

        let drag = SubmittedAnswer::area_from_drag(
            &mapper,
            mapper.to_screen(0.0, 0.0),
            mapper.to_screen(2.0, -1.5),
        );
        assert_eq!(drag, SubmittedAnswer::Area(Area::new(0.0, 0.0, 2.0, -1.5)));
    }

    #[test]
    fn submitted_answer_json_shape() {
        let json = r#"{"type": "area", "x1": 0, "y1": 0, "x2": 1, "y2": 1}"#;
        let answer: SubmittedAnswer = serde_json::from_str(json).unwrap();
        assert_eq!(answer.answer_type(), AnswerType::Area);

        let json = r#"{"type": "function", "id": "f2"}"#;
        let answer: SubmittedAnswer = serde_json::from_str(json).unwrap();
        assert_eq!(answer, SubmittedAnswer::Function { id: "f2".into() });
    }

    #[test]
    fn infinite_metric_survives_json() {
        let verdict = Verdict {
            correct: false,
            metric: f64::INFINITY,
        };
        let json = serde_json::to_string(&verdict).unwrap();
        assert!(json.contains("null"));
        let back: Verdict = serde_json::from_str(&json).unwrap();
        assert!(back.metric.is_infinite());
    }

    #[test]
    fn area_policy_parse_and_display() {
        assert_eq!("containment".parse::<AreaPolicy>().unwrap(), AreaPolicy::Containment);
        assert_eq!("Centroid".parse::<AreaPolicy>().unwrap(), AreaPolicy::CentroidInside);
        assert_eq!(
            "overlap:0.75".parse::<AreaPolicy>().unwrap(),
            AreaPolicy::Overlap { threshold: 0.75 }
        );
        assert!("overlap:2".parse::<AreaPolicy>().is_err());
        assert!("overlap".parse::<AreaPolicy>().is_err());
        assert_eq!(AreaPolicy::Overlap { threshold: 0.5 }.to_string(), "overlap:0.5");
    }

    #[test]
    fn area_policy_check_rejects_bad_thresholds() {
        assert!(AreaPolicy::Overlap { threshold: -1.0 }.check().is_err());
        assert!(AreaPolicy::Overlap { threshold: 5.0 }.check().is_err());
        assert!(AreaPolicy::Overlap { threshold: f64::NAN }.check().is_err());
        assert!(AreaPolicy::Overlap { threshold: 0.0 }.check().is_ok());
        assert!(AreaPolicy::Containment.check().is_ok());
        assert!("overlap:nan".parse::<AreaPolicy>().is_err());
    }
}
