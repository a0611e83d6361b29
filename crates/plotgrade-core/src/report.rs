//! Batch grading reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::{AnswerValidator, AreaPolicy, SubmittedAnswer, Verdict};
use crate::model::{AnswerType, GraphModel};

/// One student's answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub student_id: String,
    pub answer: SubmittedAnswer,
}

/// A submission together with its verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradedSubmission {
    pub student_id: String,
    pub answer: SubmittedAnswer,
    pub verdict: Verdict,
}

/// Aggregate numbers for a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeSummary {
    pub total: usize,
    pub correct: usize,
    /// `correct / total`, or 0 for an empty batch.
    pub pass_rate: f64,
    /// Mean of the finite metrics, if there are any.
    pub mean_metric: Option<f64>,
}

impl GradeSummary {
    fn from_results(results: &[GradedSubmission]) -> Self {
        let total = results.len();
        let correct = results.iter().filter(|r| r.verdict.correct).count();
        let pass_rate = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        };

        let finite: Vec<f64> = results
            .iter()
            .map(|r| r.verdict.metric)
            .filter(|m| m.is_finite())
            .collect();
        let mean_metric = if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        };

        Self {
            total,
            correct,
            pass_rate,
            mean_metric,
        }
    }
}

/// The graded results of one question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the batch was graded.
    pub created_at: DateTime<Utc>,
    pub question_id: String,
    /// Answer type of the question, absent for non-interactive graphs.
    pub answer_type: Option<AnswerType>,
    pub area_policy: AreaPolicy,
    pub results: Vec<GradedSubmission>,
    pub summary: GradeSummary,
}

/// Grade every submission against one question.
pub fn grade_batch(
    question_id: &str,
    model: &GraphModel,
    validator: &AnswerValidator,
    submissions: &[Submission],
) -> GradingReport {
    let results: Vec<GradedSubmission> = submissions
        .iter()
        .map(|s| GradedSubmission {
            student_id: s.student_id.clone(),
            answer: s.answer.clone(),
            verdict: validator.validate(model, &s.answer),
        })
        .collect();
    let summary = GradeSummary::from_results(&results);

    tracing::info!(
        "graded {} submissions for {question_id}: {} correct",
        summary.total,
        summary.correct
    );

    GradingReport {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        question_id: question_id.to_string(),
        answer_type: model.answer_type(),
        area_policy: validator.area_policy,
        results,
        summary,
    }
}

impl GradingReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradingReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.question_id));
        md.push_str(&format!(
            "**Summary:** {}/{} correct ({:.1}%)\n\n",
            self.summary.correct,
            self.summary.total,
            self.summary.pass_rate * 100.0
        ));

        if !self.results.is_empty() {
            md.push_str("| Student | Answer | Metric | Correct |\n");
            md.push_str("|---------|--------|--------|---------|\n");
            for r in &self.results {
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    r.student_id,
                    describe_answer(&r.answer),
                    format_metric(r.verdict.metric),
                    if r.verdict.correct { "yes" } else { "no" }
                ));
            }
        }

        md
    }
}

/// Short human-readable form of a submitted answer.
pub fn describe_answer(answer: &SubmittedAnswer) -> String {
    match answer {
        SubmittedAnswer::Point(p) => format!("({}, {})", p.x, p.y),
        SubmittedAnswer::Function { id } => id.clone(),
        SubmittedAnswer::Area(a) => {
            let (x1, y1, x2, y2) = a.bounds();
            format!("[{x1}, {y1}]..[{x2}, {y2}]")
        }
    }
}

/// A metric with four decimals, or `-` when it is not finite.
pub fn format_metric(metric: f64) -> String {
    if metric.is_finite() {
        format!("{metric:.4}")
    } else {
        "-".to_string()
    }
}
