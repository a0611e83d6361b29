//! Error types for the graph engine.
//!
//! Configuration errors are raised when a graph violates one of its
//! structural invariants. Expression errors never escape the evaluator as
//! panics: callers either inspect them or collapse them into "no value".

use thiserror::Error;

use crate::model::AnswerType;

/// A graph configuration that violates a model invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// An axis range is empty, inverted, or not finite.
    #[error("invalid {axis}-range: min ({min}) must be finite and less than max ({max})")]
    InvalidRange { axis: char, min: f64, max: f64 },

    /// The canvas leaves no drawable area once padding is applied.
    #[error("invalid canvas {width}x{height} with padding {padding}: no drawable area")]
    InvalidCanvas { width: f64, height: f64, padding: f64 },

    /// The grid step must be strictly positive.
    #[error("grid step must be positive, got {0}")]
    NonPositiveGridStep(f64),

    /// The tolerance radius must be zero or positive.
    #[error("tolerance radius must be non-negative, got {0}")]
    NegativeTolerance(f64),

    /// An interactive graph has no correct answer.
    #[error("interactive graph has no correct answer")]
    NoCorrectAnswer,

    /// The declared answer type has no matching correct-answer field.
    #[error("answer type '{0}' declared but its correct answer is missing")]
    MissingCorrectAnswer(AnswerType),

    /// More than one correct-answer field is set on an interactive graph.
    #[error("answer type '{declared}' conflicts with other correct-answer fields")]
    ConflictingAnswers { declared: AnswerType },

    /// A correct function or area is set without an answer type.
    #[error("correct answer set without an answer type")]
    AmbiguousAnswer,

    /// The correct function id does not name an authored function.
    #[error("correct function '{0}' does not exist")]
    UnknownFunction(String),

    /// The correct area has zero width or height.
    #[error("correct area must have positive width and height")]
    DegenerateArea,

    /// A correct point or a data-line point has a NaN or infinite coordinate.
    #[error("{owner} has a non-finite point ({x}, {y})")]
    NonFinitePoint { owner: String, x: f64, y: f64 },

    /// Two lines or two functions share the same id.
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
}

/// Why an expression produced no value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("unexpected token {found} at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("trailing input at position {0}")]
    TrailingInput(usize),

    #[error("expression nested too deeply")]
    TooDeep,

    #[error("expression longer than {0} bytes")]
    TooLong(usize),

    #[error("'{func}' is undefined at {arg}")]
    Domain { func: &'static str, arg: f64 },

    #[error("result is not a finite number")]
    NonFinite,
}

impl ExprError {
    /// Returns `true` if the expression could not be parsed at all.
    pub fn is_parse_error(&self) -> bool {
        !matches!(self, ExprError::Domain { .. } | ExprError::NonFinite)
    }
}

/// A rejected authoring transition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The expression failed its probe evaluation.
    #[error("invalid expression '{expression}': {source}")]
    InvalidExpression {
        expression: String,
        #[source]
        source: ExprError,
    },

    /// Correct answers can only be set on interactive graphs.
    #[error("graph is not interactive")]
    NotInteractive,

    #[error("no line with id '{0}'")]
    UnknownLine(String),

    #[error("no function with id '{0}'")]
    UnknownFunction(String),

    /// The edit would break a model invariant.
    #[error(transparent)]
    InvalidEdit(#[from] ConfigError),
}
