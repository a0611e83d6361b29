//! Authoring state machine.
//!
//! A [`GraphSession`] pairs the graph being authored with the editor state
//! (which line receives clicks, whether the author is placing the correct
//! answer). Every transition borrows the current session and returns a new
//! one; the previous session and its model are left untouched, which makes
//! undo a matter of keeping the old value around.

use crate::error::{ConfigError, SessionError};
use crate::expr::Expr;
use crate::mapper::Canvas;
use crate::model::{AxisRange, CorrectAnswer, GraphFunction, GraphLine, GraphModel, GraphPoint, LineKind};

/// The x value at which new expressions are probed before being accepted.
pub const PROBE_X: f64 = 1.0;

/// What a canvas click currently does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Clicks are ignored.
    Idle,
    /// Clicks append points to the given line.
    EditingLine { line_id: String },
    /// The author is placing the correct answer.
    DefiningAnswer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphSession {
    model: GraphModel,
    state: SessionState,
    canvas: Canvas,
}

impl GraphSession {
    pub fn new(model: GraphModel, canvas: Canvas) -> Self {
        Self {
            model,
            state: SessionState::Idle,
            canvas,
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn active_line_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::EditingLine { line_id } => Some(line_id),
            _ => None,
        }
    }

    fn next(&self, model: GraphModel, state: SessionState) -> Self {
        Self {
            model,
            state,
            canvas: self.canvas,
        }
    }

    fn with_state(&self, state: SessionState) -> Self {
        self.next(self.model.clone(), state)
    }

    fn with_model(&self, model: GraphModel) -> Self {
        self.next(model, self.state.clone())
    }

    // -- lines --------------------------------------------------------------

    /// Create an empty line, select it and start editing it.
    pub fn add_line(&self, color: impl Into<String>, kind: LineKind) -> Self {
        let id = fresh_id("line", |id| self.model.line(id).is_some());
        let mut model = self.model.clone();
        model.lines.push(GraphLine {
            id: id.clone(),
            points: Vec::new(),
            color: color.into(),
            kind,
        });
        self.next(model, SessionState::EditingLine { line_id: id })
    }

    pub fn select_line(&self, id: &str) -> Result<Self, SessionError> {
        if self.model.line(id).is_none() {
            return Err(SessionError::UnknownLine(id.to_string()));
        }
        Ok(self.with_state(SessionState::EditingLine {
            line_id: id.to_string(),
        }))
    }

    /// Stop editing the active line.
    pub fn finish_line(&self) -> Self {
        self.with_state(SessionState::Idle)
    }

    pub fn remove_line(&self, id: &str) -> Result<Self, SessionError> {
        if self.model.line(id).is_none() {
            return Err(SessionError::UnknownLine(id.to_string()));
        }
        let mut model = self.model.clone();
        model.lines.retain(|l| l.id != id);

        let state = if self.active_line_id() == Some(id) {
            SessionState::Idle
        } else {
            self.state.clone()
        };
        Ok(self.next(model, state))
    }

    /// Handle a canvas click at pixel coordinates.
    ///
    /// While editing a line the click becomes a new point of that line. While
    /// defining a point answer it moves the correct point. Otherwise the
    /// session is returned unchanged.
    pub fn click(&self, px: f64, py: f64) -> Result<Self, SessionError> {
        let mapper = self.model.mapper(self.canvas)?;
        let (x, y) = mapper.to_graph(px, py);
        let point = GraphPoint::snapped(x, y);

        match &self.state {
            SessionState::EditingLine { line_id } => {
                let mut model = self.model.clone();
                let line = model
                    .lines
                    .iter_mut()
                    .find(|l| &l.id == line_id)
                    .ok_or_else(|| SessionError::UnknownLine(line_id.clone()))?;
                line.points.push(point);
                Ok(self.with_model(model))
            }
            SessionState::DefiningAnswer
                if matches!(self.model.answer, Some(CorrectAnswer::Point(_))) =>
            {
                let mut model = self.model.clone();
                model.answer = Some(CorrectAnswer::Point(point));
                Ok(self.with_model(model))
            }
            _ => {
                tracing::debug!("click at ({px}, {py}) ignored in state {:?}", self.state);
                Ok(self.clone())
            }
        }
    }

    // -- functions ----------------------------------------------------------

    /// Add a function after checking that it evaluates at [`PROBE_X`].
    pub fn add_function(
        &self,
        expression: &str,
        color: impl Into<String>,
        label: Option<String>,
    ) -> Result<Self, SessionError> {
        let expression = expression.trim();
        Expr::parse(expression)
            .and_then(|expr| expr.eval(PROBE_X))
            .map_err(|source| {
                tracing::debug!("rejected expression '{expression}': {source}");
                SessionError::InvalidExpression {
                    expression: expression.to_string(),
                    source,
                }
            })?;

        let mut model = self.model.clone();
        model.functions.push(GraphFunction {
            id: fresh_id("fn", |id| self.model.function(id).is_some()),
            expression: expression.to_string(),
            color: color.into(),
            label,
        });
        Ok(self.with_model(model))
    }

    /// Remove a function. If it was the correct answer the answer is cleared.
    pub fn remove_function(&self, id: &str) -> Result<Self, SessionError> {
        if self.model.function(id).is_none() {
            return Err(SessionError::UnknownFunction(id.to_string()));
        }
        let mut model = self.model.clone();
        model.functions.retain(|f| f.id != id);

        let mut state = self.state.clone();
        if matches!(&model.answer, Some(CorrectAnswer::Function { id: answer }) if answer == id) {
            model.answer = None;
            if state == SessionState::DefiningAnswer {
                state = SessionState::Idle;
            }
        }
        Ok(self.next(model, state))
    }

    // -- answer -------------------------------------------------------------

    pub fn set_interactive(&self, interactive: bool) -> Self {
        let mut model = self.model.clone();
        model.interactive = interactive;
        let state = if !interactive && self.state == SessionState::DefiningAnswer {
            SessionState::Idle
        } else {
            self.state.clone()
        };
        self.next(model, state)
    }

    /// Set the correct answer and start defining it. Only valid on
    /// interactive graphs.
    pub fn set_correct_answer(&self, answer: CorrectAnswer) -> Result<Self, SessionError> {
        if !self.model.interactive {
            return Err(SessionError::NotInteractive);
        }
        self.model.check_answer(&answer)?;

        let mut model = self.model.clone();
        model.answer = Some(answer);
        Ok(self.next(model, SessionState::DefiningAnswer))
    }

    pub fn set_tolerance(&self, radius: f64) -> Result<Self, SessionError> {
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(ConfigError::NegativeTolerance(radius).into());
        }
        let mut model = self.model.clone();
        model.tolerance_radius = radius;
        Ok(self.with_model(model))
    }

    // -- axes ---------------------------------------------------------------

    pub fn set_x_range(&self, range: AxisRange) -> Result<Self, SessionError> {
        range.check('x')?;
        let mut model = self.model.clone();
        model.x_range = range;
        Ok(self.with_model(model))
    }

    pub fn set_y_range(&self, range: AxisRange) -> Result<Self, SessionError> {
        range.check('y')?;
        let mut model = self.model.clone();
        model.y_range = range;
        Ok(self.with_model(model))
    }

    pub fn set_labels(&self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        let mut model = self.model.clone();
        model.x_label = x_label.into();
        model.y_label = y_label.into();
        self.with_model(model)
    }

    pub fn set_title(&self, title: Option<String>) -> Self {
        let mut model = self.model.clone();
        model.title = title;
        self.with_model(model)
    }

    pub fn set_grid(&self, show: bool, step: f64) -> Result<Self, SessionError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(ConfigError::NonPositiveGridStep(step).into());
        }
        let mut model = self.model.clone();
        model.show_grid = show;
        model.grid_step = step;
        Ok(self.with_model(model))
    }

    /// The authored graph, fully validated for saving.
    pub fn commit(&self) -> Result<GraphModel, ConfigError> {
        self.model.validate()?;
        Ok(self.model.clone())
    }
}

/// First `{prefix}-{n}` (n from 1) not already taken.
fn fresh_id(prefix: &str, taken: impl Fn(&str) -> bool) -> String {
    (1..)
        .map(|n| format!("{prefix}-{n}"))
        .find(|id| !taken(id))
        .unwrap_or_else(|| format!("{prefix}-0"))
}
