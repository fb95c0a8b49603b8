//! Piecewise threshold programs.
//!
//! A rule program maps ordered `(boundary, variable, expression)` rules plus a
//! default action onto a single `IF` / `ELSEIF` / `ELSE` / `ENDIF` chain:
//!
//! ```text
//! IF Tout <= 26.0
//! SET C = TC_25
//! ELSEIF Tout <= 28.0
//! SET C = TC_27
//! ELSE
//! SET C = TC_85
//! ENDIF
//! ```
//!
//! Rules are emitted exactly in the order given. Nothing is sorted and
//! boundary monotonicity is not checked; with `<=` an ascending table selects
//! the first bracket the value fits in, a descending table would always hit
//! the first rule.

use tracing::debug;

use crate::error::{ProgramError, ProgramResult};
use crate::expr::Expression;
use crate::ident::Identifier;
use crate::program::ProgramText;
use crate::statement::{Comparison, Condition, Statement};

/// One `(boundary, action)` row of a rule table.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    pub boundary: f64,
    pub variable: Identifier,
    pub expression: Expression,
}

/// `SET variable = expression`
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub variable: Identifier,
    pub expression: Expression,
}

impl Action {
    fn statement(&self) -> Statement {
        Statement::assign(self.variable.clone(), self.expression.clone())
    }
}

/// Validated rule program, ready to compile.
#[derive(Debug, Clone, PartialEq)]
pub struct PiecewiseRuleProgram {
    comparison_variable: Identifier,
    comparison: Comparison,
    rules: Vec<ThresholdRule>,
    default: Action,
}

impl PiecewiseRuleProgram {
    /// Assemble a program from already-typed parts.
    ///
    /// # Errors
    ///
    /// `InvalidRuleSet` if `rules` is empty, `NonFinite` for a NaN or
    /// infinite boundary.
    pub fn new(
        comparison_variable: Identifier,
        comparison: Comparison,
        rules: Vec<ThresholdRule>,
        default: Action,
    ) -> ProgramResult<Self> {
        if rules.is_empty() {
            return Err(ProgramError::InvalidRuleSet {
                what: "at least one threshold rule is required",
            });
        }
        for rule in &rules {
            ems_core::ensure_finite(rule.boundary, "rule boundary")?;
        }
        Ok(Self {
            comparison_variable,
            comparison,
            rules,
            default,
        })
    }

    pub fn comparison_variable(&self) -> &Identifier {
        &self.comparison_variable
    }

    pub fn comparison(&self) -> Comparison {
        self.comparison
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn default_action(&self) -> &Action {
        &self.default
    }

    /// Statement list of the chain, rules in authored order.
    pub fn statements(&self) -> ProgramResult<Vec<Statement>> {
        let mut out = Vec::with_capacity(2 * self.rules.len() + 3);
        for (idx, rule) in self.rules.iter().enumerate() {
            let cond = Condition::compare(
                self.comparison_variable.clone(),
                self.comparison,
                rule.boundary,
            )?;
            out.push(if idx == 0 {
                Statement::If(cond)
            } else {
                Statement::ElseIf(cond)
            });
            out.push(Statement::assign(
                rule.variable.clone(),
                rule.expression.clone(),
            ));
        }
        out.push(Statement::Else);
        out.push(self.default.statement());
        out.push(Statement::EndIf);
        Ok(out)
    }

    /// Render the chain.
    pub fn compile(&self) -> ProgramResult<ProgramText> {
        let text = ProgramText::from_statements(self.statements()?)?;
        debug!(
            comparison_variable = %self.comparison_variable,
            rules = self.rules.len(),
            lines = text.lines().len(),
            "compiled piecewise program"
        );
        Ok(text)
    }
}

/// Builder taking raw names and expressions.
///
/// Validation happens in [`into_program`](Self::into_program) /
/// [`build`](Self::build), in this order: rule set completeness,
/// identifiers, boundaries, expressions. The first failure is returned.
///
/// ```
/// use ems_program::PiecewiseRuleProgramBuilder;
///
/// let program = PiecewiseRuleProgramBuilder::new("Tout")
///     .rule(26.0, "C", "TC_25")
///     .rule(28.0, "C", "TC_27")
///     .otherwise("C", "TC_85")
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     program.text(),
///     "IF Tout <= 26.0\nSET C = TC_25\nELSEIF Tout <= 28.0\nSET C = TC_27\nELSE\nSET C = TC_85\nENDIF"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PiecewiseRuleProgramBuilder {
    comparison_variable: String,
    comparison: Comparison,
    rules: Vec<(f64, String, String)>,
    default: Option<(String, String)>,
}

impl PiecewiseRuleProgramBuilder {
    pub fn new(comparison_variable: impl Into<String>) -> Self {
        Self {
            comparison_variable: comparison_variable.into(),
            comparison: Comparison::default(),
            rules: Vec::new(),
            default: None,
        }
    }

    /// Comparison operator used on every rule (default `<=`).
    pub fn comparison(mut self, op: Comparison) -> Self {
        self.comparison = op;
        self
    }

    /// Append a rule after the ones already added.
    pub fn rule(
        mut self,
        boundary: f64,
        variable: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        self.rules
            .push((boundary, variable.into(), expression.into()));
        self
    }

    /// Append several rules in iteration order.
    pub fn rules<I, V, E>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = (f64, V, E)>,
        V: Into<String>,
        E: Into<String>,
    {
        self.rules.extend(
            rules
                .into_iter()
                .map(|(b, v, e)| (b, v.into(), e.into())),
        );
        self
    }

    /// Default action for values no rule matched.
    pub fn otherwise(mut self, variable: impl Into<String>, expression: impl Into<String>) -> Self {
        self.default = Some((variable.into(), expression.into()));
        self
    }

    /// Validate into a [`PiecewiseRuleProgram`].
    pub fn into_program(self) -> ProgramResult<PiecewiseRuleProgram> {
        if self.rules.is_empty() {
            return Err(ProgramError::InvalidRuleSet {
                what: "at least one threshold rule is required",
            });
        }
        let Some((default_variable, default_expression)) = self.default else {
            return Err(ProgramError::InvalidRuleSet {
                what: "a default action is required",
            });
        };

        let comparison_variable = Identifier::new(self.comparison_variable)?;
        let mut variables = Vec::with_capacity(self.rules.len());
        for (_, variable, _) in &self.rules {
            variables.push(Identifier::new(variable.as_str())?);
        }
        let default_variable = Identifier::new(default_variable)?;

        for (boundary, _, _) in &self.rules {
            ems_core::ensure_finite(*boundary, "rule boundary")?;
        }

        let mut rules = Vec::with_capacity(self.rules.len());
        for ((boundary, _, expression), variable) in self.rules.into_iter().zip(variables) {
            rules.push(ThresholdRule {
                boundary,
                variable,
                expression: Expression::new(expression)?,
            });
        }
        let default = Action {
            variable: default_variable,
            expression: Expression::new(default_expression)?,
        };

        PiecewiseRuleProgram::new(comparison_variable, self.comparison, rules, default)
    }

    /// Validate and compile.
    pub fn build(self) -> ProgramResult<ProgramText> {
        self.into_program()?.compile()
    }
}
