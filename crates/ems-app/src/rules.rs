//! Ad-hoc rule programs from `BOUNDARY:VARIABLE:EXPRESSION` arguments.

use ems_program::{Comparison, PiecewiseRuleProgramBuilder, ProgramText};

use crate::error::{AppError, AppResult};

/// One parsed `--rule` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleArg {
    pub boundary: f64,
    pub variable: String,
    pub expression: String,
}

/// Parse `BOUNDARY:VARIABLE:EXPRESSION`. The expression may contain `:`.
pub fn parse_rule_arg(arg: &str) -> AppResult<RuleArg> {
    let mut parts = arg.splitn(3, ':');
    let (Some(boundary), Some(variable), Some(expression)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(AppError::InvalidInput(format!(
            "rule '{arg}' is not BOUNDARY:VARIABLE:EXPRESSION"
        )));
    };
    let boundary = boundary.trim().parse::<f64>().map_err(|e| {
        AppError::InvalidInput(format!("rule '{arg}' has a bad boundary: {e}"))
    })?;
    Ok(RuleArg {
        boundary,
        variable: variable.trim().to_string(),
        expression: expression.trim().to_string(),
    })
}

/// Parse `VARIABLE:EXPRESSION`.
pub fn parse_action_arg(arg: &str) -> AppResult<(String, String)> {
    match arg.split_once(':') {
        Some((variable, expression)) => {
            Ok((variable.trim().to_string(), expression.trim().to_string()))
        }
        None => Err(AppError::InvalidInput(format!(
            "default '{arg}' is not VARIABLE:EXPRESSION"
        ))),
    }
}

/// Compile rules in the given order into an if/elseif chain.
pub fn compile_rules(
    comparison_variable: &str,
    comparison: Comparison,
    rules: &[RuleArg],
    default: Option<(String, String)>,
) -> AppResult<ProgramText> {
    let mut builder = PiecewiseRuleProgramBuilder::new(comparison_variable)
        .comparison(comparison)
        .rules(
            rules
                .iter()
                .map(|r| (r.boundary, r.variable.as_str(), r.expression.as_str())),
        );
    if let Some((variable, expression)) = default {
        builder = builder.otherwise(variable, expression);
    }
    Ok(builder.build()?)
}
