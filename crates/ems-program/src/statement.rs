//! Typed program statements and the one formatter that turns them into text.

use core::fmt;
use core::str::FromStr;

use ems_core::format_real;
use serde::{Deserialize, Serialize};

use crate::error::{ProgramError, ProgramResult};
use crate::expr::Expression;
use crate::ident::Identifier;

/// Comparison operator used in threshold conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Comparison {
    /// `<=`, for ascending boundaries.
    #[default]
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
    /// `>=`, for descending boundaries.
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "<>")]
    Ne,
}

impl Comparison {
    /// ERL operator text.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Le => "<=",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Eq => "==",
            Self::Ne => "<>",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparison {
    type Err = ProgramError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" => Ok(Self::Le),
            "<" => Ok(Self::Lt),
            ">=" => Ok(Self::Ge),
            ">" => Ok(Self::Gt),
            "==" => Ok(Self::Eq),
            "<>" => Ok(Self::Ne),
            _ => Err(ProgramError::InvalidArg {
                what: "comparison must be one of <=, <, >=, >, ==, <>",
            }),
        }
    }
}

/// Condition of an `IF` / `ELSEIF` line.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `variable op value`, e.g. `Tout <= 26.0`.
    Compare {
        variable: Identifier,
        op: Comparison,
        value: f64,
    },
    /// Free-form condition, e.g. `(Hour >= 6) && (DayOfWeek <= 6)`.
    Expr(Expression),
}

impl Condition {
    /// Threshold condition; `value` must be finite.
    pub fn compare(variable: Identifier, op: Comparison, value: f64) -> ProgramResult<Self> {
        ems_core::ensure_finite(value, "condition boundary")?;
        Ok(Self::Compare {
            variable,
            op,
            value,
        })
    }

    /// Names the condition reads.
    pub fn referenced_names(&self) -> ProgramResult<Vec<Identifier>> {
        match self {
            Self::Compare { variable, .. } => Ok(vec![variable.clone()]),
            Self::Expr(expr) => expr.referenced_names(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare {
                variable,
                op,
                value,
            } => write!(f, "{} {} {}", variable, op, format_real(*value)),
            Self::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

/// One program line.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `SET target = expr`
    Assign {
        target: Identifier,
        expr: Expression,
    },
    If(Condition),
    ElseIf(Condition),
    Else,
    EndIf,
    /// `RUN subroutine`
    Run(Identifier),
    Return,
}

impl Statement {
    pub fn assign(target: Identifier, expr: Expression) -> Self {
        Self::Assign { target, expr }
    }
}

/// Render one statement. This is the only place program text is produced.
pub fn render(statement: &Statement) -> String {
    match statement {
        Statement::Assign { target, expr } => format!("SET {} = {}", target, expr),
        Statement::If(cond) => format!("IF {}", cond),
        Statement::ElseIf(cond) => format!("ELSEIF {}", cond),
        Statement::Else => "ELSE".to_string(),
        Statement::EndIf => "ENDIF".to_string(),
        Statement::Run(name) => format!("RUN {}", name),
        Statement::Return => "RETURN".to_string(),
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}

/// Check IF/ELSEIF/ELSE/ENDIF nesting.
///
/// Rules: `ELSEIF` and `ELSE` only inside an open `IF`; nothing but
/// statements and `ENDIF` after an `ELSE`; every `IF` closed; no stray
/// `ENDIF`.
///
/// # Errors
///
/// `UnmatchedBranch` naming the offending line (1-based).
pub fn check_structure(statements: &[Statement]) -> ProgramResult<()> {
    // one entry per open IF: whether its ELSE was seen
    let mut open: Vec<bool> = Vec::new();

    for (idx, statement) in statements.iter().enumerate() {
        let line = idx + 1;
        match statement {
            Statement::If(_) => open.push(false),
            Statement::ElseIf(_) => match open.last() {
                None => return Err(unmatched(line, "ELSEIF without open IF")),
                Some(true) => return Err(unmatched(line, "ELSEIF after ELSE")),
                Some(false) => {}
            },
            Statement::Else => match open.last_mut() {
                None => return Err(unmatched(line, "ELSE without open IF")),
                Some(seen_else) if *seen_else => {
                    return Err(unmatched(line, "second ELSE in one IF"));
                }
                Some(seen_else) => *seen_else = true,
            },
            Statement::EndIf => {
                if open.pop().is_none() {
                    return Err(unmatched(line, "ENDIF without open IF"));
                }
            }
            Statement::Assign { .. } | Statement::Run(_) | Statement::Return => {}
        }
    }

    if !open.is_empty() {
        return Err(ProgramError::UnmatchedBranch {
            what: format!("{} IF block(s) not closed by ENDIF", open.len()),
        });
    }

    Ok(())
}

fn unmatched(line: usize, what: &str) -> ProgramError {
    ProgramError::UnmatchedBranch {
        what: format!("line {}: {}", line, what),
    }
}
