//! Right-hand-side expressions and the names they reference.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProgramError, ProgramResult};
use crate::ident::{Identifier, is_reserved};
use crate::idf::field_text_error;

/// Built-in ERL variables and constants. They are always bound, so they are
/// never reported as free variables.
pub const BUILTIN_NAMES: &[&str] = &[
    "Year",
    "Month",
    "DayOfMonth",
    "DayOfWeek",
    "DayOfYear",
    "Hour",
    "Minute",
    "Holiday",
    "DaylightSavings",
    "CurrentTime",
    "SunIsUp",
    "IsRaining",
    "SystemTimeStep",
    "ZoneTimeStep",
    "CurrentEnvironment",
    "ActualDateAndTime",
    "ActualTime",
    "WarmupFlag",
    "CalendarYear",
    "TRUE",
    "FALSE",
    "ON",
    "OFF",
    "PI",
];

/// Expression text placed after `SET x =` or inside a condition.
///
/// The text itself is not parsed beyond extracting the names it references;
/// evaluation belongs to the simulation engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Expression(String);

impl Expression {
    /// Validate expression text.
    ///
    /// # Errors
    ///
    /// `InvalidExpression` if the text is blank, spans several lines, or
    /// contains `,`, `;` or `!` (field separators and comment marker of the
    /// IDF files programs end up in).
    pub fn new(text: impl Into<String>) -> ProgramResult<Self> {
        let text = text.into();
        let reason = if text.trim().is_empty() {
            Some("must not be empty")
        } else {
            field_text_error(&text)
        };

        match reason {
            Some(reason) => Err(ProgramError::InvalidExpression { expr: text, reason }),
            None => Ok(Self(text.trim().to_string())),
        }
    }

    /// Expression consisting of a single number, rendered by the shared
    /// numeric policy.
    pub fn number(value: f64) -> ProgramResult<Self> {
        Ok(Self(ems_core::format_finite(value, "expression literal")?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Variable names referenced by the expression, in order of first
    /// appearance, without duplicates.
    ///
    /// Skips numeric literals, `@Function` names, reserved words and
    /// [`BUILTIN_NAMES`].
    ///
    /// # Errors
    ///
    /// `InvalidIdentifier` if a name-like token is not a valid identifier
    /// (e.g. starts with `_`).
    pub fn referenced_names(&self) -> ProgramResult<Vec<Identifier>> {
        let mut names: Vec<Identifier> = Vec::new();
        for token in scan_names(&self.0) {
            if is_reserved(token) || is_builtin(token) {
                continue;
            }
            let id = Identifier::new(token)?;
            if !names.contains(&id) {
                names.push(id);
            }
        }
        Ok(names)
    }
}

fn is_builtin(word: &str) -> bool {
    BUILTIN_NAMES.iter().any(|b| b.eq_ignore_ascii_case(word))
}

/// Name-like tokens of `text` that are not function names.
fn scan_names(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_digit() || (c == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            // numeric literal, including exponent and its sign
            i += 1;
            while i < bytes.len() {
                let d = bytes[i];
                if d.is_ascii_digit() || d == b'.' {
                    i += 1;
                } else if (d == b'e' || d == b'E')
                    && bytes
                        .get(i + 1)
                        .is_some_and(|n| n.is_ascii_digit() || *n == b'-' || *n == b'+')
                {
                    i += 2;
                } else {
                    break;
                }
            }
        } else if c == b'@' || c.is_ascii_alphabetic() || c == b'_' {
            let is_function = c == b'@';
            let start = if is_function { i + 1 } else { i };
            i = start;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            if !is_function && i > start {
                tokens.push(&text[start..i]);
            }
        } else {
            i += 1;
        }
    }

    tokens
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Expression {
    type Error = ProgramError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

impl TryFrom<&str> for Expression {
    type Error = ProgramError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::new(text)
    }
}

impl From<Expression> for String {
    fn from(expr: Expression) -> Self {
        expr.0
    }
}

impl From<Identifier> for Expression {
    fn from(id: Identifier) -> Self {
        Self(id.into())
    }
}
