//! ERL identifiers and generated-name allocation.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::{ProgramError, ProgramResult};

/// Words the ERL parser reserves; none of them may name a variable.
pub const RESERVED_WORDS: &[&str] = &[
    "SET", "IF", "ELSEIF", "ELSE", "ENDIF", "WHILE", "ENDWHILE", "RUN", "RETURN", "NULL",
];

/// Validated ERL variable / program name.
///
/// Permitted set: ASCII letters, digits and `_`, starting with a letter, and
/// not a reserved word. ERL compares names case-insensitively; equality here
/// is exact, case folding happens where uniqueness is enforced
/// ([`crate::EmsModel`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Validate `name` as an identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` if the name is empty, starts with anything
    /// but a letter, contains a character outside `[A-Za-z0-9_]`, or is a
    /// reserved word. The name is never repaired; see [`sanitize`].
    pub fn new(name: impl Into<String>) -> ProgramResult<Self> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("must not be empty")
        } else if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            Some("must start with a letter")
        } else if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            Some("may only contain letters, digits and '_'")
        } else if is_reserved(&name) {
            Some("is a reserved word")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(ProgramError::InvalidIdentifier { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded key used for uniqueness checks.
    pub fn key(&self) -> String {
        self.0.to_ascii_uppercase()
    }
}

pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.iter().any(|r| r.eq_ignore_ascii_case(word))
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identifier {
    type Error = ProgramError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = ProgramError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

/// Turn a host object name into something [`Identifier::new`] accepts.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`; names that would not
/// start with a letter get an `a_` prefix. Callers run this on host names
/// (loop names, surface names) before composing variable names; the program
/// builders never sanitize on their own.
pub fn sanitize(raw: &str) -> String {
    let mut out: String = raw
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic()) {
        out.insert_str(0, "a_");
    }
    if is_reserved(&out) {
        out.push('_');
    }
    out
}

/// Counter for generated names, passed by value.
///
/// Measures that declare one set of objects per zone / loop number them
/// `Name1`, `Name2`, ... Each call hands back the advanced allocator instead
/// of bumping shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameAllocator {
    next: NonZeroU32,
}

impl NameAllocator {
    /// Allocator whose first index is 1.
    pub fn new() -> Self {
        Self {
            next: NonZeroU32::MIN,
        }
    }

    /// Allocator whose first index is `first`.
    pub fn starting_at(first: NonZeroU32) -> Self {
        Self { next: first }
    }

    /// Index the next allocation will use.
    pub fn peek(&self) -> u32 {
        self.next.get()
    }

    /// Take the next index.
    pub fn advance(self) -> ProgramResult<(u32, Self)> {
        let index = self.next.get();
        let next = self.next.checked_add(1).ok_or(ProgramError::InvalidArg {
            what: "name allocator exhausted",
        })?;
        Ok((index, Self { next }))
    }

    /// Reserve `count` indices without naming them.
    pub fn skip(self, count: u32) -> ProgramResult<Self> {
        let next = self.next.checked_add(count).ok_or(ProgramError::InvalidArg {
            what: "name allocator exhausted",
        })?;
        Ok(Self { next })
    }

    /// Allocate `"{stem}{index}"`.
    pub fn allocate(self, stem: &str) -> ProgramResult<(Identifier, Self)> {
        self.allocate_with(|index| format!("{stem}{index}"))
    }

    /// Allocate a name built from the next index by `make`.
    pub fn allocate_with(
        self,
        make: impl FnOnce(u32) -> String,
    ) -> ProgramResult<(Identifier, Self)> {
        let (index, next) = self.advance()?;
        let id = Identifier::new(make(index))?;
        Ok((id, next))
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        for name in ["Tout", "Win1_Tout", "TCwindow_25", "a_1_Kill_Run_if_Uncomfortable"] {
            assert!(Identifier::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_space_and_hyphen() {
        for name in ["Outdoor Temp", "Loop-1", "T.out", ""] {
            let err = Identifier::new(name).unwrap_err();
            assert!(matches!(err, ProgramError::InvalidIdentifier { .. }));
        }
    }

    #[test]
    fn rejects_leading_digit_and_reserved_words() {
        assert!(Identifier::new("1Loop").is_err());
        assert!(Identifier::new("_x").is_err());
        assert!(Identifier::new("set").is_err());
        assert!(Identifier::new("Null").is_err());
    }

    #[test]
    fn sanitize_produces_valid_identifiers() {
        assert_eq!(sanitize("Condenser Loop-1"), "Condenser_Loop_1");
        assert_eq!(sanitize("1st Floor"), "a_1st_Floor");
        assert_eq!(sanitize("If"), "If_");
        for raw in ["Condenser Loop-1", "1st Floor", "If", "", "  Zone (north)  "] {
            assert!(Identifier::new(sanitize(raw)).is_ok(), "{raw}");
        }
    }

    #[test]
    fn allocator_threads_by_value() {
        let names = NameAllocator::new();
        let (a, names) = names.allocate("PumpFlowOverrideReport").unwrap();
        let (b, names) = names.allocate("PumpFlowOverrideReport").unwrap();
        assert_eq!(a.as_str(), "PumpFlowOverrideReport1");
        assert_eq!(b.as_str(), "PumpFlowOverrideReport2");
        assert_eq!(names.peek(), 3);
    }

    #[test]
    fn allocator_is_a_value() {
        let start = NameAllocator::new();
        let (first, _) = start.allocate("PMV").unwrap();
        let (again, _) = start.allocate("PMV").unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn allocate_with_custom_layout() {
        let (id, _) = NameAllocator::new()
            .allocate_with(|n| format!("a_{n}_Kill_Run_if_Uncomfortable"))
            .unwrap();
        assert_eq!(id.as_str(), "a_1_Kill_Run_if_Uncomfortable");
    }

    #[test]
    fn allocator_exhaustion_is_an_error() {
        let last = NameAllocator::starting_at(NonZeroU32::MAX);
        assert!(last.advance().is_err());
    }

    #[test]
    fn identifier_serde_validates() {
        let ok: Result<Identifier, _> = serde_json::from_str("\"Tout\"");
        assert!(ok.is_ok());
        let bad: Result<Identifier, _> = serde_json::from_str("\"Out Temp\"");
        assert!(bad.is_err());
    }
}
