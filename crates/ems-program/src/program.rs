//! Program text values and the general-purpose program builder.

use core::fmt;

use crate::error::{ProgramError, ProgramResult};
use crate::expr::Expression;
use crate::ident::Identifier;
use crate::statement::{Comparison, Condition, Statement, check_structure, render};

/// Rendered, structurally valid program.
///
/// Immutable once built. Besides the lines it records the names the program
/// reads and writes and the subroutines it runs; a caller must bind every one
/// of them to an EMS object before the text is usable.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramText {
    statements: Vec<Statement>,
    lines: Vec<String>,
    reads: Vec<Identifier>,
    writes: Vec<Identifier>,
    runs: Vec<Identifier>,
}

impl ProgramText {
    /// Validate structure and render.
    ///
    /// # Errors
    ///
    /// `UnmatchedBranch` for broken IF nesting; `InvalidIdentifier` if an
    /// expression references a malformed name.
    pub fn from_statements(statements: Vec<Statement>) -> ProgramResult<Self> {
        if statements.is_empty() {
            return Err(ProgramError::InvalidArg {
                what: "program must contain at least one statement",
            });
        }
        check_structure(&statements)?;

        let mut reads = Vec::new();
        let mut writes = Vec::new();
        let mut runs = Vec::new();
        for statement in &statements {
            match statement {
                Statement::Assign { target, expr } => {
                    push_unique(&mut reads, expr.referenced_names()?);
                    push_unique(&mut writes, [target.clone()]);
                }
                Statement::If(cond) | Statement::ElseIf(cond) => {
                    push_unique(&mut reads, cond.referenced_names()?);
                }
                Statement::Run(name) => push_unique(&mut runs, [name.clone()]),
                Statement::Else | Statement::EndIf | Statement::Return => {}
            }
        }

        let lines: Vec<String> = statements.iter().map(render).collect();

        let ifs = lines.iter().filter(|l| l.starts_with("IF ")).count();
        let endifs = lines.iter().filter(|l| *l == "ENDIF").count();
        if ifs != endifs {
            return Err(ProgramError::UnmatchedBranch {
                what: format!("rendered {} IF lines but {} ENDIF lines", ifs, endifs),
            });
        }

        Ok(Self {
            statements,
            lines,
            reads,
            writes,
            runs,
        })
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Names read by conditions and right-hand sides, first appearance first.
    pub fn reads(&self) -> &[Identifier] {
        &self.reads
    }

    /// Assignment targets, first appearance first.
    pub fn writes(&self) -> &[Identifier] {
        &self.writes
    }

    /// Subroutines invoked with `RUN`.
    pub fn runs(&self) -> &[Identifier] {
        &self.runs
    }

    /// All names the program reads or writes.
    pub fn free_variables(&self) -> Vec<Identifier> {
        let mut all = self.reads.clone();
        push_unique(&mut all, self.writes.iter().cloned());
        all
    }

    /// Lines joined with `\n`, no trailing newline.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

fn push_unique(into: &mut Vec<Identifier>, names: impl IntoIterator<Item = Identifier>) {
    for name in names {
        if !into.contains(&name) {
            into.push(name);
        }
    }
}

impl fmt::Display for ProgramText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Builder for programs that are not a single threshold table: several
/// assignments per branch, consecutive IF blocks, `RUN`, `RETURN`.
///
/// Methods take raw strings and defer validation errors to [`build`]; the
/// first error wins and nothing is rendered.
///
/// ```
/// use ems_program::{Comparison, ProgramBuilder};
///
/// let program = ProgramBuilder::new()
///     .if_compare("OutdoorTemp", Comparison::Lt, 6.0)
///     .set("Loop1_OnOff", "0.0")
///     .else_branch()
///     .set("Loop1_OnOff", "Null")
///     .end_if()
///     .build()
///     .unwrap();
///
/// assert_eq!(program.lines()[0], "IF OutdoorTemp < 6.0");
/// assert_eq!(program.lines().len(), 5);
/// ```
///
/// [`build`]: ProgramBuilder::build
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    statements: Vec<Statement>,
    error: Option<ProgramError>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `SET target = expr`
    pub fn set(mut self, target: &str, expr: &str) -> Self {
        let statement = Identifier::new(target).and_then(|target| {
            Expression::new(expr).map(|expr| Statement::Assign { target, expr })
        });
        self.record(statement);
        self
    }

    /// `IF variable op value`
    pub fn if_compare(mut self, variable: &str, op: Comparison, value: f64) -> Self {
        let statement = compare(variable, op, value).map(Statement::If);
        self.record(statement);
        self
    }

    /// `IF expr`
    pub fn if_expr(mut self, expr: &str) -> Self {
        let statement = Expression::new(expr).map(|e| Statement::If(Condition::Expr(e)));
        self.record(statement);
        self
    }

    /// `ELSEIF variable op value`
    pub fn else_if_compare(mut self, variable: &str, op: Comparison, value: f64) -> Self {
        let statement = compare(variable, op, value).map(Statement::ElseIf);
        self.record(statement);
        self
    }

    /// `ELSEIF expr`
    pub fn else_if_expr(mut self, expr: &str) -> Self {
        let statement = Expression::new(expr).map(|e| Statement::ElseIf(Condition::Expr(e)));
        self.record(statement);
        self
    }

    pub fn else_branch(mut self) -> Self {
        self.statements.push(Statement::Else);
        self
    }

    pub fn end_if(mut self) -> Self {
        self.statements.push(Statement::EndIf);
        self
    }

    /// `RUN subroutine`
    pub fn run(mut self, subroutine: &str) -> Self {
        let statement = Identifier::new(subroutine).map(Statement::Run);
        self.record(statement);
        self
    }

    pub fn ret(mut self) -> Self {
        self.statements.push(Statement::Return);
        self
    }

    /// Append an already-typed statement.
    pub fn push(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Append every statement of a finished program.
    pub fn append(mut self, program: &ProgramText) -> Self {
        self.statements.extend(program.statements().iter().cloned());
        self
    }

    /// Validate and render.
    pub fn build(self) -> ProgramResult<ProgramText> {
        if let Some(err) = self.error {
            return Err(err);
        }
        ProgramText::from_statements(self.statements)
    }

    fn record(&mut self, statement: ProgramResult<Statement>) {
        match statement {
            Ok(statement) => self.statements.push(statement),
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
    }
}

fn compare(variable: &str, op: Comparison, value: f64) -> ProgramResult<Condition> {
    Condition::compare(Identifier::new(variable)?, op, value)
}
