//! EMS program generation for EnergyPlus Runtime Language (ERL).
//!
//! This crate turns control policies into ERL program text and keeps track of
//! the EMS objects (sensors, actuators, globals, programs, calling managers)
//! that the text refers to.
//!
//! # Architecture
//!
//! - Names are validated [`Identifier`]s; counters for generated names are
//!   threaded through an explicit [`NameAllocator`] value
//! - Programs are built as typed [`Statement`] lists and rendered by a single
//!   formatter, after their IF/ELSEIF/ELSE/ENDIF structure has been checked
//! - [`PiecewiseRuleProgramBuilder`] compiles ordered threshold tables into
//!   if/elseif chains; [`ProgramBuilder`] covers free-form programs
//! - [`EmsModel`] collects declarations and checks that every program only
//!   reads names that exist
//!
//! The host simulation engine interprets the generated text; nothing here
//! evaluates ERL.

pub mod component;
pub mod error;
pub mod expr;
pub mod ident;
pub mod idf;
pub mod model;
pub mod objects;
pub mod piecewise;
pub mod program;
pub mod statement;

pub use component::{ComponentKind, ComponentRef, PumpSpeed, ScheduleKind};
pub use error::{ProgramError, ProgramResult};
pub use expr::Expression;
pub use ident::{Identifier, NameAllocator, sanitize};
pub use idf::{field_text_error, to_idf};
pub use model::{EmsModel, ModelSummary, NameClass};
pub use objects::{
    Actuator, CallingPoint, ConstructionIndexVariable, DebugOutputLevel, DictionaryReporting,
    GlobalVariable, InternalVariable, OutputDataType, OutputReporting, OutputRequest,
    OutputVariable, Program, ProgramCallingManager, ReportingFrequency, Sensor, TrendVariable,
    UpdateFrequency,
};
pub use piecewise::{Action, PiecewiseRuleProgram, PiecewiseRuleProgramBuilder, ThresholdRule};
pub use program::{ProgramBuilder, ProgramText};
pub use statement::{Comparison, Condition, Statement, check_structure, render};
