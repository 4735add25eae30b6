pub mod adapter;
pub mod collaborators;
pub mod cooldown;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod reports;
pub mod resolver;
pub mod runner;
pub mod store;
pub mod templates;

pub use error::{HarnessError, Result};
pub use executor::{ExecutionService, PistonClient};
pub use runner::{BatchReport, BatchRunner, CaseResult, RunOutcome, Signal};
pub use store::{TestCaseField, TestCaseStore};
