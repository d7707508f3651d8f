//! Task factories and the kind registry
//!
//! A factory is the editing state for one task kind: it holds in-progress
//! parameter values, reports whether they validate, and builds the task.
//! Kinds are registered explicitly in [`TaskRegistry::builtin`].

mod parameter;
mod registry;

use std::fmt;

use thiserror::Error;

use crate::catalog::Catalog;
use crate::task::Task;

pub use parameter::{Constraint, ParamTag, ParamValue, TaskParameter};
pub use registry::{KindEntry, SmartIcons, TaskKind, TaskRegistry};

/// Errors from editing factory values
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Kind '{kind}' has no parameter named '{name}'")]
    UnknownParameter { kind: &'static str, name: String },

    #[error("Parameter '{name}' expects a {expected} value")]
    WrongType { name: &'static str, expected: ParamTag },

    #[error("Invalid value '{raw}' for parameter '{name}'")]
    Unparsable { name: &'static str, raw: String },

    #[error("Unknown task kind '{0}'")]
    UnknownKind(String),

    #[error("Task kind '{expected}' cannot be initialized from a '{found}' task")]
    KindMismatch { expected: &'static str, found: String },
}

/// Authoring state for one task kind
pub trait TaskFactory: Send + Sync + fmt::Debug {
    fn kind(&self) -> &'static str;

    /// Parameter descriptors in display order
    fn parameters(&self) -> &'static [TaskParameter];

    /// Current value of a parameter, `None` if the name is unknown
    fn get(&self, name: &str) -> Option<ParamValue>;

    fn set(&mut self, name: &str, value: ParamValue) -> Result<(), FactoryError>;

    /// Construct the task from the current values
    ///
    /// Called only after [`TaskFactory::is_ready`] holds.
    fn build(&self, name: &str, catalog: &dyn Catalog) -> Option<Box<dyn Task>>;

    /// Populate values from an existing task for edit-in-place
    fn initialize(&mut self, task: &dyn Task) -> Result<(), FactoryError>;

    fn parameter(&self, name: &str) -> Option<&'static TaskParameter> {
        self.parameters().iter().find(|p| p.name == name)
    }

    /// Parse raw text with the parameter's tag and store it
    fn set_raw(&mut self, name: &str, raw: &str) -> Result<(), FactoryError> {
        let param = self.parameter(name).ok_or_else(|| FactoryError::UnknownParameter {
            kind: self.kind(),
            name: name.to_string(),
        })?;
        let value = ParamValue::parse(param.tag, raw).ok_or_else(|| FactoryError::Unparsable {
            name: param.name,
            raw: raw.to_string(),
        })?;
        self.set(name, value)
    }

    /// Every visible parameter validates
    ///
    /// Required parameters must satisfy their constraints; optional ones only
    /// when they carry a value.
    fn is_ready(&self, catalog: &dyn Catalog) -> bool {
        self.parameters().iter().filter(|p| !p.hidden).all(|p| {
            let value = self.get(p.name).unwrap_or_default();
            if !p.required && value.is_empty() {
                return true;
            }
            p.is_valid(&value, catalog)
        })
    }

    /// Build the task, or `None` when not ready
    fn create(&self, name: &str, catalog: &dyn Catalog) -> Option<Box<dyn Task>> {
        if !self.is_ready(catalog) {
            tracing::debug!(kind = self.kind(), "TaskFactory::create: not ready");
            return None;
        }
        self.build(name, catalog)
    }
}

/// Look up a parameter of `kind` by name
pub(crate) fn lookup(
    kind: &'static str,
    params: &'static [TaskParameter],
    name: &str,
) -> Result<&'static TaskParameter, FactoryError> {
    params
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| FactoryError::UnknownParameter {
            kind,
            name: name.to_string(),
        })
}

/// Ensure `task` is of `kind` before initializing from it
pub(crate) fn expect_kind(kind: &'static str, task: &dyn Task) -> Result<(), FactoryError> {
    if task.kind() == kind {
        Ok(())
    } else {
        Err(FactoryError::KindMismatch {
            expected: kind,
            found: task.kind().to_string(),
        })
    }
}
