//! Typed parameter values and the per-task parameter schema.
//!
//! Parameter edits are maps from a declared [`ParameterId`] to a typed
//! [`ParameterValue`]. Before an edit is queued it is checked against the
//! task's [`ParameterSchema`], so only known targets, known parameters and
//! well-typed, in-range values ever reach the wire.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{DynamicInstanceNodeId, FixedInstanceNodeId, ParameterId};

/// A single parameter value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// On/off switch.
    Toggle(bool),
    /// Continuous or stepped numeric value.
    Number(f64),
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Toggle(value)
    }
}

/// Field map of one parameter edit.
pub type ParameterValues = BTreeMap<ParameterId, ParameterValue>;

/// The instance node a parameter edit is addressed to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterTarget {
    /// A fixed (hardware) instance.
    Fixed(FixedInstanceNodeId),
    /// A dynamic (software) instance.
    Dynamic(DynamicInstanceNodeId),
}

impl fmt::Display for ParameterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(id) => write!(f, "fixed:{id}"),
            Self::Dynamic(id) => write!(f, "dynamic:{id}"),
        }
    }
}

/// Declared type of a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ParameterKind {
    /// Numeric parameter with an inclusive range.
    Number {
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },
    /// Boolean switch.
    Toggle,
}

impl ParameterKind {
    /// Check a value against this declaration.
    pub fn check(&self, value: ParameterValue) -> Result<(), String> {
        match (self, value) {
            (Self::Toggle, ParameterValue::Toggle(_)) => Ok(()),
            (Self::Number { min, max }, ParameterValue::Number(n)) => {
                if n.is_finite() && n >= *min && n <= *max {
                    Ok(())
                } else {
                    Err(format!("{n} outside [{min}, {max}]"))
                }
            }
            (Self::Toggle, ParameterValue::Number(_)) => Err("expected toggle, got number".into()),
            (Self::Number { .. }, ParameterValue::Toggle(_)) => {
                Err("expected number, got toggle".into())
            }
        }
    }
}

/// The parameters a task declares for each of its instance nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSchema {
    targets: HashMap<ParameterTarget, BTreeMap<ParameterId, ParameterKind>>,
}

impl ParameterSchema {
    /// Empty schema; every edit is rejected until targets are declared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one parameter on a target (builder style).
    #[must_use]
    pub fn with_parameter(
        mut self,
        target: ParameterTarget,
        parameter: impl Into<ParameterId>,
        kind: ParameterKind,
    ) -> Self {
        let _ = self
            .targets
            .entry(target)
            .or_default()
            .insert(parameter.into(), kind);
        self
    }

    /// Validate an edit. Returns a human-readable reason on rejection.
    pub fn validate(&self, target: &ParameterTarget, values: &ParameterValues) -> Result<(), String> {
        let Some(declared) = self.targets.get(target) else {
            return Err("unknown target".into());
        };
        for (parameter, value) in values {
            let Some(kind) = declared.get(parameter) else {
                return Err(format!("unknown parameter '{parameter}'"));
            };
            kind.check(*value)
                .map_err(|reason| format!("parameter '{parameter}': {reason}"))?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
