//! Conversation-level parameters and the option gates that reference them.
//!
//! Parameters are named bool/int values declared on the conversation.
//! Conditions on option nodes reference them by name; they are carried
//! through persistence but not evaluated by the editor core.

use serde::{Deserialize, Serialize};

/// A named parameter declared at the conversation level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    /// A boolean flag.
    Bool { name: String, value: bool },
    /// An integer counter.
    Int { name: String, value: i32 },
}

impl Parameter {
    /// The parameter's declared name.
    pub fn name(&self) -> &str {
        match self {
            Parameter::Bool { name, .. } | Parameter::Int { name, .. } => name,
        }
    }
}

/// How an integer condition compares the parameter to its required value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntCheck {
    Equal,
    GreaterThan,
    LessThan,
}

/// A gate on an option node, keyed by a parameter name.
///
/// Presently inert: the editor stores and round-trips conditions but never
/// evaluates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Requires a bool parameter to hold a given value.
    Bool { parameter: String, required: bool },
    /// Compares an int parameter against a required value.
    Int {
        parameter: String,
        check: IntCheck,
        required: i32,
    },
}

impl Condition {
    /// Name of the parameter this condition gates on.
    pub fn parameter(&self) -> &str {
        match self {
            Condition::Bool { parameter, .. } | Condition::Int { parameter, .. } => parameter,
        }
    }
}
