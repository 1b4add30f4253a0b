use serde::{Deserialize, Serialize};

use super::{MethodId, SourceLocation};

/// Identity of a call site: the calling method and the position of the
/// invocation within its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallSiteId {
    pub method: MethodId,
    pub index: usize,
}

/// One invocation in one method body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSite {
    /// Method whose body contains this invocation.
    pub caller: MethodId,
    /// Position in the caller's body.
    pub index: usize,
    /// Declaring type of the invoked method (e.g., "java.security.MessageDigest").
    pub declaring_type: String,
    /// Name of the invoked method (e.g., "getInstance").
    pub method_name: String,
    /// Argument shapes as seen at the call site.
    pub arguments: Vec<ArgumentValue>,
    pub location: Option<SourceLocation>,
}

impl CallSite {
    pub fn argument(&self, index: usize) -> Option<&ArgumentValue> {
        self.arguments.get(index)
    }

    pub fn arity(&self) -> usize {
        self.arguments.len()
    }

    pub fn line(&self) -> Option<u32> {
        self.location.as_ref().map(|l| l.line)
    }

    /// `declaring_type.method_name`, the form rules and reports use.
    pub fn target(&self) -> String {
        format!("{}.{}", self.declaring_type, self.method_name)
    }
}

/// Where a call-site argument comes from.
///
/// `ParameterRef` indices are only meaningful relative to the method that
/// owns the call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentValue {
    /// Hardcoded string constant.
    Literal(String),
    /// Positional parameter of the enclosing method.
    ParameterRef(usize),
    /// Any other expression (field load, call result, concatenation, ...).
    Unsupported,
}

impl ArgumentValue {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }
}
