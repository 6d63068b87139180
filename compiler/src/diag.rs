// diag.rs — Unified diagnostics model
//
// Provides the shared diagnostic and error types used across all lowering
// passes, plus the serializable error record handed to the caller / UI.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0100`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // Graph construction (E00xx)
    pub const E0001: DiagCode = DiagCode("E0001"); // label references unknown node
    pub const E0002: DiagCode = DiagCode("E0002"); // label references out-of-range port
    pub const E0003: DiagCode = DiagCode("E0003"); // invalid array-slot parent

    // Identifiers (E01xx)
    pub const E0100: DiagCode = DiagCode("E0100"); // invalid block name
    pub const E0101: DiagCode = DiagCode("E0101"); // invalid block class
    pub const E0102: DiagCode = DiagCode("E0102"); // invalid port name
    pub const E0103: DiagCode = DiagCode("E0103"); // invalid array parent port name
    pub const E0104: DiagCode = DiagCode("E0104"); // invalid argument name
    pub const E0105: DiagCode = DiagCode("E0105"); // invalid implicit block name
    pub const E0106: DiagCode = DiagCode("E0106"); // implicit block name already taken

    // Arguments (E02xx)
    pub const E0200: DiagCode = DiagCode("E0200"); // non-int value
    pub const E0201: DiagCode = DiagCode("E0201"); // non-float value
    pub const E0202: DiagCode = DiagCode("E0202"); // malformed range
    pub const E0203: DiagCode = DiagCode("E0203"); // string arguments unsupported
    pub const E0204: DiagCode = DiagCode("E0204"); // array arguments unsupported
    pub const E0205: DiagCode = DiagCode("E0205"); // unknown argument kind

    // Connection shape (E03xx)
    pub const E0300: DiagCode = DiagCode("E0300"); // mixed array and scalar ports

    // Connectors (E04xx)
    pub const E0400: DiagCode = DiagCode("E0400"); // connector pin on array connection
    pub const E0401: DiagCode = DiagCode("E0401"); // no adapter type for incoming types
    pub const E0402: DiagCode = DiagCode("E0402"); // connector pin not named port_<N>
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A structural validation failure, located by a path of graph element
/// names (node, then port or argument, or a connection name).
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: DiagCode,
    pub path: Vec<String>,
    pub message: String,
    /// Name of the violated constraint or offending field, if any.
    pub constraint: Option<String>,
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn new<I, S>(code: DiagCode, path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            code,
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
            constraint: None,
            hint: None,
        }
    }

    /// Attach the name of the violated constraint.
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: ", self.code)?;
        if !self.path.is_empty() {
            write!(f, "{}: ", self.path.join("."))?;
        }
        write!(f, "{}", self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

// ── Lowering error ───────────────────────────────────────────────────────

/// The error returned by any lowering pass. The first one aborts lowering.
#[derive(Debug, thiserror::Error)]
pub enum LowerError {
    /// The input does not decode into the graph schema.
    #[error("format error: {0}")]
    Format(#[from] serde_json::Error),
    /// A graph element violates a naming, typing, or shape rule.
    #[error("{0}")]
    Invalid(Diagnostic),
    /// The graph producer broke an invariant the editor is meant to enforce.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Diagnostic> for LowerError {
    fn from(diag: Diagnostic) -> Self {
        LowerError::Invalid(diag)
    }
}

pub const KIND_INVALID_INPUT: &str = "invalid input";
pub const KIND_INTERNAL_ERROR: &str = "internal error";

impl LowerError {
    /// Convert into the record consumed by the caller / UI.
    pub fn to_record(&self) -> CompilerError {
        match self {
            LowerError::Format(_) => CompilerError {
                path: Vec::new(),
                kind: KIND_INVALID_INPUT.to_string(),
                name: None,
                details: "format error".to_string(),
            },
            LowerError::Invalid(diag) => CompilerError {
                path: diag.path.clone(),
                kind: KIND_INVALID_INPUT.to_string(),
                name: diag.constraint.clone(),
                details: diag.message.clone(),
            },
            LowerError::Internal(message) => CompilerError {
                path: Vec::new(),
                kind: KIND_INTERNAL_ERROR.to_string(),
                name: None,
                details: message.clone(),
            },
        }
    }

    /// The structured diagnostic, if this is a validation failure.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            LowerError::Invalid(diag) => Some(diag),
            _ => None,
        }
    }
}

// ── Caller-facing records ────────────────────────────────────────────────

/// One error record as relayed to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerError {
    pub path: Vec<String>,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub details: String,
}

/// The full response document: emitted declarations or the errors that
/// prevented them. Exactly one of the two is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileResult {
    #[serde(rename = "edgHdl")]
    pub edg_hdl: String,
    pub errors: Vec<CompilerError>,
}

impl CompileResult {
    pub fn from_lowering(result: Result<String, LowerError>) -> Self {
        match result {
            Ok(edg_hdl) => Self {
                edg_hdl,
                errors: Vec::new(),
            },
            Err(e) => Self {
                edg_hdl: String::new(),
                errors: vec![e.to_record()],
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
