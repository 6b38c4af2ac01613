//! Error type for BLIF parsing.

use thiserror::Error;

/// Errors produced while parsing a BLIF netlist.
#[derive(Debug, Error)]
pub enum BlifError {
    /// The input violated BLIF syntax.
    #[error("BLIF syntax error on line {line}: {message}")]
    Syntax {
        /// 1-based line number of the offending logical line.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A `.names` block had more inputs than a LUT can hold.
    #[error("unsupported LUT with {width} inputs on line {line}")]
    LutTooWide {
        /// 1-based line number of the `.names` header.
        line: usize,
        /// Number of inputs declared.
        width: usize,
    },

    /// The file ended before `.end`.
    #[error("unexpected end of BLIF input, missing .end")]
    UnexpectedEof,
}

impl BlifError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        BlifError::Syntax {
            line,
            message: message.into(),
        }
    }
}
