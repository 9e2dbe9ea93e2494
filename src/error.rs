use std::error::Error;
use std::{fmt, io};

#[derive(Debug)]
pub enum BrainfuckError {
    /// Generic message
    Message(String),
    /// I/O error.
    IoError(io::Error),
    /// A `[` without a matching `]`. The index refers to the command sequence.
    UnbalancedLoopStart { index: usize },
    /// A `]` without a matching `[`. The index refers to the command sequence.
    UnbalancedLoopEnd { index: usize },
    /// Unknown optimization pass.
    UnknownOptimizationPass(String),
    /// Unknown optimization level.
    UnknownOptimizationLevel(String)
}

impl Error for BrainfuckError {}

impl fmt::Display for BrainfuckError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use BrainfuckError::*;
        match self {
            Message(ref m) => {
                write!(f, "{}", m)
            },
            IoError(ref e) => {
                write!(f, "I/O error: {}", e)
            },
            UnbalancedLoopStart { index } => {
                write!(f, "Unmatched loop start at index {}", index)
            },
            UnbalancedLoopEnd { index } => {
                write!(f, "Unmatched loop end at index {}", index)
            },
            UnknownOptimizationPass(ref name) => {
                write!(f, "Unknown optimization pass: {}", name)
            },
            UnknownOptimizationLevel(ref level) => {
                write!(f, "Unknown optimization level: {}", level)
            }
        }
    }
}

impl From<&str> for BrainfuckError {
    fn from(s: &str) -> Self {
        BrainfuckError::Message(s.to_owned())
    }
}

impl From<String> for BrainfuckError {
    fn from(s: String) -> Self {
        BrainfuckError::Message(s)
    }
}

impl From<io::Error> for BrainfuckError {
    fn from(e: io::Error) -> Self {
        BrainfuckError::IoError(e)
    }
}
