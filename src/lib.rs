#[macro_use] extern crate log;
#[macro_use] extern crate lazy_static;

pub mod emitter;
pub mod error;
pub mod optimizer;
pub mod parser;
pub mod tokenizer;

use std::io::{Read, Write};

pub use emitter::{emit, emit_to_path, Emitter};
pub use error::BrainfuckError;
pub use optimizer::{optimize, OptimizationLevel, Optimizer};
pub use parser::{parse, parse_file, parse_str, Command, CommandBuilder, Program};
pub use tokenizer::Token;

/// Runs the whole pipeline: parses the source, optimizes it at the given level
/// and writes the resulting C program to `out`.
pub fn compile(source: impl Read, level: OptimizationLevel, out: impl Write) -> Result<(), BrainfuckError> {
    let mut program = parse(source)?;
    optimize(&mut program, level);
    emit(&program, out)
}
