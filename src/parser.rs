use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use crate::BrainfuckError;
use crate::tokenizer::{self, Token};

/// A single fused Brainfuck command.
///
/// Loop brackets carry the signed distance to their matching bracket:
/// positive on [`LoopStart`](Command::LoopStart), negative on [`LoopEnd`](Command::LoopEnd).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Adds the given (possibly negative) amount to the current cell.
    ChangeValue(i32),
    /// Moves the data pointer by the given (possibly negative) amount.
    MovePointer(i32),
    Output,
    Input,
    LoopStart(i32),
    LoopEnd(i32),
    Debug,
    /// Overwrites the current cell. Only produced by constant folding.
    SetValue(u8)
}

impl Command {

    /// Signed payload of the command. Commands without one report 0.
    pub fn value(&self) -> i32 {
        match *self {
            Command::ChangeValue(v) |
            Command::MovePointer(v) |
            Command::LoopStart(v) |
            Command::LoopEnd(v) => v,
            Command::SetValue(v) => v.into(),
            Command::Output |
            Command::Input |
            Command::Debug => 0
        }
    }

    /// Name of the kind of command, as shown in program listings.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Command::ChangeValue(_) => "CHANGE_VAL",
            Command::MovePointer(_) => "CHANGE_PTR",
            Command::Output => "OUT",
            Command::Input => "IN",
            Command::LoopStart(_) => "LOOP_START",
            Command::LoopEnd(_) => "LOOP_END",
            Command::Debug => "DEBUG",
            Command::SetValue(_) => "SET_VAL"
        }
    }

}

/// A parsed Brainfuck program: a flat sequence of commands with resolved loop jumps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    commands: Vec<Command>
}

impl Program {

    /// Builds a program from a token stream.
    pub fn from_tokens<I>(tokens: I) -> Result<Program, BrainfuckError>
        where I: IntoIterator<Item = Token>
    {
        let mut builder = CommandBuilder::new();
        for t in tokens {
            builder.push(t);
        }
        builder.build()
    }

    /// Returns the commands of this program.
    pub fn commands(&self) -> &[Command] {
        &*self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns `true` if at least one command satisfies the predicate.
    pub fn contains(&self, f: impl Fn(&Command) -> bool) -> bool {
        self.commands.iter().any(f)
    }

    /// Replaces the whole command sequence and recomputes all the loop jumps.
    ///
    /// The new sequence must have balanced brackets; any payload already on the brackets is ignored.
    pub(crate) fn replace_commands(&mut self, commands: Vec<Command>) {
        self.commands = commands;
        relink(&mut self.commands);
    }

}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let width = self.commands.len().to_string().len();
        for (i, cmd) in self.commands.iter().enumerate() {
            writeln!(f, "[{:>width$}] Command: {}, Value: {}", i, cmd.kind_name(), cmd.value(), width = width)?;
        }
        Ok(())
    }
}

/// The two families of commands whose tokens get fused together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Value,
    Pointer
}

/// Incrementally turns tokens into a [`Program`](crate::parser::Program).
///
/// Consecutive `+`/`-` and `<`/`>` tokens are fused into a single command carrying their net sum,
/// and runs summing to zero disappear. Loop brackets are matched when calling [`build`](CommandBuilder::build).
#[derive(Debug, Default)]
pub struct CommandBuilder {
    commands: Vec<Command>,
    run: Option<(Family, i32)>
}

impl CommandBuilder {

    pub fn new() -> CommandBuilder {
        CommandBuilder::default()
    }

    /// Feeds a single token to the builder.
    pub fn push(&mut self, t: Token) -> &mut Self {
        let cmd = match t {
            Token::Increment => return self.accumulate(Family::Value, 1),
            Token::Decrement => return self.accumulate(Family::Value, -1),
            Token::MoveRight => return self.accumulate(Family::Pointer, 1),
            Token::MoveLeft => return self.accumulate(Family::Pointer, -1),
            Token::LoopStart => Command::LoopStart(0),
            Token::LoopEnd => Command::LoopEnd(0),
            Token::Output => Command::Output,
            Token::Input => Command::Input,
            Token::Debug => Command::Debug
        };
        self.flush();
        self.commands.push(cmd);
        self
    }

    fn accumulate(&mut self, family: Family, delta: i32) -> &mut Self {
        match self.run {
            Some((f, ref mut sum)) if f == family => {
                *sum = sum.wrapping_add(delta);
            },
            _ => {
                self.flush();
                self.run = Some((family, delta));
            }
        }
        self
    }

    /// Closes the pending additive run, dropping it if it cancelled itself out.
    fn flush(&mut self) {
        match self.run.take() {
            Some((_, 0)) | None => {},
            Some((Family::Value, sum)) => self.commands.push(Command::ChangeValue(sum)),
            Some((Family::Pointer, sum)) => self.commands.push(Command::MovePointer(sum))
        }
    }

    /// Matches the loop brackets and returns the finished program.
    pub fn build(mut self) -> Result<Program, BrainfuckError> {
        self.flush();
        let mut commands = self.commands;

        let mut stack: Vec<usize> = Vec::new();
        for i in 0..commands.len() {
            match commands[i] {
                Command::LoopStart(_) => stack.push(i),
                Command::LoopEnd(_) => {
                    let start = stack.pop().ok_or(BrainfuckError::UnbalancedLoopEnd { index: i })?;
                    let delta = (i - start) as i32;
                    commands[start] = Command::LoopStart(delta);
                    commands[i] = Command::LoopEnd(-delta);
                },
                _ => {}
            }
        }

        // The bottom of the stack is the earliest unmatched bracket
        if let Some(&index) = stack.first() {
            return Err(BrainfuckError::UnbalancedLoopStart { index });
        }

        Ok(Program { commands })
    }

}

/// Recomputes the jumps of all the brackets of an already balanced sequence.
fn relink(commands: &mut [Command]) {
    let mut stack: Vec<usize> = Vec::new();
    for i in 0..commands.len() {
        match commands[i] {
            Command::LoopStart(_) => stack.push(i),
            Command::LoopEnd(_) => {
                if let Some(start) = stack.pop() {
                    let delta = (i - start) as i32;
                    commands[start] = Command::LoopStart(delta);
                    commands[i] = Command::LoopEnd(-delta);
                }
            },
            _ => {}
        }
    }
    debug_assert!(stack.is_empty(), "Unbalanced brackets after rewriting the program");
}

/// Parses a Brainfuck program from the given stream.
pub fn parse(r: impl Read) -> Result<Program, BrainfuckError> {
    Program::from_tokens(tokenizer::tokenize_reader(r)?)
}

/// Parses a Brainfuck program from source text.
pub fn parse_str(source: &str) -> Result<Program, BrainfuckError> {
    Program::from_tokens(tokenizer::tokenize(source.as_bytes()))
}

/// Parses the Brainfuck file at the given path.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Program, BrainfuckError> {
    debug!("Parsing file: {}", path.as_ref().display());
    let file = File::open(path)?;
    parse(BufReader::new(file))
}
