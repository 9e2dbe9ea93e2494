use std::io::Read;
use crate::BrainfuckError;

/// A meaningful Brainfuck symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Increment,
    Decrement,
    MoveLeft,
    MoveRight,
    LoopStart,
    LoopEnd,
    Output,
    Input,
    Debug
}

impl Token {

    /// Classifies a single source byte.
    /// Returns `None` for comments, which also covers the reserved `!`.
    pub fn from_byte(b: u8) -> Option<Token> {
        match b {
            b'+' => Some(Token::Increment),
            b'-' => Some(Token::Decrement),
            b'<' => Some(Token::MoveLeft),
            b'>' => Some(Token::MoveRight),
            b'[' => Some(Token::LoopStart),
            b']' => Some(Token::LoopEnd),
            b'.' => Some(Token::Output),
            b',' => Some(Token::Input),
            b'#' => Some(Token::Debug),
            _ => None
        }
    }

}

/// Lazily tokenizes an in-memory buffer, dropping every comment byte.
pub fn tokenize<'a>(source: &'a [u8]) -> impl Iterator<Item = Token> + 'a {
    source.iter().filter_map(|b| Token::from_byte(*b))
}

/// Reads the whole stream and returns its tokens.
pub fn tokenize_reader(r: impl Read) -> Result<Vec<Token>, BrainfuckError> {
    let mut tokens = Vec::new();
    for b in r.bytes() {
        if let Some(t) = Token::from_byte(b?) {
            tokens.push(t);
        }
    }
    Ok(tokens)
}
