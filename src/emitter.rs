use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use crate::BrainfuckError;
use crate::parser::{Command, Program};

/// Number of cells of the tape of the emitted program.
pub const DATA_SIZE: usize = 30_000;

/// Number of cells printed by a debug command.
pub const DBG_SIZE: usize = 31;

const INDENT_WIDTH: usize = 4;

const INCLUDES: &str = "#include <stdio.h>\n\n";

const DEBUG_FUNC: &str = r#"void debug(unsigned char const* data, unsigned int idx) {
    size_t const start = idx < DBG_SIZE / 2 ? 0
                       : idx >= DATA_SIZE - DBG_SIZE / 2 ? DATA_SIZE - DBG_SIZE
                       : idx - DBG_SIZE / 2;
    printf("\n");
    for (size_t i = start; i < start + DBG_SIZE; ++i) {
        printf("[%3d]", data[i]);
    }
    printf("\n");
}
"#;

const MAIN_SETUP: &str = "
int main(void) {
    unsigned char data[DATA_SIZE] = {0};
    unsigned int idx = 0;
    /* PROGRAM */
";

const EPILOGUE: &str = "    /* PROGRAM END */
    return 0;
}
";

/// Writes the C translation of a program to a stream.
pub struct Emitter<W>
    where W: Write
{
    out: W,
    indentation_level: usize
}

impl<W> Emitter<W>
    where W: Write
{

    pub fn new(out: W) -> Emitter<W> {
        Emitter {
            out,
            indentation_level: 1
        }
    }

    /// Emits the whole program: preamble, one statement per command and epilogue.
    pub fn emit_program(&mut self, program: &Program) -> Result<(), BrainfuckError> {
        self.emit_preamble(program)?;
        for cmd in program.commands() {
            self.emit_command(*cmd)?;
        }
        self.out.write_all(EPILOGUE.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }

    /// Consumes the emitter, returning the underlying stream.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit_preamble(&mut self, program: &Program) -> Result<(), BrainfuckError> {
        let has_debug = program.contains(|c| *c == Command::Debug);
        let has_io = program.contains(|c| *c == Command::Output || *c == Command::Input);

        if has_debug || has_io {
            self.out.write_all(INCLUDES.as_bytes())?;
        }
        write!(self.out, "/* PREAMBLE */\n#define DATA_SIZE {}\n", DATA_SIZE)?;
        if has_debug {
            write!(self.out, "#define DBG_SIZE {}\n\n", DBG_SIZE)?;
            self.out.write_all(DEBUG_FUNC.as_bytes())?;
        }
        self.out.write_all(MAIN_SETUP.as_bytes())?;
        Ok(())
    }

    fn emit_command(&mut self, cmd: Command) -> Result<(), BrainfuckError> {
        let statement = match cmd {
            Command::ChangeValue(v) => format!("data[idx] {}= {};", sign(v), v.unsigned_abs()),
            Command::MovePointer(v) => format!("idx {}= {};", sign(v), v.unsigned_abs()),
            Command::SetValue(v) => format!("data[idx] = {};", v),
            Command::Output => "printf(\"%c\", data[idx]);".to_owned(),
            Command::Input => "(void) scanf(\"%c\", (char*) &data[idx]);".to_owned(),
            Command::LoopStart(_) => {
                self.write_line("while (data[idx]) {")?;
                self.indentation_level += 1;
                return Ok(());
            },
            Command::LoopEnd(_) => {
                self.indentation_level = self.indentation_level.saturating_sub(1);
                "}".to_owned()
            },
            Command::Debug => "debug(data, idx);".to_owned()
        };
        self.write_line(&statement)
    }

    fn write_line(&mut self, line: &str) -> Result<(), BrainfuckError> {
        let indent = self.indentation_level * INDENT_WIDTH;
        writeln!(self.out, "{:indent$}{}", "", line, indent = indent)?;
        Ok(())
    }

}

fn sign(v: i32) -> char {
    if v > 0 { '+' } else { '-' }
}

/// Writes the C translation of the program to the given stream.
pub fn emit(program: &Program, out: impl Write) -> Result<(), BrainfuckError> {
    Emitter::new(out).emit_program(program)
}

/// Writes the C translation of the program to the file at the given path, creating or truncating it.
pub fn emit_to_path<P: AsRef<Path>>(program: &Program, path: P) -> Result<(), BrainfuckError> {
    debug!("Writing C source to {}.", path.as_ref().display());
    let file = File::create(path)?;
    emit(program, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use crate::parser::parse_str;

    fn c(s: &str) -> String {
        let mut out = Vec::new();
        emit(&parse_str(s).unwrap(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    /// Returns only the lines between the program markers.
    fn body(s: &str) -> Vec<String> {
        c(s).lines()
            .skip_while(|l| !l.contains("/* PROGRAM */"))
            .skip(1)
            .take_while(|l| !l.contains("/* PROGRAM END */"))
            .map(|l| l.to_owned())
            .collect()
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(c(""), "/* PREAMBLE */
#define DATA_SIZE 30000

int main(void) {
    unsigned char data[DATA_SIZE] = {0};
    unsigned int idx = 0;
    /* PROGRAM */
    /* PROGRAM END */
    return 0;
}
");
    }

    #[test]
    fn test_increment_and_print() {
        let out = c("+++.");
        assert!(out.starts_with("#include <stdio.h>\n\n/* PREAMBLE */\n"));
        assert!(!out.contains("DBG_SIZE"));
        assert_eq!(body("+++."), vec![
            "    data[idx] += 3;",
            "    printf(\"%c\", data[idx]);"
        ]);
    }

    #[test]
    fn test_statements() {
        assert_eq!(body("--->>,<<<<"), vec![
            "    data[idx] -= 3;",
            "    idx += 2;",
            "    (void) scanf(\"%c\", (char*) &data[idx]);",
            "    idx -= 4;"
        ]);
    }

    #[test]
    fn test_nested_indentation() {
        assert_eq!(body("+[>[-]<-]"), vec![
            "    data[idx] += 1;",
            "    while (data[idx]) {",
            "        idx += 1;",
            "        while (data[idx]) {",
            "            data[idx] -= 1;",
            "        }",
            "        idx -= 1;",
            "        data[idx] -= 1;",
            "    }"
        ]);
    }

    #[test]
    fn test_debug_helper() {
        let out = c("+#");
        assert!(out.starts_with("#include <stdio.h>\n\n/* PREAMBLE */\n#define DATA_SIZE 30000\n#define DBG_SIZE 31\n"));
        assert!(out.contains("void debug(unsigned char const* data, unsigned int idx) {"));
        assert!(out.contains("    debug(data, idx);\n"));

        // No I/O at all: no include
        assert!(!c("+[-]").contains("#include"));
    }

    #[test]
    fn test_into_inner() {
        let program = parse_str("+[>.<-]").unwrap();
        let mut emitter = Emitter::new(Vec::new());
        emitter.emit_program(&program).unwrap();
        let out = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(out, c("+[>.<-]"));
    }

    #[test]
    fn test_set_value() {
        let mut prog = parse_str("[-]").unwrap();
        crate::optimizer::optimize(&mut prog, crate::optimizer::OptimizationLevel::Medium);
        let mut out = Vec::new();
        emit(&prog, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("\n    data[idx] = 0;\n"));
        assert!(!out.contains("while"));
    }

    #[test]
    fn test_write_failure() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        match emit(&parse_str("+.").unwrap(), Full) {
            Err(BrainfuckError::IoError(_)) => {},
            r => panic!("Expected I/O error. Got: {:?}", r)
        }
    }

}
