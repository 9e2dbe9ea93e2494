#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::process::{Command as Process, Stdio};
use bf2c::{Command, Program};

/// Upper bound on the number of commands evaluated before giving up.
const MAX_STEPS: u64 = 100_000_000;

/// Reference evaluation of a program, used to check that optimizations preserve behaviour.
/// Reading past the end of `input` leaves the current cell untouched, like the emitted `scanf`.
pub fn evaluate(program: &Program, input: &[u8]) -> Vec<u8> {
    let cmds = program.commands();
    let mut tape = vec![0u8; bf2c::emitter::DATA_SIZE];
    let mut idx = 0usize;
    let mut pc = 0usize;
    let mut input = input.iter();
    let mut output = Vec::new();
    let mut steps = 0u64;

    while pc < cmds.len() {
        steps += 1;
        assert!(steps < MAX_STEPS, "Program did not terminate");

        match cmds[pc] {
            Command::ChangeValue(v) => tape[idx] = tape[idx].wrapping_add(v as u8),
            Command::MovePointer(v) => idx = (idx as i64 + i64::from(v)) as usize,
            Command::SetValue(v) => tape[idx] = v,
            Command::Output => output.push(tape[idx]),
            Command::Input => {
                if let Some(b) = input.next() {
                    tape[idx] = *b;
                }
            },
            Command::LoopStart(d) => {
                if tape[idx] == 0 {
                    pc += d as usize;
                }
            },
            Command::LoopEnd(d) => {
                if tape[idx] != 0 {
                    pc -= (-d) as usize;
                }
            },
            Command::Debug => {}
        }
        pc += 1;
    }

    output
}

/// Checks the jump distances of every loop bracket.
pub fn assert_linked(program: &Program) {
    let cmds = program.commands();
    let mut starts = 0;
    let mut ends = 0;
    for (i, c) in cmds.iter().enumerate() {
        match *c {
            Command::LoopStart(d) => {
                starts += 1;
                assert!(d > 0, "Bad jump at {}", i);
                assert_eq!(cmds[i + d as usize], Command::LoopEnd(-d));
            },
            Command::LoopEnd(d) => {
                ends += 1;
                assert!(d < 0, "Bad jump at {}", i);
                assert_eq!(cmds[i - (-d) as usize], Command::LoopStart(-d));
            },
            _ => {}
        }
    }
    assert_eq!(starts, ends);
}

/// Returns `true` if a C compiler can be invoked as `cc`.
pub fn has_c_compiler() -> bool {
    Process::new("cc")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Compiles the C source at `source` and runs it with the given input, returning its stdout.
pub fn compile_and_run(source: &Path, input: &[u8]) -> Vec<u8> {
    let exe = source.with_extension("out");
    let status = Process::new("cc")
        .arg("-std=c99")
        .arg("-O1")
        .arg("-o")
        .arg(&exe)
        .arg(source)
        .status()
        .expect("Failed to execute the C compiler");
    assert!(status.success(), "C compilation failed: {}", status);

    let mut child = Process::new(&exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(input).unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "Child process exited with status: {}", output.status);
    output.stdout
}
