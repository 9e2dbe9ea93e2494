use std::collections::{BTreeMap, BTreeSet};
use itertools::Itertools;
use crate::parser::{Command, Program};
use crate::optimizer::Pass;

/// Maximum number of steps simulated while folding a single run of commands.
/// Loops still running when the budget is exhausted are left in place.
const STEP_BUDGET: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantFold;

impl Pass for ConstantFold {

    fn name(&self) -> &str {
        "constant-fold"
    }

    fn run(&self, program: &mut Program) {
        let commands = program.commands();
        let mut folded = Vec::with_capacity(commands.len());
        let mut tape = Tape::default();
        let mut i = 0;

        while i < commands.len() {

            // Simulate as much as possible, then replace everything we simulated
            // with the minimal sequence producing the same tape
            let stop = simulate_run(commands, i, &mut tape);
            folded.extend(tape.to_commands());
            if stop == commands.len() {
                break;
            }

            // Whatever stopped the simulation is kept verbatim.
            // What we know about the tape depends on what it was.
            let cmd = commands[stop];
            folded.push(cmd);
            tape = match cmd {
                Command::Input => tape.carry(true),
                Command::LoopStart(_) => Tape::default(),
                Command::LoopEnd(_) => Tape::after_loop(),
                _ => tape.carry(false)
            };
            i = stop + 1;
        }

        program.replace_commands(folded);
    }

}

/// Abstract value of a tape cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    /// The value is known.
    Exact(u8),
    /// Unknown initial value plus a known delta.
    Relative(u8)
}

/// Abstract tape used while folding a run. Offsets are relative to the position
/// of the data pointer at the beginning of the run.
#[derive(Debug, Clone, Default)]
struct Tape {
    /// Cells whose value was already known when the run started.
    known: BTreeMap<i32, u8>,
    /// Cells touched during the run.
    cells: BTreeMap<i32, Cell>,
    position: i32
}

impl Tape {

    /// Tape right after a loop exited: the current cell is zero.
    fn after_loop() -> Tape {
        let mut tape = Tape::default();
        tape.known.insert(0, 0);
        tape
    }

    fn get(&self, offset: i32) -> Cell {
        match self.cells.get(&offset) {
            Some(c) => *c,
            None => self.known.get(&offset).map_or(Cell::Relative(0), |v| Cell::Exact(*v))
        }
    }

    fn current(&self) -> Cell {
        self.get(self.position)
    }

    fn set(&mut self, cell: Cell) {
        self.cells.insert(self.position, cell);
    }

    fn add(&mut self, amount: i32) {
        let amount = amount as u8;
        let cell = match self.current() {
            Cell::Exact(v) => Cell::Exact(v.wrapping_add(amount)),
            Cell::Relative(d) => Cell::Relative(d.wrapping_add(amount))
        };
        self.set(cell);
    }

    fn shift(&mut self, amount: i32) {
        self.position = self.position.wrapping_add(amount);
    }

    /// Starts a new run from the current state, keeping every exact cell.
    /// If `clobber_current` is set, the current cell is forgotten (it has just been read from input).
    fn carry(&self, clobber_current: bool) -> Tape {
        let offsets: BTreeSet<i32> = self.known.keys().chain(self.cells.keys()).cloned().collect();
        let mut tape = Tape::default();
        for offset in offsets {
            if clobber_current && offset == self.position {
                continue;
            }
            if let Cell::Exact(v) = self.get(offset) {
                tape.known.insert(offset.wrapping_sub(self.position), v);
            }
        }
        tape
    }

    /// Minimal sequence of commands bringing the real tape in the same state as this one:
    /// cells in ascending offset order, then a final move to the current position.
    fn to_commands(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut at = 0;
        for (&offset, &cell) in &self.cells {
            let cmd = match (cell, self.known.get(&offset)) {
                (Cell::Exact(v), Some(&initial)) if v == initial => continue,
                (Cell::Exact(v), Some(&initial)) => Command::ChangeValue(signed(v.wrapping_sub(initial))),
                (Cell::Exact(v), None) => Command::SetValue(v),
                (Cell::Relative(0), _) => continue,
                (Cell::Relative(d), _) => Command::ChangeValue(signed(d))
            };
            if offset != at {
                commands.push(Command::MovePointer(offset.wrapping_sub(at)));
                at = offset;
            }
            commands.push(cmd);
        }
        if self.position != at {
            commands.push(Command::MovePointer(self.position.wrapping_sub(at)));
        }
        commands
    }

}

/// Maps a byte delta to the closest signed amount.
fn signed(delta: u8) -> i32 {
    i32::from(delta as i8)
}

/// Simulates `commands` starting from `start` until a command that cannot be folded.
/// Returns the index of that command, or the length of `commands` if the end was reached.
fn simulate_run(commands: &[Command], start: usize, tape: &mut Tape) -> usize {
    let mut budget = STEP_BUDGET;
    let mut i = start;
    while i < commands.len() {
        match commands[i] {
            Command::ChangeValue(v) => tape.add(v),
            Command::MovePointer(v) => tape.shift(v),
            Command::SetValue(v) => tape.set(Cell::Exact(v)),
            Command::LoopStart(jump) => {
                let end = i + jump as usize;
                let mut attempt = tape.clone();
                if !run_loop(&commands[i + 1..end], &mut attempt, &mut budget) {
                    return i;
                }
                *tape = attempt;
                i = end;
            },
            Command::Output |
            Command::Input |
            Command::Debug |
            Command::LoopEnd(_) => return i
        }
        i += 1;
    }
    i
}

/// Statically executes a loop with the given body.
/// Returns `false` if the effect of the loop cannot be determined; the tape is garbage in that case.
fn run_loop(body: &[Command], tape: &mut Tape, budget: &mut usize) -> bool {
    loop {
        if *budget == 0 {
            return false;
        }
        *budget -= 1;

        match tape.current() {
            Cell::Exact(0) => return true,
            Cell::Exact(_) => {
                if !run_body(body, tape, budget) {
                    return false;
                }
            },
            Cell::Relative(_) => return clear_loop(body, tape)
        }
    }
}

fn run_body(body: &[Command], tape: &mut Tape, budget: &mut usize) -> bool {
    let mut i = 0;
    while i < body.len() {
        if *budget == 0 {
            return false;
        }
        *budget -= 1;

        match body[i] {
            Command::ChangeValue(v) => tape.add(v),
            Command::MovePointer(v) => tape.shift(v),
            Command::SetValue(v) => tape.set(Cell::Exact(v)),
            Command::LoopStart(jump) => {
                let end = i + jump as usize;
                if !run_loop(&body[i + 1..end], tape, budget) {
                    return false;
                }
                i = end;
            },
            Command::Output |
            Command::Input |
            Command::Debug |
            Command::LoopEnd(_) => return false
        }
        i += 1;
    }
    true
}

/// Recognizes loops that only bring their governing cell to zero, whatever its value.
///
/// The body must be straight-line code which returns to the cell it started from,
/// changes that cell by an odd amount (so that it always reaches zero)
/// and leaves every other cell as it found it.
fn clear_loop(body: &[Command], tape: &mut Tape) -> bool {
    let mut offset = 0i32;
    let mut deltas: BTreeMap<i32, u8> = BTreeMap::new();
    for cmd in body {
        match *cmd {
            Command::ChangeValue(v) => {
                let d = deltas.entry(offset).or_insert(0);
                *d = d.wrapping_add(v as u8);
            },
            Command::MovePointer(v) => offset = offset.wrapping_add(v),
            _ => return false
        }
    }

    if offset != 0 {
        return false;
    }
    if deltas.get(&0).map_or(true, |d| d % 2 == 0) {
        return false;
    }
    if deltas.iter().any(|(&o, &d)| o != 0 && d != 0) {
        return false;
    }

    tape.set(Cell::Exact(0));
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadCode;

impl Pass for DeadCode {

    fn name(&self) -> &str {
        "dead-code"
    }

    fn run(&self, program: &mut Program) {
        let commands = program.commands();
        let mut alive = Vec::with_capacity(commands.len());

        // `zero` is set whenever the current cell is statically known to be zero.
        // Until the first write all the cells are zero, wherever the pointer is.
        let mut zero = true;
        let mut pristine = true;

        let mut i = 0;
        while i < commands.len() {
            let cmd = commands[i];
            match cmd {

                // A loop entered with a zero cell is never executed: skip it with its body
                Command::LoopStart(jump) if zero => {
                    i += jump as usize + 1;
                    continue;
                },
                Command::LoopStart(_) => zero = false,

                // Loops always exit with the current cell at zero
                Command::LoopEnd(_) => zero = true,

                Command::ChangeValue(0) | Command::MovePointer(0) => {},
                Command::ChangeValue(_) | Command::Input => {
                    zero = false;
                    pristine = false;
                },
                Command::MovePointer(_) => zero = pristine,
                Command::SetValue(v) => {
                    zero = v == 0;
                    pristine = pristine && zero;
                },
                Command::Output | Command::Debug => {}

            }
            alive.push(cmd);
            i += 1;
        }

        program.replace_commands(alive);
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveNoops;

impl Pass for RemoveNoops {

    fn name(&self) -> &str {
        "remove-noops"
    }

    fn run(&self, program: &mut Program) {
        let commands = program.commands().iter().cloned().filter(|c| match c {
            Command::ChangeValue(0) |
            Command::MovePointer(0) => false,
            _ => true
        })
        .collect();
        program.replace_commands(commands);
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapseIncrements;

impl Pass for CollapseIncrements {

    fn name(&self) -> &str {
        "collapse-increments"
    }

    fn run(&self, program: &mut Program) {
        use crate::parser::Command::*;
        let commands = program.commands().iter().cloned().coalesce(|a, b| {
            match (a, b) {

                // Merge consecutive changes and moves together
                (ChangeValue(x), ChangeValue(y)) => Ok(ChangeValue(x.wrapping_add(y))),
                (MovePointer(x), MovePointer(y)) => Ok(MovePointer(x.wrapping_add(y))),

                // An assignment absorbs the changes after it and overwrites the ones before
                (SetValue(x), ChangeValue(y)) => Ok(SetValue(x.wrapping_add(y as u8))),
                (ChangeValue(_), SetValue(y)) |
                (SetValue(_), SetValue(y)) => Ok(SetValue(y)),

                (a, b) => Err((a, b))

            }
        })
        .collect();
        program.replace_commands(commands);
    }

}
