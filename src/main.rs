#[macro_use] extern crate log;

use std::io::{self, Read};
use clap::{App, Arg};
use bf2c::{BrainfuckError, OptimizationLevel, Optimizer, Program};
use bf2c::parser::{parse, parse_file, parse_str};

/// Where the Brainfuck source comes from.
enum Source<'a> {
    File(&'a str),
    Text(&'a str),
    Stdin
}

fn load(source: Source) -> Result<Program, BrainfuckError> {
    match source {
        Source::File(path) => {
            debug!("Opening {}.", path);
            parse_file(path)
        },
        Source::Text(text) => {
            debug!("Parsing source given on the command line.");
            parse_str(text)
        },
        Source::Stdin => {
            debug!("Reading source from stdin.");
            let stdin = io::stdin();
            let mut lock = stdin.lock();
            let mut buf = Vec::new();
            lock.read_to_end(&mut buf)?;
            parse(&*buf)
        }
    }
}

fn main_compile(source: Source, optimizer: &Optimizer, output: Option<&str>, dump: bool) -> Result<(), BrainfuckError> {

    // Parse the source
    let mut program = load(source)?;
    info!("Parsed {} commands.", program.len());

    // Optimize the commands
    optimizer.run(&mut program);
    info!("{} commands after optimization.", program.len());

    if dump {
        eprint!("{}", program);
    }

    // Emit the C source
    match output {
        Some(path) => bf2c::emit_to_path(&program, path)?,
        None => {
            let stdout = io::stdout();
            bf2c::emit(&program, stdout.lock())?;
        }
    }
    debug!("Done.");

    Ok(())

}

fn main() {

    // All the cli options are here
    let matches = App::new("bf2c")
        .version("0.1.0")
        .author("Marco Cameriero")
        .about("A Brainfuck to C transpiler")
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the input file to use. Reads stdin if omitted.")
                .index(1)
        )
        .arg(
            Arg::with_name("text")
                .short("t")
                .long("text")
                .takes_value(true)
                .value_name("CODE")
                .conflicts_with("INPUT")
                .help("Uses the given Brainfuck code instead of an input file")
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .help("Writes the C source to the given file instead of stdout")
        )
        .arg(
            Arg::with_name("opt-level")
                .short("O")
                .long("opt-level")
                .takes_value(true)
                .default_value("default")
                .possible_values(&["none", "default", "medium", "max", "0", "1", "2", "3"])
                .help("Sets the optimization level")
        )
        .arg(
            Arg::with_name("passes")
                .short("p")
                .long("passes")
                .takes_value(true)
                .help("Comma-separated list of optimization passes to run, overrides the optimization level")
        )
        .arg(
            Arg::with_name("dump")
                .long("dump")
                .help("Prints the optimized commands to stderr")
        )
        .arg(
            Arg::with_name("v")
                .short("v")
                .multiple(true)
                .help("Sets the level of verbosity. Repeat to increase.")
        )
        .get_matches();

    // Initialize logger as soon as possible
    let verbosity = match matches.occurrences_of("v") {
        0     => "warn",
        1     => "info",
        2     => "debug",
        3 | _ => "trace"
    };
    env_logger::Builder::from_env(
        env_logger::Env::new()
            .filter_or("BF2C_LOG", format!("bf2c={}", verbosity))
            .write_style_or("BF2C_LOG_STYLE", "auto")
    )
    .init();

    let source = match (matches.value_of("INPUT"), matches.value_of("text")) {
        (Some(path), _) => Source::File(path),
        (None, Some(text)) => Source::Text(text),
        (None, None) => Source::Stdin
    };

    let res = match matches.value_of("passes") {
        Some(passes) => Optimizer::with_passes_str(passes),
        None => matches.value_of("opt-level").unwrap_or("default")
            .parse::<OptimizationLevel>()
            .map(Optimizer::for_level)
    }
    .and_then(|optimizer| {
        main_compile(source, &optimizer, matches.value_of("output"), matches.is_present("dump"))
    });

    if let Err(e) = res {
        error!("{}", e);
        std::process::exit(1);
    }
}
