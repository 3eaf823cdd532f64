use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;

use clap::{App, Arg, ArgMatches};
use itertools::Itertools;
use slog::{o, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use oisc::{
    engine::Engine,
    error::EngineError,
    event::Event,
};

enum Error {
    Engine(EngineError),
    IO(std::io::Error),
    Usage(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IO(e)
    }
}

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Error {
        Error::Engine(e)
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("oiscrun")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility for assembling and executing OISC scripts")
        .arg(Arg::with_name("source")
             .help("File containing the script to execute")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("cycles")
             .help("Number of instructions to execute before stopping")
             .long("cycles")
             .short("n")
             .takes_value(true)
             .default_value("64"))
        .arg(Arg::with_name("pace")
             .help("Delay between instructions, in milliseconds")
             .long("pace")
             .takes_value(true)
             .default_value("0"))
        .arg(Arg::with_name("verbose")
             .help("Trace assembly and execution to the terminal")
             .long("verbose")
             .short("v"))
        .get_matches()
}

fn main() {
    let args = parse_arguments();

    match run(&args) {
        Ok(()) => (),
        Err(Error::IO(err)) => eprintln!("IO error: {}", err),
        Err(Error::Engine(err)) => eprintln!("{}", err),
        Err(Error::Usage(msg)) => eprintln!("{}", msg),
    }
}

fn run(args: &ArgMatches) -> Result<(), Error> {
    let source = std::fs::read_to_string(args.value_of("source").unwrap())?;

    let cycles: usize = args
        .value_of("cycles")
        .unwrap()
        .parse()
        .map_err(|_| Error::Usage("--cycles expects a number".to_string()))?;

    let pace: u64 = args
        .value_of("pace")
        .unwrap()
        .parse()
        .map_err(|_| Error::Usage("--pace expects a number of milliseconds".to_string()))?;

    let logger = if args.is_present("verbose") {
        let decorator = TermDecorator::new().build();
        let drain = FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();

        Some(Logger::root(drain, o!()))
    } else {
        None
    };

    let mut engine = Engine::with_logger(logger);
    engine.set_script(&source)?;
    engine.set_pacing(Duration::from_millis(pace))?;

    let (tx, rx) = mpsc::channel();
    engine.add_listener(move |event: &Event| {
        let _ = tx.send(event.clone());
    });

    engine.run()?;

    let mut waveforms: HashMap<String, String> = HashMap::new();
    let mut executed = 0;

    while executed < cycles {
        match rx.recv() {
            Ok(Event::CaptureUpdate { signals }) => {
                executed += 1;
                waveforms = signals;
            }
            Ok(Event::BreakpointHit { line }) => {
                println!("paused at line {}", line);
            }
            Ok(Event::Halted { error }) => {
                eprintln!("runtime error: {}", error);
                break;
            }
            Ok(_) => (),
            Err(_) => break,
        }
    }

    // A worker that halted on a fault reports the same error from the join;
    // it has been printed already.
    match engine.interrupt() {
        Ok(()) | Err(EngineError::Runtime(_)) => (),
        Err(err) => return Err(Error::Engine(err)),
    }

    for signal in waveforms.keys().sorted() {
        println!("{}", waveforms[signal]);
    }

    Ok(())
}
