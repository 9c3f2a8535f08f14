use clap::Parser;
use serde_json::json;
use std::io::{self, Read};
use std::path::Path;
use std::process;
use std::time::Duration;
use tmwork::{
    derive, AutoPlayer, DefinitionLoader, ExecutionEngine, Graph, MachineModel, PlayResult,
    ProgramManager, Step, TuringMachineError, MAX_EXECUTION_STEPS,
};
use tracing::Level;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  tmwork-cli -p demos/even-as.yaml -i aaaa
  tmwork-cli --example \"a^n b^n\" -i aabb --debug
  cat demos/simple.yaml | tmwork-cli -i a --graph")]
struct Cli {
    /// The machine definition file to execute (.yaml, .tm or .json).
    /// Can also pipe the definition via stdin.
    #[clap(short, long)]
    program: Option<String>,

    /// Run a built-in example instead of a file
    #[clap(short, long, conflicts_with = "program")]
    example: Option<String>,

    /// The input written to the tape. Defaults to the example's suggested input.
    #[clap(short, long)]
    input: Option<String>,

    /// Print each step of the execution
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print the state graph in DOT format, highlighting the final state
    #[clap(long)]
    graph: bool,

    /// Print the final configuration and outcome as JSON
    #[clap(long, conflicts_with = "graph")]
    json: bool,

    /// Step automatically with this delay between steps
    #[clap(long)]
    interval_ms: Option<u64>,

    /// Give up after this many steps
    #[clap(long, default_value_t = MAX_EXECUTION_STEPS)]
    max_steps: usize,

    /// List the built-in examples and exit
    #[clap(short, long)]
    list: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.list {
        for (index, name) in ProgramManager::names().iter().enumerate() {
            let input = ProgramManager::get_by_index(index)
                .map(|example| example.input)
                .unwrap_or_default();
            println!("{:>2}. {} (input: {})", index, name, input);
        }
        return;
    }

    let (model, suggested_input) = match load_model(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            if cli.graph {
                println!("{}", Graph::error(e.to_string()));
            }
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let input = cli.input.clone().unwrap_or(suggested_input);
    let mut engine = ExecutionEngine::new(model);
    engine.reset(&input);

    if cli.debug {
        print_configuration(&engine);
    }

    let finished = match cli.interval_ms {
        Some(interval) => {
            let player =
                AutoPlayer::new(Duration::from_millis(interval)).with_max_steps(cli.max_steps);
            let result = player.play(&mut engine, |engine| {
                if cli.debug {
                    print_configuration(engine);
                }
            });
            result != PlayResult::StepLimit
        }
        None => run(&mut engine, cli.max_steps, cli.debug),
    };

    if cli.json {
        let summary = json!({
            "outcome": engine.outcome(),
            "state": engine.snapshot(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if cli.graph {
        println!("{}", derive(engine.model(), Some(engine.current())));
        return;
    }

    if cli.debug {
        println!();
        for entry in engine.trace() {
            println!("{}", entry);
        }
    }

    match engine.outcome() {
        Some(outcome) => println!("\nMachine halted: {}", outcome),
        None if !finished => println!("\nStopped after {} steps.", engine.step_count()),
        None => println!("\nMachine is still running."),
    }
    println!("{}", engine.tape_string());
}

/// Loads the definition from a file, a built-in example, stdin, or the first example.
///
/// Returns the model and the input to use when none is given.
fn load_model(cli: &Cli) -> Result<(MachineModel, String), TuringMachineError> {
    if let Some(path) = &cli.program {
        DefinitionLoader::load_file(Path::new(path)).map(|model| (model, String::new()))
    } else if let Some(name) = &cli.example {
        ProgramManager::get_by_name(name)
            .map(|example| (example.model.clone(), example.input.to_string()))
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read from stdin: {}", e))
        })?;

        let model = if buffer.trim_start().starts_with('{') {
            DefinitionLoader::load_json(&buffer)?
        } else {
            DefinitionLoader::load_str(&buffer)?
        };
        Ok((model, String::new()))
    } else {
        ProgramManager::get_by_index(0)
            .map(|example| (example.model.clone(), example.input.to_string()))
    }
}

/// Steps the engine until it halts or `max_steps` steps have run.
///
/// Returns `false` if the step limit was reached first.
fn run(engine: &mut ExecutionEngine, max_steps: usize, debug: bool) -> bool {
    if !debug {
        return matches!(engine.run_with_limit(max_steps), Step::Halt(_));
    }

    for _ in 0..max_steps {
        let step = engine.step();
        print_configuration(engine);
        if let Step::Halt(_) = step {
            return true;
        }
    }

    false
}

fn print_configuration(engine: &ExecutionEngine) {
    println!(
        "Step: {}, State: {}, Tape: [{}], Head: {}",
        engine.step_count(),
        engine.current(),
        engine.tape_string(),
        engine.head()
    );
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}
