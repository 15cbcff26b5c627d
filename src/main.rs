use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use movcpu::assembler::{self, default_program};
use movcpu::config::{ImageFormat, RunConfig};
use movcpu::instruction::disassemble;
use movcpu::{Engine, ProgramData, Result};

#[derive(Parser)]
#[command(name = "movcpu", about = "MOV-only computer: one instruction, 100 cells")]
struct Cli {
    /// JSON run configuration; flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log every executed step to stderr.
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program image or `.mov` source until it halts.
    Run {
        program: PathBuf,

        /// Values fed into INP, comma separated.
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        input: Vec<i32>,

        /// Max steps before stopping.
        #[arg(long)]
        step_limit: Option<usize>,
    },
    /// Assemble `.mov` source into a program image.
    Asm {
        source: PathBuf,

        #[arg(long, value_enum)]
        format: Option<ImageFormat>,
    },
    /// Print the disassembly of a program image or source file.
    Disasm { program: PathBuf },
    /// Print the default program image.
    Default {
        #[arg(long, value_enum)]
        format: Option<ImageFormat>,
    },
    /// Run a random program.
    Fuzz {
        /// Random seed for reproducibility.
        #[arg(long)]
        seed: u64,

        #[arg(long)]
        step_limit: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.trace { "trace" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dispatch(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let mut config = match cli.config {
        Some(ref path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };

    match cli.command {
        Command::Run {
            program,
            input,
            step_limit,
        } => {
            if !input.is_empty() {
                config.inputs = input;
            }
            if let Some(limit) = step_limit {
                config.step_limit = limit;
            }
            let data = read_program(&program)?;
            run(&data, &config);
        }
        Command::Asm { source, format } => {
            let text = std::fs::read_to_string(&source)?;
            let data = ProgramData::from_assembler(&assembler::parse(&text)?)?;
            print_image(&data, format.unwrap_or(config.format))?;
        }
        Command::Disasm { program } => {
            let data = read_program(&program)?;
            print!("{}", disassemble(&data.to_cells()));
        }
        Command::Default { format } => {
            let data = ProgramData::from_assembler(&default_program())?;
            print_image(&data, format.unwrap_or(config.format))?;
        }
        Command::Fuzz { seed, step_limit } => {
            if let Some(limit) = step_limit {
                config.step_limit = limit;
            }
            let mut rng = SmallRng::seed_from_u64(seed);
            let data = ProgramData::random(&mut rng);
            eprint!("{}", disassemble(&data.to_cells()));
            run(&data, &config);
        }
    }
    Ok(())
}

/// Load a program: `.mov` files are assembled, anything else is read as a
/// stored image.
fn read_program(path: &Path) -> Result<ProgramData> {
    let text = std::fs::read_to_string(path)?;
    if path.extension().is_some_and(|ext| ext == "mov") {
        ProgramData::from_assembler(&assembler::parse(&text)?)
    } else {
        ProgramData::parse_image(&text)
    }
}

fn run(data: &ProgramData, config: &RunConfig) {
    let mut engine = Engine::new();
    engine.update_program_data(data);
    let report = engine.run_with_inputs(&config.inputs, config.step_limit);

    for value in &report.outputs {
        println!("{value}");
    }
    info!(steps = report.steps, halted = report.halted, "run finished");
    if !report.halted {
        eprintln!("stopped after {} steps without halting", report.steps);
    }
}

fn print_image(data: &ProgramData, format: ImageFormat) -> Result<()> {
    match format {
        ImageFormat::Text => print!("{data}"),
        ImageFormat::Json => println!("{}", serde_json::to_string(data)?),
    }
    Ok(())
}
