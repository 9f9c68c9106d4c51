use clap::{Parser, ValueEnum};
use shaclex::Warning;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    /// SHACL Turtle in, ShExC out
    #[value(name = "shacl2shex")]
    ShaclToShex,
    /// ShExC in, SHACL Turtle out
    #[value(name = "shex2shacl")]
    ShexToShacl,
}

impl Direction {
    fn extensions(self) -> (&'static str, &'static str) {
        match self {
            Direction::ShaclToShex => ("ttl", "shex"),
            Direction::ShexToShacl => ("shex", "ttl"),
        }
    }
}

#[derive(Parser)]
struct ConvertArgs {
    /// Path to the input schema file
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Path to the output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Conversion direction
    #[arg(short, long, value_enum)]
    direction: Direction,
}

#[derive(Parser)]
struct BatchArgs {
    /// Directory containing the input schemas
    #[arg(long, value_name = "DIR")]
    input_dir: PathBuf,

    /// Directory to write the converted schemas to
    #[arg(long, value_name = "DIR")]
    output_dir: PathBuf,

    /// Conversion direction
    #[arg(short, long, value_enum)]
    direction: Direction,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Convert a single schema file
    Convert(ConvertArgs),
    /// Convert every matching schema in a directory
    Batch(BatchArgs),
}

fn convert_text(text: &str, direction: Direction) -> Result<String, Box<dyn std::error::Error>> {
    let (output, warnings) = match direction {
        Direction::ShaclToShex => shaclex::translate_shacl_to_shex(text)?,
        Direction::ShexToShacl => shaclex::translate_shex_to_shacl(text)?,
    };
    report_warnings(&warnings);
    Ok(output)
}

fn report_warnings(warnings: &[Warning]) {
    for warning in warnings {
        eprintln!("warning: {}", warning);
    }
}

fn convert_file(
    input: &Path,
    output: Option<&Path>,
    direction: Direction,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(input)
        .map_err(|e| format!("cannot read {}: {}", input.display(), e))?;
    let converted = convert_text(&text, direction)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, converted)?;
        }
        None => print!("{}", converted),
    }
    Ok(())
}

fn convert_batch(args: &BatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (ext_in, ext_out) = args.direction.extensions();
    fs::create_dir_all(&args.output_dir)?;

    let mut inputs: Vec<PathBuf> = WalkDir::new(&args.input_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().map_or(false, |ext| ext == ext_in)
        })
        .map(|entry| entry.into_path())
        .collect();
    inputs.sort();

    let mut ok = 0usize;
    let mut failed = 0usize;
    for input in inputs {
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = args
            .output_dir
            .join(&file_name)
            .with_extension(ext_out);
        match convert_file(&input, Some(&output), args.direction) {
            Ok(()) => {
                println!("  OK   {} -> {}", file_name, output.display());
                ok += 1;
            }
            Err(e) => {
                println!("  FAIL {}: {}", file_name, e);
                failed += 1;
            }
        }
    }
    println!("\nConverted {} files, {} failed", ok, failed);
    if failed > 0 {
        return Err(format!("{} conversions failed", failed).into());
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert(args) => {
            convert_file(&args.input, args.output.as_deref(), args.direction)
        }
        Commands::Batch(args) => convert_batch(&args),
    }
}
