//! Terraplot CLI — evaluate map-plotting expressions.
//!
//! Reads one expression per line, either from `-e` or from a script file,
//! and prints each result. Variables persist for the length of the run,
//! so a script can build state line by line. Geometry-valued results can
//! be printed as canonical text (WKT), or as GeoJSON with `--format`.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use terraplot_core::{
    evaluate, parse_expression, CharStream, FunctionRegistry, Value, Variables,
};

mod builtins;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// How geometry-valued results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Wkt,
    GeoJson,
}

fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_lowercase().as_str() {
        "text" => Ok(OutputFormat::Text),
        "wkt" => Ok(OutputFormat::Wkt),
        "geojson" => Ok(OutputFormat::GeoJson),
        _ => Err(format!(
            "unknown format \"{s}\": expected \"text\", \"wkt\" or \"geojson\""
        )),
    }
}

#[derive(Parser)]
#[command(version, about = "Terraplot \u{2014} map-plotting expression engine")]
struct Cli {
    /// Script file with one expression per line (`#` starts a comment)
    file: Option<PathBuf>,

    /// Evaluate a single expression instead of reading a file
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Output form for geometry-valued results
    #[arg(long, default_value = "text", value_parser = parse_output_format)]
    format: OutputFormat,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();

    let (source_name, source) = read_source(&cli);

    let mut registry = FunctionRegistry::new();
    builtins::register(&mut registry);
    let mut vars = Variables::new();

    for (idx, line) in source.lines().enumerate() {
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        let line_number = (idx + 1) as u32;
        match run_line(text, &source_name, line_number, &registry, &mut vars, cli.format) {
            Ok(output) => println!("{output}"),
            Err(message) => {
                eprintln!("Error: {message}");
                process::exit(1);
            }
        }
    }
}

fn read_source(cli: &Cli) -> (String, String) {
    if let Some(ref expr) = cli.eval {
        return ("<eval>".to_owned(), expr.clone());
    }
    if let Some(ref file) = cli.file {
        match fs::read_to_string(file) {
            Ok(s) => return (file.display().to_string(), s),
            Err(e) => {
                eprintln!("Error reading {}: {e}", file.display());
                process::exit(1);
            }
        }
    }
    eprintln!("No input file or expression specified");
    process::exit(1);
}

/// Parse and evaluate one line, rendering the result per `format`.
fn run_line(
    text: &str,
    source_name: &str,
    line_number: u32,
    registry: &FunctionRegistry,
    vars: &mut Variables,
    format: OutputFormat,
) -> Result<String, String> {
    let mut stream = CharStream::with_position(text, source_name, line_number);
    let expr = parse_expression(&mut stream, registry).map_err(|e| e.to_string())?;
    stream.skip_space();
    if !stream.is_eof() {
        return Err(format!(
            "{}: unexpected characters after expression",
            stream.pos()
        ));
    }
    let value =
        evaluate(&expr, vars).map_err(|e| format!("{source_name}:{line_number}: {e}"))?;
    Ok(render(&value, format))
}

/// Geometry values honor `--format`; everything else prints canonically.
fn render(value: &Value, format: OutputFormat) -> String {
    match (value, format) {
        (Value::Geometry(g), OutputFormat::GeoJson) => g.to_geojson(),
        (Value::Geometry(g), OutputFormat::Wkt) => g.to_wkt(),
        _ => value.to_text(),
    }
}
