//! svg-validate
//!
//! Usage:
//!   svg-validate <FILE>
//!
//! Exits 0 silently when FILE is well-formed XML with a document element,
//! 1 with an `ERROR:` report otherwise.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use svgprim::{ValidationError, validate_path};

#[derive(Parser)]
#[command(name = "svg-validate")]
#[command(about = "Check that an SVG file parses and has a root element")]
struct Cli {
    /// SVG file to validate
    file: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures; usage errors exit 1, not clap's 2.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    if let Err(e) = validate_path(&cli.file) {
        match &e {
            ValidationError::Read(_) | ValidationError::MissingRoot => eprintln!("ERROR: {e}"),
            ValidationError::Parse(detail) => {
                eprintln!("ERROR: SVG validation failed");
                eprintln!("Error: {detail}");
            }
        }
        eprintln!("File: {}", cli.file.display());
        process::exit(1);
    }
}
