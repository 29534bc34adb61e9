//! CLI logic for the Trellis diagram tool.
//!
//! Reads an `.er` document from a file or stdin, compiles it to Graphviz
//! dot, and writes the result to a file or stdout. Running the Graphviz
//! binary on the output is left to the caller.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io::Read as _};

use log::info;

use trellis::TrellisError;

/// Run the Trellis CLI application
///
/// # Errors
///
/// Returns `TrellisError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
pub fn run(args: &Args) -> Result<(), TrellisError> {
    let app_config = config::load_config(args.config.as_ref())?;

    let source = match &args.input {
        Some(path) => {
            info!(input_path = path.as_str(); "Reading input file");
            fs::read_to_string(path)?
        }
        None => {
            info!("Reading from stdin");
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let diagram = trellis::parse(&source)?;
    info!(
        tables = diagram.table_count(),
        relations = diagram.relations().len();
        "Parsed diagram"
    );

    let dot = trellis::render_dot(&diagram, &app_config);

    match &args.output {
        Some(path) => {
            fs::write(path, dot)?;
            info!(output_file = path.as_str(); "dot exported successfully");
        }
        None => print!("{dot}"),
    }

    Ok(())
}
