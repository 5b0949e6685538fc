//! pngx - a command-line client for Paperless-NGX
//!
//! Entry point for the pngx CLI application.

use std::io::IsTerminal;

use clap::Parser;
use pngx::{
    cli::Cli,
    error::{ExitCode, StructuredError},
};
use yansi::Paint;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    if cli.no_color || !std::io::stderr().is_terminal() {
        yansi::disable();
    }

    // Run the application logic
    match pngx::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::for_error(&err);

            // Report the error
            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{}", json);
                } else {
                    eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
                }
            } else {
                eprintln!(
                    "[{}] {} {:#}",
                    exit_code.code_prefix(),
                    "Error:".red().bold(),
                    err
                );
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
