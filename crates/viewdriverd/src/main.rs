//! Entrypoint for the view driver server.

use std::process::ExitCode;

fn main() -> ExitCode {
    match viewdriverd::run_server() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("viewdriverd: {error}");
            ExitCode::FAILURE
        }
    }
}
