use std::process::ExitCode;

fn main() -> ExitCode {
    skyhop_cli::run()
}
