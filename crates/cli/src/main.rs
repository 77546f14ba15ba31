use std::process::ExitCode;

fn main() -> ExitCode {
    blindquote_cli::run()
}
