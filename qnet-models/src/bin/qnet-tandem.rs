use std::process::ExitCode;

use qnet_models::cli::{run, ModelKind};

fn main() -> ExitCode {
    run(ModelKind::Tandem)
}
