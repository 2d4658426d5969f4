use colored::Colorize;
use std::process::{Command, ExitStatus, Stdio};

use crate::DynError;

pub fn ci() -> Result<(), DynError> {
    let tasks = vec![
        ("cargo check on code", vec!["check", "--workspace"]),
        ("cargo check on examples", vec!["check", "--examples"]),
        ("cargo clippy", vec!["clippy", "--workspace", "--", "-D", "warnings"]),
        ("cargo build", vec!["build"]),
        ("cargo build on examples", vec!["build", "--examples"]),
        ("cargo test", vec!["test", "--workspace"]),
        ("cargo test on docs", vec!["test", "--doc"]),
        ("cargo audit", vec!["audit"]),
        ("cargo fmt", vec!["fmt", "--all", "--check"]),
    ];

    run_cargo_tasks(&tasks)
}

pub(crate) fn run_cargo_tasks(tasks: &[(&str, Vec<&str>)]) -> Result<(), DynError> {
    for (name, args) in tasks {
        let mut cmd = cargo_command(args);
        println!(
            "{}{}{}",
            "Running ".truecolor(255, 165, 0),
            name.truecolor(255, 165, 0),
            "...".truecolor(255, 165, 0)
        );
        let status = cmd.status()?;
        print_error_with_status_code(name, status);
        if !status.success() {
            return Err(format!("`{}` failed", name).into());
        }
    }

    Ok(())
}

fn print_error_with_status_code(task: &str, status: ExitStatus) {
    let code = match status.code() {
        Some(x) => x.to_string(),
        None => "<< no status code >>".to_string(),
    };
    if !status.success() {
        println!(
            "{} `{}` finished with a non-zero status code: {}",
            "Error:".red(),
            task.blue(),
            code
        );
    }
}

fn cargo_command(args: &[&str]) -> Command {
    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let mut cmd = Command::new(cargo);
    cmd.current_dir(crate::project_root())
        .args(args)
        .stdout(Stdio::inherit());
    cmd
}
