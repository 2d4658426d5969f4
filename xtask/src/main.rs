use std::env;

use xtask::{
    tasks::{ci::ci, distribute::dist, e2e::e2e},
    DynError,
};

const TASKS: &[(&str, &str)] = &[
    (
        "ci",
        "check, lint, test and format-check the workspace before pushing",
    ),
    (
        "e2e",
        "run the ignored tests against a MongoDB server that requires TLS",
    ),
    (
        "dist",
        "stage a stripped mongo-tls-client next to an empty truststore/ directory",
    ),
];

fn main() {
    if let Err(e) = try_main() {
        eprintln!("{}", e);
        std::process::exit(-1);
    }
}

fn try_main() -> Result<(), DynError> {
    match env::args().nth(1).as_deref() {
        Some("ci") => ci(),
        Some("e2e") => e2e(),
        Some("dist") => dist(),
        None | Some("help") => {
            print_help();
            Ok(())
        }
        Some(other) => {
            print_help();
            Err(format!("Unknown task `{}`", other).into())
        }
    }
}

fn print_help() {
    eprintln!("Usage: cargo xtask <task>\n\nTasks for the mongo_tls_client workspace:");
    for (name, description) in TASKS {
        eprintln!("  {:<8}{}", name, description);
    }
}
