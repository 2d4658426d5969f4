use std::{
    env, fs,
    process::{Command, Stdio},
};

use crate::{dist_dir, project_root, DynError};

const BINARY_NAME: &str = "mongo-tls-client";

pub fn dist() -> Result<(), DynError> {
    let _ = fs::remove_dir_all(dist_dir());
    fs::create_dir_all(dist_dir())?;

    dist_binary()?;

    Ok(())
}

pub fn dist_binary() -> Result<(), DynError> {
    // Get the `cargo` command and then build the release
    let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let status = Command::new(cargo)
        .current_dir(project_root())
        .args(["build", "--release", "--package", "mongo_tls_client"])
        .status()?;

    if !status.success() {
        return Err("cargo build failed".into());
    }

    // Set file paths based on the architecture
    #[allow(unused_mut)]
    let mut distributable = project_root().join("target/release").join(BINARY_NAME);

    #[allow(unused_mut)]
    let mut destination = dist_dir().join(BINARY_NAME);

    #[cfg(windows)]
    distributable.set_extension("exe");
    #[cfg(windows)]
    destination.set_extension("exe");

    // Copy the binary
    fs::copy(&distributable, &destination)?;

    // The binary reads its trust store relative to the working directory
    fs::create_dir(dist_dir().join("truststore"))?;

    // Strip the binary
    if Command::new("strip")
        .arg("--version")
        .stdout(Stdio::null())
        .status()
        .is_ok()
    {
        eprintln!("stripping the binary");
        let status = Command::new("strip").arg(&destination).status()?;
        if !status.success() {
            return Err("strip failed".into());
        }
    } else {
        eprintln!("No `strip` utility found");
    }

    Ok(())
}
