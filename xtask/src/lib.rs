use std::path::{Path, PathBuf};

pub mod tasks {
    pub mod ci;
    pub mod distribute;
    pub mod e2e;
}

pub type DynError = Box<dyn std::error::Error>;

pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

pub fn dist_dir() -> PathBuf {
    project_root().join("target/dist")
}
