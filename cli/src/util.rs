use std::{
    path::{Path, PathBuf},
    process::exit,
};

use chum_core::storage::ProblemsRoot;

pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("Failed to get current dir: {}", e);
        exit(1);
    })
}

pub fn find_problems_root() -> anyhow::Result<ProblemsRoot> {
    Ok(ProblemsRoot::find_in_ancestors(current_dir())?)
}

pub fn replace_homedir_to_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(home_dir) = ::dirs::home_dir() else {
        return path
    };
    path.strip_prefix(home_dir)
        .map(|path| Path::new("~").join(path))
        .unwrap_or(path)
}
