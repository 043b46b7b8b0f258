use chum_core::{action, print_success, storage::InitStatus};
use std::path::PathBuf;

use super::{GlobalArgs, SubcmdResult};
use crate::util;

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(default_value = "./")]
    dir: PathBuf,
}

pub fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let (root, status) = action::init_problems_root(&args.dir)?;
    let shown = util::replace_homedir_to_tilde(root.config_file());
    match status {
        InitStatus::Created => {
            print_success!(
                "Successfully initialized problems root. (config: {})",
                shown.to_string_lossy()
            );
        }
        InitStatus::AlreadyInitialized => {
            print_success!(
                "Problems root is already initialized. (config: {})",
                shown.to_string_lossy()
            );
        }
    }
    Ok(())
}
