use crate::util;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {}

pub fn exec(_args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    let root = util::find_problems_root()?;
    let dir = root.dir().canonicalize()?;
    println!("{}", util::replace_homedir_to_tilde(dir).to_string_lossy());
    Ok(())
}
