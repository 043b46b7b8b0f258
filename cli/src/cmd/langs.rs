use colored::Colorize as _;

use super::{GlobalArgs, SubcmdResult};
use crate::util;

#[derive(Debug, clap::Args)]
pub struct Args {}

pub fn exec(_args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let root = util::find_problems_root()?;
    let cfg = root.load_config()?;
    let registry = cfg.language_registry()?;

    if registry.is_empty() {
        println!("No languages configured in {:?}", root.config_file());
        return Ok(());
    }

    for lang in registry.iter() {
        println!("{} {}", lang.name().bold(), lang.pattern().as_str().dimmed());
        if let Some(compile) = lang.compile_template() {
            println!("  compile: {}", compile);
        }
        println!("  run:     {}", lang.run_template());
    }
    Ok(())
}
