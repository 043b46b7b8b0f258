pub mod init;
pub mod langs;
pub mod root;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    /// Make a directory the problems root
    Init(init::Args),

    /// List the configured languages
    Langs(langs::Args),

    /// Print the problems root enclosing the current directory
    Root(root::Args),

    /// Compile, run and verify every solution of a problem
    #[command(alias("t"))]
    Test(test::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Init(args) => init::exec(args, self),
            Langs(args) => langs::exec(args, self),
            Root(args) => root::exec(args, self),
            Test(args) => test::exec(args, self).await,
        }
    }
}
