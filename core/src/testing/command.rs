use std::{
    borrow::Cow,
    fmt,
    path::{Path, PathBuf},
};

/// A program and its arguments. Never goes through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn to_tokio_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Quotes every token that a POSIX shell (or `hyperfine --shell=none`) would split or expand.
impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// ```
/// use chum_core::testing::command::quote;
///
/// assert_eq!(quote("chum_output/hello_cpp"), "chum_output/hello_cpp");
/// assert_eq!(quote("my file.py"), "'my file.py'");
/// assert_eq!(quote("it's"), r#"'it'"'"'s'"#);
/// assert_eq!(quote(""), "''");
/// ```
pub fn quote(token: &str) -> Cow<'_, str> {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c);
    if !token.is_empty() && token.chars().all(is_safe) {
        return Cow::Borrowed(token);
    }
    // terminate '  ->  enclose ' with "  ->  restart '
    Cow::Owned(format!("'{}'", token.replace('\'', r#"'"'"'"#)))
}

/// How to run one source candidate. Built once after a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionCommand {
    source: PathBuf,
    cmdline: CommandLine,
}

impl ExecutionCommand {
    pub fn new(source: impl Into<PathBuf>, cmdline: CommandLine) -> Self {
        Self {
            source: source.into(),
            cmdline,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn command_line(&self) -> &CommandLine {
        &self.cmdline
    }

    pub fn bind(&self, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> BoundCommand {
        BoundCommand {
            command: self.clone(),
            input: input.into(),
            output: output.into(),
        }
    }
}

/// An [`ExecutionCommand`] with stdin and stdout redirected to files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundCommand {
    command: ExecutionCommand,
    input: PathBuf,
    output: PathBuf,
}

impl BoundCommand {
    pub fn command(&self) -> &ExecutionCommand {
        &self.command
    }

    pub fn command_line(&self) -> &CommandLine {
        self.command.command_line()
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl fmt::Display for BoundCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} < {} > {}",
            self.command.cmdline,
            quote(&self.input.to_string_lossy()),
            quote(&self.output.to_string_lossy()),
        )
    }
}
