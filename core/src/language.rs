use std::{
    collections::HashMap,
    ffi::OsStr,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::serdable::GlobPattern;
use crate::str_interp::{InterpError, Template};
use crate::testing::command::{CommandLine, ExecutionCommand};

/// One `[[language]]` entry of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub name: String,
    pub pattern: GlobPattern,
    #[serde(default)]
    pub compile: Option<Vec<String>>,
    pub run: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LanguageError {
    #[error("language '{lang}': invalid template '{template}': {source}")]
    InvalidTemplate {
        lang: String,
        template: String,
        source: InterpError,
    },

    #[error("language '{lang}': unknown variable '#{{{var}}}' (available: {})", VARIABLES.join(", "))]
    UnknownVar { lang: String, var: String },

    #[error("language '{0}': `run` must contain at least the program")]
    EmptyRun(String),

    #[error("language '{0}': `compile` must contain at least the program when given")]
    EmptyCompile(String),

    #[error("language '{0}' is defined more than once")]
    Duplicated(String),
}

/// Variables usable inside `compile` and `run` templates.
pub const VARIABLES: &[&str] = &[
    "filePath",
    "fileName",
    "fileStem",
    "fileExt",
    "fileDir",
    "exePath",
    "problemDir",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct ArgvTemplate {
    program: Template,
    args: Vec<Template>,
}

impl ArgvTemplate {
    fn render(&self, vars: &HashMap<&'static str, &OsStr>) -> Result<CommandLine, InterpError> {
        let program = self.program.render(vars)?;
        let args = self
            .args
            .iter()
            .map(|t| t.render(vars))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CommandLine::new(program, args))
    }

    fn source_text(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(Template::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    name: String,
    pattern: GlobPattern,
    compile: Option<ArgvTemplate>,
    run: ArgvTemplate,
}

/// The pieces a language needs to know about one source file.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    pub source: &'a Path,
    pub exe_path: &'a Path,
    pub problem_dir: &'a Path,
}

/// Compile step (if any) and the command that runs the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCommands {
    pub compile: Option<CommandLine>,
    pub run: ExecutionCommand,
}

impl Language {
    pub fn from_config(cfg: &LanguageConfig) -> Result<Self, LanguageError> {
        let lang = &cfg.name;
        let parse_all = |templates: &[String]| -> Result<Vec<Template>, LanguageError> {
            templates
                .iter()
                .map(|s| {
                    let t = Template::parse(s).map_err(|source| LanguageError::InvalidTemplate {
                        lang: lang.clone(),
                        template: s.clone(),
                        source,
                    })?;
                    if let Some(var) = t.var_names().find(|v| !VARIABLES.contains(v)) {
                        return Err(LanguageError::UnknownVar {
                            lang: lang.clone(),
                            var: var.to_owned(),
                        });
                    }
                    Ok(t)
                })
                .collect()
        };

        let split = |mut templates: Vec<Template>| {
            if templates.is_empty() {
                return None;
            }
            let program = templates.remove(0);
            Some(ArgvTemplate {
                program,
                args: templates,
            })
        };

        let compile = match cfg.compile.as_deref() {
            None => None,
            Some(c) => Some(
                split(parse_all(c)?).ok_or_else(|| LanguageError::EmptyCompile(lang.clone()))?,
            ),
        };
        let run = split(parse_all(&cfg.run)?).ok_or_else(|| LanguageError::EmptyRun(lang.clone()))?;

        Ok(Self {
            name: cfg.name.clone(),
            pattern: cfg.pattern.clone(),
            compile,
            run,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &GlobPattern {
        &self.pattern
    }

    pub fn needs_compile(&self) -> bool {
        self.compile.is_some()
    }

    pub fn compile_template(&self) -> Option<String> {
        self.compile.as_ref().map(ArgvTemplate::source_text)
    }

    pub fn run_template(&self) -> String {
        self.run.source_text()
    }

    pub fn commands(&self, ctx: CommandContext) -> Result<LanguageCommands, InterpError> {
        let vars = make_vars(&ctx);
        let compile = self
            .compile
            .as_ref()
            .map(|argv| argv.render(&vars))
            .transpose()?;
        let run = ExecutionCommand::new(ctx.source, self.run.render(&vars)?);
        Ok(LanguageCommands { compile, run })
    }
}

fn make_vars<'a>(ctx: &CommandContext<'a>) -> HashMap<&'static str, &'a OsStr> {
    let source = ctx.source;
    let mut m: HashMap<_, &OsStr> = HashMap::new();
    m.insert("filePath", source.as_os_str());
    m.insert(
        "fileName",
        source.file_name().unwrap_or(OsStr::new("UNDEFINED_FILE_NAME")),
    );
    m.insert(
        "fileDir",
        source.parent().unwrap_or(Path::new(".")).as_os_str(),
    );
    m.insert(
        "fileStem",
        source.file_stem().unwrap_or(OsStr::new("UNDEFINED_FILE_STEM")),
    );
    m.insert(
        "fileExt",
        source
            .extension()
            .unwrap_or(OsStr::new("UNDEFINED_FILE_EXTENSION")),
    );
    m.insert("exePath", ctx.exe_path.as_os_str());
    m.insert("problemDir", ctx.problem_dir.as_os_str());
    m
}

/// Maps file names to languages. The first registered pattern that matches wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageRegistry {
    languages: Vec<Language>,
}

impl LanguageRegistry {
    pub fn from_configs(configs: &[LanguageConfig]) -> Result<Self, LanguageError> {
        let mut languages: Vec<Language> = Vec::with_capacity(configs.len());
        for cfg in configs {
            if languages.iter().any(|l| l.name == cfg.name) {
                return Err(LanguageError::Duplicated(cfg.name.clone()));
            }
            languages.push(Language::from_config(cfg)?);
        }
        Ok(Self { languages })
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Language> {
        self.languages.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.name == name)
    }

    pub fn find_for_filename(&self, filename: impl AsRef<str>) -> Option<&Language> {
        let filename = filename.as_ref();
        self.languages
            .iter()
            .find(|l| l.pattern.matches(filename))
    }

    pub fn find_for_path(&self, path: impl AsRef<Path>) -> Option<&Language> {
        let filename = path.as_ref().file_name()?.to_string_lossy();
        self.find_for_filename(filename)
    }
}

/// `<stem>_<ext>`, the name compiled executables and outputs are derived from.
pub fn artifact_basename(source: &Path) -> PathBuf {
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    match source.extension() {
        Some(ext) => format!("{}_{}", stem, ext.to_string_lossy()).into(),
        None => stem.into_owned().into(),
    }
}
