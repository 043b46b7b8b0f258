//! `#{var}` interpolation used by the language registry's argument templates.
//!
//! `##` yields a literal `#`; a `#` not followed by `{` or `#` is kept as-is.

use std::{borrow::Borrow, collections::HashMap, ffi::OsStr, fmt, hash::Hash};

pub type Result<T> = std::result::Result<T, InterpError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterpError {
    #[error("Undefined variable '{0}' at {}", .1+1)]
    UndefinedVar(String, usize),

    #[error("Unclosed brace (found open brace at {})", .0+1)]
    UnclosedBrace(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Variable name and the 0-based char position where the name starts.
    Var(String, usize),
}

/// A parsed template. Parsing up-front lets config loading reject
/// malformed templates before anything is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(fmt: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = fmt.chars().enumerate().peekable();

        while let Some((_, c)) = chars.next() {
            if c != '#' {
                literal.push(c);
                continue;
            }
            match chars.peek() {
                Some(&(_, '#')) => {
                    chars.next();
                    literal.push('#');
                }
                Some(&(pos_open_brace, '{')) => {
                    chars.next();
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, c)) => name.push(c),
                            None => return Err(InterpError::UnclosedBrace(pos_open_brace)),
                        }
                    }
                    segments.push(Segment::Var(name, pos_open_brace + 1));
                }
                _ => literal.push('#'),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: fmt.to_owned(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn var_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            Segment::Var(name, _) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Fails on the first variable missing from `variables`.
    pub fn render<K, V>(&self, variables: &HashMap<K, V>) -> Result<String>
    where
        K: Borrow<str> + Hash + Eq,
        V: AsRef<OsStr>,
    {
        let mut res = String::with_capacity(self.source.len() * 2);
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => res += s,
                Segment::Var(name, pos) => {
                    let Some(value) = variables.get(name.as_str()) else {
                        return Err(InterpError::UndefinedVar(name.clone(), *pos));
                    };
                    res += value.as_ref().to_string_lossy().as_ref();
                }
            }
        }
        Ok(res)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.source)
    }
}

pub fn interp<K, V>(fmt: &str, variables: &HashMap<K, V>) -> Result<String>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<OsStr>,
{
    Template::parse(fmt)?.render(variables)
}

#[cfg(test)]
mod test {
    use super::*;

    fn vars() -> HashMap<&'static str, &'static str> {
        let mut m = HashMap::new();
        m.insert("filePath", "/probs/hello/hello.cpp");
        m.insert("fileStem", "hello");
        m.insert("exePath", "chum_output/hello_cpp");
        m
    }

    #[test]
    fn interp_ok() {
        let vars = vars();
        assert_eq!(interp("g++", &vars).unwrap(), "g++");
        assert_eq!(interp("#{filePath}", &vars).unwrap(), vars["filePath"]);
        assert_eq!(
            interp("-o#{exePath}", &vars).unwrap(),
            "-ochum_output/hello_cpp"
        );
        assert_eq!(
            interp("#{fileStem}#{fileStem}", &vars).unwrap(),
            "hellohello"
        );
        assert_eq!(interp("{fileStem}", &vars).unwrap(), "{fileStem}");
        assert_eq!(interp("# {fileStem}", &vars).unwrap(), "# {fileStem}");
        assert_eq!(interp("##{fileStem}", &vars).unwrap(), "#{fileStem}");
        assert_eq!(interp("#", &vars).unwrap(), "#");
        assert_eq!(interp("##", &vars).unwrap(), "#");
        assert_eq!(interp("###", &vars).unwrap(), "##");
    }

    #[test]
    fn interp_ng() {
        let vars = vars();
        assert_eq!(
            interp("#{binPath} #{fileStem}", &vars).unwrap_err(),
            InterpError::UndefinedVar("binPath".to_owned(), 2)
        );
        assert_eq!(
            Template::parse("#{fileStem} #{exe").unwrap_err(),
            InterpError::UnclosedBrace(13),
        );
    }

    #[test]
    fn var_names_lists_placeholders_in_order() {
        let t = Template::parse("-I#{problemDir}/#{fileStem}.h").unwrap();
        let names: Vec<_> = t.var_names().collect();
        assert_eq!(names, ["problemDir", "fileStem"]);
        assert_eq!(t.to_string(), "-I#{problemDir}/#{fileStem}.h");
    }
}
