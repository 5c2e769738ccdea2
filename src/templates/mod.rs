//! Page templates.
//!
//! Every `*.html` file of the template directory is parsed once at startup;
//! the file stem is the page name. A parse error anywhere is fatal. The
//! parsed set is immutable and shared read-only by all requests.

pub mod parse;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use self::parse::{ParseError, Segment};

/// Errors raised while loading the template set.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("cannot read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse template {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },

    #[error("required template {0:?} is missing")]
    Missing(String),
}

/// Errors raised while rendering a page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("unknown template {0:?}")]
    UnknownTemplate(String),

    #[error("template {page:?} references undefined variable {name:?}")]
    MissingVariable { page: String, name: String },
}

/// Values available to a template.
#[derive(Debug, Clone, Default)]
pub struct Context {
    values: BTreeMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// The parsed templates, keyed by page name.
#[derive(Debug, Default)]
pub struct TemplateSet {
    pages: BTreeMap<String, Vec<Segment>>,
}

impl TemplateSet {
    /// Parse every `*.html` file in `dir`.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let io_err = |source| TemplateError::Io { path: dir.to_path_buf(), source };
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
            .collect();
        paths.sort();

        let mut set = Self::default();
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let source = fs::read_to_string(&path)
                .map_err(|source| TemplateError::Io { path: path.clone(), source })?;
            set.add(name, &source)?;
        }

        tracing::debug!(dir = %dir.display(), pages = set.pages.len(), "Templates loaded");
        Ok(set)
    }

    /// Parse and register one template from source text.
    pub fn add(&mut self, name: impl Into<String>, source: &str) -> Result<(), TemplateError> {
        let name = name.into();
        let segments = parse::parse(source)
            .map_err(|source| TemplateError::Parse { name: name.clone(), source })?;
        self.pages.insert(name, segments);
        Ok(())
    }

    /// Fail unless every page in `names` is present.
    pub fn require(&self, names: &[&str]) -> Result<(), TemplateError> {
        match names.iter().find(|n| !self.pages.contains_key(**n)) {
            Some(missing) => Err(TemplateError::Missing(missing.to_string())),
            None => Ok(()),
        }
    }

    pub fn render(&self, page: &str, context: &Context) -> Result<String, RenderError> {
        let segments = self
            .pages
            .get(page)
            .ok_or_else(|| RenderError::UnknownTemplate(page.to_string()))?;

        let mut out = String::new();
        for segment in segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Var { name, escape } => {
                    let value = context.get(name).ok_or_else(|| RenderError::MissingVariable {
                        page: page.to_string(),
                        name: name.clone(),
                    })?;
                    if *escape {
                        escape_html(&mut out, value);
                    } else {
                        out.push_str(value);
                    }
                }
            }
        }
        Ok(out)
    }
}

fn escape_html(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
