// src/config.rs

//! Pipeline configuration
//!
//! A configuration is either built in code:
//!
//! ```ignore
//! let config = PipelineConfig::for_task("build", "compileJava")
//!     .with_classpath("build/classes/java/main")
//!     .with_classpath("libs/foo.jar")
//!     .with_transformer("chasm/extra.chasm");
//! ```
//!
//! or loaded from a TOML file:
//!
//! ```toml
//! classpath = ["build/classes", "libs/foo.jar"]
//! transformers = ["extra/patch.chasm"]
//! output_dir = "build/chasm/chasmMain"
//! loose_dir = "chasm-added-files"
//! ```
//!
//! Relative paths in a file resolve against the file's directory.

use crate::error::{Error, Result};
use crate::output::{DEFAULT_LOOSE_DIR, OutputLayout};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the pipeline bound to a host task or source set
///
/// `main` becomes `chasmMain`, `compileJava` becomes `chasmCompileJava`.
pub fn task_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("chasm{}{}", first.to_uppercase(), chars.as_str()),
        None => "chasm".to_string(),
    }
}

/// Everything one pipeline run needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directories and archives to transform, in order
    pub classpath: Vec<PathBuf>,
    /// Transformer scripts registered after all classpath scripts
    pub transformers: Vec<PathBuf>,
    /// Output directory; deleted at the start of every run
    pub output_dir: PathBuf,
    /// Name of the loose output subdirectory
    pub loose_dir: String,
}

/// On-disk form of [`PipelineConfig`]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    classpath: Vec<PathBuf>,
    #[serde(default)]
    transformers: Vec<PathBuf>,
    output_dir: PathBuf,
    loose_dir: Option<String>,
}

impl PipelineConfig {
    /// Create an empty configuration writing to `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            classpath: Vec::new(),
            transformers: Vec::new(),
            output_dir: output_dir.into(),
            loose_dir: DEFAULT_LOOSE_DIR.to_string(),
        }
    }

    /// Configuration for a host task, writing to `<build_dir>/chasm/<task>`
    pub fn for_task(build_dir: impl AsRef<Path>, name: &str) -> Self {
        Self::new(build_dir.as_ref().join("chasm").join(task_name(name)))
    }

    /// Append a classpath element
    pub fn with_classpath(mut self, path: impl Into<PathBuf>) -> Self {
        self.classpath.push(path.into());
        self
    }

    /// Append an explicit transformer script
    pub fn with_transformer(mut self, path: impl Into<PathBuf>) -> Self {
        self.transformers.push(path.into());
        self
    }

    /// Set the loose output subdirectory name
    pub fn with_loose_dir(mut self, name: impl Into<String>) -> Self {
        self.loose_dir = name.into();
        self
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml_str(&content, base)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration TOML, resolving relative paths against `base`
    pub fn from_toml_str(content: &str, base: &Path) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };

        Ok(Self {
            classpath: file.classpath.into_iter().map(resolve).collect(),
            transformers: file.transformers.into_iter().map(resolve).collect(),
            output_dir: resolve(file.output_dir),
            loose_dir: file
                .loose_dir
                .unwrap_or_else(|| DEFAULT_LOOSE_DIR.to_string()),
        })
    }

    /// Output layout described by this configuration
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.output_dir).with_loose_dir_name(&self.loose_dir)
    }

    /// Check the configuration before anything is deleted
    ///
    /// The output directory is removed at the start of a run, so it must
    /// not be, or contain, any input.
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::Config("output directory is not set".to_string()));
        }

        if self.loose_dir.is_empty()
            || self.loose_dir.contains(['/', '\\'])
            || self.loose_dir == "."
            || self.loose_dir == ".."
        {
            return Err(Error::Config(format!(
                "loose directory must be a single path component, got '{}'",
                self.loose_dir
            )));
        }

        let output = comparable(&self.output_dir);
        for input in self.classpath.iter().chain(&self.transformers) {
            if comparable(input).starts_with(&output) {
                return Err(Error::Config(format!(
                    "input {} lies inside output directory {}",
                    input.display(),
                    self.output_dir.display()
                )));
            }
        }

        Ok(())
    }
}

/// Best-effort absolute form of a path for containment checks
fn comparable(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
