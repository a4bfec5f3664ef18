//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::model::{AmalgamationPlan, ArtifactPaths, InputFile};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));

/// Configuration layered from embedded defaults and an optional explicit file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub inputs: Inputs,
    #[serde(default)]
    pub outputs: Outputs,
}

/// Ordered input list and the directory it is resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Inputs {
    #[serde(default)]
    base_dir: Option<PathBuf>,
    #[serde(default)]
    files: Option<Vec<String>>,
}

impl Inputs {
    fn default_files() -> Vec<String> {
        vec![
            "vexcore/utils/CoreTemplates.h".into(),
            "vexcore/containers/Tuple.h".into(),
            "vexcore/containers/Union.h".into(),
        ]
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn files(&self) -> Vec<String> {
        self.files.clone().unwrap_or_else(Self::default_files)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Outputs {
    #[serde(default)]
    intermediate: Option<PathBuf>,
    #[serde(default)]
    processed: Option<PathBuf>,
    #[serde(default)]
    keep_intermediate: Option<bool>,
}

impl Outputs {
    fn default_intermediate() -> PathBuf {
        PathBuf::from("containers_monolith.compexp.tmp")
    }

    fn default_processed() -> PathBuf {
        PathBuf::from("containers_monolith.compexp")
    }

    pub fn intermediate(&self) -> PathBuf {
        self.intermediate
            .clone()
            .unwrap_or_else(Self::default_intermediate)
    }

    pub fn processed(&self) -> PathBuf {
        self.processed
            .clone()
            .unwrap_or_else(Self::default_processed)
    }

    pub fn keep_intermediate(&self) -> bool {
        self.keep_intermediate.unwrap_or(true)
    }
}

impl Config {
    /// Load the embedded defaults, overlaid by an explicit file when one is given.
    ///
    /// No other location is consulted, so the configuration of a run depends only on its
    /// arguments. An explicit file that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(explicit_path) = explicit {
            tracing::debug!(path = %explicit_path.display(), "loading config file");
            layers.push(Self::from_file(explicit_path)?);
        }

        Ok(layers.into_iter().reduce(Config::merge).unwrap_or_default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            inputs: merge_inputs(self.inputs, other.inputs),
            outputs: merge_outputs(self.outputs, other.outputs),
        }
    }

    /// Override the directory input subpaths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inputs.base_dir = Some(dir.into());
        self
    }

    pub fn with_keep_intermediate(mut self, keep: bool) -> Self {
        self.outputs.keep_intermediate = Some(keep);
        self
    }

    /// Resolve inputs against the base directory and outputs against `cwd`.
    ///
    /// Without a configured base directory the inputs resolve against the directory holding the
    /// running executable. A relative base directory is taken relative to `cwd`.
    pub fn to_plan(&self, cwd: &Path) -> Result<AmalgamationPlan> {
        let base = match self.inputs.base_dir() {
            Some(dir) => cwd.join(dir),
            None => executable_dir()?,
        };

        let inputs = self
            .inputs
            .files()
            .into_iter()
            .map(|rel| {
                let path = base.join(&rel);
                InputFile::new(rel, path)
            })
            .collect();

        Ok(AmalgamationPlan {
            inputs,
            artifacts: ArtifactPaths {
                intermediate: cwd.join(self.outputs.intermediate()),
                processed: cwd.join(self.outputs.processed()),
            },
            materialize_intermediate: self.outputs.keep_intermediate(),
        })
    }
}

fn merge_inputs(mut base: Inputs, overlay: Inputs) -> Inputs {
    if let Some(dir) = overlay.base_dir {
        base.base_dir = Some(dir);
    }
    // Order is significant, so an overlay list replaces the base list outright.
    if let Some(files) = overlay.files {
        base.files = Some(files);
    }
    base
}

fn merge_outputs(mut base: Outputs, overlay: Outputs) -> Outputs {
    if let Some(value) = overlay.intermediate {
        base.intermediate = Some(value);
    }
    if let Some(value) = overlay.processed {
        base.processed = Some(value);
    }
    if let Some(value) = overlay.keep_intermediate {
        base.keep_intermediate = Some(value);
    }
    base
}

/// Directory containing the running executable, with symlinks resolved.
pub fn executable_dir() -> Result<PathBuf> {
    let exe = env::current_exe().context("failed to locate the running executable")?;
    let exe = fs::canonicalize(&exe)
        .with_context(|| format!("failed to resolve executable path {}", exe.display()))?;
    exe.parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("executable has no parent directory: {}", exe.display()))
}
