use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::skeleton::HeaderPolicy;

fn default_extension() -> String {
    String::from("bin")
}

fn default_converter_output() -> PathBuf {
    PathBuf::from("tmp.hkx")
}

/// External programs that produce the dumps. Only needed when the conversion starts from `.hkx`
/// files instead of existing dumps.
#[derive(Debug, Deserialize, Clone)]
pub struct ToolsConfig {
    /// Havok standalone filter manager used to re-save 64-bit files in the 32-bit layout.
    pub filter_manager: PathBuf,
    /// Filter set passed to the filter manager with `-s`.
    pub filter_options: PathBuf,
    /// File the filter set writes its result to.
    #[serde(default = "default_converter_output")]
    pub converter_output: PathBuf,
    pub dumper: PathBuf,
    pub hkx64_dir: PathBuf,
    pub hkx86_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub skeleton: PathBuf,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub skeleton_header: HeaderPolicy,
    #[serde(default)]
    pub tools: Option<ToolsConfig>,
}

impl Config {
    pub fn new(skeleton: impl Into<PathBuf>, input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            skeleton: skeleton.into(),
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            extension: default_extension(),
            skeleton_header: HeaderPolicy::default(),
            tools: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {:?}", path))?;
        Self::parse(&text).with_context(|| format!("Invalid config {:?}", path))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn skeleton_csv_path(&self) -> PathBuf {
        self.output_dir.join(crate::export::SKELETON_FILE_NAME)
    }

    /// CSV path for an animation dump, named after the dump's file stem.
    pub fn animation_csv_path(&self, input: &Path) -> PathBuf {
        let mut file_name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
        file_name.push(".csv");
        self.output_dir.join(file_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("resources/skeleton.bin", "resources/dumpfiles", "resources/csvfiles")
    }
}
