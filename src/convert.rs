use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::animation::Animation;
use crate::config::Config;
use crate::export::{write_animation_csv, write_skeleton_csv};
use crate::skeleton::Skeleton;

/// Outcome of a batch over a directory. Failures are collected instead of stopping the batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<(PathBuf, PathBuf)>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub(crate) fn record(&mut self, input: PathBuf, result: Result<PathBuf>) {
        match result {
            Ok(output) => {
                tracing::info!("{:?} -> {:?}", input, output);
                self.converted.push((input, output));
            }
            Err(err) => {
                tracing::error!("{:?} failed: {:#}", input, err);
                self.failed.push((input, err));
            }
        }
    }
}

/// Lists the files directly inside `dir` with the given extension, sorted by name. Hidden files are
/// skipped.
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to list {:?}", dir))?;
        if !entry.file_type().is_file() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let matches = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension));
        if matches {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn write_csv(output: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<usize>) -> Result<usize> {
    let file = File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    match write(&mut writer) {
        Ok(rows) => Ok(rows),
        Err(err) => {
            drop(writer);
            // don't leave a half-written table behind for the importer
            let _ = fs::remove_file(output);
            Err(err)
        }
    }
}

/// Converts dumps to CSV against one skeleton, which is decoded once and shared by every
/// animation.
#[derive(Debug)]
pub struct DumpConverter {
    config: Config,
    skeleton: Skeleton,
}

impl DumpConverter {
    pub fn new(config: Config) -> Result<Self> {
        let data = fs::read(&config.skeleton).with_context(|| format!("Failed to read skeleton {:?}", config.skeleton))?;
        let skeleton = Skeleton::from_bytes(&data, config.skeleton_header)
            .with_context(|| format!("Failed to decode skeleton {:?}", config.skeleton))?;

        tracing::info!(
            "Loaded skeleton '{}': {} bones, {} float slots",
            skeleton.name,
            skeleton.num_bones(),
            skeleton.num_float_slots()
        );

        Ok(Self { config, skeleton })
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn export_skeleton(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", self.config.output_dir))?;

        let output = self.config.skeleton_csv_path();
        let rows = write_csv(&output, |f| write_skeleton_csv(&self.skeleton, f))?;
        tracing::info!("Exported skeleton: {} rows -> {:?}", rows, output);
        Ok(output)
    }

    /// Decodes one animation dump and writes its CSV. The dump is decoded completely before the
    /// output file is created.
    pub fn convert_animation(&self, input: &Path) -> Result<PathBuf> {
        let data = fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
        let animation = Animation::from_bytes(&data).with_context(|| format!("Failed to decode {:?}", input))?;
        tracing::debug!(
            "{:?}: {} frames, {} s, {} transforms, {} floats, {} annotations",
            input,
            animation.num_frames(),
            animation.duration,
            animation.transform_count(),
            animation.float_count(),
            animation.annotations().len()
        );

        fs::create_dir_all(&self.config.output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", self.config.output_dir))?;
        let output = self.config.animation_csv_path(input);
        write_csv(&output, |f| write_animation_csv(&self.skeleton, &animation, f))?;

        Ok(output)
    }

    /// Converts every animation dump in the input directory. A failing file is reported and the
    /// rest are still converted.
    pub fn convert_all(&self) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for input in list_files(&self.config.input_dir, &self.config.extension)? {
            if same_file(&input, &self.config.skeleton) {
                continue;
            }

            let result = self.convert_animation(&input);
            report.record(input, result);
        }

        Ok(report)
    }
}

/// Decodes the skeleton, writes its table, then converts every animation dump.
pub fn run(config: Config) -> Result<BatchReport> {
    let converter = DumpConverter::new(config)?;
    converter.export_skeleton()?;
    converter.convert_all()
}
