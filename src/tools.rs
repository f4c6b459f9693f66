//! Adapters for the external programs that turn `.hkx` files into dumps.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::config::ToolsConfig;
use crate::convert::{list_files, BatchReport};

const HKX_EXTENSION: &str = "hkx";
const DUMP_EXTENSION: &str = "bin";

fn require(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("Missing {} {:?}", what, path);
    }

    Ok(())
}

fn run_tool(command: &mut Command) -> Result<()> {
    let status = command
        .status()
        .with_context(|| format!("Failed to start {:?}", command.get_program()))?;
    if !status.success() {
        bail!("{:?} exited with {}", command.get_program(), status);
    }

    Ok(())
}

fn filter_to_hkx86(tools: &ToolsConfig, input: &Path, output: &Path) -> Result<PathBuf> {
    run_tool(Command::new(&tools.filter_manager).arg("-s").arg(&tools.filter_options).arg(input))?;
    fs::rename(&tools.converter_output, output)
        .with_context(|| format!("Failed to move {:?} to {:?}", tools.converter_output, output))?;
    Ok(output.to_path_buf())
}

/// Re-saves every `.hkx` in `hkx64_dir` into `hkx86_dir` with the filter manager. Files the filter
/// manager rejects are copied unchanged, since they are usually in the 32-bit layout already.
pub fn convert_hkx64_to_hkx86(tools: &ToolsConfig) -> Result<BatchReport> {
    require(&tools.filter_manager, "filter manager")?;
    require(&tools.filter_options, "filter options")?;
    fs::create_dir_all(&tools.hkx86_dir).with_context(|| format!("Failed to create {:?}", tools.hkx86_dir))?;

    let mut report = BatchReport::default();
    for input in list_files(&tools.hkx64_dir, HKX_EXTENSION)? {
        let Some(file_name) = input.file_name() else { continue };
        let output = tools.hkx86_dir.join(file_name);

        let result = filter_to_hkx86(tools, &input, &output).or_else(|err| {
            tracing::warn!("{:?}: {:#}; copying unchanged", input, err);
            fs::copy(&input, &output)
                .with_context(|| format!("Failed to copy {:?} to {:?}", input, output))
                .map(|_| output.clone())
        });
        report.record(input, result);
    }

    Ok(report)
}

/// Runs the dumper over every `.hkx` in `hkx86_dir`, writing `<stem>.bin` files to `dump_dir`.
pub fn dump_hkx86(tools: &ToolsConfig, dump_dir: &Path) -> Result<BatchReport> {
    require(&tools.dumper, "dumper")?;
    fs::create_dir_all(dump_dir).with_context(|| format!("Failed to create {:?}", dump_dir))?;

    let mut report = BatchReport::default();
    for input in list_files(&tools.hkx86_dir, HKX_EXTENSION)? {
        let output = dump_dir.join(input.with_extension(DUMP_EXTENSION).file_name().unwrap_or_default());
        let result = run_tool(Command::new(&tools.dumper).arg("-o").arg(&output).arg(&input)).map(|()| output);
        report.record(input, result);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tools(dir: &Path, program: &str) -> ToolsConfig {
        ToolsConfig {
            filter_manager: PathBuf::from(program),
            filter_options: dir.join("filter.hko"),
            converter_output: dir.join("tmp.hkx"),
            dumper: PathBuf::from(program),
            hkx64_dir: dir.join("hkx64"),
            hkx86_dir: dir.join("hkx86"),
        }
    }

    #[test]
    fn missing_tool_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let tools = tools(dir.path(), "/nonexistent/hkdump.exe");
        assert!(dump_hkx86(&tools, &dir.path().join("dumps")).is_err());
        assert!(convert_hkx64_to_hkx86(&tools).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn rejected_file_is_copied_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let tools = tools(dir.path(), "/bin/false");
        fs::write(&tools.filter_options, b"").unwrap();
        fs::create_dir_all(&tools.hkx64_dir).unwrap();
        fs::write(tools.hkx64_dir.join("walk.hkx"), b"hkx").unwrap();

        let report = convert_hkx64_to_hkx86(&tools).unwrap();
        assert!(report.is_success());
        assert_eq!(fs::read(tools.hkx86_dir.join("walk.hkx")).unwrap(), b"hkx");
    }

    #[cfg(unix)]
    #[test]
    fn failing_dumper_is_reported_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let tools = tools(dir.path(), "/bin/false");
        fs::create_dir_all(&tools.hkx86_dir).unwrap();
        fs::write(tools.hkx86_dir.join("a.hkx"), b"").unwrap();
        fs::write(tools.hkx86_dir.join("b.hkx"), b"").unwrap();

        let report = dump_hkx86(&tools, &dir.path().join("dumps")).unwrap();
        assert_eq!(report.failed.len(), 2);
        assert!(report.converted.is_empty());
    }
}
