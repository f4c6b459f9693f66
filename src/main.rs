use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{arg, command, value_parser, ArgAction};
use tracing_subscriber::filter::{Builder, EnvFilter, LevelFilter};

use hkdump_csv::config::Config;
use hkdump_csv::convert;
use hkdump_csv::skeleton::HeaderPolicy;
use hkdump_csv::tools;

const DEFAULT_CONFIG: &str = "hkdump.toml";

/// `RUST_LOG` when it is set, `info` otherwise.
fn log_filter() -> Builder {
    EnvFilter::builder().with_default_directive(LevelFilter::INFO.into())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter().from_env_lossy()).init();

    let matches = command!()
        .arg(
            arg!(-c --config <CONFIG> "The TOML file describing where the dumps are and where the CSV files go. If not provided, hkdump.toml is used when it exists in the current directory; otherwise the resources/ layout is assumed.")
                .value_parser(value_parser!(PathBuf))
        )
        .arg(arg!(-s --skeleton <SKELETON> "The skeleton dump. Overrides the config file.").value_parser(value_parser!(PathBuf)))
        .arg(arg!(-i --"input-dir" <INPUT_DIR> "The directory containing animation dumps. Overrides the config file.").value_parser(value_parser!(PathBuf)))
        .arg(arg!(-o --"output-dir" <OUTPUT_DIR> "The directory to write CSV files to. Overrides the config file.").value_parser(value_parser!(PathBuf)))
        .arg(
            arg!(--"strict-skeleton" "Reject skeleton dumps whose version tag or embedded counts don't match the animation format.")
                .action(ArgAction::SetTrue)
        )
        .arg(
            arg!(--"skip-tools" "Don't run the configured .hkx conversion tools; only convert existing dumps.")
                .action(ArgAction::SetTrue)
        )
        .get_matches()
        ;

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => Config::load(Path::new(DEFAULT_CONFIG))?,
        None => Config::default(),
    };

    if let Some(skeleton) = matches.get_one::<PathBuf>("skeleton") {
        config.skeleton = skeleton.clone();
    }
    if let Some(input_dir) = matches.get_one::<PathBuf>("input-dir") {
        config.input_dir = input_dir.clone();
    }
    if let Some(output_dir) = matches.get_one::<PathBuf>("output-dir") {
        config.output_dir = output_dir.clone();
    }
    if matches.get_flag("strict-skeleton") {
        config.skeleton_header = HeaderPolicy::Strict;
    }

    let mut failures = 0;
    if let Some(tool_config) = config.tools.as_ref().filter(|_| !matches.get_flag("skip-tools")) {
        tracing::info!("Converting hkx64 to hkx86");
        failures += tools::convert_hkx64_to_hkx86(tool_config)?.failed.len();
        tracing::info!("Dumping hkx86 files");
        failures += tools::dump_hkx86(tool_config, &config.input_dir)?.failed.len();
    }

    tracing::info!("Converting dumps to CSV");
    let report = convert::run(config)?;
    failures += report.failed.len();
    tracing::info!("{} animations converted, {} failed", report.converted.len(), report.failed.len());

    if failures > 0 {
        bail!("{} files failed to convert", failures);
    }

    Ok(())
}
