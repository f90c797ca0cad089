//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::{info, warn};

use crate::cli::WriteArgs;
use crate::config::{ConvertConfig, DEFAULT_FILESYSTEM};
use crate::device::{DeviceReport, SystemInspector};
use crate::error::Result;
use crate::writer::{AssumeYes, Confirmation, DeviceWriter, PromptConfirmation, WriteOutcome};

/// Convert audio files and write them to the card.
pub fn write_to_device(args: &WriteArgs) -> Result<()> {
    let config = ConvertConfig::build(args.block_device.clone(), args.audio_files.clone(), args.settings()?)?;
    info!(
        "Writing {} file(s) to {} at {}Hz",
        config.audio_files.len(),
        config.block_device.display(),
        config.sample_rate
    );

    let confirmation: Box<dyn Confirmation> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(PromptConfirmation::stdio())
    };

    let report = DeviceWriter::new(config, SystemInspector::new(), confirmation).run()?;

    for warning in &report.warnings {
        println!("Warning: {}", warning);
    }

    match report.outcome {
        WriteOutcome::Written { files, bytes } => {
            for file in &files {
                println!("Wrote: {}", file.display());
            }
            println!("{} file(s), {} bytes written", files.len(), bytes);
        }
        WriteOutcome::Declined => {
            println!("Nothing written");
        }
    }

    Ok(())
}

/// Print what the system knows about a block device.
pub fn probe_device(block_device: &Path, filesystem: Option<&str>, json: bool) -> Result<()> {
    info!("Probing: {}", block_device.display());

    let required = filesystem.unwrap_or(DEFAULT_FILESYSTEM);
    let report = DeviceReport::gather(&SystemInspector::new(), block_device, required)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Device: {}", report.device.display());
    if report.canonical_path != report.device {
        println!("Resolves to: {}", report.canonical_path.display());
    }
    if let Some(size) = report.size_bytes {
        println!("Size: {} bytes", size);
    }

    if report.drive_partitions.is_empty() {
        println!("Partitions: none");
    } else {
        println!("Partitions:");
        for partition in &report.drive_partitions {
            let marker = if *partition == report.canonical_path { " *" } else { "" };
            println!("  {}{}", partition.display(), marker);
        }
    }

    match &report.mounting {
        Some(mounting) => {
            println!(
                "Mounted at: {} ({})",
                mounting.mount_point.display(),
                mounting.fs_name
            );
            if let Some(available) = report.available_bytes {
                println!("Available: {} bytes", available);
            }
        }
        None => println!("Mounted at: not mounted"),
    }

    match &report.problem {
        None => println!("Ready for writing"),
        Some(problem) => {
            warn!("{}", problem);
            println!("Not ready: {}", problem);
        }
    }

    Ok(())
}
