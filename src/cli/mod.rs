//! CLI Module
//!
//! Command-line interface for writing audio to playback cards.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{ByteOrder, Defaults, OutputRange};
use crate::error::Result;

/// Rawdeck - convert audio files to raw samples on a playback card
#[derive(Parser, Debug)]
#[command(name = "rawdeck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert audio files and write them to a mounted card partition
    #[command(name = "write")]
    Write(WriteArgs),

    /// Report what is known about a block device without writing
    #[command(name = "probe")]
    Probe {
        /// Block device to inspect
        block_device: PathBuf,

        /// Filesystem the device is expected to carry
        #[arg(long)]
        filesystem: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct WriteArgs {
    /// First partition of the card, e.g. /dev/sdb1
    pub block_device: PathBuf,

    /// WAV or AIFF files to convert
    #[arg(required = true)]
    pub audio_files: Vec<PathBuf>,

    /// Bytes per output word (1, 2, 4 or 8)
    #[arg(short = 'w', long)]
    pub word_size: Option<u8>,

    /// Significant bits per output word
    #[arg(short = 'b', long)]
    pub bit_depth: Option<u32>,

    /// Output value range as MIN,MAX
    #[arg(short = 'r', long, value_parser = parse_range)]
    pub range: Option<OutputRange>,

    /// Output sample rate in Hz
    #[arg(short = 's', long)]
    pub sample_rate: Option<u32>,

    /// Stretch each file's own peaks to the full output range
    #[arg(short = 'e', long)]
    pub enlarge: bool,

    /// Byte order of written words (native, little, big)
    #[arg(long)]
    pub byte_order: Option<ByteOrder>,

    /// Filesystem the card must be formatted with
    #[arg(long)]
    pub filesystem: Option<String>,

    /// JSON file with default settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write without asking for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl WriteArgs {
    /// Settings given on the command line, layered over the defaults file
    pub fn settings(&self) -> Result<Defaults> {
        let file = match &self.config {
            Some(path) => Defaults::load(path)?,
            None => Defaults::default(),
        };
        let flags = Defaults {
            word_size: self.word_size,
            bit_depth: self.bit_depth,
            sample_rate: self.sample_rate,
            range_min: self.range.map(|r| r.min),
            range_max: self.range.map(|r| r.max),
            enlarge: self.enlarge.then_some(true),
            byte_order: self.byte_order,
            filesystem: self.filesystem.clone(),
            extension: None,
        };
        Ok(file.merged(flags))
    }
}

fn parse_range(s: &str) -> std::result::Result<OutputRange, String> {
    OutputRange::parse(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_args(args: &[&str]) -> WriteArgs {
        let cli = Cli::try_parse_from(["rawdeck", "write"].iter().chain(args)).unwrap();
        match cli.command {
            Commands::Write(args) => args,
            other => panic!("Expected write command, got: {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_write_flags() {
        let args = write_args(&[
            "-w", "1", "-b", "8", "-r", "10,200", "-s", "22050", "-e", "--byte-order", "big", "-y",
            "/dev/sdb1", "a.wav", "b.wav",
        ]);
        assert_eq!(args.block_device, PathBuf::from("/dev/sdb1"));
        assert_eq!(args.audio_files.len(), 2);
        assert!(args.yes);

        let settings = args.settings().unwrap();
        assert_eq!(settings.word_size, Some(1));
        assert_eq!(settings.bit_depth, Some(8));
        assert_eq!(settings.range_min, Some(10));
        assert_eq!(settings.range_max, Some(200));
        assert_eq!(settings.sample_rate, Some(22050));
        assert_eq!(settings.enlarge, Some(true));
        assert_eq!(settings.byte_order, Some(ByteOrder::Big));
    }

    #[test]
    fn test_write_requires_audio_files() {
        assert!(Cli::try_parse_from(["rawdeck", "write", "/dev/sdb1"]).is_err());
    }

    #[test]
    fn test_bad_range_is_rejected() {
        assert!(Cli::try_parse_from(["rawdeck", "write", "-r", "10", "/dev/sdb1", "a.wav"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rawdeck.json");
        fs::write(&path, r#"{"word_size": 4, "sample_rate": 8000, "extension": "pcm"}"#).unwrap();

        let args = write_args(&["--config", path.to_str().unwrap(), "-s", "16000", "/dev/sdb1", "a.wav"]);
        let settings = args.settings().unwrap();
        assert_eq!(settings.word_size, Some(4));
        assert_eq!(settings.sample_rate, Some(16000));
        assert_eq!(settings.extension.as_deref(), Some("pcm"));
        assert_eq!(settings.enlarge, None);
    }

    #[test]
    fn test_probe_flags() {
        let cli = Cli::try_parse_from(["rawdeck", "-v", "probe", "--json", "/dev/sdb1"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Probe { block_device, json, .. } => {
                assert_eq!(block_device, PathBuf::from("/dev/sdb1"));
                assert!(json);
            }
            other => panic!("Expected probe command, got: {:?}", other),
        }
    }
}
