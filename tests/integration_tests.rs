//! Integration Tests
//!
//! End-to-end tests for the rawdeck write pipeline, run against a fake
//! block device whose mount point is a temporary directory.

use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use hound::{SampleFormat, WavSpec, WavWriter};
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};

use rawdeck::config::{ByteOrder, ConvertConfig, Defaults};
use rawdeck::device::DeviceInspector;
use rawdeck::writer::{AssumeYes, Confirmation, DeviceWriter, WriteOutcome};
use rawdeck::RawdeckError;

const DEVICE: &str = "/dev/sdx1";

/// A card at /dev/sdx1, mounted on a temporary directory
struct FakeCard {
    mount_point: PathBuf,
    fs_name: &'static str,
    available: u64,
}

impl DeviceInspector for FakeCard {
    fn is_block_device(&self, path: &Path) -> io::Result<bool> {
        if path == Path::new(DEVICE) {
            Ok(true)
        } else {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }

    fn partition_table(&self) -> io::Result<String> {
        Ok("major minor  #blocks  name\n\n   8   96  1000 sdx\n   8   97  1000 sdx1\n".to_string())
    }

    fn mount_table(&self) -> io::Result<String> {
        Ok(format!(
            "{} {} {} rw,relatime 0 0\n",
            DEVICE,
            self.mount_point.display(),
            self.fs_name
        ))
    }

    fn available_space(&self, _mount_point: &Path) -> io::Result<u64> {
        Ok(self.available)
    }

    fn device_size(&self, _device: &Path) -> io::Result<u64> {
        Ok(1_024_000)
    }

    fn partition_table_path(&self) -> PathBuf {
        PathBuf::from("/proc/partitions")
    }

    fn mount_table_path(&self) -> PathBuf {
        PathBuf::from("/proc/mounts")
    }
}

/// Answers every prompt the same way and counts how often it was asked
struct Scripted {
    answer: bool,
    asked: Rc<Cell<usize>>,
}

impl Confirmation for Scripted {
    fn confirm(&mut self, _message: &str) -> io::Result<bool> {
        self.asked.set(self.asked.get() + 1);
        Ok(self.answer)
    }
}

struct Fixture {
    inputs: TempDir,
    card: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            inputs: tempdir().unwrap(),
            card: tempdir().unwrap(),
        }
    }

    fn card(&self, available: u64) -> FakeCard {
        FakeCard {
            mount_point: self.card.path().to_path_buf(),
            fs_name: "vfat",
            available,
        }
    }

    /// Write a 16-bit WAV with a 440 Hz sine at the given peak
    fn sine_wav(&self, name: &str, channels: u16, sample_rate: u32, frames: usize, peak: f64) -> PathBuf {
        let path = self.inputs.path().join(name);
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..frames {
            let t = i as f64 / sample_rate as f64;
            let value = (peak * (2.0 * std::f64::consts::PI * 440.0 * t).sin() * 32767.0) as i16;
            for _ in 0..channels {
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
        path
    }

    fn card_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.card.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn config(inputs: Vec<PathBuf>, values: Defaults) -> ConvertConfig {
    ConvertConfig::build(PathBuf::from(DEVICE), inputs, values).unwrap()
}

fn words_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect()
}

// === End-to-End ===

#[test]
fn test_enlarge_fills_16_bit_range() {
    let fixture = Fixture::new();
    let input = fixture.sine_wav("tone.wav", 1, 44100, 4410, 0.5);

    let config = config(
        vec![input],
        Defaults {
            word_size: Some(2),
            bit_depth: Some(16),
            sample_rate: Some(44100),
            range_min: Some(0),
            range_max: Some(65535),
            enlarge: Some(true),
            byte_order: Some(ByteOrder::Native),
            ..Default::default()
        },
    );

    let report = DeviceWriter::new(config, fixture.card(1 << 20), AssumeYes).run().unwrap();
    assert!(report.warnings.is_empty());

    let output = fixture.card.path().join("tone.raw");
    match report.outcome {
        WriteOutcome::Written { files, bytes } => {
            assert_eq!(files, vec![output.clone()]);
            assert_eq!(bytes, 4410 * 2);
        }
        WriteOutcome::Declined => panic!("Expected files to be written"),
    }

    let data = fs::read(&output).unwrap();
    assert_eq!(data.len(), 4410 * 2);
    let words = words_u16(&data);
    assert_eq!(*words.iter().min().unwrap(), 0);
    assert_eq!(*words.iter().max().unwrap(), 65535);
}

#[test]
fn test_batch_with_resample_and_downmix() {
    let fixture = Fixture::new();
    let mono = fixture.sine_wav("kick.wav", 1, 48000, 4800, 0.8);
    let stereo = fixture.sine_wav("pad.wav", 2, 22050, 2205, 0.8);

    let config = config(vec![mono, stereo], Defaults::default());
    let report = DeviceWriter::new(config, fixture.card(1 << 20), AssumeYes).run().unwrap();

    assert!(matches!(report.outcome, WriteOutcome::Written { .. }));
    assert_eq!(fixture.card_files(), vec!["kick.raw", "pad.raw"]);

    // Default output rate is 44000 Hz with 2 byte words
    let kick = fs::read(fixture.card.path().join("kick.raw")).unwrap();
    assert_eq!(kick.len(), 4400 * 2);
    let pad = fs::read(fixture.card.path().join("pad.raw")).unwrap();
    assert_eq!(pad.len(), 4400 * 2);

    // Default bit depth is 12, so no word exceeds 4095
    assert!(words_u16(&kick).iter().all(|&w| w <= 4095));
}

#[test]
fn test_big_endian_output() {
    let fixture = Fixture::new();
    let input = fixture.sine_wav("tone.wav", 1, 44000, 440, 1.0);

    let config = config(
        vec![input],
        Defaults {
            bit_depth: Some(16),
            byte_order: Some(ByteOrder::Big),
            enlarge: Some(true),
            ..Default::default()
        },
    );
    DeviceWriter::new(config, fixture.card(1 << 20), AssumeYes).run().unwrap();

    let data = fs::read(fixture.card.path().join("tone.raw")).unwrap();
    let words: Vec<u16> = data.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
    assert_eq!(*words.iter().max().unwrap(), 65535);
    assert_eq!(*words.iter().min().unwrap(), 0);
}

// === Fail-Fast Ordering ===

#[test]
fn test_insufficient_space_writes_nothing() {
    let fixture = Fixture::new();
    let input = fixture.sine_wav("tone.wav", 1, 44000, 1000, 0.5);
    let asked = Rc::new(Cell::new(0));

    let config = config(vec![input], Defaults::default());
    let confirmation = Scripted {
        answer: true,
        asked: asked.clone(),
    };
    let err = DeviceWriter::new(config, fixture.card(1999), confirmation).run().unwrap_err();

    match err {
        RawdeckError::InsufficientSpace {
            needed_bytes,
            available_bytes,
            ..
        } => {
            assert_eq!(needed_bytes, 2000);
            assert_eq!(available_bytes, 1999);
        }
        other => panic!("Expected InsufficientSpace, got: {:?}", other),
    }
    assert_eq!(asked.get(), 0);
    assert!(fixture.card_files().is_empty());
}

#[test]
fn test_exact_space_is_enough() {
    let fixture = Fixture::new();
    let input = fixture.sine_wav("tone.wav", 1, 44000, 1000, 0.5);

    let config = config(vec![input], Defaults::default());
    let report = DeviceWriter::new(config, fixture.card(2000), AssumeYes).run().unwrap();
    assert_eq!(
        report.outcome,
        WriteOutcome::Written {
            files: vec![fixture.card.path().join("tone.raw")],
            bytes: 2000,
        }
    );
}

#[test]
fn test_declined_confirmation_writes_nothing() {
    let fixture = Fixture::new();
    let input = fixture.sine_wav("tone.wav", 1, 44000, 100, 0.5);
    let asked = Rc::new(Cell::new(0));

    let config = config(vec![input], Defaults::default());
    let confirmation = Scripted {
        answer: false,
        asked: asked.clone(),
    };
    let report = DeviceWriter::new(config, fixture.card(1 << 20), confirmation).run().unwrap();

    assert_eq!(report.outcome, WriteOutcome::Declined);
    assert_eq!(asked.get(), 1);
    assert!(fixture.card_files().is_empty());
}

#[test]
fn test_bad_input_aborts_before_writing() {
    let fixture = Fixture::new();
    let good = fixture.sine_wav("good.wav", 1, 44000, 100, 0.5);
    let bad = fixture.inputs.path().join("bad.wav");
    fs::write(&bad, b"not audio").unwrap();

    let config = config(vec![good, bad.clone()], Defaults::default());
    let err = DeviceWriter::new(config, fixture.card(1 << 20), AssumeYes).run().unwrap_err();

    match err {
        RawdeckError::DecodeFailure { path, .. } => assert_eq!(path, bad),
        other => panic!("Expected DecodeFailure, got: {:?}", other),
    }
    assert!(fixture.card_files().is_empty());
}

#[test]
fn test_device_checked_before_loading() {
    let fixture = Fixture::new();
    let mut card = fixture.card(1 << 20);
    card.fs_name = "ext4";

    // The input does not exist, but the device check fails first
    let config = config(vec![fixture.inputs.path().join("missing.wav")], Defaults::default());
    let err = DeviceWriter::new(config, card, AssumeYes).run().unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_FILESYSTEM");
}

#[test]
fn test_constant_signal_in_enlarge_mode() {
    let fixture = Fixture::new();
    let path = fixture.inputs.path().join("flat.wav");
    let spec = WavSpec {
        channels: 1,
        sample_rate: 44000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec).unwrap();
    for _ in 0..100 {
        writer.write_sample(1000i16).unwrap();
    }
    writer.finalize().unwrap();

    let config = config(
        vec![path],
        Defaults {
            enlarge: Some(true),
            ..Default::default()
        },
    );
    let err = DeviceWriter::new(config, fixture.card(1 << 20), AssumeYes).run().unwrap_err();
    assert_eq!(err.error_code(), "DEGENERATE_REMAP_RANGE");
    assert!(fixture.card_files().is_empty());
}

#[test]
fn test_truncated_input_is_written_with_warning() {
    let fixture = Fixture::new();
    let path = fixture.sine_wav("cut.wav", 1, 44000, 1000, 0.5);
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 500 * 2]).unwrap();

    let config = config(vec![path], Defaults::default());
    let report = DeviceWriter::new(config, fixture.card(1 << 20), AssumeYes).run().unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].is_warning());
    let data = fs::read(fixture.card.path().join("cut.raw")).unwrap();
    assert_eq!(data.len(), 500 * 2);
}

#[test]
fn test_numbered_takes_keep_their_names() {
    let fixture = Fixture::new();
    let first = fixture.sine_wav("take.01.wav", 1, 44000, 100, 0.5);
    let second = fixture.sine_wav("take.02.wav", 1, 44000, 100, 0.5);

    let config = config(vec![first, second], Defaults::default());
    DeviceWriter::new(config, fixture.card(1 << 20), AssumeYes).run().unwrap();

    assert_eq!(fixture.card_files(), vec!["take.01.raw", "take.02.raw"]);
}
