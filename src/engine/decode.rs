//! Audio file decoding
//!
//! WAV files are read through `hound`, AIFF files through `symphonia`.
//! Stereo is folded to mono and every sample ends up as 32-bit float.
//! Files that end before their declared sample count are not rejected:
//! whatever was read is kept and the truncation is reported as a warning.
//! Any other read failure is an error.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::debug;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::engine::buffer::{downmix_stereo, Midpoint, SignalBuffer};
use crate::error::{DecodeErrorKind, RawdeckError, Result};

/// Magic number opening an AIFF (or AIFF-C) file
const AIFF_MAGIC: &[u8; 4] = b"FORM";

/// Outcome of decoding one file
#[derive(Debug)]
pub struct Decoded {
    /// Mono signal at the file's own sample rate
    pub buffer: SignalBuffer,
    /// Channel count of the source file (1 or 2)
    pub source_channels: u16,
    /// Set when the file ended early; always a `TruncatedDecode` warning
    pub warning: Option<RawdeckError>,
}

/// Decode an audio file into a mono signal
///
/// # Arguments
/// * `path` - Path to a WAV or AIFF file
///
/// # Returns
/// * `Ok(Decoded)` - The mono signal, possibly with a truncation warning
/// * `Err(RawdeckError)` - If the file cannot be decoded
///
/// # Errors
/// * `DecodeFailure` - unrecognized format, system error, malformed file or
///   unsupported encoding
/// * `UnsupportedChannelCount` - if the file has other than 1 or 2 channels
pub fn decode_file(path: &Path) -> Result<Decoded> {
    let mut file = File::open(path).map_err(|e| io_failure(path, e))?;

    let mut magic = Vec::with_capacity(AIFF_MAGIC.len());
    (&mut file)
        .take(AIFF_MAGIC.len() as u64)
        .read_to_end(&mut magic)
        .map_err(|e| io_failure(path, e))?;
    file.seek(SeekFrom::Start(0)).map_err(|e| io_failure(path, e))?;

    if magic == AIFF_MAGIC {
        decode_aiff(file, path)
    } else {
        decode_wav(BufReader::new(file), path)
    }
}

// ============================================================================
// WAV
// ============================================================================

/// Decode a WAV stream; `path` only names the source in errors
pub fn decode_wav<R: Read>(source: R, path: &Path) -> Result<Decoded> {
    let mut reader = WavReader::new(EofTracker::new(source)).map_err(|e| hound_failure(path, e))?;

    let spec = reader.spec();
    check_channels(path, spec.channels as usize)?;

    debug!(
        "Decoding {}: {} Hz, {} channel(s), {}-bit {:?}",
        path.display(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let expected = reader.len() as usize;
    let full_scale = (1u64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
    let (mono, read, stopped_by) = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => read_mono::<_, f32, _>(&mut reader, spec.channels, |s| s),
        (SampleFormat::Int, 0..=16) => read_mono::<_, i16, _>(&mut reader, spec.channels, |s| s as f32 / full_scale),
        (SampleFormat::Int, _) => read_mono::<_, i32, _>(&mut reader, spec.channels, |s| s as f32 / full_scale),
    };

    let hit_eof = reader.into_inner().hit_eof;
    let warning = match stopped_by {
        None => None,
        Some(hound::Error::IoError(e)) if is_end_of_data(&e, hit_eof) => {
            Some(RawdeckError::TruncatedDecode {
                path: path.to_path_buf(),
                decoded: read,
                expected,
            })
        }
        Some(e) => return Err(hound_failure(path, e)),
    };

    Ok(Decoded {
        buffer: SignalBuffer::new(mono, spec.sample_rate),
        source_channels: spec.channels,
        warning,
    })
}

/// Read interleaved samples until the end of the data chunk or the first
/// error, then fold them to mono on their native type
///
/// Returns the mono signal, the number of samples read, and the error that
/// stopped reading, if any.
fn read_mono<R, S, F>(
    reader: &mut WavReader<R>,
    channels: u16,
    normalize: F,
) -> (Vec<f32>, usize, Option<hound::Error>)
where
    R: Read,
    S: hound::Sample + Midpoint,
    F: Fn(S) -> f32,
{
    let mut samples: Vec<S> = Vec::with_capacity(reader.len() as usize);
    let mut stopped_by = None;
    for sample in reader.samples::<S>() {
        match sample {
            Ok(s) => samples.push(s),
            Err(e) => {
                stopped_by = Some(e);
                break;
            }
        }
    }

    let read = samples.len();
    if channels == 2 {
        downmix_stereo(&mut samples);
    }
    (samples.into_iter().map(normalize).collect(), read, stopped_by)
}

/// Whether a read error marks the end of the underlying data
fn is_end_of_data(err: &io::Error, hit_eof: bool) -> bool {
    err.kind() == io::ErrorKind::UnexpectedEof || hit_eof
}

/// Reader that remembers whether its source ran dry
///
/// The decoder reports a short read as an I/O error of an unspecified
/// kind, so end of file is told apart from a failing device here.
struct EofTracker<R> {
    inner: R,
    hit_eof: bool,
}

impl<R> EofTracker<R> {
    fn new(inner: R) -> Self {
        Self { inner, hit_eof: false }
    }
}

impl<R: Read> Read for EofTracker<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.hit_eof = true;
        }
        Ok(n)
    }
}

fn hound_failure(path: &Path, err: hound::Error) -> RawdeckError {
    let kind = match &err {
        hound::Error::IoError(_) => DecodeErrorKind::System,
        hound::Error::FormatError(msg) if msg.contains("RIFF") || msg.contains("WAVE") => {
            DecodeErrorKind::UnrecognizedFormat
        }
        hound::Error::FormatError(_) | hound::Error::UnfinishedSample => DecodeErrorKind::Malformed,
        _ => DecodeErrorKind::UnsupportedEncoding,
    };
    decode_failure(path, kind, err)
}

// ============================================================================
// AIFF
// ============================================================================

/// Decode an AIFF file
fn decode_aiff(file: File, path: &Path) -> Result<Decoded> {
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("aiff");

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| match e {
            SymphoniaError::Unsupported(_) => decode_failure(path, DecodeErrorKind::UnrecognizedFormat, e),
            other => symphonia_failure(path, other),
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| RawdeckError::DecodeFailure {
            path: path.to_path_buf(),
            kind: DecodeErrorKind::Malformed,
            reason: "no audio track found".to_string(),
            source: None,
        })?;

    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params.sample_rate.ok_or_else(|| RawdeckError::DecodeFailure {
        path: path.to_path_buf(),
        kind: DecodeErrorKind::Malformed,
        reason: "sample rate not specified".to_string(),
        source: None,
    })?;
    let mut channels = params.channels.map(|c| c.count());
    if let Some(count) = channels {
        check_channels(path, count)?;
    }

    debug!(
        "Decoding {}: {} Hz, {:?} channel(s), {:?} frames",
        path.display(),
        sample_rate,
        channels,
        params.n_frames
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| symphonia_failure(path, e))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(symphonia_failure(path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).map_err(|e| symphonia_failure(path, e))?;
        if channels.is_none() {
            let count = decoded.spec().channels.count();
            check_channels(path, count)?;
            channels = Some(count);
        }

        let buf = sample_buf
            .get_or_insert_with(|| SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec()));
        buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(buf.samples());
    }

    let channels = channels.unwrap_or(1);
    let read = samples.len();
    let expected = params.n_frames.map(|frames| frames as usize * channels);

    let warning = match expected {
        Some(expected) if read < expected => Some(RawdeckError::TruncatedDecode {
            path: path.to_path_buf(),
            decoded: read,
            expected,
        }),
        _ => None,
    };

    let source_channels = channels as u16;
    let buffer = SignalBuffer::from_interleaved(samples, source_channels, sample_rate).ok_or(
        RawdeckError::UnsupportedChannelCount {
            path: path.to_path_buf(),
            channels: source_channels,
        },
    )?;

    Ok(Decoded {
        buffer,
        source_channels,
        warning,
    })
}

fn symphonia_failure(path: &Path, err: SymphoniaError) -> RawdeckError {
    let kind = match &err {
        SymphoniaError::IoError(_) => DecodeErrorKind::System,
        SymphoniaError::Unsupported(_) => DecodeErrorKind::UnsupportedEncoding,
        _ => DecodeErrorKind::Malformed,
    };
    decode_failure(path, kind, err)
}

// ============================================================================
// Shared
// ============================================================================

fn check_channels(path: &Path, channels: usize) -> Result<()> {
    if (1..=2).contains(&channels) {
        return Ok(());
    }
    Err(RawdeckError::UnsupportedChannelCount {
        path: path.to_path_buf(),
        channels: channels.min(u16::MAX as usize) as u16,
    })
}

fn io_failure(path: &Path, err: io::Error) -> RawdeckError {
    decode_failure(path, DecodeErrorKind::System, err)
}

fn decode_failure<E>(path: &Path, kind: DecodeErrorKind, err: E) -> RawdeckError
where
    E: std::error::Error + Send + Sync + 'static,
{
    RawdeckError::DecodeFailure {
        path: path.to_path_buf(),
        kind,
        reason: err.to_string(),
        source: Some(Box::new(err)),
    }
}
