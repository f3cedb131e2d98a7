//! Audio file I/O collaborators
//!
//! Decodes any symphonia-supported container/codec into a mono f32
//! buffer and writes processed audio back out as 32-bit float WAV. The
//! engine itself never touches files; these helpers are the boundary.

use std::fs::File;
use std::path::Path;

use hound::{WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::ReductionError;

/// A fully decoded audio file, mixed down to mono
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Channel count of the source file, kept so output can be written
    /// with the original layout
    pub channels: u16,
}

impl AudioBuffer {
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Load an audio file and mix it down to mono
pub fn load_audio(path: &Path) -> Result<AudioBuffer, ReductionError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let format_opts = FormatOptions::default();
    let metadata_opts = MetadataOptions::default();
    let decoder_opts = DecoderOptions::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| ReductionError::Decode(format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| ReductionError::Decode("No audio tracks found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|e| ReductionError::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut mono_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(ReductionError::Decode(format!("Error reading packet: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(ReductionError::Decode(format!("Decode error: {}", e))),
        };

        let spec = *decoded.spec();
        let duration = decoded.capacity() as u64;

        let mut sample_buf = SampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(decoded);

        for chunk in sample_buf.samples().chunks(channels) {
            let mono = chunk.iter().sum::<f32>() / channels as f32;
            mono_samples.push(mono);
        }
    }

    if mono_samples.is_empty() {
        return Err(ReductionError::Decode(format!(
            "No audio decoded from {}",
            path.display()
        )));
    }

    log::debug!(
        "Loaded {}: {} mono samples at {} Hz ({} channels)",
        path.display(),
        mono_samples.len(),
        sample_rate,
        channels
    );

    Ok(AudioBuffer {
        samples: mono_samples,
        sample_rate,
        channels: channels as u16,
    })
}

/// Write a mono buffer as 32-bit float WAV, expanding to `channels`
/// identical channels to match the source layout
pub fn write_wav(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<(), ReductionError> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let result = (|| {
        let mut writer = WavWriter::create(path, spec)
            .map_err(|e| ReductionError::Encode(format!("Failed to create WAV file: {}", e)))?;

        for &sample in samples {
            for _ in 0..channels {
                writer
                    .write_sample(sample)
                    .map_err(|e| ReductionError::Encode(format!("Failed to write sample: {}", e)))?;
            }
        }

        writer
            .finalize()
            .map_err(|e| ReductionError::Encode(format!("Failed to finalize WAV: {}", e)))
    })();

    // A half-written WAV must not be left behind at the destination
    if result.is_err() {
        let _ = std::fs::remove_file(path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let samples: Vec<f32> = (0..4410)
            .map(|i| 0.25 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        write_wav(&path, &samples, 44100, 2).unwrap();

        let loaded = load_audio(&path).unwrap();
        assert_eq!(loaded.sample_rate, 44100);
        assert_eq!(loaded.channels, 2);
        assert_eq!(loaded.samples.len(), samples.len());
        // Both channels carry the same data, so the mono mixdown is exact
        for (orig, read) in samples.iter().zip(&loaded.samples) {
            assert!((orig - read).abs() < 1e-6);
        }
    }

    #[test]
    fn test_failed_write_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.wav");

        let result = write_wav(&path, &[0.1, 0.2], 44100, 1);
        assert!(matches!(result, Err(ReductionError::Encode(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_audio(Path::new("/nonexistent/audio.wav"));
        assert!(matches!(result, Err(ReductionError::Io(_))));
    }
}
