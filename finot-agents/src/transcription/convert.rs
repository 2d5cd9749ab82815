use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tempfile::NamedTempFile;

use super::TranscriptionError;

/// Containers the remote transcription model accepts as-is.
pub const ACCEPTED_EXTENSIONS: [&str; 10] = [
    "flac", "m4a", "mp3", "mp4", "mpeg", "mpga", "oga", "ogg", "wav", "webm",
];

pub fn needs_conversion(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => !ACCEPTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => true,
    }
}

/// Decodes any supported container to mono PCM and writes it to a temporary
/// 16-bit WAV file, removed when the handle drops.
pub fn convert_to_wav(path: &Path) -> Result<NamedTempFile, TranscriptionError> {
    let (samples, sample_rate) = decode_to_mono_f32(path)?;
    if samples.is_empty() {
        return Err(TranscriptionError::Decode("no audio samples decoded".to_string()));
    }

    let wav = tempfile::Builder::new()
        .prefix("finot-voice-")
        .suffix(".wav")
        .tempfile()?;
    write_wav_mono(wav.path(), &samples, sample_rate)?;
    Ok(wav)
}

pub fn decode_to_mono_f32(path: &Path) -> Result<(Vec<f32>, u32), TranscriptionError> {
    let decode_err = |context: &str, e: SymphoniaError| {
        TranscriptionError::Decode(format!("{context}: {e}"))
    };

    let file = std::fs::File::open(path)?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_err("failed to probe audio", e))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| TranscriptionError::Decode("no default audio track".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| TranscriptionError::Decode("unknown sample rate".to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err("failed to create decoder", e))?;

    let mut mono = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(decode_err("audio read error", e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(decode_err("audio decode error", e)),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buffer = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        buffer.copy_interleaved_ref(decoded);

        if channels == 1 {
            mono.extend_from_slice(buffer.samples());
        } else {
            mono.extend(
                buffer
                    .samples()
                    .chunks_exact(channels)
                    .map(|frame| frame.iter().sum::<f32>() / channels as f32),
            );
        }
    }

    Ok((mono, sample_rate))
}

pub fn write_wav_mono(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), TranscriptionError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_conversion() {
        assert!(!needs_conversion(Path::new("voice.ogg")));
        assert!(!needs_conversion(Path::new("voice.OGA")));
        assert!(!needs_conversion(Path::new("memo.m4a")));
        assert!(needs_conversion(Path::new("memo.aac")));
        assert!(needs_conversion(Path::new("voice")));
    }

    #[test]
    fn test_wav_written_by_hound_decodes_to_same_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..1600)
            .map(|i| (i as f32 * 0.05).sin() * 0.5)
            .collect();
        write_wav_mono(&path, &samples, 16_000).unwrap();

        let (decoded, sample_rate) = decode_to_mono_f32(&path).unwrap();
        assert_eq!(sample_rate, 16_000);
        assert_eq!(decoded.len(), samples.len());
        assert!((decoded[100] - samples[100]).abs() < 1e-3);
    }

    #[test]
    fn test_undecodable_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voice.aac");
        std::fs::write(&path, b"not audio").unwrap();
        assert!(matches!(
            convert_to_wav(&path),
            Err(TranscriptionError::Decode(_))
        ));
    }
}
