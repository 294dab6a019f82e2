use anyhow::{Context, Result, anyhow, bail};
use audrey::Reader;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;

/// whisper.cpp only accepts 16 kHz mono
pub const SAMPLE_RATE: u32 = 16_000;

fn conversion_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), input.into()];
    args.extend(
        [
            "-vn",
            "-ar",
            "16000",
            "-ac",
            "1",
            "-c:a",
            "pcm_s16le",
            "-hide_banner",
            "-y",
            "-loglevel",
            "error",
        ]
        .map(OsString::from),
    );
    args.push(output.into());
    args
}

fn convert_to_wav(input: &Path) -> Result<NamedTempFile> {
    log::info!("Decoding {:?} with ffmpeg", input);

    let wav = NamedTempFile::with_suffix(".wav")?;
    let result = Command::new("ffmpeg")
        .args(conversion_args(input, wav.path()))
        .stdin(Stdio::null())
        .output()
        .context("Failed to run ffmpeg (is it installed?)")?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        bail!("ffmpeg could not decode {:?}: {}", input, stderr.trim());
    }
    Ok(wav)
}

/// Decodes any ffmpeg-readable media into whisper's f32 sample format.
pub fn read_file<P: AsRef<Path>>(audio_file_path: P) -> Result<Vec<f32>> {
    let wav = convert_to_wav(audio_file_path.as_ref())?;

    let mut reader = Reader::new(wav.reopen()?)?;
    let description = reader.description();
    if description.sample_rate() != SAMPLE_RATE || description.channel_count() != 1 {
        bail!(
            "unexpected wav layout: {} Hz, {} channels",
            description.sample_rate(),
            description.channel_count()
        );
    }

    let samples: Vec<i16> = reader.samples().collect::<Result<_, _>>()?;
    if samples.is_empty() {
        return Err(anyhow!("no audio in {:?}", audio_file_path.as_ref()));
    }
    log::debug!(
        "decoded {:.1}s of audio",
        samples.len() as f64 / SAMPLE_RATE as f64
    );

    let mut output = vec![0.0f32; samples.len()];
    whisper_rs::convert_integer_to_float_audio(&samples, &mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_args() {
        let args = conversion_args(Path::new("talk.mp4"), Path::new("/tmp/out.wav"));
        assert_eq!(args.first(), Some(&OsString::from("-i")));
        assert_eq!(args.get(1), Some(&OsString::from("talk.mp4")));
        assert_eq!(args.last(), Some(&OsString::from("/tmp/out.wav")));
        let pos = args.iter().position(|a| a == "-ar").unwrap();
        assert_eq!(args[pos + 1], "16000");
        assert!(args.iter().any(|a| a == "-vn"));
    }

    #[test]
    fn test_missing_input_fails() {
        // fails whether or not ffmpeg is installed
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp3");
        assert!(read_file(&missing).is_err());
    }
}
