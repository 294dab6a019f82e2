use crate::subtitle::{SubtitleBlock, srt};
use crate::transcribe::Transcription;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

pub fn save_transcript_json(path: &Path, transcription: &Transcription) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    serde_json::to_writer_pretty(file, transcription)?;
    Ok(())
}

pub fn save_srt(path: &Path, blocks: &[SubtitleBlock]) -> Result<()> {
    std::fs::write(path, srt::compose(blocks))
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

pub fn load_srt(path: &Path) -> Result<Vec<SubtitleBlock>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    srt::parse(&content).with_context(|| format!("Failed to parse {:?}", path))
}
