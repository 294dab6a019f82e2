use std::{ffi::c_int, path::Path};

use anyhow::{Result, anyhow};
use indicatif::ProgressBar;
use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters, WhisperVadParams};

use crate::{
    config::{Language, WhisperConfig},
    ffmpeg_decoder,
    transcribe::{Segment, Transcription, Word},
};

pub struct Whisper {
    ctx: WhisperContext,
    lang: Language,
}

const DEFAULT_BEAM_SIZE: u32 = 5;
const DEFAULT_PATIENCE: f32 = 1.0;

/// Raw token as reported by whisper, times in centiseconds.
#[derive(Debug, Clone)]
pub struct TokenPiece {
    pub text: String,
    pub t0: i64,
    pub t1: i64,
}

fn centiseconds_to_seconds(cs: i64) -> f64 {
    // whisper reports -1 for unknown
    cs.max(0) as f64 / 100.0
}

fn is_special(text: &str) -> bool {
    text.starts_with("[_") || text.starts_with("<|")
}

/// Merges sub-word tokens into words. A token with leading whitespace opens a
/// new word; special tokens are dropped.
pub fn tokens_to_words(tokens: &[TokenPiece]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Vec<&TokenPiece> = Vec::new();

    for token in tokens.iter().filter(|t| !is_special(&t.text)) {
        let starts_word = token.text.starts_with(char::is_whitespace);
        if starts_word && !current.is_empty() {
            words.extend(finalize_word(&current));
            current.clear();
        }
        current.push(token);
    }
    words.extend(finalize_word(&current));

    words
}

fn finalize_word(tokens: &[&TokenPiece]) -> Option<Word> {
    let first = tokens.first()?;
    let last = tokens.last()?;
    let text: String = tokens.iter().map(|t| t.text.as_str()).collect();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(Word::new(
        text,
        centiseconds_to_seconds(first.t0),
        centiseconds_to_seconds(last.t1),
    ))
}

impl Whisper {
    pub fn new(model_path: &Path, lang: Language) -> Result<Self> {
        let model_path = model_path
            .to_str()
            .ok_or_else(|| anyhow!("Invalid model path: {:?}", model_path))?;

        log::info!("Loading whisper model {}", model_path);
        let param = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(model_path, param)?;

        Ok(Self { ctx, lang })
    }

    pub fn transcribe<P: AsRef<Path>>(
        &mut self,
        audio: P,
        conf: &WhisperConfig,
        pb: &ProgressBar,
    ) -> Result<Transcription> {
        let word_timestamps = conf.word_timestamps.unwrap_or(true);

        let mut params = FullParams::new(whisper_rs::SamplingStrategy::BeamSearch {
            beam_size: conf.beam_size.unwrap_or(DEFAULT_BEAM_SIZE) as c_int,
            patience: conf.patience.unwrap_or(DEFAULT_PATIENCE),
        });

        let vad_model = match conf.vad_model.as_ref() {
            Some(path) => Some(
                path.to_str()
                    .ok_or_else(|| anyhow!("Invalid VAD model path: {:?}", path))?,
            ),
            None => None,
        };
        if let Some(vad_model) = vad_model {
            let mut vad_params = WhisperVadParams::new();
            vad_params.set_min_speech_duration(150);
            vad_params.set_min_silence_duration(200);
            vad_params.set_speech_pad(30);
            params.set_no_context(true);
            params.set_vad_params(vad_params);
            params.set_vad_model_path(Some(vad_model));
            params.enable_vad(true);
        }

        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_token_timestamps(word_timestamps);
        params.set_temperature(conf.temperature.unwrap_or(0.0));
        params.set_language(Some(self.lang.as_str()));
        if let Some(prompt) = conf.initial_prompt.as_ref() {
            params.set_initial_prompt(prompt);
        }

        let progress = pb.clone();
        params.set_progress_callback_safe(move |percent: i32| {
            progress.set_position(percent.clamp(0, 100) as u64);
        });

        let audio = ffmpeg_decoder::read_file(audio)?;

        let mut state = self.ctx.create_state()?;
        state.full(params, &audio)?;

        let num_segments = state.full_n_segments();
        if num_segments < 1 {
            return Err(anyhow!("no segments found"));
        }
        log::debug!("whisper produced {} segments", num_segments);

        let mut segments = Vec::with_capacity(num_segments as usize);

        for segment in state.as_iter() {
            if !word_timestamps {
                segments.push(Segment::Flat {
                    start: centiseconds_to_seconds(segment.start_timestamp()),
                    end: centiseconds_to_seconds(segment.end_timestamp()),
                    text: segment.to_str_lossy()?.to_string(),
                });
                continue;
            }

            let mut tokens = Vec::with_capacity(segment.n_tokens().max(0) as usize);
            for i in 0..segment.n_tokens() {
                let token = segment
                    .get_token(i)
                    .ok_or_else(|| anyhow!("missing token {} in segment", i))?;
                let data = token.token_data();
                tokens.push(TokenPiece {
                    text: token.to_str_lossy()?.to_string(),
                    t0: data.t0,
                    t1: data.t1,
                });
            }

            segments.push(Segment::Words {
                words: tokens_to_words(&tokens),
            });
        }

        Ok(Transcription::new(segments))
    }
}
