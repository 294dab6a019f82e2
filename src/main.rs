mod config;
mod ffmpeg_decoder;
mod output;
mod subtitle;
mod transcribe;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::{AppConfig, Language, RunConfig, WhisperConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::subtitle::{grouper, srt};
use crate::transcribe::whisper_cpp::Whisper;

#[derive(Parser)]
#[command(name = "subline")]
#[command(about = "Audio to subtitle transcriber", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe audio and write an SRT file
    Run {
        /// Input audio or video file
        input: PathBuf,

        /// Output SRT path (default: next to the input)
        output: Option<PathBuf>,

        /// Whisper ggml model path (default: from config)
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Input language (default: auto)
        #[arg(short, long, default_value = "auto")]
        lang: Language,

        /// Minimum characters per subtitle block (default: 10)
        #[arg(long)]
        min_chars: Option<usize>,

        /// Configuration profile or file path
        #[arg(short, long)]
        profile: Option<String>,

        /// Also save the raw transcript as JSON
        #[arg(long)]
        keep_transcript: bool,
    },

    /// Build subtitles from a saved transcript JSON
    Group {
        /// Transcript JSON, e.g. from 'run --keep-transcript'
        input: PathBuf,

        /// Output SRT path (default: next to the input)
        output: Option<PathBuf>,

        /// Minimum characters per subtitle block (default: 10)
        #[arg(long)]
        min_chars: Option<usize>,

        /// Configuration profile or file path
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Validate an SRT file
    Check {
        /// SRT file to read
        input: PathBuf,
    },
}

fn load_profile(profile: Option<&str>) -> anyhow::Result<Option<RunConfig>> {
    match profile {
        Some(p) => {
            let conf_path = config::resolve_profile_path(p)?;
            let run_config =
                config::load_run_config(&conf_path).context("Failed to load run config")?;
            Ok(Some(run_config))
        }
        None => Ok(None),
    }
}

/// `foo/bar.mp4` -> `foo/bar.<ext>`, dropping a `.transcript` infix.
fn sibling_path(input: &Path, ext: &str) -> PathBuf {
    let raw_stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let file_stem = raw_stem.trim_end_matches(".transcript");
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{}.{}", file_stem, ext))
}

fn write_subtitles(
    transcription: &transcribe::Transcription,
    min_chars: usize,
    srt_path: &Path,
) -> anyhow::Result<()> {
    let blocks = grouper::group_all(&transcription.segments, min_chars);
    output::save_srt(srt_path, &blocks)?;
    log::info!("{} subtitle blocks (min_chars={})", blocks.len(), min_chars);
    println!("Saved SRT to {:?}", srt_path);
    Ok(())
}

fn resolve_model(
    model: Option<PathBuf>,
    lang: &Language,
    app_config: &AppConfig,
) -> anyhow::Result<PathBuf> {
    match model {
        Some(path) => Ok(path),
        None => app_config
            .transcription
            .model_for(lang)
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No transcription model configured for language: {} (pass --model)",
                    lang
                )
            }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            model,
            lang,
            min_chars,
            profile,
            keep_transcript,
        } => {
            let app_config = config::load_app_config().context("Failed to load app config")?;
            let run_config = load_profile(profile.as_deref())?;
            let min_chars = config::resolve_min_chars(min_chars, run_config.as_ref(), &app_config)?;
            let model_path = resolve_model(model, &lang, &app_config)?;

            let input_path = input.canonicalize().context("Failed to find input file")?;
            let srt_path = output.unwrap_or_else(|| sibling_path(&input_path, "srt"));

            let whisper_conf = run_config
                .as_ref()
                .and_then(|rc| rc.whisper.clone())
                .unwrap_or_else(WhisperConfig::default);

            println!("Transcribing...");
            let pb = ProgressBar::new(100);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% ({eta})",
                    )?
                    .progress_chars("#>-"),
            );

            let worker_pb = pb.clone();
            let worker_input = input_path.clone();
            let transcription = tokio::task::spawn_blocking(move || {
                let mut whisper = Whisper::new(&model_path, lang)
                    .context("Failed to create Whisper instance")?;
                whisper
                    .transcribe(&worker_input, &whisper_conf, &worker_pb)
                    .context("Failed to transcribe with WhisperCpp")
            })
            .await??;

            pb.finish_with_message("Transcription complete");

            if keep_transcript {
                let transcript_path = sibling_path(&input_path, "transcript.json");
                output::save_transcript_json(&transcript_path, &transcription)?;
                println!("Saved transcript to {:?}", transcript_path);
            }

            write_subtitles(&transcription, min_chars, &srt_path)?;
        }
        Commands::Group {
            input,
            output,
            min_chars,
            profile,
        } => {
            let app_config = config::load_app_config().context("Failed to load app config")?;
            let run_config = load_profile(profile.as_deref())?;
            let min_chars = config::resolve_min_chars(min_chars, run_config.as_ref(), &app_config)?;

            let transcription = transcribe::load_transcript_json(&input)?;
            if transcription.segments.is_empty() {
                anyhow::bail!("Transcript is empty");
            }
            let word_level = transcription
                .segments
                .iter()
                .filter(|s| s.is_word_level())
                .count();
            log::debug!(
                "{} segments ({} word-level), {} words",
                transcription.segments.len(),
                word_level,
                transcription.word_count()
            );

            let srt_path = output.unwrap_or_else(|| sibling_path(&input, "srt"));
            write_subtitles(&transcription, min_chars, &srt_path)?;
        }
        Commands::Check { input } => {
            let blocks = output::load_srt(&input)?;
            let report = srt::report(&blocks)?;
            println!(
                "{} blocks spanning {}",
                report.blocks,
                srt::format_timestamp(report.span)
            );
            if !report.contiguous {
                log::warn!("indices are not contiguous from 1");
            }
        }
    }

    Ok(())
}
