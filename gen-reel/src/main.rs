//! gen-reel - Convert text into narrated short-form videos

mod assembly;
mod config;
mod error;
mod job;
mod narration;
mod orchestrator;
mod retry;
mod script;
mod text;
mod visual;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::GenReelConfig;
use indicatif::{ProgressBar, ProgressStyle};
use provider_client::{DeepSeekProvider, ElevenLabsProvider, VoiceConfig};
use std::path::PathBuf;
use std::sync::Arc;

use assembly::FfmpegAssembler;
use job::types::{JobStatus, UnitState};
use job::{JobRegistry, JobStore};
use narration::NarrationSynthesizer;
use orchestrator::{JobOptions, Pipeline};
use script::ScriptGenerator;
use visual::{PlaceholderVisual, VisualStage};

#[derive(Parser, Debug)]
#[command(name = "gen-reel")]
#[command(about = "Convert text into narrated short-form videos", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the input text file
    input_file: Option<PathBuf>,

    /// Inline input text (alternative to a file)
    #[arg(long)]
    text: Option<String>,

    /// ElevenLabs voice id
    #[arg(long)]
    voice: Option<String>,

    /// Maximum number of video segments
    #[arg(long)]
    max_chunks: Option<usize>,

    /// Produce a video from the segments that succeeded
    #[arg(long, default_value_t = false)]
    allow_partial: bool,

    /// Maximum concurrent provider calls
    #[arg(long)]
    concurrency: Option<usize>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default voice id
    SetVoice {
        /// ElevenLabs voice id
        voice_id: String,
    },
    /// Set default speaking rate
    SetSpeakingRate {
        /// Value (0.5-2.0)
        value: f32,
    },
    /// Set default chunk word bounds
    SetChunkWords {
        /// Minimum words per segment
        min: usize,
        /// Maximum words per segment
        max: usize,
    },
    /// Set default provider concurrency
    SetConcurrency {
        /// Maximum concurrent provider calls
        value: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let input = read_input(&args)?;
    let config = GenReelConfig::load().context("Failed to load configuration")?;

    let options = build_options(&args, &config);

    if args.debug {
        eprintln!("Voice: {}", options.voice.voice_id);
        eprintln!(
            "Chunks: {}-{} words, max {}",
            options.min_words_per_chunk, options.max_words_per_chunk, options.max_chunks
        );
        eprintln!("Concurrency: {}", options.max_concurrent_calls);
        eprintln!("Partial output: {}", options.allow_partial_output);
    }

    let pipeline = build_pipeline(&config)?;

    eprintln!("Processing input ({} words)...", word_count(&input));

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let result = pipeline
        .process_job_with_progress(&input, &options, |progress| {
            pb.set_length(progress.total_units as u64);
            pb.set_position(progress.terminal_units as u64);
            if progress.failed_units > 0 {
                pb.set_message(format!("{} failed", progress.failed_units));
            }
        })
        .await?;

    pb.finish_and_clear();
    report_result(&result);

    if result.status == JobStatus::Failed {
        std::process::exit(1);
    }
    Ok(())
}

fn read_input(args: &Args) -> Result<String> {
    match (&args.input_file, &args.text) {
        (Some(path), None) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        (None, Some(text)) => Ok(text.clone()),
        (Some(_), Some(_)) => {
            anyhow::bail!("Provide either an input file or --text, not both")
        }
        (None, None) => {
            anyhow::bail!("Input is required. Run 'gen-reel --help' for usage.")
        }
    }
}

fn build_options(args: &Args, config: &GenReelConfig) -> JobOptions {
    let voice_id = args.voice.clone().unwrap_or_else(|| config.voice_id.clone());
    let mut voice = VoiceConfig::new(&voice_id, &config.voice_model);
    if let Some(rate) = config.speaking_rate {
        voice = voice.with_speaking_rate(rate);
    }

    JobOptions {
        min_words_per_chunk: config.min_words_per_chunk,
        max_words_per_chunk: config.max_words_per_chunk,
        max_chunks: args.max_chunks.unwrap_or(config.max_chunks),
        voice,
        allow_partial_output: args.allow_partial || config.allow_partial_output,
        max_concurrent_calls: args.concurrency.unwrap_or(config.max_concurrent_calls),
    }
}

fn build_pipeline(config: &GenReelConfig) -> Result<Pipeline> {
    let deepseek_key = std::env::var("DEEPSEEK_API_KEY")
        .context("DEEPSEEK_API_KEY environment variable is required")?;
    let elevenlabs_key = std::env::var("ELEVENLABS_API_KEY")
        .context("ELEVENLABS_API_KEY environment variable is required")?;

    let text_gen = Arc::new(DeepSeekProvider::new(&config.text_model, deepseek_key));
    let speech = Arc::new(ElevenLabsProvider::new(elevenlabs_key));

    let store = match &config.output_dir {
        Some(dir) => JobStore::new(dir),
        None => JobStore::new(JobStore::default_root()),
    };

    Ok(Pipeline::new(
        ScriptGenerator::new(text_gen),
        NarrationSynthesizer::new(speech),
        VisualStage::new(Arc::new(PlaceholderVisual)),
        Arc::new(FfmpegAssembler),
        store,
        Arc::new(JobRegistry::new()),
    ))
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = GenReelConfig::load()?;
            println!("Configuration file: {:?}", GenReelConfig::config_path()?);
            println!();
            println!("voice_id = \"{}\"", config.voice_id);
            println!("voice_model = \"{}\"", config.voice_model);
            if let Some(rate) = config.speaking_rate {
                println!("speaking_rate = {}", rate);
            } else {
                println!("speaking_rate = (provider default)");
            }
            println!("text_model = \"{}\"", config.text_model);
            println!(
                "chunk_words = {}-{}",
                config.min_words_per_chunk, config.max_words_per_chunk
            );
            println!("max_chunks = {}", config.max_chunks);
            println!("max_concurrent_calls = {}", config.max_concurrent_calls);
            println!("allow_partial_output = {}", config.allow_partial_output);
            if let Some(dir) = &config.output_dir {
                println!("output_dir = \"{}\"", dir.display());
            } else {
                println!("output_dir = (platform data dir)");
            }
        }
        ConfigAction::SetVoice { voice_id } => {
            let mut config = GenReelConfig::load()?;
            config.voice_id = voice_id.clone();
            config.save()?;
            println!("Default voice set to: {}", voice_id);
        }
        ConfigAction::SetSpeakingRate { value } => {
            let mut config = GenReelConfig::load()?;
            config.speaking_rate = Some(value.clamp(0.5, 2.0));
            config.save()?;
            println!(
                "Default speaking rate set to: {}",
                config.speaking_rate.unwrap_or(1.0)
            );
        }
        ConfigAction::SetChunkWords { min, max } => {
            if *min == 0 || max < min {
                anyhow::bail!("Invalid chunk bounds: min must be >= 1 and max >= min");
            }
            let mut config = GenReelConfig::load()?;
            config.min_words_per_chunk = *min;
            config.max_words_per_chunk = *max;
            config.save()?;
            println!("Default chunk bounds set to: {}-{} words", min, max);
        }
        ConfigAction::SetConcurrency { value } => {
            let mut config = GenReelConfig::load()?;
            config.max_concurrent_calls = (*value).max(1);
            config.save()?;
            println!(
                "Default concurrency set to: {}",
                config.max_concurrent_calls
            );
        }
    }
    Ok(())
}

fn report_result(result: &job::JobResult) {
    let ready = result
        .units
        .iter()
        .filter(|u| u.state == UnitState::Ready)
        .count();
    let failed = result.units.len() - ready;

    match result.status {
        JobStatus::Completed => {
            eprintln!("Completed: {} segments", result.units.len());
        }
        JobStatus::PartiallyFailed => {
            eprintln!("Partially completed: {} of {} segments", ready, result.units.len());
        }
        _ => {
            eprintln!("Failed: {} of {} segments succeeded", ready, result.units.len());
            if let Some(cause) = &result.failure {
                eprintln!("Cause: {:?}", cause);
            }
        }
    }

    if failed > 0 {
        for unit in &result.units {
            if let UnitState::Failed(cause) = &unit.state {
                eprintln!("  segment {}: {:?}", unit.index, cause);
            }
        }
    }

    let fallbacks = result.ungenerated_units();
    if !fallbacks.is_empty() {
        eprintln!(
            "Note: {} segment(s) narrate the original text (script generation unavailable)",
            fallbacks.len()
        );
    }

    if let Some(video) = &result.video {
        eprintln!("Output: {}", video.path.display());
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_chunk_bounds_rejected() {
        // Validation fires before any config file is touched.
        let result = handle_config_command(&ConfigAction::SetChunkWords { min: 0, max: 10 });
        assert!(result.is_err());
        let result = handle_config_command(&ConfigAction::SetChunkWords { min: 20, max: 10 });
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parses_conversion_args() {
        let args = Args::parse_from([
            "gen-reel",
            "input.txt",
            "--voice",
            "rachel",
            "--max-chunks",
            "5",
            "--allow-partial",
        ]);
        assert_eq!(args.input_file, Some(PathBuf::from("input.txt")));
        assert_eq!(args.voice.as_deref(), Some("rachel"));
        assert_eq!(args.max_chunks, Some(5));
        assert!(args.allow_partial);
    }

    #[test]
    fn test_cli_parses_config_subcommand() {
        let args = Args::parse_from(["gen-reel", "config", "set-voice", "adam"]);
        assert!(matches!(
            args.command,
            Some(Commands::Config {
                action: ConfigAction::SetVoice { .. }
            })
        ));
    }
}
