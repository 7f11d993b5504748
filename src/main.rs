use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use speakersplit::{
    AnalysisConfig, ChatClient, ChatConfig, DialogueExtractor, ReportMetadata, SegmentConfig,
    Stage1Config, Stage4Config, TtsClient, TtsConfig, analyze_text, execute_stage0,
    execute_stage4, read_source_text,
};

#[derive(Parser)]
#[command(name = "speakersplit")]
#[command(author, version, about = "Speaker-attributed dialogue extraction for narrative text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract dialogue and write one transcript per character
    Analyze {
        /// Input narrative text file (UTF-8)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for per-character transcripts
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Also write the full analysis as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Maximum characters per chunk sent to the model
        #[arg(long, default_value = "1000")]
        max_chunk_chars: usize,

        /// Sentence terminator characters
        #[arg(long, default_value = "。")]
        terminators: String,

        /// Model name (overrides ZHIPUAI_MODEL)
        #[arg(long)]
        model: Option<String>,

        /// Extra attempts per chunk after a failed or malformed reply
        #[arg(long, default_value = "0")]
        retries: u32,

        /// Chunks processed concurrently (results are still merged in order)
        #[arg(long, default_value = "1")]
        concurrency: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show how a text would be chunked without calling the model
    Inspect {
        /// Input narrative text file (UTF-8)
        #[arg(short, long)]
        input: PathBuf,

        /// Maximum characters per chunk
        #[arg(long, default_value = "1000")]
        max_chunk_chars: usize,

        /// Sentence terminator characters
        #[arg(long, default_value = "。")]
        terminators: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Voice a text file through a GPT-SoVITS server
    Speak {
        /// TTS configuration file, JSON with the same sections (api, models,
        /// text, output) as a GPT-SoVITS client `config.yaml`
        #[arg(short, long, default_value = "tts.json")]
        config: PathBuf,

        /// Input file (overrides text.input_file)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Input is a speaker transcript: voice `[id] content` lines only
        #[arg(long)]
        transcript: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            json,
            max_chunk_chars,
            terminators,
            model,
            retries,
            concurrency,
            verbose,
        } => {
            setup_logging(verbose);
            let config = AnalysisConfig {
                segment: segment_config(max_chunk_chars, &terminators),
                extract: Stage1Config {
                    max_retries: retries,
                    concurrency,
                },
            };
            analyze_novel(input, output, json, model, config).await
        }
        Commands::Inspect {
            input,
            max_chunk_chars,
            terminators,
            verbose,
        } => {
            setup_logging(verbose);
            inspect_text(input, segment_config(max_chunk_chars, &terminators))
        }
        Commands::Speak {
            config,
            input,
            transcript,
            verbose,
        } => {
            setup_logging(verbose);
            speak(config, input, transcript).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn segment_config(max_chunk_chars: usize, terminators: &str) -> SegmentConfig {
    let defaults = SegmentConfig::default();
    let terminators: Vec<char> = terminators.chars().collect();
    SegmentConfig {
        max_chunk_chars,
        terminators: if terminators.is_empty() {
            defaults.terminators
        } else {
            terminators
        },
    }
}

async fn analyze_novel(
    input: PathBuf,
    output: PathBuf,
    json: Option<PathBuf>,
    model: Option<String>,
    config: AnalysisConfig,
) -> Result<()> {
    info!("Loading text from {:?}", input);
    let text = read_source_text(&input)?;

    let mut chat_config = ChatConfig::from_env()?;
    if let Some(model) = model {
        chat_config.model = model;
    }
    let client = ChatClient::new(chat_config);

    let run = match analyze_text(&client, &text, &config).await {
        Ok(run) => run,
        Err(e) => {
            if let Some(index) = e.chunk_index() {
                error!("Analysis aborted at chunk {}; no transcripts written", index);
            }
            return Err(e).context("Analysis failed");
        }
    };

    let report = json.as_deref().map(|path| {
        (
            path,
            ReportMetadata::new(client.model(), run.chunk_count, &run.result),
        )
    });
    let rendered = execute_stage4(&run.result, &output, report, &Stage4Config::default())?;

    info!(
        "Complete: {} dialogues, {} transcripts written to {:?}",
        run.result.dialogue_count(),
        rendered.transcripts.written.len(),
        output
    );
    info!(
        "Characters: {}",
        run.result
            .characters
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    );
    if let Some(path) = rendered.report_path {
        info!("JSON report written to {:?}", path);
    }

    if !rendered.transcripts.is_complete() {
        anyhow::bail!(
            "{} transcript file(s) could not be written",
            rendered.transcripts.failures.len()
        );
    }

    Ok(())
}

fn inspect_text(input: PathBuf, config: SegmentConfig) -> Result<()> {
    info!("Inspecting text from {:?}", input);
    let text = read_source_text(&input)?;
    let segments = execute_stage0(&text, &config);

    println!("Segmentation");
    println!("============");
    println!("Characters of text: {}", text.chars().count());
    println!("Sentences: {}", segments.sentence_count);
    println!("Chunks: {} (max {} chars)", segments.chunks.len(), config.max_chunk_chars);
    println!("Oversized chunks: {}", segments.oversized_chunks);
    println!();

    println!("Chunks");
    println!("------");
    for chunk in &segments.chunks {
        let preview: String = chunk.text().chars().take(20).collect();
        println!(
            "#{:<4} {:>5} chars {:>4} sentences  {}...",
            chunk.index + 1,
            chunk.char_len,
            chunk.sentences.len(),
            preview
        );
    }

    Ok(())
}

async fn speak(config_path: PathBuf, input: Option<PathBuf>, transcript: bool) -> Result<()> {
    let mut config = TtsConfig::from_file(&config_path)?;
    info!("Loaded TTS config from {:?}", config_path);
    if let Some(input) = input {
        config.text.input_file = input;
    }
    if transcript {
        config.text.transcript_lines = true;
    }

    let client = TtsClient::new(config)?;

    info!("Switching models...");
    client
        .switch_models()
        .await
        .context("Failed to switch TTS models")?;

    info!("Processing text...");
    let report = client.process_text_file().await?;
    info!(
        "Speech complete: {} files generated, {} failed",
        report.generated.len(),
        report.failed
    );

    Ok(())
}
