use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, warn};

use super::TtsConfig;

/// One line of input to be voiced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechJob {
    pub text: String,
    /// Number used in the output file name
    pub number: u64,
}

/// Outcome of voicing an input file
#[derive(Debug, Default)]
pub struct SpeechReport {
    pub generated: Vec<PathBuf>,
    pub failed: usize,
}

/// Client for a GPT-SoVITS HTTP API server
pub struct TtsClient {
    client: Client,
    config: TtsConfig,
    base_url: String,
}

impl TtsClient {
    /// Create the client and make sure the output directory exists
    pub fn new(config: TtsConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.output.dir)
            .with_context(|| format!("Failed to create directory: {:?}", config.output.dir))?;

        Ok(Self {
            client: Client::new(),
            base_url: config.base_url(),
            config,
        })
    }

    /// Switch the server to the configured GPT and SoVITS weights
    pub async fn switch_models(&self) -> Result<()> {
        let models = &self.config.models;
        self.set_weights("set_gpt_weights", &models.gpt_weights).await?;
        info!("GPT weights loaded");
        self.set_weights("set_sovits_weights", &models.sovits_weights).await?;
        info!("SoVITS weights loaded");
        Ok(())
    }

    async fn set_weights(&self, endpoint: &str, weights_path: &str) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(&[("weights_path", weights_path)])
            .send()
            .await
            .with_context(|| format!("Failed to reach TTS server for {}", endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} failed: {} - {}", endpoint, status, body);
        }
        Ok(())
    }

    fn tts_params<'a>(&'a self, text: &'a str) -> Vec<(&'static str, &'a str)> {
        let text_config = &self.config.text;
        vec![
            ("text", text),
            ("text_lang", text_config.language.as_str()),
            ("ref_audio_path", self.config.models.ref_audio.as_str()),
            ("prompt_text", text_config.prompt_text.as_str()),
            ("prompt_lang", text_config.prompt_language.as_str()),
            ("text_split_method", text_config.split_method.as_str()),
            ("media_type", self.config.output.format.as_str()),
        ]
    }

    /// Synthesize `text` into `output.dir/file_name`
    ///
    /// Returns `Ok(false)` when the server rejects the request; transport
    /// failures are errors.
    pub async fn text_to_speech(&self, text: &str, file_name: &str) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/tts", self.base_url))
            .query(&self.tts_params(text))
            .send()
            .await
            .context("Failed to reach TTS server")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Speech generation failed: {} - {}", status, body);
            return Ok(false);
        }

        let audio = response
            .bytes()
            .await
            .context("Failed to read audio from TTS server")?;
        let path = self.config.output.dir.join(file_name);
        std::fs::write(&path, &audio)
            .with_context(|| format!("Failed to write file: {:?}", path))?;
        info!("Generated {:?}", path);
        Ok(true)
    }

    /// Voice every line of the configured input file
    ///
    /// Individual failures are logged and counted; the loop carries on.
    pub async fn process_text_file(&self) -> Result<SpeechReport> {
        let input = &self.config.text.input_file;
        let content = std::fs::read_to_string(input)
            .with_context(|| format!("Input file not found: {:?}", input))?;

        let jobs = plan_jobs(&content, self.config.text.transcript_lines);
        let delay = Duration::from_millis(self.config.request_delay_ms);
        let mut report = SpeechReport::default();

        for (position, job) in jobs.iter().enumerate() {
            if position > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let preview: String = job.text.chars().take(30).collect();
            info!("Line {}: {}...", job.number, preview);

            let file_name = format!("output_{}.{}", job.number, self.config.output.format);
            match self.text_to_speech(&job.text, &file_name).await {
                Ok(true) => report.generated.push(self.config.output.dir.join(&file_name)),
                Ok(false) => report.failed += 1,
                Err(e) => {
                    warn!("Line {} failed: {:#}", job.number, e);
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Decide which lines to voice and how to number them
///
/// Plain mode numbers lines by their 1-based position in the file and skips
/// blank ones. Transcript mode voices only `[id] content` lines, numbered by id.
pub fn plan_jobs(content: &str, transcript_lines: bool) -> Vec<SpeechJob> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            if transcript_lines {
                let (id, text) = parse_transcript_line(line)?;
                Some(SpeechJob {
                    text: text.to_string(),
                    number: id,
                })
            } else {
                Some(SpeechJob {
                    text: line.to_string(),
                    number: i as u64 + 1,
                })
            }
        })
        .collect()
}

/// Split a `[id] content` line
fn parse_transcript_line(line: &str) -> Option<(u64, &str)> {
    let rest = line.strip_prefix('[')?;
    let (id, text) = rest.split_once(']')?;
    let id = id.trim().parse().ok()?;
    let text = text.trim();
    (!text.is_empty()).then_some((id, text))
}
