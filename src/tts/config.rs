use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the GPT-SoVITS speech client
///
/// Expected format:
/// ```json
/// {
///   "api": {"host": "127.0.0.1", "port": 9880},
///   "models": {"gpt_weights": "GPT_weights/a.ckpt", "sovits_weights": "SoVITS_weights/a.pth", "ref_audio": "ref.wav"},
///   "text": {"language": "zh", "prompt_text": "参考音频的文本", "prompt_language": "zh", "input_file": "output/他.txt"},
///   "output": {"dir": "audio", "format": "wav"}
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub api: ApiConfig,
    pub models: ModelConfig,
    pub text: TextConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Pause between synthesis requests
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9880,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub gpt_weights: String,
    pub sovits_weights: String,
    /// Reference audio the voice is cloned from
    pub ref_audio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    pub language: String,
    /// Transcript of the reference audio
    pub prompt_text: String,
    pub prompt_language: String,
    #[serde(default = "default_split_method")]
    pub split_method: String,
    pub input_file: PathBuf,
    /// Treat the input as a speaker transcript: voice only `[id] content`
    /// lines and name each file after its id
    #[serde(default)]
    pub transcript_lines: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Media type requested from the server, also used as file extension
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("audio"),
            format: "wav".to_string(),
        }
    }
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_split_method() -> String {
    "cut5".to_string()
}

impl TtsConfig {
    /// Load from a JSON file
    ///
    /// The keys mirror the usual GPT-SoVITS client YAML, so an existing
    /// `config.yaml` converts one-to-one.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Config file not found: {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.api.host, self.api.port)
    }
}
