//! Process configuration.
//!
//! Every option is a CLI flag that can also come from the environment.
//! `run()` loads a `.env` file first when one exists.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};

use crate::pipeline::extraction::transcribe::DEFAULT_OPENAI_BASE_URL;
use crate::pipeline::llm::gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::pipeline::report::FanOut;

/// Application-level constants
pub const APP_NAME: &str = "OfferIQ";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DATABASE_FILE: &str = "offeriq.db";
pub const DEFAULT_STORAGE_BUCKET: &str = "offer-files";

/// How report sections are requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FanOutMode {
    /// One section at a time, pausing between calls.
    Serialized,
    /// All sections at once.
    Concurrent,
}

/// OfferIQ: offer analysis, funnel pages and sales reports.
#[derive(Parser, Debug, Clone)]
#[command(name = "offeriq", version)]
#[command(about = "Offer analysis, funnel generation and sales reports backed by Gemini")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: SocketAddr,

    /// Directory for the database and locally stored objects
    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    /// Timeout for a single outbound model or transcription call
    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 300)]
    pub llm_timeout_secs: u64,

    /// OpenAI API key, used for audio and video transcription
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    pub openai_base_url: String,

    /// Supabase project URL. Local storage is used unless both URL and key are set.
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_service_role_key: Option<String>,

    #[arg(long, env = "STORAGE_BUCKET", default_value = DEFAULT_STORAGE_BUCKET)]
    pub storage_bucket: String,

    #[arg(long, env = "REPORT_FAN_OUT", value_enum, default_value_t = FanOutMode::Serialized)]
    pub report_fan_out: FanOutMode,

    /// Pause between section calls in serialized mode
    #[arg(long, env = "REPORT_SECTION_DELAY_SECS", default_value_t = 15)]
    pub report_section_delay_secs: u64,

    /// Maximum characters per summarization chunk
    #[arg(long, env = "SUMMARY_CHUNK_CHARS", default_value_t = 30_000)]
    pub summary_chunk_chars: usize,

    /// Return the canned analysis when the model fails
    #[arg(long, env = "ANALYSIS_MOCK_FALLBACK", action = ArgAction::Set, default_value_t = true)]
    pub analysis_mock_fallback: bool,

    /// Maximum upload size in megabytes
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 100)]
    pub max_upload_mb: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Default for Config {
    /// Built-in defaults, ignoring the command line and environment.
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: None,
            google_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            llm_timeout_secs: 300,
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            supabase_url: None,
            supabase_service_role_key: None,
            storage_bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            report_fan_out: FanOutMode::Serialized,
            report_section_delay_secs: 15,
            summary_chunk_chars: 30_000,
            analysis_mock_fallback: true,
            max_upload_mb: 100,
            log_level: None,
        }
    }
}

impl Config {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(app_data_dir)
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join(DATABASE_FILE)
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.data_dir().join("objects")
    }

    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }

    pub fn fan_out(&self) -> FanOut {
        match self.report_fan_out {
            FanOutMode::Concurrent => FanOut::Concurrent,
            FanOutMode::Serialized => FanOut::Serialized {
                delay: Duration::from_secs(self.report_section_delay_secs),
            },
        }
    }

    /// Supabase credentials, when both are configured.
    pub fn supabase(&self) -> Option<(&str, &str)> {
        let url = self.supabase_url.as_deref().filter(|s| !s.trim().is_empty())?;
        let key = self
            .supabase_service_role_key
            .as_deref()
            .filter(|s| !s.trim().is_empty())?;
        Some((url, key))
    }

    pub fn log_filter(&self) -> String {
        self.log_level
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| default_log_filter().to_string())
    }
}

/// Get the application data directory
/// `<platform data dir>/OfferIQ`, or `./OfferIQ` when the platform has none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,offeriq_lib=debug"
    } else {
        "info"
    }
}
