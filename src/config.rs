use crate::models::submission::{DEFAULT_MAX_FILES, default_video_types};
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub max_files: usize,
    pub video_types: Vec<String>,
    pub generation_delay_ms: u64,
    pub max_upload_bytes: usize,
    pub admin_username: String,
    pub admin_password: String,
    pub session_ttl_secs: u64,
    pub session_idle_secs: u64,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Content operations dashboard API")]
pub struct Args {
    /// Host to bind to (overrides CONTENT_OPS_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides CONTENT_OPS_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where submitted videos are stored (overrides CONTENT_OPS_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides CONTENT_OPS_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Maximum files per upload batch (overrides CONTENT_OPS_MAX_FILES)
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Comma-separated video types (overrides CONTENT_OPS_VIDEO_TYPES)
    #[arg(long)]
    pub video_types: Option<String>,

    /// Simulated script generation latency in milliseconds
    /// (overrides CONTENT_OPS_GENERATION_DELAY_MS)
    #[arg(long)]
    pub generation_delay_ms: Option<u64>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            storage_dir: "./data/submissions".into(),
            database_url: "sqlite://./data/meta/content_ops.db".into(),
            max_files: DEFAULT_MAX_FILES,
            video_types: default_video_types(),
            generation_delay_ms: 2000,
            max_upload_bytes: 512 * 1024 * 1024,
            admin_username: "admin".into(),
            admin_password: "admin".into(),
            session_ttl_secs: 12 * 60 * 60,
            session_idle_secs: 60 * 60,
        }
    }
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::from_args(args)?, migrate))
    }

    /// Merge CLI args over `CONTENT_OPS_*` environment variables over defaults.
    pub fn from_args(args: Args) -> Result<Self> {
        let defaults = Self::default();

        // --- Environment fallback ---
        let env_host = env::var("CONTENT_OPS_HOST").unwrap_or(defaults.host);
        let env_port = env_parse("CONTENT_OPS_PORT")?.unwrap_or(defaults.port);
        let env_storage = env::var("CONTENT_OPS_STORAGE_DIR").unwrap_or(defaults.storage_dir);
        let env_db = env::var("CONTENT_OPS_DATABASE_URL").unwrap_or(defaults.database_url);
        let env_max_files = env_parse("CONTENT_OPS_MAX_FILES")?.unwrap_or(defaults.max_files);
        let env_types = env::var("CONTENT_OPS_VIDEO_TYPES").ok();
        let env_delay =
            env_parse("CONTENT_OPS_GENERATION_DELAY_MS")?.unwrap_or(defaults.generation_delay_ms);

        // --- Merge ---
        let video_types = match args.video_types.or(env_types) {
            Some(raw) => parse_video_types(&raw),
            None => defaults.video_types,
        };

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            max_files: args.max_files.unwrap_or(env_max_files),
            video_types,
            generation_delay_ms: args.generation_delay_ms.unwrap_or(env_delay),
            max_upload_bytes: env_parse("CONTENT_OPS_MAX_UPLOAD_BYTES")?
                .unwrap_or(defaults.max_upload_bytes),
            admin_username: env::var("CONTENT_OPS_ADMIN_USERNAME")
                .unwrap_or(defaults.admin_username),
            admin_password: env::var("CONTENT_OPS_ADMIN_PASSWORD")
                .unwrap_or(defaults.admin_password),
            session_ttl_secs: env_parse("CONTENT_OPS_SESSION_TTL_SECS")?
                .unwrap_or(defaults.session_ttl_secs),
            session_idle_secs: env_parse("CONTENT_OPS_SESSION_IDLE_SECS")?
                .unwrap_or(defaults.session_idle_secs),
        };

        if cfg.max_files == 0 {
            anyhow::bail!("max_files must be at least 1");
        }
        if cfg.session_idle_secs == 0 {
            anyhow::bail!("session_idle_secs must be at least 1");
        }

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn generation_delay(&self) -> Duration {
        Duration::from_millis(self.generation_delay_ms)
    }

    /// How long an upload session or script workflow may sit untouched.
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

/// Read and parse an optional environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

/// Split a comma-separated list, dropping blanks and duplicates, sorted.
fn parse_video_types(raw: &str) -> Vec<String> {
    let mut types: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    types.sort();
    types.dedup();
    types
}
