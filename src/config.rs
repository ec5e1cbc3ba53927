use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, time::Duration};

pub const DEFAULT_ALLOWED_PREFIX: &str = "love/";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments; loaded once at start-up.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub allowed_prefix: String,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub fetch_timeout: Duration,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Read-only media proxy in front of S3")]
pub struct Args {
    /// Host to bind to (overrides MEDIA_PROXY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides MEDIA_PROXY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket to read objects from (overrides S3_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Key prefix every served object must start with (overrides S3_PREFIX)
    #[arg(long)]
    pub prefix: Option<String>,

    /// S3 region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint (overrides S3_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Seconds to wait for the backend before giving up
    /// (overrides MEDIA_PROXY_FETCH_TIMEOUT_SECS)
    #[arg(long)]
    pub fetch_timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::resolve(Args::parse(), |name| env::var(name).ok())
    }

    /// Merge parsed CLI args over values produced by `lookup`.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // --- Environment fallback ---
        let env_host = lookup("MEDIA_PROXY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let env_port = match lookup("MEDIA_PROXY_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing MEDIA_PROXY_PORT value `{}`", value))?,
            None => 3000,
        };
        let env_timeout = match lookup("MEDIA_PROXY_FETCH_TIMEOUT_SECS") {
            Some(value) => value.parse::<u64>().with_context(|| {
                format!("parsing MEDIA_PROXY_FETCH_TIMEOUT_SECS value `{}`", value)
            })?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        let bucket = args
            .bucket
            .or_else(|| lookup("S3_BUCKET"))
            .filter(|b| !b.trim().is_empty())
            .context("S3_BUCKET (or --bucket) must be set")?;

        let allowed_prefix = args
            .prefix
            .or_else(|| lookup("S3_PREFIX"))
            .unwrap_or_else(|| DEFAULT_ALLOWED_PREFIX.into());

        let fetch_timeout_secs = args.fetch_timeout_secs.unwrap_or(env_timeout);
        if fetch_timeout_secs == 0 {
            bail!("fetch timeout must be at least one second");
        }

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            bucket,
            allowed_prefix,
            region: args.region.or_else(|| lookup("AWS_REGION")),
            endpoint_url: args.endpoint_url.or_else(|| lookup("S3_ENDPOINT_URL")),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_bucket_is_set() {
        let cfg = AppConfig::resolve(Args::default(), env_of(&[("S3_BUCKET", "media")])).unwrap();
        assert_eq!(cfg.bucket, "media");
        assert_eq!(cfg.allowed_prefix, "love/");
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
        assert!(cfg.region.is_none());
        assert!(cfg.endpoint_url.is_none());
    }

    #[test]
    fn missing_bucket_is_an_error() {
        assert!(AppConfig::resolve(Args::default(), env_of(&[])).is_err());
        assert!(AppConfig::resolve(Args::default(), env_of(&[("S3_BUCKET", "  ")])).is_err());
    }

    #[test]
    fn cli_args_override_environment() {
        let args = Args {
            port: Some(8080),
            prefix: Some("photos/".into()),
            fetch_timeout_secs: Some(5),
            ..Args::default()
        };
        let cfg = AppConfig::resolve(
            args,
            env_of(&[
                ("S3_BUCKET", "media"),
                ("S3_PREFIX", "love/"),
                ("MEDIA_PROXY_PORT", "9000"),
                ("AWS_REGION", "eu-west-1"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.allowed_prefix, "photos/");
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(5));
        assert_eq!(cfg.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let env = env_of(&[("S3_BUCKET", "media"), ("MEDIA_PROXY_PORT", "http")]);
        assert!(AppConfig::resolve(Args::default(), env).is_err());

        let args = Args {
            fetch_timeout_secs: Some(0),
            ..Args::default()
        };
        assert!(AppConfig::resolve(args, env_of(&[("S3_BUCKET", "media")])).is_err());
    }
}
