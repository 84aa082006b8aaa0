use anyhow::{Context, Result, bail};
use clap::Parser;
use std::{env, fmt, path::PathBuf, str::FromStr};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STAGING_DIR: &str = "./uploads";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: BackendConfig,
    pub staging_dir: PathBuf,
    /// Upper bound on request bodies. `None` leaves uploads unbounded.
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum BackendConfig {
    InMemory,
    S3(S3Config),
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// Falls back to the AWS provider chain when unset.
    pub region: Option<String>,
    pub credentials: Option<StaticCredentials>,
    /// Custom endpoint for S3-compatible stores (MinIO, Ceph, ...).
    pub endpoint_url: Option<String>,
}

#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "HTTP gateway for an S3-compatible bucket")]
pub struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket holding the files (overrides S3_BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Bucket region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3 endpoint (overrides S3_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Directory for in-flight uploads (overrides UPLOAD_STAGING_DIR)
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Reject request bodies above this many bytes (overrides MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Keep objects in process memory instead of S3
    #[arg(long)]
    pub in_memory: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::resolve(args, |name| env::var(name).ok())
    }

    /// Merge CLI args over values produced by `lookup`. Blank values count as unset.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match args.port {
            Some(port) => port,
            None => parse_var(&var, "PORT")?.unwrap_or(DEFAULT_PORT),
        };
        let max_upload_bytes = match args.max_upload_bytes {
            Some(limit) => Some(limit),
            None => parse_var(&var, "MAX_UPLOAD_BYTES")?,
        };

        let backend = if args.in_memory {
            BackendConfig::InMemory
        } else {
            let Some(bucket) = args.bucket.or_else(|| var("S3_BUCKET_NAME")) else {
                bail!("S3_BUCKET_NAME (or --bucket) must be set unless --in-memory is used");
            };
            let credentials = match (var("AWS_ACCESS_KEY_ID"), var("AWS_SECRET_ACCESS_KEY")) {
                (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                    access_key_id,
                    secret_access_key,
                }),
                (None, None) => None,
                _ => bail!("AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"),
            };
            BackendConfig::S3(S3Config {
                bucket,
                region: args.region.or_else(|| var("AWS_REGION")),
                credentials,
                endpoint_url: args.endpoint_url.or_else(|| var("S3_ENDPOINT_URL")),
            })
        };

        Ok(Self {
            host: args
                .host
                .or_else(|| var("HOST"))
                .unwrap_or_else(|| DEFAULT_HOST.into()),
            port,
            backend,
            staging_dir: args
                .staging_dir
                .or_else(|| var("UPLOAD_STAGING_DIR").map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            max_upload_bytes,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(var: &F, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    var(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .with_context(|| format!("parsing {} value `{}`", name, value))
        })
        .transpose()
}
