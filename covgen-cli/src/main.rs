mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use config::{CliOverrides, ConfigMerger};
use covgen_transform::{TransformerRegistry, Usage};
use covgen_types::worker::{CoverageWorkerData, WorkerOutcome, WorkerResponse};
use covgen_worker::{CoverageWorker, WorkerSettings, fail_fast, install_fatal_handler};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

/// Reads one `CoverageWorkerData` JSON object per stdin line and writes one response line per
/// job to stdout. Logs go to stderr.
#[derive(Debug, Parser)]
#[command(
    name = "covgen-worker",
    version,
    about = "Empty-coverage execution unit speaking newline-delimited JSON."
)]
struct Cli {
    /// Config file (default: ./covgen.toml when present).
    #[arg(long, env = "COVGEN_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Transform cache directory.
    #[arg(long, env = "COVGEN_CACHE_DIR")]
    cache_dir: Option<Utf8PathBuf>,

    /// Disable the transform cache.
    #[arg(long, default_value_t = false)]
    no_cache: bool,

    /// Module loading mode transformers are selected for.
    #[arg(long, value_enum)]
    usage: Option<UsageArg>,

    /// Line prefix treated as a comment by the built-in instrumenter (repeatable).
    #[arg(long = "comment-prefix")]
    comment_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UsageArg {
    Require,
    Import,
}

impl From<UsageArg> for Usage {
    fn from(arg: UsageArg) -> Self {
        match arg {
            UsageArg::Require => Usage::Require,
            UsageArg::Import => Usage::Import,
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = settings_from(&cli)?;
    debug!(?settings, "worker settings");

    install_fatal_handler();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start runtime")?;
    runtime.block_on(serve(settings))
}

fn settings_from(cli: &Cli) -> anyhow::Result<WorkerSettings> {
    let cwd = std::env::current_dir().context("current directory")?;
    let cwd = Utf8PathBuf::from_path_buf(cwd)
        .map_err(|p| anyhow::anyhow!("current directory is not UTF-8: {}", p.display()))?;

    let file = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_or_default(&cwd)?,
    };
    let overrides = CliOverrides {
        cache_dir: cli.cache_dir.clone(),
        no_cache: cli.no_cache,
        usage: cli.usage.map(Usage::from),
        comment_prefixes: cli.comment_prefixes.clone(),
    };
    Ok(ConfigMerger::new(file, cwd).merge(&overrides))
}

async fn serve(settings: WorkerSettings) -> anyhow::Result<()> {
    let worker = CoverageWorker::new(settings, TransformerRegistry::new());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("read job from stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let data: CoverageWorkerData = match serde_json::from_str(&line) {
            Ok(data) => data,
            Err(e) => fail_fast(format!("undecodable job: {e}")),
        };

        let path = data.path.clone();
        let outcome = match worker.worker(data).await {
            Ok(result) => WorkerOutcome::Result(result),
            Err(e) => {
                warn!(path = %path, error = %e, retryable = e.is_retryable(), "job failed");
                WorkerOutcome::Error {
                    message: e.to_string(),
                    retryable: e.is_retryable(),
                }
            }
        };

        let mut out = serde_json::to_vec(&WorkerResponse { path, outcome })
            .context("encode response")?;
        out.push(b'\n');
        stdout.write_all(&out).await.context("write response")?;
        stdout.flush().await.context("flush response")?;
    }
    Ok(())
}
