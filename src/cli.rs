use crate::{
    config::Config,
    detector,
    pipeline::{IncomingFile, Pipeline, load_job_report},
    server::{self, AppState, JobResponse},
    util::ensure_dir,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "face-intake")]
#[command(about = "Photo intake pipeline (upload + face-count quality gate + policy)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./face-intake.toml if present,
    /// then ./face-intake.example.toml, then built-in defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the configured face detector loads.
    Doctor {},
    /// Run one batch of local photos through the pipeline.
    Intake {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        jobs_dir: Option<PathBuf>,
    },
    /// Print the stored report of a job.
    Show {
        #[arg(long)]
        job: String,
        #[arg(long)]
        jobs_dir: Option<PathBuf>,
    },
    /// Serve the HTTP API.
    Serve {
        #[arg(long)]
        addr: Option<String>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    match &args.cmd {
        Command::Doctor {} => {
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;
            doctor(&cfg)
        }
        Command::Intake { inputs, jobs_dir } => {
            if let Some(dir) = jobs_dir {
                cfg.paths.jobs_dir = dir.display().to_string();
            }
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;
            intake(&cfg, inputs)
        }
        Command::Show { job, jobs_dir } => {
            if let Some(dir) = jobs_dir {
                cfg.paths.jobs_dir = dir.display().to_string();
            }
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;
            show(&cfg, job)
        }
        Command::Serve { addr } => {
            if let Some(addr) = addr {
                cfg.server.addr = addr.clone();
            }
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;
            serve(&cfg)
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    ["face-intake.toml", "face-intake.example.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn init_logging(
    args: &Args,
    cfg: &Config,
    file_path: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn doctor(cfg: &Config) -> Result<()> {
    let backend = cfg.detector.backend;
    let model_path = match backend {
        crate::config::DetectorBackend::Cascade => &cfg.detector.cascade.model_path,
        crate::config::DetectorBackend::Neural => &cfg.detector.neural.model_path,
    };
    let loaded = detector::from_config(cfg);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "backend": backend,
            "model_path": model_path,
            "ok": loaded.is_ok(),
            "error": loaded.as_ref().err().map(|e| e.to_string()),
        }))?
    );
    loaded.map(|_| ()).context("detector check failed")
}

fn intake(cfg: &Config, inputs: &[PathBuf]) -> Result<()> {
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        let bytes = std::fs::read(input)
            .with_context(|| format!("reading input: {}", input.display()))?;
        let filename = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push(IncomingFile { filename, bytes });
    }

    let detector = detector::from_config(cfg).context("loading face detector")?;
    let pipeline = Pipeline::new(cfg, detector);
    let out = pipeline.run_job(files)?;

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(out.job.root.join("effective-config.toml"), raw)?;
    }

    info!("job_id={} report={}", out.job.id, out.job.report_path().display());
    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&JobResponse::from(out.report))?
        );
    }
    Ok(())
}

fn show(cfg: &Config, job: &str) -> Result<()> {
    let report = load_job_report(Path::new(&cfg.paths.jobs_dir), job)
        .with_context(|| format!("loading report for job {job}"))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn serve(cfg: &Config) -> Result<()> {
    let detector = detector::from_config(cfg).context("loading face detector")?;
    let state = AppState::new(cfg, detector);
    let app = server::create_app(state);
    let addr = cfg.server.addr.clone();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    runtime.block_on(async move {
        info!("listening on http://{addr}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding {addr}"))?;
        axum::serve(listener, app).await.context("server error")
    })
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }

    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }

    Some(PathBuf::from(&cfg.paths.jobs_dir).join("face-intake.log"))
}
