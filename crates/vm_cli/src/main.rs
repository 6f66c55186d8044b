// crates/vm_cli/src/main.rs
//
// load → (validate-only short-circuit) → seed → count → artifacts → report.
// Logs go to stderr through tracing; stdout carries only the report.

mod args;

mod exitcodes {
    pub const OK: u8 = 0;
    pub const CONFIG: u8 = 2;
    pub const IO: u8 = 4;
    pub const COUNT: u8 = 5;
}

use std::process::ExitCode;

use rand_core::{OsRng, RngCore};
use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, Args, Inputs, RenderKind};
use vm_pipeline::{load, run_election, validate, write_artifacts, InputSource, PipelineError, PipelineOutputs, RunOverrides};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Seat count, bad flags, failed validation.
    Config(String),
    /// Inputs missing, unreadable or malformed; artifacts not writable.
    Io(String),
    /// Counting, artifact building, report rendering.
    Count(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Config(m) | MainError::Io(m) | MainError::Count(m) => f.write_str(m),
        }
    }
}

fn main() -> ExitCode {
    let (args, inputs) = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("vm: error: {e}");
            let rc = if e.is_io() { exitcodes::IO } else { exitcodes::CONFIG };
            return ExitCode::from(rc);
        }
    };
    init_tracing(&args);

    let rc = match run_once(&args, inputs) {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("vm: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc)
}

fn init_tracing(args: &Args) {
    let default = match (args.quiet, args.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn map_error(e: &MainError) -> u8 {
    match e {
        MainError::Config(_) => exitcodes::CONFIG,
        MainError::Io(_) => exitcodes::IO,
        MainError::Count(_) => exitcodes::COUNT,
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Config(m) => MainError::Config(m),
        PipelineError::Ingest(m) => MainError::Io(m),
        PipelineError::Tabulate(m) | PipelineError::Build(m) => MainError::Count(m),
    }
}

fn run_once(args: &Args, inputs: Inputs) -> Result<(), MainError> {
    let (source, seats) = match inputs {
        Inputs::Files { candidates, ballots, seats } => (InputSource::Files { candidates, ballots }, Some(seats)),
        Inputs::Manifest { path, seats } => (InputSource::Manifest(path), seats),
    };
    let loaded = load::load(&source).map_err(map_pipeline_err)?;
    let mut params = loaded
        .params(RunOverrides { seats, tie_seed: args.seed })
        .map_err(map_pipeline_err)?;

    if args.validate_only {
        let report = validate::validate(&loaded.election, &params);
        report.log();
        report.ensure_pass().map_err(map_pipeline_err)?;
        if !args.quiet {
            println!("validate-only: inputs OK ({} warning(s))", report.warnings().count());
        }
        return Ok(());
    }

    if params.tie_seed.is_none() {
        let seed = OsRng.next_u64();
        tracing::info!(seed, "no tie seed given; drew one from OS entropy");
        params.tie_seed = Some(seed);
    }

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let outs = run_election(&loaded.election, &params, &timestamp).map_err(map_pipeline_err)?;

    if let Some(dir) = &args.out {
        std::fs::create_dir_all(dir).map_err(|e| MainError::Io(format!("mkdir {}: {e}", dir.display())))?;
        write_artifacts(dir, &outs).map_err(|e| match e {
            PipelineError::Build(m) => MainError::Io(m),
            other => map_pipeline_err(other),
        })?;
    }

    if !args.quiet {
        print!("{}", render(args.render, &outs)?);
    }
    Ok(())
}

fn render(kind: RenderKind, outs: &PipelineOutputs) -> Result<String, MainError> {
    let render_err = |e: &dyn std::fmt::Display| MainError::Count(format!("report: {e}"));
    let result = serde_json::to_value(&outs.result).map_err(|e| render_err(&e))?;
    let run = serde_json::to_value(&outs.run_record).map_err(|e| render_err(&e))?;
    let model = vm_report::build_report_model(&result, Some(&run)).map_err(|e| render_err(&e))?;
    match kind {
        RenderKind::Text => Ok(vm_report::render_text(&model)),
        RenderKind::Json => render_json(&model).map_err(|e| render_err(&e)),
    }
}

#[cfg(feature = "report-json")]
fn render_json(model: &vm_report::ReportModel) -> Result<String, serde_json::Error> {
    let mut s = serde_json::to_string_pretty(&vm_report::render_report_json(model))?;
    s.push('\n');
    Ok(s)
}

#[cfg(not(feature = "report-json"))]
fn render_json(_model: &vm_report::ReportModel) -> Result<String, &'static str> {
    Err("built without the report-json feature")
}
