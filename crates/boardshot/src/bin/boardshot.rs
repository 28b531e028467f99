use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use boardshot::fen::{ActiveColor, CastlingRights, Perspective};
use boardshot::io::{BoardshotConfig, DetectReport};
use boardshot::{ErrorKind, PipelineError, PipelineOutput, PipelineStage};
use clap::Parser;
use serde::Serialize;

#[cfg(feature = "tracing")]
use boardshot::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use boardshot::core::{init_with_level, level_from_verbosity};

/// Read a chess position from a screenshot and print its FEN.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Screenshot (PNG, JPEG or WebP). Overrides `image_path` from --config.
    image: Option<PathBuf>,

    /// Ensemble weights JSON. Overrides `models_path` from --config.
    #[arg(short, long)]
    models: Option<PathBuf>,

    /// JSON run configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Black is to move.
    #[arg(long)]
    black_to_move: bool,

    /// Castling availability, e.g. `KQkq`, `Kq` or `-`.
    #[arg(long)]
    castling: Option<CastlingRights>,

    /// The screenshot shows the board from Black's side.
    #[arg(long)]
    black_bottom: bool,

    /// Write the annotated overlay PNG here.
    #[arg(long)]
    annotated: Option<PathBuf>,

    /// Write the JSON report here.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write one PNG per diagnostic stage into this directory.
    #[arg(long)]
    stages: Option<PathBuf>,

    /// Fail instead of analysing the whole image when no board is located.
    #[arg(long)]
    no_fallback: bool,

    /// Print the prediction as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct StageEntry<'a> {
    key: &'a str,
    title: &'a str,
    description: &'a str,
    image: Option<String>,
}

fn init_logging(verbosity: u8) {
    #[cfg(feature = "tracing")]
    {
        let _ = verbosity;
        init_tracing(false);
        let _ = tracing_log::LogTracer::init();
    }
    #[cfg(not(feature = "tracing"))]
    {
        if std::env::var_os("RUST_LOG").is_some() {
            env_logger::init();
        } else {
            let _ = init_with_level(level_from_verbosity(verbosity));
        }
    }
}

fn config_from_args(args: &Args) -> Result<BoardshotConfig, Box<dyn std::error::Error>> {
    let mut cfg = match &args.config {
        Some(path) => BoardshotConfig::load_json(path)?,
        None => BoardshotConfig::new(String::new(), String::new()),
    };
    if let Some(image) = &args.image {
        cfg.image_path = image.to_string_lossy().into_owned();
    }
    if let Some(models) = &args.models {
        cfg.models_path = models.to_string_lossy().into_owned();
    }
    if cfg.image_path.is_empty() || cfg.models_path.is_empty() {
        return Err("an image and a models file are required (positional IMAGE and --models, or --config)".into());
    }

    if args.black_to_move {
        cfg.state.active_color = ActiveColor::Black;
    }
    if let Some(castling) = args.castling {
        cfg.state.castling = castling;
    }
    if args.black_bottom {
        cfg.state.perspective = Perspective::BlackBottom;
    }
    if args.no_fallback {
        cfg.pipeline.fallback_to_full_image = false;
    }
    if let Some(path) = &args.annotated {
        cfg.annotated_path = Some(path.to_string_lossy().into_owned());
    }
    if let Some(path) = &args.report {
        cfg.report_path = Some(path.to_string_lossy().into_owned());
    }
    if let Some(path) = &args.stages {
        cfg.stages_dir = Some(path.to_string_lossy().into_owned());
    }
    Ok(cfg)
}

fn write_stages(dir: &Path, stages: &[PipelineStage]) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;
    let mut entries = Vec::with_capacity(stages.len());
    for (idx, stage) in stages.iter().enumerate() {
        let key = stage.key.as_str();
        let image = match &stage.image {
            Some(img) => {
                let name = format!("{idx:02}_{key}.png");
                img.save(dir.join(&name))?;
                Some(name)
            }
            None => None,
        };
        entries.push(StageEntry {
            key,
            title: stage.title,
            description: &stage.description,
            image,
        });
    }
    fs::write(dir.join("stages.json"), serde_json::to_string_pretty(&entries)?)?;
    log::info!("wrote {} stages to {}", stages.len(), dir.display());
    Ok(())
}

fn print_output(out: &PipelineOutput, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let response = out.response();
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("fen: {}", response.fen_standard);
    println!("simplified: {}", response.fen);
    println!(
        "confidence: mean {:.1}%, min {:.1}%{}",
        100.0 * response.confidence,
        100.0 * response.min_confidence,
        if response.high_confidence { "" } else { " (verify manually)" }
    );
    for alert in &response.low_confidence_squares {
        println!(
            "  low confidence: {} {} ({:.1}%)",
            alert.square,
            alert.piece,
            100.0 * alert.confidence
        );
    }
    println!("lichess: {}", response.links.lichess_analysis);
    println!("chess.com: {}", response.links.chesscom);
    Ok(())
}

fn run(args: &Args) -> Result<Result<(), PipelineError>, Box<dyn std::error::Error>> {
    let cfg = config_from_args(args)?;
    let ensemble = Arc::new(cfg.load_ensemble()?);
    log::info!(
        "loaded {} models: {}",
        ensemble.len(),
        ensemble.member_names().join(", ")
    );
    let pipeline = cfg.build_pipeline(Arc::clone(&ensemble));
    let mut report = DetectReport::new(&cfg, &ensemble);

    let bytes = fs::read(&cfg.image_path)?;
    let result = match &cfg.stages_dir {
        Some(dir) => match pipeline.decode(&bytes) {
            Ok(image) => {
                let run = pipeline.run_with_diagnostics(&image, &cfg.state);
                write_stages(Path::new(dir), &run.stages)?;
                run.result
            }
            Err(err) => Err(err),
        },
        None => pipeline.run_bytes(&bytes, &cfg.state),
    };

    let outcome = match result {
        Ok(out) => {
            report.set_output(&out);
            if let Some(path) = &cfg.annotated_path {
                out.report.annotated.save(path)?;
            }
            print_output(&out, args.json)?;
            Ok(())
        }
        Err(err) => {
            report.set_error(&err);
            Err(err)
        }
    };

    if cfg.report_path.is_some() {
        let path = cfg.report_path();
        report.write_json(&path)?;
        log::info!("report written to {}", path.display());
    }
    Ok(outcome)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(err)) => {
            eprintln!("error: {err}");
            match err.kind() {
                ErrorKind::InputQuality => ExitCode::from(2),
                ErrorKind::Internal => ExitCode::FAILURE,
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
