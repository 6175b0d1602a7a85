use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use materai::error_display::{user_message_from_io, user_message_from_report};
use materai::preview::render_preview;
use materai::{ConfigManager, Pipeline, PipelineConfig, Severity, SourceFile};
use materai_cli::{Args, SpreadsheetFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, EnvFilter};

const NO_FILES_MESSAGE: &str = "Please upload at least one .txt file";

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "materai=info" } else { "warn" };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let config = ConfigManager::new(materai::APP_NAME)?;
        match config.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error writing config: {}", user_message_from_report(&e));
                std::process::exit(1);
            }
        }
    }

    if args.files.is_empty() {
        eprintln!("{}", NO_FILES_MESSAGE);
        std::process::exit(1);
    }

    Ok(None)
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load_from_path(path)?,
        None => PipelineConfig::load(materai::APP_NAME)?,
    };
    if let Some(rows) = args.preview_rows {
        config.display.preview_rows = rows;
    }
    config.validate()?;
    Ok(config)
}

fn read_source(path: &Path) -> Result<SourceFile> {
    SourceFile::from_path(path).map_err(|e| {
        eyre!(user_message_from_io(&e, Some(&path.display().to_string())))
    })
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    debug!(?config, "loaded configuration");

    let sources = args
        .files
        .iter()
        .map(|path| read_source(path))
        .collect::<Result<Vec<_>>>()?;

    let mut pipeline = Pipeline::new(config.clone()).with_sources(sources);
    if let Some(path) = &args.reference {
        if SpreadsheetFormat::from_path(path).is_none() {
            warn!(path = %path.display(), "lookup file extension not recognized, detecting format from content");
        }
        pipeline = pipeline.with_reference(read_source(path)?);
    }

    let output = pipeline.run().wrap_err("Could not create the Excel file")?;

    for notice in &output.notices {
        match notice.severity {
            Severity::Info => debug!("{}", notice),
            _ => eprintln!("{}", notice),
        }
    }

    if !args.no_preview {
        print!("{}", render_preview(&output.display, config.display.preview_rows));
    }

    let target = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&output.artifact.file_name));
    std::fs::write(&target, &output.artifact.bytes).map_err(|e| {
        eyre!(user_message_from_io(&e, Some(&target.display().to_string())))
    })?;
    println!(
        "Wrote {} rows to {}",
        output.table.height(),
        target.display()
    );

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", user_message_from_report(&e));
        std::process::exit(1);
    }
    Ok(())
}
