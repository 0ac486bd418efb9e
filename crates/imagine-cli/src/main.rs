use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use imagine_contracts::events::EventWriter;
use imagine_contracts::interaction::InteractionSurface;
use imagine_engine::{
    build_provider, DirectoryArtifactWriter, EngineConfig, ImageAcquirer, Session, SessionError,
};

mod console;

use console::{wait_for_any_key, ConsoleSurface};

#[derive(Debug, Parser)]
#[command(
    name = "imagine",
    version,
    about = "Generate images with Azure OpenAI, OpenAI or Google AI"
)]
struct Cli {
    /// Directory for generated images (defaults to the system temp directory).
    #[arg(long)]
    out: Option<PathBuf>,
    /// JSONL session log (defaults to `<out>/imagine-events.jsonl`).
    #[arg(long)]
    events: Option<PathBuf>,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("imagine error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let out_dir = cli.out.unwrap_or_else(std::env::temp_dir);
    let events_path = cli
        .events
        .unwrap_or_else(|| out_dir.join("imagine-events.jsonl"));
    let config = EngineConfig::from_env();

    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut surface = ConsoleSurface::new(stdin.lock(), io::stdout(), interactive);
    surface.info("Imagine image generator");
    surface.info(&format!("Images are saved to {}", out_dir.display()));

    let result = Session::new(
        &mut surface,
        EventWriter::for_new_session(&events_path),
        ImageAcquirer::http(config.request_timeout),
        Box::new(DirectoryArtifactWriter::new(&out_dir)),
    )
    .run(|settings| build_provider(settings, &config));

    match result {
        Ok(_) | Err(SessionError::Configuration(_)) => {}
        Err(SessionError::Interaction(err)) => return Err(err),
    }

    surface.info("Press any key to exit...");
    wait_for_any_key(interactive)?;
    Ok(0)
}
