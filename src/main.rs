use anyhow::{Context, Result, bail};
use cast_cards::castlist;
use cast_cards::pipeline::{BuildOptions, CastlistBuilder, PlayerRecord};
use cast_cards::portrait::{NullDetector, RustfaceDetector, SubjectDetector};
use cast_cards::{cards, players};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cast-cards")]
#[command(about = "Turn a cast-list spreadsheet into player files and mic-card PDFs")]
#[command(long_about = "\
Turn a cast-list spreadsheet into player files and mic-card PDFs

The cast list is a CSV with a header row. Recognized columns:

  Real Name   performer name
  Character   role name
  Comments    free text shown on the card
  Image       portrait: a local path (relative to the CSV) or a URL
  Crop        1 = crop around the detected face (default on)
  Resize      1 = bound the longer edge to 512 px
  Channel     mic channel label

A row needs at least one of Real Name/Character; rows with neither are
skipped. A missing or broken Image never fails the build — the bundled
default portrait is used instead.

Face cropping needs a SeetaFace model file (--face-model); without one,
portraits are carried through uncropped.")]
#[command(version)]
struct Cli {
    /// SeetaFace model file enabling subject-aware cropping
    #[arg(long, global = true, value_name = "PATH")]
    face_model: Option<PathBuf>,

    /// Treat rows without a Resize cell as resize-enabled
    #[arg(long, global = true)]
    resize_default: bool,

    /// Abort the build on the first portrait-processing failure
    #[arg(long, global = true)]
    fail_fast: bool,

    /// Timeout in seconds for remote image fetches
    #[arg(long, global = true, default_value_t = 30, value_name = "SECS")]
    fetch_timeout: u64,

    /// Overwrite existing output files
    #[arg(long, global = true)]
    force: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a WaveTool player list (.pla)
    Players {
        castlist: PathBuf,
        output: PathBuf,
    },
    /// Build a PDF of mic cards
    Cards {
        castlist: PathBuf,
        output: PathBuf,
    },
    /// Build both artifacts from a single pipeline run
    Build {
        castlist: PathBuf,
        /// Player-list output path
        #[arg(long, value_name = "FILE")]
        players: Option<PathBuf>,
        /// Mic-card PDF output path
        #[arg(long, value_name = "FILE")]
        cards: Option<PathBuf>,
    },
    /// Normalize the cast list and print the entries as JSON
    Check { castlist: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Players { castlist, output } => {
            run_build(&cli, castlist, Some(output.as_path()), None)?;
        }
        Command::Cards { castlist, output } => {
            run_build(&cli, castlist, None, Some(output.as_path()))?;
        }
        Command::Build {
            castlist,
            players,
            cards,
        } => {
            if players.is_none() && cards.is_none() {
                bail!("nothing to build: pass --players and/or --cards");
            }
            run_build(&cli, castlist, players.as_deref(), cards.as_deref())?;
        }
        Command::Check { castlist } => {
            let entries = read_entries(castlist, cli.resize_default)?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}

fn read_entries(path: &Path, resize_default: bool) -> Result<Vec<castlist::CastEntry>> {
    castlist::read_castlist(path, resize_default)
        .with_context(|| format!("could not read cast list {}", path.display()))
}

fn run_build(
    cli: &Cli,
    castlist_path: &Path,
    players_out: Option<&Path>,
    cards_out: Option<&Path>,
) -> Result<()> {
    for output in [players_out, cards_out].into_iter().flatten() {
        guard_overwrite(output, cli.force)?;
    }

    let entries = read_entries(castlist_path, cli.resize_default)?;
    println!(
        "==> Cast list: {} members from {}",
        entries.len(),
        castlist_path.display()
    );

    let detector = build_detector(cli)?;
    let options = BuildOptions {
        fetch_timeout: Duration::from_secs(cli.fetch_timeout),
        fail_fast: cli.fail_fast,
        ..BuildOptions::default()
    };
    let base_dir = castlist_path.parent().unwrap_or(Path::new("."));
    let builder = CastlistBuilder::new(detector.as_ref(), options);
    let records: Vec<PlayerRecord> = builder.build(&entries, base_dir)?;

    if let Some(path) = players_out {
        players::write_players_file(&records, path)
            .with_context(|| format!("could not write player list {}", path.display()))?;
        println!("==> Player list: {}", path.display());
    }
    if let Some(path) = cards_out {
        cards::render_cards_file(&records, path)
            .with_context(|| format!("could not write mic cards {}", path.display()))?;
        println!("==> Mic cards: {} ({} pages)", path.display(), records.len());
    }

    Ok(())
}

fn build_detector(cli: &Cli) -> Result<Box<dyn SubjectDetector>> {
    match &cli.face_model {
        Some(path) => {
            let detector = RustfaceDetector::from_model(path)
                .with_context(|| format!("could not load face model {}", path.display()))?;
            Ok(Box::new(detector))
        }
        None => {
            tracing::info!("no face model configured; portraits will not be cropped");
            Ok(Box::new(NullDetector))
        }
    }
}

fn guard_overwrite(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "output file {} already exists (pass --force to overwrite)",
            path.display()
        );
    }
    Ok(())
}
