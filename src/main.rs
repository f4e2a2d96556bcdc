use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use kdam::{tqdm, BarExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use threadfinder_client::config::parse_endpoint;
use threadfinder_client::render::OverlayStyle;
use threadfinder_client::{
    annotated_file_name, init_tracing, EntryHandle, HoverTarget, HttpRecognitionClient, OverlayHandle,
    RecognitionParams, RecognitionSession, RequestTicket, SelectedFile, Settings,
};

#[derive(Parser, Debug)]
#[command(name = "threadfinder", version, about = "Face recognition client for a /recognize service")]
struct Cli {
    /// Service base url (overrides THREADFINDER_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(flatten)]
    params: ParamArgs,

    /// Maximum displayed width; 0 for no limit
    #[arg(long, global = true)]
    display_width: Option<u32>,

    /// Maximum displayed height; 0 for no limit
    #[arg(long, global = true)]
    display_height: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ParamArgs {
    /// Match threshold, lower is stricter
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    /// Ignore faces narrower than this percentage of the image width
    #[arg(long, global = true)]
    min_face_width_percentage: Option<f64>,

    /// Ignore faces shorter than this percentage of the image height
    #[arg(long, global = true)]
    min_face_height_percentage: Option<f64>,

    /// Process at most this many faces; 0 for no limit
    #[arg(long, global = true)]
    max_faces: Option<u32>,
}

impl ParamArgs {
    fn apply(&self, params: &mut RecognitionParams) {
        if let Some(tolerance) = self.tolerance {
            params.tolerance = tolerance;
        }
        if let Some(width) = self.min_face_width_percentage {
            params.min_face_width_percentage = width;
        }
        if let Some(height) = self.min_face_height_percentage {
            params.min_face_height_percentage = height;
        }
        if let Some(max_faces) = self.max_faces {
            params.max_faces = max_faces;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize faces in one image and write an annotated copy
    Recognize {
        file: PathBuf,
        /// Output image (default: <output dir>/<name>_annotated.png)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Highlight the face with this id
        #[arg(long)]
        highlight: Option<String>,
        /// Print overlay geometry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recognize several images, one request at a time
    Batch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Line-driven session: open, set, reprocess, hover, save
    Interactive,
}

type HttpSession = RecognitionSession<HttpRecognitionClient>;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;
    if let Some(endpoint) = &cli.endpoint {
        settings.endpoint = parse_endpoint(endpoint)?;
    }
    if let Some(width) = cli.display_width {
        settings.display.max_width = width;
    }
    if let Some(height) = cli.display_height {
        settings.display.max_height = height;
    }
    let mut params = RecognitionParams::default();
    cli.params.apply(&mut params);

    let client = HttpRecognitionClient::new(settings.endpoint.clone(), settings.request_timeout)
        .context("failed to build http client")?;
    info!("using {}", client.endpoint());
    let mut session = RecognitionSession::new(client, params);

    match cli.command {
        Command::Recognize { file, out, highlight, json } => {
            recognize(&mut session, &settings, &file, out, highlight, json).await
        }
        Command::Batch { files, out_dir } => {
            let out_dir = out_dir.unwrap_or_else(|| settings.output_dir.clone());
            batch(&mut session, &settings, &files, &out_dir).await
        }
        Command::Interactive => interactive(&mut session, &settings).await,
    }
}

async fn recognize(
    session: &mut HttpSession,
    settings: &Settings,
    path: &Path,
    out: Option<PathBuf>,
    highlight: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let file = SelectedFile::from_path(path).await?;
    let ticket = session.select_file(Some(file))?.context("no request was started")?;
    let outcome = session.run(ticket, &settings.display).await;

    if let Some(id) = highlight {
        hover(session, "box", &id, true);
    }
    print_view(session);
    if json {
        println!("{}", serde_json::to_string_pretty(&session.view().annotations)?);
    }

    let out = out.unwrap_or_else(|| settings.output_dir.join(annotated_file_name(&session_file_name(session))));
    save_composed(session, &out)?;
    Ok(if outcome.is_ok() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn batch(session: &mut HttpSession, settings: &Settings, files: &[PathBuf], out_dir: &Path) -> Result<ExitCode> {
    let mut bar = tqdm!(total = files.len(), desc = "recognizing", animation = "ascii");
    let mut failures = 0usize;

    for path in files {
        let label = path.display().to_string();
        bar.set_postfix(label.clone());
        match batch_one(session, settings, path, out_dir).await {
            Ok(count) => info!("{}: {} face(s)", label, count),
            Err(err) => {
                failures += 1;
                bar.write(format!("{label}: {err:#}"))?;
            }
        }
        bar.update(1)?;
    }
    eprintln!();
    println!("{} of {} image(s) processed", files.len() - failures, files.len());
    Ok(if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn batch_one(session: &mut HttpSession, settings: &Settings, path: &Path, out_dir: &Path) -> Result<usize> {
    let file = SelectedFile::from_path(path).await?;
    let ticket = session.select_file(Some(file))?.context("no request was started")?;
    let count = session.run(ticket, &settings.display).await?;
    if !session.view().panel.text.is_empty() && session.view().panel.is_error {
        warn!("{}: {}", path.display(), session.view().panel.text);
    }
    save_composed(session, &out_dir.join(annotated_file_name(&session_file_name(session))))?;
    Ok(count)
}

const HELP: &str = "\
commands:
  open <path>              select an image and recognize it
  set <param> <value>      tolerance | minFaceWidthPercentage | minFaceHeightPercentage | maxFaces
  params                   show current parameters
  reprocess                re-submit the selected image with current parameters
  enter <box|entry> <id>   hover over a box or list entry
  leave <box|entry> <id>   stop hovering
  show                     print the results panel
  save <path>              write the annotated image
  clear                    forget the selected image
  quit";

async fn interactive(session: &mut HttpSession, settings: &Settings) -> Result<ExitCode> {
    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };
        match (command, args) {
            ("quit" | "exit", _) => break,
            ("help", _) => println!("{HELP}"),
            ("open", _) if !args.is_empty() => {
                let path = PathBuf::from(args.join(" "));
                match SelectedFile::from_path(&path).await.and_then(|file| session.select_file(Some(file))) {
                    Ok(Some(ticket)) => submit(session, settings, ticket).await,
                    Ok(None) => {}
                    Err(err) => println!("{err}"),
                }
            }
            ("set", [key, value]) => {
                let mut params = *session.params();
                match params.set(key, value) {
                    Ok(()) => {
                        if let Err(err) = session.set_params(params) {
                            println!("{err}");
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            }
            ("params", _) => println!("{}", serde_json::to_string_pretty(session.params())?),
            ("reprocess", _) => match session.reprocess() {
                Ok(ticket) => submit(session, settings, ticket).await,
                Err(err) => println!("{err}"),
            },
            ("enter", [side, id]) => {
                hover(session, side, id, true);
                print_view(session);
            }
            ("leave", [side, id]) => {
                hover(session, side, id, false);
                print_view(session);
            }
            ("show", _) => print_view(session),
            ("save", [path]) => {
                if let Err(err) = save_composed(session, Path::new(path)) {
                    println!("{err:#}");
                }
            }
            ("clear", _) => {
                session.select_file(None)?;
                println!("selection cleared");
            }
            _ => println!("unrecognized command, try `help`"),
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn submit(session: &mut HttpSession, settings: &Settings, ticket: RequestTicket) {
    println!("{}", ticket.kind.busy_text());
    // the view carries the outcome either way
    let _ = session.run(ticket, &settings.display).await;
    print_view(session);
}

fn hover(session: &mut HttpSession, side: &str, id: &str, entering: bool) {
    let Some((overlay, entry)) = session.view().annotations.links().pair_for_id(id) else {
        warn!("no face with id {}", id);
        return;
    };
    let Some(target) = hover_target(side, overlay, entry) else {
        println!("unrecognized side {side:?}, expected `box` or `entry`");
        return;
    };
    if entering {
        session.hover_enter(target);
    } else {
        session.hover_leave(target);
    }
}

fn hover_target(side: &str, overlay: OverlayHandle, entry: EntryHandle) -> Option<HoverTarget> {
    match side {
        "box" => Some(HoverTarget::Overlay(overlay)),
        "entry" => Some(HoverTarget::Entry(entry)),
        _ => None,
    }
}

fn session_file_name(session: &HttpSession) -> String {
    session.current_file().map(|file| file.name().to_owned()).unwrap_or_default()
}

fn save_composed(session: &HttpSession, out: &Path) -> Result<()> {
    let Some(image) = session.compose(&OverlayStyle::default()) else {
        return Ok(());
    };
    if let Some(parent) = out.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("cannot create {}", parent.display()))?;
    }
    image.save(out).with_context(|| format!("cannot write {}", out.display()))?;
    println!("wrote {}", out.display());
    Ok(())
}

fn print_view(session: &HttpSession) {
    let view = session.view();
    if !view.results_visible {
        return;
    }
    println!("== {}", view.image_name);
    if !view.stats.is_empty() {
        println!("{}", view.stats);
    }
    if !view.panel.text.is_empty() {
        if view.panel.is_error {
            println!("!! {}", view.panel.text);
        } else {
            println!("{}", view.panel.text);
        }
    }
    let annotations = &view.annotations;
    for (overlay, entry) in annotations.overlays.iter().zip(&annotations.entries) {
        let marker = if annotations.is_entry_highlighted(entry.handle) { '*' } else { ' ' };
        println!(
            "{marker} {:<28} [{}] box {:?} at {:.1},{:.1} size {:.1}x{:.1}",
            entry.text, entry.id, overlay.label, overlay.left, overlay.top, overlay.width, overlay.height
        );
    }
    if session.reprocess_visible() {
        println!("(reprocess available)");
    }
}
