use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Parser;
use soundpad::{
    AppConfig, AssetProvider, AudioBackend, CommandDispatcher, CrashRecorder, CrashViewer,
    DirAssetProvider, EngineSession, LogRelay, RenderSink, ScrollDirective, SessionCommand,
    StubBackend, CLIPS,
};

#[derive(Parser, Debug)]
#[command(
    name = "soundpad_cli",
    about = "Interactive clip-playback demo for the soundpad session core"
)]
struct Cli {
    /// Directory containing demo audio assets and legal.txt
    #[arg(long, default_value = "assets")]
    assets_dir: PathBuf,
    /// Optional JSON config override
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Presentation context: holds the latest rendered log text, shown on
/// demand with the `show` command.
#[derive(Clone, Default)]
struct ConsoleView {
    latest: Arc<Mutex<String>>,
}

impl ConsoleView {
    fn print_latest(&self) {
        let latest = self
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        println!("---- log ----");
        print!("{}", latest);
        println!("-------------");
    }
}

impl RenderSink for ConsoleView {
    fn render(&self, text: &str) {
        *self
            .latest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = text.to_string();
    }

    fn scroll(&self, _directive: ScrollDirective) {
        // A terminal view has no scroll position to restore
    }
}

/// Crash viewer that dumps the report to stderr before the process exits.
struct StderrCrashViewer;

impl CrashViewer for StderrCrashViewer {
    fn present(&self, report: &str, log_path: &std::path::Path) {
        eprintln!("{}", report);
        eprintln!("Crash log written to {}", log_path.display());
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    CrashRecorder::new(&config.crash)
        .with_viewer(Arc::new(StderrCrashViewer))
        .install();

    let view = ConsoleView::default();
    let relay = LogRelay::new(view.clone());
    let assets: Arc<dyn AssetProvider> = Arc::new(DirAssetProvider::new(cli.assets_dir));
    let backend: Arc<dyn AudioBackend> = Arc::new(StubBackend::new());
    let session = Arc::new(EngineSession::new(
        backend,
        Arc::clone(&assets),
        Arc::clone(&relay),
        &config,
    ));
    let dispatcher = CommandDispatcher::new(session, Arc::clone(&relay), assets);

    println!("soundpad demo. Commands: play <n>, stop <n>, credits, shutdown, show, quit");
    for descriptor in CLIPS.iter() {
        let kind = if descriptor.one_shot { "effect" } else { "song" };
        println!("  {}: {} ({})", descriptor.index, descriptor.asset_name, kind);
    }

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_command(line.trim()) {
            Some(Input::Command(command)) => {
                // Fire-and-forget: the worker owns the rest
                let _ = dispatcher.dispatch(command);
            }
            Some(Input::Show) => view.print_latest(),
            Some(Input::Quit) => {
                let _ = dispatcher.dispatch(SessionCommand::Shutdown);
                break;
            }
            None => println!("Unknown command: {}", line.trim()),
        }
    }

    Ok(ExitCode::from(0))
}

enum Input {
    Command(SessionCommand),
    Show,
    Quit,
}

fn parse_command(line: &str) -> Option<Input> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "play" => parts
            .next()
            .and_then(|n| n.parse().ok())
            .map(|n| Input::Command(SessionCommand::Play(n))),
        "stop" => parts
            .next()
            .and_then(|n| n.parse().ok())
            .map(|n| Input::Command(SessionCommand::Stop(n))),
        "credits" => Some(Input::Command(SessionCommand::ShowCredits)),
        "shutdown" => Some(Input::Command(SessionCommand::Shutdown)),
        "show" => Some(Input::Show),
        "quit" | "exit" => Some(Input::Quit),
        _ => None,
    }
}
