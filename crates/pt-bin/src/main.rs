//! Patina entrypoint: a replay harness.
//!
//! The production collaborators (PTY spawn, window surface, fonts,
//! clipboard) live in host front-ends; this binary drives the semantic
//! core directly from a captured byte stream — a file, or stdin piped
//! from `script`/`tmux` captures — and prints the resulting screen.
//! Invaluable for debugging escape-sequence handling: replay a
//! capture, diff the snapshot.

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use core_events::{Event, EventSourceRegistry, TickEventSource, EVENT_CHANNEL_CAP, PTY_CHUNK_MAX};
use core_term::{Term, TermEvent};
use core_vt::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

/// CLI arguments.
#[derive(ClapParser, Debug)]
#[command(name = "patina", version, about = "Terminal core replay harness")]
struct Args {
    /// Byte stream to replay; `-` or absent reads stdin.
    pub input: Option<PathBuf>,
    /// Screen columns.
    #[arg(long, default_value_t = 80)]
    pub cols: usize,
    /// Screen rows.
    #[arg(long, default_value_t = 24)]
    pub rows: usize,
    /// Optional configuration file (overrides `patina.toml` discovery).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Echo the core's replies (DA, DSR, OSC responses) to stderr.
    #[arg(long)]
    pub show_replies: bool,
    /// Print cursor/title/mode state after the snapshot.
    #[arg(long)]
    pub state: bool,
}

fn init_logging() -> Option<WorkerGuard> {
    let log_dir = std::env::var_os("PATINA_LOG_DIR").map(PathBuf::from)?;
    let file_appender = tracing_appender::rolling::never(log_dir, "patina.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging();

    let mut config = core_config::load_from(args.config.clone())?;
    config.apply_context(core_config::ConfigContext::detect());
    info!(
        target: "runtime.startup",
        cols = args.cols,
        rows = args.rows,
        scrollback = config.file.scrollback_lines,
        "replay starting"
    );

    let mut term = Term::new(args.cols, args.rows, config.file.scrollback_lines);
    let mut parser = Parser::new();

    let (tx, mut rx) = mpsc::channel::<Event>(EVENT_CHANNEL_CAP);
    let mut registry = EventSourceRegistry::new();
    registry.register(TickEventSource::new(Duration::from_millis(500)));
    registry.register(ReplaySource {
        input: args.input.clone(),
    });
    let handles = registry.spawn_all(&tx);
    drop(tx);

    let mut bytes_total = 0usize;
    while let Some(event) = rx.recv().await {
        match event {
            Event::PtyData(chunk) => {
                bytes_total += chunk.len();
                parser.advance(&mut term, &chunk);
                let replies = term.take_output();
                if args.show_replies && !replies.is_empty() {
                    eprint!("{}", String::from_utf8_lossy(&replies));
                }
                for ev in term.take_events() {
                    if let TermEvent::TitleChanged(title) = ev {
                        debug!(target: "runtime", %title, "title changed");
                    }
                }
            }
            Event::PtyClosed | Event::Shutdown => break,
            Event::Tick => {}
            other => {
                debug!(target: "runtime", ?other, "unhandled replay event");
            }
        }
    }
    for handle in handles {
        handle.abort();
    }

    info!(target: "runtime", bytes_total, "replay finished");
    print_snapshot(&term);
    if args.state {
        print_state(&term);
    }
    Ok(())
}

/// Event source feeding the captured byte stream in PTY-sized chunks.
struct ReplaySource {
    input: Option<PathBuf>,
}

impl core_events::AsyncEventSource for ReplaySource {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn spawn(self: Box<Self>, tx: mpsc::Sender<Event>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let result = match &self.input {
                Some(path) if path.as_os_str() != "-" => tokio::fs::read(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))
                    .map(Some),
                _ => Ok(None),
            };

            match result {
                Ok(Some(bytes)) => {
                    for chunk in bytes.chunks(PTY_CHUNK_MAX) {
                        if tx.send(Event::PtyData(chunk.to_vec())).await.is_err() {
                            return;
                        }
                    }
                }
                Ok(None) => {
                    let mut stdin = tokio::io::stdin();
                    let mut buf = vec![0u8; PTY_CHUNK_MAX];
                    loop {
                        match stdin.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                if tx.send(Event::PtyData(buf[..n].to_vec())).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::error!(target: "runtime", %err, "replay input failed");
                }
            }
            let _ = tx.send(Event::PtyClosed).await;
        })
    }
}

fn print_snapshot(term: &Term) {
    let grid = term.grid();
    println!("┌{}┐", "─".repeat(term.cols()));
    for r in 0..term.rows() {
        let mut line = String::with_capacity(term.cols());
        if let Some(row) = grid.row_in_view(r) {
            for cell in row.cells() {
                if cell.is_spacer() {
                    continue;
                }
                match cell.codepoint() {
                    Some('\t') => line.push(' '),
                    Some(c) => line.push(c),
                    None if cell.is_composed() => {
                        if let Some(chars) = term.composed().lookup(cell.content) {
                            line.extend(chars.iter());
                        }
                    }
                    None => line.push(' '),
                }
            }
        } else {
            line.push_str(&" ".repeat(term.cols()));
        }
        println!("│{line:<width$}│", width = term.cols());
    }
    println!("└{}┘", "─".repeat(term.cols()));
}

fn print_state(term: &Term) {
    let cursor = term.cursor();
    println!("cursor: row={} col={}", cursor.row, cursor.col);
    println!("title: {:?}", term.title());
    println!("alt-screen: {}", term.alt_screen_active());
    let modes = term.modes();
    println!(
        "modes: autowrap={} origin={} bracketed-paste={} mouse={:?}",
        modes.auto_margin, modes.origin, modes.bracketed_paste, modes.mouse_tracking
    );
    println!("sixels: {}", term.grid().sixels.len());
}
