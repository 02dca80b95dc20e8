mod app;
mod config;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use etrace_capture::{SerialCapture, load_log_file, source_name};
use etrace_tui::{Action, Event, EventHandler, KeyBindings, KeyContext, TraceTableScreen, Tui};
use etrace_view::{MemoryTraceStore, RowAnnotationStore, TraceStore, TraceView};

use crate::app::App;
use crate::config::Config;

/// etrace - A terminal viewer for live trace and log event streams
#[derive(Parser, Debug)]
#[command(name = "etrace")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log file (or earlier export) to load at startup
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Serial device to capture from, e.g. /dev/ttyUSB0 or \\.\COM7
    #[arg(long, value_name = "DEVICE")]
    serial: Option<String>,

    /// Serial baud rate (overrides the config file)
    #[arg(long)]
    baud: Option<u32>,

    /// Fade level for rows failing a filter, 0..1 (overrides the config file)
    #[arg(long)]
    fade: Option<f32>,

    /// Config file (default: $XDG_CONFIG_HOME/etrace/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    debug_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.debug_log.as_deref())?;

    let result = run_app(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn init_tracing(debug_log: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match debug_log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create debug log {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

/// Header text naming the row sources
fn source_title(args: &Args) -> String {
    let mut parts = Vec::new();
    if let Some(name) = args.file.as_deref().and_then(Path::file_name) {
        parts.push(name.to_string_lossy().into_owned());
    }
    if let Some(device) = &args.serial {
        parts.push(source_name(device).to_string());
    }
    if parts.is_empty() {
        "no source".to_string()
    } else {
        parts.join(" + ")
    }
}

async fn run_app(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    if let Some(fade) = args.fade {
        config.fade_level = fade.clamp(0.0, 1.0);
    }

    let store: Arc<dyn TraceStore> = Arc::new(MemoryTraceStore::new());
    let annotations = Arc::new(RowAnnotationStore::new());

    // The file goes first so serial rows follow it
    if let Some(path) = &args.file {
        load_log_file(path, store.as_ref(), &annotations)?;
    }

    let mut capture = args.serial.as_deref().map(|device| {
        SerialCapture::new(
            config.bridge_config(device),
            Arc::clone(&store),
            Arc::clone(&annotations),
        )
    });
    if let Some(capture) = capture.as_mut() {
        capture.start()?;
    }

    let view = TraceView::new(Arc::clone(&store), Arc::clone(&annotations))
        .with_fade_level(config.fade_level);
    let mut app = App::new(view, source_title(&args), config.export_dir.clone());
    app.on_tick();

    let result = run_ui(&mut app, &mut capture, config.tick_rate()).await;
    // Covers the paths where the terminal never came up; a no-op otherwise
    join_capture(&mut capture, result).await
}

/// Stop the capture session (waiting for its bridge) and pass `result` through
async fn join_capture<T>(capture: &mut Option<SerialCapture>, result: Result<T>) -> Result<T> {
    if let Some(capture) = capture.as_mut() {
        capture.stop().await;
    }
    result
}

async fn run_ui(app: &mut App, capture: &mut Option<SerialCapture>, tick_rate: Duration) -> Result<()> {
    let mut tui = Tui::new().context("failed to initialize terminal")?;
    let mut events = EventHandler::new(tick_rate);

    let result = event_loop(&mut tui, &mut events, app).await;

    // The bridge must be joined before the terminal is restored
    let result = join_capture(capture, result).await;
    events.shutdown().await;
    tui.restore()?;
    result
}

async fn event_loop(tui: &mut Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let keybindings = KeyBindings::new();

    render(tui, app)?;

    loop {
        let dirty = tokio::select! {
            Some(event) = events.next() => match event {
                Event::Key(key) => {
                    app.ui.message = None;
                    let action = if app.ui.is_editing() {
                        keybindings.get_input_action(&key)
                    } else {
                        keybindings.get_action(KeyContext::TraceTable, &key)
                    };
                    if let Some(action) = action {
                        let _ = action_tx.send(action);
                    }
                    false
                }
                Event::Tick => app.on_tick(),
                Event::Resize(_, _) => true,
                Event::Error(e) => {
                    app.ui.show_message(format!("Error: {}", e));
                    true
                }
            },

            Some(action) = action_rx.recv() => {
                app.handle_action(action);
                true
            }

            else => break,
        };

        if app.ui.should_quit {
            break;
        }
        if dirty {
            render(tui, app)?;
        }
    }

    Ok(())
}

fn render(tui: &mut Tui, app: &mut App) -> Result<()> {
    let App { view, ui, title, .. } = app;
    tui.terminal()
        .draw(|frame| TraceTableScreen::render(frame, view, ui, title))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use etrace_capture::{BridgeConfig, DeviceOpener};
    use std::future::Future;
    use std::io;
    use tokio::io::DuplexStream;

    struct Unplugged;

    impl DeviceOpener for Unplugged {
        type Device = DuplexStream;

        fn open(&self, _device: &str, _baud_rate: u32) -> impl Future<Output = io::Result<DuplexStream>> + Send {
            std::future::ready(Err(io::Error::new(io::ErrorKind::NotFound, "unplugged")))
        }
    }

    #[tokio::test]
    async fn test_join_capture_stops_bridge_on_error() {
        let config = BridgeConfig {
            reconnect_backoff: Duration::from_secs(30),
            ..BridgeConfig::new("COM5")
        };
        let mut capture = SerialCapture::new(
            config,
            Arc::new(MemoryTraceStore::new()),
            Arc::new(RowAnnotationStore::new()),
        );
        capture.start_with(Unplugged).unwrap();
        let mut capture = Some(capture);

        let result: Result<()> = join_capture(&mut capture, Err(anyhow::anyhow!("no terminal"))).await;

        assert!(result.is_err());
        assert!(capture.as_ref().is_some_and(|c| !c.is_running()));
        // a second join is harmless
        assert!(join_capture(&mut capture, Ok(())).await.is_ok());
    }

    #[test]
    fn test_source_title() {
        let args = Args::parse_from(["etrace", "--file", "/tmp/boot.log", "--serial", r"\\.\COM7"]);
        assert_eq!(source_title(&args), "boot.log + COM7");
        let args = Args::parse_from(["etrace"]);
        assert_eq!(source_title(&args), "no source");
    }
}
