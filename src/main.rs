use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use headsearch::config::CONFIG;
use headsearch::panel::Key;
use headsearch::render;
use headsearch::widget::{SearchWidget, WidgetEvent};

/// Live header search in the terminal. Each line typed is the new value of
/// the search input; lines starting with ':' are commands (:toggle, :close,
/// :esc, :enter, :pick N, :show, :quit).
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON search endpoint
    #[arg(long)]
    endpoint: Option<String>,

    #[arg(long)]
    debounce_ms: Option<u64>,

    #[arg(long)]
    min_query_len: Option<usize>,

    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Full results page opened on :enter
    #[arg(long)]
    results_path: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Also bridges the `log` records emitted by the library.
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = (*CONFIG).clone();
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(ms) = args.debounce_ms {
        config.debounce_ms = ms;
    }
    if let Some(len) = args.min_query_len {
        config.min_query_len = len;
    }
    if let Some(ms) = args.timeout_ms {
        config.request_timeout_ms = ms;
    }
    if let Some(path) = args.results_path {
        config.results_path = path;
    }

    let widget = SearchWidget::connect(config)?;
    let printer = tokio::spawn(print_events(widget.subscribe()));

    widget.click_toggle().await;
    println!("search open, type a query (:quit to exit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(command) = line.strip_prefix(':') else {
            widget.input(&line).await;
            continue;
        };

        let mut parts = command.split_whitespace();
        match parts.next().unwrap_or_default() {
            "toggle" | "open" => {
                widget.click_toggle().await;
            }
            "close" => {
                widget.click_close().await;
            }
            "esc" => {
                widget.key(Key::Escape).await;
            }
            "enter" => {
                widget.key(Key::Enter).await;
            }
            "pick" => {
                let picked = match parts.next().and_then(|n| n.parse::<usize>().ok()) {
                    Some(n) if n > 0 => widget.pick_shown(n - 1).await,
                    _ => None,
                };
                match picked {
                    Some(pick) => println!("searching for {:?}", pick.query),
                    None => println!("nothing to pick"),
                }
            }
            "show" => {
                let surface = widget.snapshot().await;
                println!(
                    "panel: {:?}, input: {:?}, searching: {}",
                    widget.panel_state().await,
                    surface.input.text,
                    surface.input.searching
                );
                match surface.shown_model() {
                    Some(model) => print!("{}", render::to_text(model)),
                    None => println!("(no results shown)"),
                }
            }
            "quit" | "q" => break,
            other => println!("unknown command :{other}"),
        }
    }

    widget.shutdown().await;
    printer.abort();
    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<WidgetEvent>) {
    loop {
        match events.recv().await {
            Ok(WidgetEvent::Rendered(model)) => print!("{}", render::to_text(&model)),
            Ok(WidgetEvent::Cleared) => println!("(results hidden)"),
            Ok(WidgetEvent::Navigated(location)) => println!("-> {location}"),
            Ok(WidgetEvent::Searching(true)) => println!("searching..."),
            Ok(WidgetEvent::Searching(false)) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("dropped {n} widget events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
