//! Terminal front end for the previewer: renders the document on every
//! transition, drives the search from line commands, and reloads when the
//! file changes on disk.

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Context;

use mdpeek::render::{Rendered, TermViewport};
use mdpeek::search::{MatcherKind, Previewer};
use mdpeek::watcher::FileMonitor;
use mdpeek::{config, markdown, render};

/// Nominal terminal height used for viewport-relative match selection.
const VIEW_LINES: usize = 40;

enum AppEvent {
    Input(String),
    InputClosed,
    Reload(PathBuf),
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--print-config") {
        let config = config::Config::default();
        match toml::to_string_pretty(&config) {
            Ok(s) => print!("{s}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("mdpeek {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("mdpeek {}", env!("CARGO_PKG_VERSION"));
        println!("A live Markdown previewer with incremental in-document search\n");
        println!("USAGE:");
        println!("    mdpeek [OPTIONS] <FILE>\n");
        println!("OPTIONS:");
        println!("    --no-watch        Don't reload when the file changes");
        println!("    --print-config    Print the default configuration to stdout");
        println!("    --version, -V     Print version information");
        println!("    --help, -h        Print this help message\n");
        println!("COMMANDS (on stdin):");
        println!("    /<text>           Search for <text>");
        println!("    mode <m>          smart | case | icase | regex");
        println!("    n, p              Next / previous match");
        println!("    c                 Close search");
        println!("    q                 Quit");
        return;
    }

    let no_watch = args.iter().any(|a| a == "--no-watch");
    let Some(file) = args.iter().skip(1).find(|a| !a.starts_with('-')) else {
        eprintln!("usage: mdpeek [OPTIONS] <FILE>");
        std::process::exit(2);
    };

    if let Err(e) = run(Path::new(file), no_watch) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(path: &Path, no_watch: bool) -> anyhow::Result<()> {
    let config = config::load();
    let mut previewer = Previewer::new(
        Duration::from_millis(config.search.debounce_ms),
        config.search.default_mode,
    );

    // The subscriber redraws on every transition and keeps the last render
    // around so navigation can query match positions.
    let last_render = Rc::new(RefCell::new(Rendered::default()));
    let sink = Rc::clone(&last_render);
    let colors = config.colors.clone();
    previewer.set_subscriber(move |update| {
        let rendered = render::render(&update.tree, &colors);
        print!("\x1b[2J\x1b[H{}", rendered.text);
        let _ = std::io::stdout().flush();
        *sink.borrow_mut() = rendered;
    });

    let tree = markdown::load(path).with_context(|| format!("cannot load {}", path.display()))?;
    previewer.on_document_rendered(tree);

    let (tx, rx) = mpsc::channel();

    let input_tx = tx.clone();
    std::thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if input_tx.send(AppEvent::Input(line)).is_err() {
                    return;
                }
            }
            let _ = input_tx.send(AppEvent::InputClosed);
        })
        .context("cannot spawn stdin reader")?;

    let monitor = if no_watch || !config.watcher.enabled {
        None
    } else {
        let reload_tx = tx.clone();
        FileMonitor::new(
            path,
            Duration::from_millis(config.watcher.debounce_ms),
            move |changed| reload_tx.send(AppEvent::Reload(changed)).is_ok(),
        )
    };
    drop(tx);

    loop {
        let event = match previewer.next_deadline() {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(timeout) {
                    Ok(event) => Some(event),
                    Err(mpsc::RecvTimeoutError::Timeout) => None,
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(event) => Some(event),
                Err(_) => break,
            },
        };

        match event {
            // Debounce deadline reached: apply the pending query.
            None => previewer.poll(Instant::now()),
            Some(AppEvent::Reload(changed)) => match markdown::load(&changed) {
                Ok(tree) => previewer.on_document_rendered(tree),
                Err(err) => log::warn!("reload of {} failed: {err}", changed.display()),
            },
            Some(AppEvent::Input(line)) => {
                if !dispatch(&mut previewer, &last_render, line.trim()) {
                    break;
                }
            }
            Some(AppEvent::InputClosed) => break,
        }
        print_status(&previewer);
    }

    if let Some(monitor) = monitor {
        monitor.shutdown();
    }
    Ok(())
}

/// Handles one stdin command. Returns `false` to quit.
fn dispatch(previewer: &mut Previewer, last_render: &Rc<RefCell<Rendered>>, line: &str) -> bool {
    if let Some(query) = line.strip_prefix('/') {
        previewer.open_search();
        previewer.set_query(query, Instant::now());
        return true;
    }
    if let Some(mode) = line.strip_prefix("mode ") {
        match parse_mode(mode.trim()) {
            Some(kind) => previewer.set_matcher(kind),
            None => println!("unknown mode {mode:?} (smart | case | icase | regex)"),
        }
        return true;
    }
    match line {
        "q" | "quit" => return false,
        "o" | "open" => previewer.open_search(),
        "c" | "close" => previewer.close_search(),
        "n" | "next" | "p" | "prev" => {
            let match_lines = last_render.borrow().match_lines.clone();
            let vq = TermViewport::new(0, VIEW_LINES, match_lines);
            let scroll = if line.starts_with('n') {
                previewer.next(&vq)
            } else {
                previewer.previous(&vq)
            };
            if let Some(request) = scroll {
                println!("→ line {:.0}", request.center_y);
            }
        }
        "" => {}
        other => println!("unknown command {other:?} (try --help)"),
    }
    true
}

fn parse_mode(name: &str) -> Option<MatcherKind> {
    match name {
        "smart" => Some(MatcherKind::SmartCase),
        "case" => Some(MatcherKind::CaseSensitive),
        "icase" => Some(MatcherKind::CaseInsensitive),
        "regex" => Some(MatcherKind::CaseSensitiveRegex),
        _ => None,
    }
}

fn print_status(previewer: &Previewer) {
    let Some(session) = previewer.session() else {
        return;
    };
    let current = session
        .current
        .map_or_else(|| "-".to_string(), |i| (i + 1).to_string());
    println!(
        "search {:?} [{:?}]: {current} / {}",
        session.query, session.kind, session.total
    );
}
