//! Interactive driver for the caret tracker and phrase matcher.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Build a [`ContextManager`] from the config: matcher thresholds plus
//!    the user's persisted word/fix tables.
//! 4. Build the host collaborators (key presser + clipboard reader) with
//!    the config's timing.
//! 5. Read commands from stdin until EOF.
//!
//! # Commands
//!
//! | Command | Effect |
//! |---------|--------|
//! | `insert <text>` | Dictate text at the caret (`\n` inserts a newline) |
//! | `key <descriptors>` | Replay key descriptors, e.g. `key ctrl-left:2` |
//! | `select <words…>` | Find and select a phrase; prints the key plan |
//! | `correct <words…>` | Replace the closest phrase with the given words |
//! | `repair <words…>` | Apply a self-repair of the just-dictated words |
//! | `homophone <a> <b>` | Register a homophone pair |
//! | `resync <text>` | Simulate a host resync (caret at the end) |
//! | `sync` | Read the focused window's text via the clipboard and resync |
//! | `state` | Print buffer text, caret state and selection |
//! | `quit` | Exit |

use std::io::{self, BufRead, Write};

use anyhow::Result;
use voice_caret::caret::CaretState;
use voice_caret::config::AppConfig;
use voice_caret::context::ContextManager;
use voice_caret::host::{ClipboardReader, EnigoPresser, FocusedTextReader};

fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("voice-caret driver starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Context manager: thresholds + persisted word/fix tables
    let mut manager = ContextManager::with_config(&config);

    // 4. Host collaborators with the configured timing
    let presser = EnigoPresser::with_delay(config.host.key_batch_delay_ms);
    let mut reader = ClipboardReader::new(presser);
    reader.settle_ms = config.host.clipboard_settle_ms;

    // 5. Command loop
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("> ");
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            match run_command(&mut manager, &mut reader, trimmed) {
                Ok(Outcome::Continue) => {}
                Ok(Outcome::Quit) => break,
                Err(e) => println!("error: {e}"),
            }
        }
        print!("> ");
        stdout.flush()?;
    }
    Ok(())
}

enum Outcome {
    Continue,
    Quit,
}

fn run_command(
    manager: &mut ContextManager,
    reader: &mut impl FocusedTextReader,
    line: &str,
) -> Result<Outcome> {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "insert" => {
            manager.insert_text(&rest.replace("\\n", "\n"));
            print_state(manager);
        }
        "key" => {
            manager.apply_keys(rest)?;
            print_state(manager);
        }
        "select" => {
            let words = split_words(rest);
            match manager.select_phrases(&words) {
                Some(plan) => println!("press: {plan}"),
                None => println!("phrase not found"),
            }
        }
        "correct" => {
            let words = split_words(rest);
            match manager.correct_phrases(&words) {
                Some(outcome) => {
                    println!("press: {}", outcome.plan);
                    println!("type:  {:?}", outcome.replacement);
                    print_state(manager);
                }
                None => println!("phrase not found"),
            }
        }
        "repair" => {
            let words = split_words(rest);
            match manager.apply_self_repair(&words) {
                Some(outcome) => {
                    println!("repaired with {:?}", outcome.replacement);
                    print_state(manager);
                }
                None => println!("no self-repair detected"),
            }
        }
        "homophone" => {
            let words = split_words(rest);
            if let [a, b] = words.as_slice() {
                manager.engine_mut().add_homophone(a, b);
                println!("registered {a} ~ {b}");
            } else {
                println!("usage: homophone <a> <b>");
            }
        }
        "resync" => {
            let text = rest.replace("\\n", "\n");
            manager.index_content(&text, Some((last_line_of(&text), 0)), None);
            print_state(manager);
        }
        "sync" => match reader.read_focused_text()? {
            Some(host_text) => {
                manager.index_content(&host_text.text, host_text.caret, host_text.selection_caret);
                print_state(manager);
            }
            None => println!("host reported no focused text"),
        },
        "state" => print_state(manager),
        "quit" | "exit" => return Ok(Outcome::Quit),
        other => println!("unknown command '{other}'"),
    }
    Ok(Outcome::Continue)
}

fn split_words(rest: &str) -> Vec<String> {
    rest.split_whitespace().map(str::to_string).collect()
}

fn last_line_of(text: &str) -> usize {
    text.chars().filter(|c| *c == '\n').count()
}

fn print_state(manager: &ContextManager) {
    let buffer = manager.buffer();
    println!("text:  {:?}", buffer.text());
    match buffer.caret_state() {
        CaretState::Unknown => println!("caret: unknown"),
        state => println!("caret: {state}"),
    }
    if let Some((start, end)) = buffer.selection_range() {
        let selected: String = buffer
            .text()
            .chars()
            .skip(start)
            .take(end - start)
            .collect();
        println!("selection: {selected:?}");
    }
    if manager.needs_resync() {
        println!("(resync from host recommended)");
    }
}
