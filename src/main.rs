// SPDX-License-Identifier: MIT
//
// conkit — an interactive viewer for the ck-term session.
//
// Draws one full-screen frame per change: a color bar, the terminal
// size, and the last keys pressed (arrow keys shown as arrows). The
// frame is redrawn when a key arrives or the terminal is resized; between
// frames the loop polls for input and naps briefly. `q` quits. However
// the loop ends, the cursor is shown again and the screen is cleared
// before the session restores the input mode.
//
//   ┌──────────────────────────────┐
//   │ gradient bar                 │  ← row 1, background colors
//   │ title + size                 │  ← rows 3-4
//   │ recent keys                  │  ← row 6
//   │ …                            │
//   │ hint                         │  ← last row
//   └──────────────────────────────┘
//
// Logging is off unless CK_LOG_FILE names a file; CK_LOG filters it
// (same syntax as RUST_LOG). Logs never go to the terminal being drawn.

use std::collections::VecDeque;
use std::env;
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use ck_term::ansi::{self, Direction};
use ck_term::platform::Platform;
use ck_term::{Config, ConsoleSize, Session, TermError};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Pause between polls when no key is waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// How many recent keys the frame shows.
const KEY_HISTORY: usize = 16;

const ENV_LOG_FILE: &str = "CK_LOG_FILE";
const ENV_LOG_FILTER: &str = "CK_LOG";

// ─── Logging ────────────────────────────────────────────────────────────────

fn init_logging() {
    let Some(path) = env::var_os(ENV_LOG_FILE) else {
        return;
    };
    let file = match File::create(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("conkit: cannot open log file {}: {e}", path.to_string_lossy());
            return;
        }
    };
    let filter = EnvFilter::try_from_env(ENV_LOG_FILTER).unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
}

// ─── Drawing ────────────────────────────────────────────────────────────────

/// One keystroke as the viewer understands it.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Key {
    Char(char),
    Arrow(Direction),
    /// An escape sequence that is not an arrow, kept verbatim.
    Sequence(String),
}

impl Key {
    /// Human-readable label: printable characters as-is, control
    /// characters in caret notation, anything else as a code point.
    fn label(&self) -> String {
        match self {
            Self::Char(c) => char_label(*c),
            Self::Arrow(Direction::Up) => "↑".to_owned(),
            Self::Arrow(Direction::Down) => "↓".to_owned(),
            Self::Arrow(Direction::Right) => "→".to_owned(),
            Self::Arrow(Direction::Left) => "←".to_owned(),
            Self::Sequence(seq) => seq.chars().map(char_label).collect(),
        }
    }
}

fn char_label(c: char) -> String {
    match c {
        ' ' => "␣".to_owned(),
        '\x1b' => "Esc".to_owned(),
        '\x7f' => "^?".to_owned(),
        '\0'..='\x1f' => format!("^{}", char::from(b'@' + c as u8)),
        c if c.is_control() => format!("U+{:04X}", u32::from(c)),
        c => c.to_string(),
    }
}

/// Read one key. Arrow keys arrive as `ESC [ A..D`; the bytes after ESC
/// are only consumed when they are already waiting, so a lone Escape
/// press never blocks.
fn read_key<P: Platform, W: Write>(session: &mut Session<P, W>) -> ck_term::Result<Key> {
    let first = session.read_char()?;
    if first != '\x1b' || !session.poll_has_input()? {
        return Ok(Key::Char(first));
    }
    let second = session.read_char()?;
    if second != '[' || !session.poll_has_input()? {
        return Ok(Key::Sequence([first, second].iter().collect()));
    }
    let last = session.read_char()?;
    let arrow = u8::try_from(last).ok().and_then(Direction::from_final_byte);
    Ok(arrow.map_or_else(
        || Key::Sequence([first, second, last].iter().collect()),
        Key::Arrow,
    ))
}

/// Channel value for column `x` of a `width`-wide gradient.
fn ramp(x: usize, width: usize) -> u8 {
    u8::try_from(x * 255 / width.max(1)).unwrap_or(u8::MAX)
}

fn draw<P: Platform, W: Write>(
    session: &mut Session<P, W>,
    size: ConsoleSize,
    keys: &VecDeque<Key>,
) -> ck_term::Result<()> {
    session.append(ansi::HIDE_CURSOR)?;
    session.append(ansi::CLEAR_SCREEN)?;

    // Gradient bar across the top row.
    session.append(ck_term::cursor_goto!(1, 1))?;
    for x in 0..size.width {
        let r = ramp(x, size.width);
        ansi::write_bg_rgb(session.frame_mut(), r, 64, 255 - r)?;
        session.append(" ")?;
    }
    session.append(ansi::RESET_FORMATTING)?;

    session.append(ck_term::cursor_goto!(3, 3))?;
    session.append(ck_term::fg_rgb!(255, 0, 128))?;
    session.append("conkit")?;
    session.append(ansi::RESET_FORMATTING)?;

    let at = session.sequences().cursor_goto(3, 4).to_owned();
    session.append(&at)?;
    write!(
        session.frame_mut(),
        "size {}x{} ({} cells)",
        size.width,
        size.height,
        size.area()
    )?;

    let at = session.sequences().cursor_goto(3, 6).to_owned();
    session.append(&at)?;
    let color = session.sequences().fg_rgb(128, 220, 128).to_owned();
    session.append(&color)?;
    session.append("keys ")?;
    session.append(ansi::RESET_FORMATTING)?;
    let labels: Vec<String> = keys.iter().map(Key::label).collect();
    session.append(&labels.join(" "))?;

    // Last row, but never above the key line.
    let hint_row = size.height.max(8);
    session.append(&ansi::cursor_goto(3, hint_row))?;
    session.append(ck_term::fg_rgb!(140, 140, 140))?;
    session.append("press q to quit")?;
    session.append(ansi::RESET_FORMATTING)?;

    session.flush()
}

// ─── Main Loop ──────────────────────────────────────────────────────────────

fn event_loop<P: Platform, W: Write>(session: &mut Session<P, W>) -> ck_term::Result<()> {
    let mut keys = VecDeque::with_capacity(KEY_HISTORY);
    let mut dirty = true;

    loop {
        let size = session.current_size()?;
        if size.has_changed || dirty {
            draw(session, size, &keys)?;
            dirty = false;
        }

        if !session.poll_has_input()? {
            thread::sleep(POLL_INTERVAL);
            continue;
        }

        let key = read_key(session)?;
        debug!(?key, "key pressed");
        if key == Key::Char('q') {
            return Ok(());
        }
        if keys.len() == KEY_HISTORY {
            keys.pop_front();
        }
        keys.push_back(key);
        dirty = true;
    }
}

/// Put the screen back the way a shell expects it: formatting reset,
/// screen cleared, cursor visible. Whatever was half-drawn is dropped.
fn restore_screen<P: Platform, W: Write>(session: &mut Session<P, W>) -> ck_term::Result<()> {
    session.frame_mut().clear();
    session.append(ansi::RESET_FORMATTING)?;
    session.append(ansi::CLEAR_SCREEN)?;
    session.append(ansi::SHOW_CURSOR)?;
    session.flush()
}

fn run(config: Config) -> ck_term::Result<()> {
    let mut session = Session::start(config)?;
    info!("conkit started");

    let result = event_loop(&mut session);
    let restored = restore_screen(&mut session);
    let ended = session.end();
    result.and(restored).and(ended)
}

fn main() {
    init_logging();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("conkit: {e}");
        process::exit(1);
    });

    match run(config) {
        Ok(()) => {}
        Err(e @ TermError::OutOfMemory { .. }) => {
            eprintln!("conkit: fatal: {e}");
            process::exit(1);
        }
        Err(TermError::NotATerminal) => {
            eprintln!("conkit: needs an interactive terminal on stdin");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("conkit: {e}");
            process::exit(1);
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
