// SPDX-License-Identifier: MIT
//
// End-to-end session runs over the scripted backend: draw, flush, read
// keys, follow resizes, tear down.

use ck_term::ansi::{self, Direction};
use ck_term::platform::{InputFlags, ScriptedPlatform};
use ck_term::{Config, Session, TermError};
use pretty_assertions::assert_eq;

fn text(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).unwrap()
}

#[test]
fn one_frame_goes_out_in_order() {
    let mut p = ScriptedPlatform::new();
    let mut s = Session::with_platform(Config::default(), &mut p, Vec::new()).unwrap();

    s.append(ansi::CLEAR_SCREEN).unwrap();
    s.append(ck_term::fg_rgb!(255, 0, 128)).unwrap();
    s.append(ck_term::cursor_goto!(10, 5)).unwrap();
    s.append("hi").unwrap();
    s.append(ansi::RESET_FORMATTING).unwrap();
    s.flush().unwrap();

    assert_eq!(
        text(s.writer()),
        "\x1b[H\x1b[2J\x1b[38;2;255;0;128m\x1b[5;10Hhi\x1b[0m"
    );
    s.end().unwrap();
    assert_eq!(p.mode(), InputFlags::COOKED);
}

#[test]
fn macros_match_runtime_formatting() {
    assert_eq!(ck_term::fg_rgb!(1, 2, 3), ansi::fg_rgb(1, 2, 3));
    assert_eq!(ck_term::bg_rgb!(4, 5, 6), ansi::bg_rgb(4, 5, 6));
    assert_eq!(ck_term::cursor_goto!(7, 8), ansi::cursor_goto(7, 8));
    assert_eq!(ck_term::cursor_up!(2), ansi::cursor_move(Direction::Up, 2));
    assert_eq!(ck_term::cursor_down!(2), ansi::cursor_down(2));
    assert_eq!(ck_term::cursor_right!(9), ansi::cursor_right(9));
    assert_eq!(ck_term::cursor_left!(3), ansi::cursor_left(3));
}

#[test]
fn large_frame_grows_and_flushes_whole() {
    let config = Config::default()
        .with_initial_capacity(8)
        .with_growth_increment(4);
    let mut s = Session::with_platform(config, ScriptedPlatform::new(), Vec::new()).unwrap();

    let row = "0123456789".repeat(20);
    for _ in 0..50 {
        s.append(&row).unwrap();
    }
    assert_eq!(s.frame().len(), 10_000);
    assert!(s.frame().capacity() > 10_000);

    s.flush().unwrap();
    assert_eq!(s.writer().len(), 10_000 + ansi::CURSOR_HOME.len());
    assert!(s.frame().is_empty());
}

#[test]
fn key_loop_reads_until_quit() {
    let mut p = ScriptedPlatform::new().with_input("ab€q");
    let mut s = Session::with_platform(Config::default(), &mut p, Vec::new()).unwrap();

    let mut keys = Vec::new();
    while s.poll_has_input().unwrap() {
        let c = s.read_char().unwrap();
        if c == 'q' {
            break;
        }
        keys.push(c);
    }
    assert_eq!(keys, ['a', 'b', '€']);
    assert!(!s.poll_has_input().unwrap());
    s.end().unwrap();

    // Raw mode is only ever in place around individual polls and reads.
    assert_eq!(p.mode(), InputFlags::COOKED);
    assert!(p.history().iter().any(|m| m.is_empty()));
    assert_eq!(p.history().last(), Some(&InputFlags::COOKED));
}

#[test]
fn input_arriving_between_frames_is_seen() {
    let mut s = Session::with_platform(Config::default(), ScriptedPlatform::new(), Vec::new()).unwrap();
    assert!(!s.poll_has_input().unwrap());

    s.platform_mut().push_input("x");
    assert!(s.poll_has_input().unwrap());
    assert_eq!(s.read_char().unwrap(), 'x');
    assert!(!s.poll_has_input().unwrap());
}

#[test]
fn multiline_frame_arrives_intact() {
    let mut s = Session::with_platform(Config::default(), ScriptedPlatform::new(), Vec::new()).unwrap();
    s.append("row one\r\nrow two\r\n").unwrap();
    s.flush().unwrap();
    assert_eq!(text(s.writer()), "\x1b[Hrow one\r\nrow two\r\n");
}

#[test]
fn redraw_only_on_resize() {
    let p = ScriptedPlatform::new().with_sizes([(80, 24), (80, 24), (120, 40), (120, 40)]);
    let mut s = Session::with_platform(Config::default(), p, Vec::new()).unwrap();

    let mut redraws = 0;
    for _ in 0..4 {
        let size = s.current_size().unwrap();
        if size.has_changed {
            redraws += 1;
            let status = format!("{}x{}", size.width, size.height);
            s.append(&status).unwrap();
            s.flush().unwrap();
        }
    }
    assert_eq!(redraws, 2);
    assert_eq!(text(s.writer()), "\x1b[H80x24\x1b[H120x40");
}

#[test]
fn closed_input_is_reported() {
    let mut s = Session::with_platform(Config::default(), ScriptedPlatform::new(), Vec::new()).unwrap();
    assert!(matches!(s.read_char(), Err(TermError::EndOfInput)));
}

#[test]
fn failed_mode_capture_fails_start() {
    let p = ScriptedPlatform::new().failing("capture_mode");
    let err = Session::with_platform(Config::default(), p, Vec::new()).unwrap_err();
    assert!(err.to_string().contains("capture_mode"));
}
