// src/cli/render.rs — Terminal renderer for a generation session
//
// Tokens go to stdout as they arrive. Status, hint and summary lines go to
// stderr so stdout carries nothing but the generated text.

use std::io::{self, Stderr, Stdout, Write};
use std::mem::discriminant;

use crate::session::view::{Controls, SessionView, Status};

pub struct TerminalView<O: Write, E: Write> {
    out: O,
    err: E,
    quiet: bool,
    status: Status,
    /// True when the last byte written to `out` was a newline (or nothing
    /// was written yet).
    at_line_start: bool,
    elapsed: String,
    controls: Controls,
}

impl TerminalView<Stdout, Stderr> {
    pub fn stdio(quiet: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), quiet)
    }
}

impl<O: Write, E: Write> TerminalView<O, E> {
    pub fn new(out: O, err: E, quiet: bool) -> Self {
        Self {
            out,
            err,
            quiet,
            status: Status::Idle,
            at_line_start: true,
            elapsed: String::new(),
            controls: Controls::idle(false),
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn elapsed(&self) -> &str {
        &self.elapsed
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    /// Print a free-form line on the side channel.
    pub fn note(&mut self, message: &str) {
        self.end_output_line();
        writeln!(self.err, "{}", message).ok();
    }

    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }

    fn chatter(&mut self, line: std::fmt::Arguments<'_>) {
        if self.quiet {
            return;
        }
        writeln!(self.err, "{}", line).ok();
    }

    fn end_output_line(&mut self) {
        if !self.at_line_start {
            writeln!(self.out).ok();
            self.out.flush().ok();
            self.at_line_start = true;
        }
    }
}

impl<O: Write, E: Write> SessionView for TerminalView<O, E> {
    fn set_status(&mut self, status: &Status) {
        // The live rate changes with every token; only announce state changes.
        let changed = discriminant(status) != discriminant(&self.status);
        self.status = status.clone();
        if !changed {
            return;
        }
        match status {
            Status::Idle | Status::Done => {}
            Status::Loading | Status::Generating { .. } => {
                self.chatter(format_args!("[status] {}", status));
            }
            Status::Cancelled | Status::Failed => {
                self.end_output_line();
                self.chatter(format_args!("[status] {}", status));
            }
        }
    }

    fn clear_output(&mut self) {
        self.end_output_line();
    }

    fn append_token(&mut self, token: &str) {
        self.out.write_all(token.as_bytes()).ok();
        self.out.flush().ok();
        if let Some(last) = token.chars().last() {
            self.at_line_start = last == '\n';
        }
    }

    fn set_elapsed(&mut self, elapsed: &str) {
        self.elapsed.clear();
        self.elapsed.push_str(elapsed);
    }

    fn set_summary(&mut self, summary: Option<&str>) {
        let Some(summary) = summary else {
            return;
        };
        self.end_output_line();
        if self.status == Status::Failed {
            // Failures are shown even when quiet.
            writeln!(self.err, "[error] {}", summary).ok();
        } else {
            self.chatter(format_args!("[done] {}", summary));
        }
    }

    fn set_hint(&mut self, hint: Option<&str>) {
        if let Some(hint) = hint {
            self.end_output_line();
            self.chatter(format_args!("[hint] {}", hint));
        }
    }

    fn set_controls(&mut self, controls: Controls) {
        self.controls = controls;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(quiet: bool) -> TerminalView<Vec<u8>, Vec<u8>> {
        TerminalView::new(Vec::new(), Vec::new(), quiet)
    }

    fn text(view: TerminalView<Vec<u8>, Vec<u8>>) -> (String, String) {
        let (out, err) = view.into_parts();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_tokens_go_to_stdout_only() {
        let mut v = view(false);
        v.append_token("Hello");
        v.append_token(", world");
        let (out, err) = text(v);
        assert_eq!(out, "Hello, world");
        assert!(err.is_empty());
    }

    #[test]
    fn test_generating_announced_once() {
        let mut v = view(false);
        v.set_status(&Status::Loading);
        v.set_status(&Status::Generating { rate: "1.0".into() });
        v.set_status(&Status::Generating { rate: "2.0".into() });
        v.set_status(&Status::Generating { rate: "3.0".into() });
        let (_, err) = text(v);
        assert_eq!(err, "[status] loading...\n[status] generating... 1.0 tok/s\n");
    }

    #[test]
    fn test_summary_ends_output_line() {
        let mut v = view(false);
        v.append_token("abc");
        v.set_status(&Status::Done);
        v.set_summary(Some("1 tokens in 0.5s (2.0 tok/s)"));
        let (out, err) = text(v);
        assert_eq!(out, "abc\n");
        assert_eq!(err, "[done] 1 tokens in 0.5s (2.0 tok/s)\n");
    }

    #[test]
    fn test_failure_summary_is_an_error_line() {
        let mut v = view(true);
        v.set_status(&Status::Loading);
        v.set_status(&Status::Failed);
        v.set_summary(Some("HTTP 500: Internal Server Error"));
        let (out, err) = text(v);
        assert!(out.is_empty());
        assert_eq!(err, "[error] HTTP 500: Internal Server Error\n");
    }

    #[test]
    fn test_quiet_suppresses_chatter() {
        let mut v = view(true);
        v.set_status(&Status::Loading);
        v.set_hint(Some("slow"));
        v.append_token("x");
        v.set_status(&Status::Done);
        v.set_summary(Some("done"));
        let (out, err) = text(v);
        assert_eq!(out, "x\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_hint_and_cleared_summary() {
        let mut v = view(false);
        v.set_hint(Some("Max tokens reduced to 256; retry for a faster answer"));
        v.set_hint(None);
        v.set_summary(None);
        let (_, err) = text(v);
        assert_eq!(err, "[hint] Max tokens reduced to 256; retry for a faster answer\n");
    }

    #[test]
    fn test_tracks_elapsed_and_controls() {
        let mut v = view(false);
        v.set_elapsed("1.2s");
        v.set_controls(Controls::busy());
        assert_eq!(v.elapsed(), "1.2s");
        assert_eq!(v.controls(), Controls::busy());
    }
}
