//! Terminal rendering of the markdown produced by the core Display impls
//!
//! Rich mode styles the markdown with termimad and colors status lines;
//! plain mode (`--no-color`) prints it untouched so the output can be piped
//! or compared in tests.

use std::io::{self, Write};

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

const BLUE: &str = "\x1b[34m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Renders markdown either styled or as plain text
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::Magenta);
        skin.code_block.set_bg(Color::AnsiValue(238));
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Prints `markdown` to stdout.
    pub fn render(&self, markdown: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        if !self.rich_enabled {
            stdout.write_all(markdown.as_bytes())?;
            return Ok(stdout.flush()?);
        }

        for line in markdown.lines() {
            match line_color(line) {
                // Headers keep their hashes
                Some(color) => writeln!(stdout, "{color}{line}{RESET}")?,
                None => writeln!(stdout, "{}", self.skin.inline(line))?,
            }
        }
        Ok(stdout.flush()?)
    }
}

fn line_color(line: &str) -> Option<&'static str> {
    if line.starts_with('#') {
        Some(BLUE)
    } else if line.starts_with("Success:") {
        Some(GREEN)
    } else if line.starts_with("Error:") {
        Some(RED)
    } else {
        None
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}
