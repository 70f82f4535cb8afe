//! Table rendering.
//!
//! The presenter is the only component that touches the terminal. It is
//! injected into the tick loop as a trait object so the aggregator can be
//! driven against an in-memory writer.

use super::collectors::MemorySummary;
use super::error::Result;
use super::humanize::humanize_size;
use super::types::DisplayRow;
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use std::io::Write;

/// Row colours, cycled from the first data row.
const ROW_COLORS: [Color; 6] =
    [Color::Red, Color::Green, Color::Blue, Color::Cyan, Color::Magenta, Color::Yellow];

/// Renders one tick's rows.
pub trait Presenter {
    /// Replaces any previous output with `rows` and an optional memory footer.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::TerminalError`] if the output stream fails.
    ///
    /// [`MonitorError::TerminalError`]: super::error::MonitorError::TerminalError
    fn render(&mut self, rows: &[DisplayRow], memory: Option<&MemorySummary>) -> Result<()>;
}

/// Fixed-width text table writer.
#[derive(Debug)]
pub struct TerminalPresenter<W: Write> {
    out: W,
    color: bool,
    clear: bool,
    command_width: usize,
}

impl<W: Write> TerminalPresenter<W> {
    /// Creates a presenter writing to `out`.
    pub fn new(out: W, command_width: usize) -> Self {
        Self { out, color: true, clear: true, command_width }
    }

    /// Enables or disables row colouring.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Enables or disables clearing the screen before each render.
    #[must_use]
    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Formats the static header line.
    #[must_use]
    pub fn header(&self) -> String {
        format!(
            "{:>7} {:<width$} {:>10} {:>8} {:>8} {:>10} {:>11}",
            "",
            "COMMAND",
            "PageFault",
            "USS",
            "SWAP",
            "SYSCALL",
            "Involuntary",
            width = self.command_width
        )
    }

    /// Formats one data row.
    #[must_use]
    pub fn format_row(&self, row: &DisplayRow) -> String {
        format!(
            "{:>7} {:<width$} {:>10} {:>8} {:>8} {:>10} {:>11}",
            row.pid,
            row.command,
            row.page_fault,
            row.uss,
            row.swap,
            row.blocked,
            row.involuntary,
            width = self.command_width
        )
    }
}

/// Formats the memory footer line.
#[must_use]
pub fn format_memory(memory: &MemorySummary) -> String {
    format!(
        "memory total: {}, free: {}, available: {} swap usage: {}",
        humanize_size(memory.total),
        humanize_size(memory.free),
        humanize_size(memory.available),
        humanize_size(memory.swap_used)
    )
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render(&mut self, rows: &[DisplayRow], memory: Option<&MemorySummary>) -> Result<()> {
        if self.clear {
            queue!(self.out, MoveTo(0, 0), Clear(ClearType::FromCursorDown))?;
        }

        let header = self.header();
        writeln!(self.out, "{header}")?;

        for (i, row) in rows.iter().enumerate() {
            let line = self.format_row(row);
            if self.color {
                queue!(
                    self.out,
                    SetForegroundColor(ROW_COLORS[i % ROW_COLORS.len()]),
                    Print(line),
                    ResetColor,
                    Print("\n")
                )?;
            } else {
                writeln!(self.out, "{line}")?;
            }
        }

        if let Some(memory) = memory {
            writeln!(self.out, "{}", format_memory(memory))?;
        }

        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pid: u32, command: &str) -> DisplayRow {
        DisplayRow {
            pid,
            command: command.to_string(),
            page_fault: "2s".to_string(),
            uss: "12MB".to_string(),
            swap: "0".to_string(),
            blocked: "3ms".to_string(),
            involuntary: 17,
        }
    }

    fn plain() -> TerminalPresenter<Vec<u8>> {
        TerminalPresenter::new(Vec::new(), 20).with_color(false).with_clear(false)
    }

    #[test]
    fn test_header_columns() {
        let header = plain().header();
        for column in ["COMMAND", "PageFault", "USS", "SWAP", "SYSCALL", "Involuntary"] {
            assert!(header.contains(column), "header missing {column}: {header}");
        }
    }

    #[test]
    fn test_render_plain_rows_in_order() {
        let mut presenter = plain();
        presenter.render(&[row(10, "/usr/bin/a"), row(20, "/usr/bin/b")], None).unwrap();
        let out = String::from_utf8(presenter.into_inner()).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("COMMAND"));
        assert!(lines[1].trim_start().starts_with("10 /usr/bin/a"));
        assert!(lines[2].trim_start().starts_with("20 /usr/bin/b"));
        assert!(!out.contains('\x1b'), "plain output has no escapes");
    }

    #[test]
    fn test_rows_are_fixed_width() {
        let presenter = plain();
        let a = presenter.format_row(&row(1, "x"));
        let b = presenter.format_row(&row(1234567, "/a/much/longer/path"));
        assert_eq!(a.len(), b.len());
        assert_eq!(a.len(), presenter.header().len());
    }

    #[test]
    fn test_render_empty_prints_header_only() {
        let mut presenter = plain();
        presenter.render(&[], None).unwrap();
        let out = String::from_utf8(presenter.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_render_memory_footer() {
        let mut presenter = plain();
        let memory =
            MemorySummary { total: 4 << 30, free: 1 << 30, available: 2 << 30, swap_used: 0 };
        presenter.render(&[], Some(&memory)).unwrap();
        let out = String::from_utf8(presenter.into_inner()).unwrap();

        let footer = "memory total: 4096MB, free: 1024MB, available: 2048MB swap usage: 0";
        assert!(out.contains(footer), "footer missing: {out:?}");
    }

    #[test]
    fn test_render_clear_and_color_emit_escapes() {
        let mut presenter = TerminalPresenter::new(Vec::new(), 20);
        presenter.render(&[row(1, "a")], None).unwrap();
        let out = String::from_utf8(presenter.into_inner()).unwrap();

        assert!(out.starts_with('\x1b'), "clear sequence first");
        assert!(out.contains("COMMAND"));
        assert!(out.matches('\x1b').count() >= 4, "clear plus colour set/reset: {out:?}");
    }
}
