use crate::ui::width_util::WidthUtil;
use std::io::Write;

const COLUMN_SEPARATOR: &str = " | ";

/// Plain-text tables with a banner title, a header rule and a closing rule.
#[derive(Debug, Clone, Default)]
pub struct TablePrinter {
    util: WidthUtil,
    max_width: Option<usize>,
}

impl TablePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Printer whose lines never exceed the current terminal width.
    pub fn for_terminal() -> Self {
        let util = WidthUtil;
        let width = util.terminal_width();
        Self {
            util,
            max_width: Some(width),
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn column_widths<T: AsRef<str>>(&self, headers: &[&str], rows: &[Vec<T>]) -> Vec<usize> {
        let mut widths: Vec<usize> = headers.iter().map(|h| self.util.visible_width(h)).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(self.util.visible_width(cell.as_ref()));
            }
        }
        widths
    }

    fn line_width(widths: &[usize]) -> usize {
        widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * COLUMN_SEPARATOR.len()
    }

    fn emit<W: Write + ?Sized>(&self, out: &mut W, line: &str) -> std::io::Result<()> {
        match self.max_width {
            Some(max) => writeln!(out, "{}", self.util.clip(line, max)),
            None => writeln!(out, "{line}"),
        }
    }

    fn join<T: AsRef<str>>(&self, cells: &[T], widths: &[usize]) -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, w)| self.util.pad_visible(cell.as_ref(), *w))
            .collect::<Vec<_>>()
            .join(COLUMN_SEPARATOR)
            .trim_end()
            .to_string()
    }

    pub fn render_table<T: AsRef<str>, W: Write + ?Sized>(
        &self,
        title: &str,
        headers: &[&str],
        rows: &[Vec<T>],
        empty_message: &str,
        out: &mut W,
    ) -> std::io::Result<()> {
        let widths = self.column_widths(headers, rows);
        let mut width = Self::line_width(&widths).max(title.chars().count());
        if rows.is_empty() {
            width = width.max(empty_message.chars().count());
        }
        let rule = "-".repeat(self.max_width.map_or(width, |max| width.min(max)));

        self.emit(out, &rule)?;
        self.emit(out, &title.to_uppercase())?;
        self.emit(out, &rule)?;
        if rows.is_empty() {
            self.emit(out, empty_message)?;
            return self.emit(out, &rule);
        }

        self.emit(out, &self.join(headers, &widths))?;
        self.emit(out, &rule)?;
        for row in rows {
            self.emit(out, &self.join(row, &widths))?;
        }
        self.emit(out, &rule)
    }
}
