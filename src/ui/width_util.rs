use terminal_size::{Width, terminal_size};

use crate::ui::ascii::ESC_BYTE;

/// Width arithmetic on strings that may contain ANSI styling.
#[derive(Debug, Default, Clone)]
pub struct WidthUtil;

impl WidthUtil {
    /// Removes CSI sequences (`ESC [ ... letter`).
    pub fn strip_ansi(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if c as u32 == u32::from(ESC_BYTE) && chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
                continue;
            }
            out.push(c);
        }
        out
    }

    pub fn visible_width(&self, s: &str) -> usize {
        Self::strip_ansi(s).chars().count()
    }

    /// Right-pads `s` with spaces to `width` visible columns.
    pub fn pad_visible(&self, s: &str, width: usize) -> String {
        let missing = width.saturating_sub(self.visible_width(s));
        format!("{s}{}", " ".repeat(missing))
    }

    /// Cuts plain text to at most `width` columns, marking the cut with `~`.
    pub fn clip(&self, s: &str, width: usize) -> String {
        let plain = Self::strip_ansi(s);
        if plain.chars().count() <= width {
            return s.to_string();
        }
        if width == 0 {
            return String::new();
        }
        let mut clipped: String = plain.chars().take(width - 1).collect();
        clipped.push('~');
        clipped
    }

    /// Terminal width in columns, or 80 when stdout is not a terminal.
    pub fn terminal_width(&self) -> usize {
        match terminal_size() {
            Some((Width(w), _)) => usize::from(w),
            None => 80,
        }
    }
}
