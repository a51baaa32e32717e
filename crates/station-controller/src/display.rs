//! Text status displays.
//!
//! [`VirtualDisplay`] keeps an in-memory character grid the size of a
//! 128×64 OLED driven with a 6×10 font (6 rows × 21 columns) and logs every
//! frame it shows. It stands in for the panel when the station runs on a
//! host. [`NoDisplay`] is used when the display is disabled.
//!
//! # Character Encoding - ASCII Only
//!
//! The grid only holds printable ASCII. Control characters are dropped and
//! any other non-ASCII character is replaced by `?`, which is what the
//! built-in panel font would show for a glyph it does not have.
//!
//! # Examples
//!
//! ```
//! use station_controller::VirtualDisplay;
//! use station_hardware::traits::StatusDisplay;
//!
//! let mut display = VirtualDisplay::new(6, 21);
//! display.show("connecting").unwrap();
//!
//! assert_eq!(display.get_line(0).unwrap().trim_end(), "connecting");
//! assert_eq!(display.get_line(1).unwrap().trim_end(), "");
//! ```
//!
//! ## Builder Pattern
//!
//! ```
//! use station_controller::VirtualDisplay;
//!
//! let display = VirtualDisplay::builder().with_size(2, 16).build();
//! assert_eq!(display.get_all_lines().len(), 2);
//! ```

use station_hardware::error::Result;
use station_hardware::traits::StatusDisplay;
use station_hardware::types::DeviceInfo;
use tracing::info;

/// Rows of a 128×64 panel with a 10 px line height.
pub const DEFAULT_ROWS: usize = 6;

/// Columns of a 128 px wide panel with a 6 px glyph advance.
pub const DEFAULT_COLUMNS: usize = 21;

/// In-memory character display.
///
/// Not thread-safe; the station owns it exclusively.
#[derive(Debug, Clone)]
pub struct VirtualDisplay {
    /// Number of rows in the display.
    rows: usize,

    /// Number of columns per row.
    columns: usize,

    /// Current display buffer (ASCII characters only).
    buffer: Vec<String>,

    /// Frames shown through [`StatusDisplay::show`] since creation.
    frames_shown: usize,

    initialised: bool,
}

impl VirtualDisplay {
    /// Create a blank display with the given dimensions.
    ///
    /// Zero dimensions are raised to one.
    pub fn new(rows: usize, columns: usize) -> Self {
        let rows = rows.max(1);
        let columns = columns.max(1);
        Self {
            rows,
            columns,
            buffer: vec![" ".repeat(columns); rows],
            frames_shown: 0,
            initialised: false,
        }
    }

    /// Create a builder for a display with custom dimensions.
    pub fn builder() -> VirtualDisplayBuilder {
        VirtualDisplayBuilder::default()
    }

    /// Blank every row.
    pub fn clear(&mut self) {
        for line in &mut self.buffer {
            *line = " ".repeat(self.columns);
        }
    }

    /// Get a row, padded to the column width.
    pub fn get_line(&self, line: usize) -> Option<&str> {
        self.buffer.get(line).map(String::as_str)
    }

    /// All rows, top to bottom.
    pub fn get_all_lines(&self) -> &[String] {
        &self.buffer
    }

    /// Non-blank rows with trailing padding removed, joined by newlines.
    pub fn text(&self) -> String {
        let mut lines: Vec<&str> = self.buffer.iter().map(|l| l.trim_end()).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }
}

impl Default for VirtualDisplay {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLUMNS)
    }
}

impl StatusDisplay for VirtualDisplay {
    fn init(&mut self) -> Result<()> {
        self.clear();
        self.initialised = true;
        info!(rows = self.rows, columns = self.columns, "Virtual display ready");
        Ok(())
    }

    fn show(&mut self, text: &str) -> Result<()> {
        self.clear();
        for (row, line) in layout_text(text, self.columns, self.rows)
            .iter()
            .enumerate()
        {
            self.buffer[row] = pad_line(line, self.columns);
        }
        self.frames_shown += 1;
        info!(frame = self.frames_shown, text = %self.text(), "Display");
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new(
            "Virtual Display",
            format!("{}x{} text", self.rows, self.columns),
        )
    }
}

/// Builder for [`VirtualDisplay`].
#[derive(Debug, Clone)]
pub struct VirtualDisplayBuilder {
    rows: usize,
    columns: usize,
}

impl VirtualDisplayBuilder {
    pub fn with_size(mut self, rows: usize, columns: usize) -> Self {
        self.rows = rows;
        self.columns = columns;
        self
    }

    pub fn build(self) -> VirtualDisplay {
        VirtualDisplay::new(self.rows, self.columns)
    }
}

impl Default for VirtualDisplayBuilder {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
        }
    }
}

/// Display used when no panel is configured; accepts and drops every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisplay;

impl StatusDisplay for NoDisplay {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn show(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new("No Display", "None")
    }
}

/// Truncate text to a maximum number of characters.
///
/// # Examples
///
/// ```
/// use station_controller::display::truncate_text;
///
/// assert_eq!(truncate_text("SE150001", 4), "SE15");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Fit text to a row of `width` columns: truncate, or pad with spaces.
///
/// # Examples
///
/// ```
/// use station_controller::display::pad_line;
///
/// assert_eq!(pad_line("HELLO", 10), "HELLO     ");
/// assert_eq!(pad_line("HELLO", 3), "HEL");
/// ```
pub fn pad_line(text: &str, width: usize) -> String {
    let char_count = text.chars().count();

    if char_count >= width {
        return truncate_text(text, width);
    }

    format!("{}{}", text, " ".repeat(width - char_count))
}

/// Break text into at most `rows` lines of at most `columns` characters.
///
/// Explicit newlines start a new line; longer lines wrap at the column
/// limit. Text beyond the last row is dropped.
///
/// # Examples
///
/// ```
/// use station_controller::display::layout_text;
///
/// assert_eq!(layout_text("abcdef", 4, 6), vec!["abcd", "ef"]);
/// assert_eq!(layout_text("a\nb\nc", 4, 2), vec!["a", "b"]);
/// ```
pub fn layout_text(text: &str, columns: usize, rows: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let chars: Vec<char> = sanitize_text(paragraph).chars().collect();
        if chars.is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(chars.chunks(columns).map(|chunk| chunk.iter().collect()));
        }
        if lines.len() >= rows {
            break;
        }
    }

    lines.truncate(rows);
    lines
}

/// Drop control characters, replace non-ASCII with `?` and trim.
fn sanitize_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect::<String>()
        .trim()
        .to_string()
}
