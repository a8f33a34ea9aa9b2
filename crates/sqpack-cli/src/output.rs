//! Terminal styling for command output
//!
//! Colors are dropped when `NO_COLOR` is set.

use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table, presets};
use owo_colors::OwoColorize;

/// Style configuration for output formatting
#[derive(Debug, Clone, Copy)]
pub struct OutputStyle {
    /// Whether to use colors in output
    pub use_color: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_color: std::env::var_os("NO_COLOR").is_none(),
        }
    }
}

impl OutputStyle {
    /// Style from the environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors in output
    #[must_use]
    pub const fn no_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

/// Format a success message
pub fn format_success(text: &str, style: OutputStyle) -> String {
    if style.use_color {
        text.green().to_string()
    } else {
        text.to_string()
    }
}

/// Format a key-value pair
pub fn format_key_value(key: &str, value: &str, style: OutputStyle) -> String {
    if style.use_color {
        format!("{}: {}", key.cyan(), value)
    } else {
        format!("{key}: {value}")
    }
}

/// Format a hash value (dimmed)
pub fn format_hash(text: &str, style: OutputStyle) -> String {
    if style.use_color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

/// Create a styled table
pub fn create_table(style: OutputStyle) -> Table {
    let mut table = Table::new();
    if style.use_color {
        table
            .load_preset(presets::UTF8_FULL)
            .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    } else {
        table.load_preset(presets::ASCII_FULL);
    }
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Style a table header cell
pub fn header_cell(text: &str, style: OutputStyle) -> Cell {
    let cell = Cell::new(text)
        .add_attribute(Attribute::Bold)
        .set_alignment(CellAlignment::Left);
    if style.use_color {
        cell.fg(Color::Cyan)
    } else {
        cell
    }
}

/// Style a regular cell
pub fn regular_cell(text: &str) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Left)
}

/// Style a numeric cell (right-aligned)
pub fn numeric_cell(value: usize) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}
