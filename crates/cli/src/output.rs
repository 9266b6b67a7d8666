//! CLI output formatting module

use crate::config::{supports_color, CliConfig, OutputFormat};
use omnilytics_core::Result;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

const TABLE_VALUE_WIDTH: usize = 48;

/// ANSI colors used by the pretty format
#[derive(Debug, Clone, Copy)]
enum Color {
    Red = 31,
    Green = 32,
    Yellow = 33,
    Blue = 34,
    Magenta = 35,
    Cyan = 36,
    Gray = 90,
}

/// Writes command results in the selected [`OutputFormat`]
pub struct OutputFormatter {
    format: OutputFormat,
    use_colors: bool,
    writer: Box<dyn Write + Send>,
}

impl OutputFormatter {
    /// Formatter writing to stdout as configured
    pub fn new(config: &CliConfig) -> Self {
        Self::with_writer(config.output_format, config.use_colors, io::stdout())
    }

    /// Formatter writing to a custom writer
    ///
    /// Colors are only used when requested and the terminal supports them.
    pub fn with_writer<W: Write + Send + 'static>(
        format: OutputFormat,
        use_colors: bool,
        writer: W,
    ) -> Self {
        Self {
            format,
            use_colors: use_colors && supports_color(),
            writer: Box::new(writer),
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a serializable value
    pub fn output<T: Serialize>(&mut self, value: &T) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(value)?;
                writeln!(self.writer, "{}", json)?;
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(value)?;
                write!(self.writer, "{}", yaml)?;
            }
            OutputFormat::Compact => {
                let json = serde_json::to_string(value)?;
                writeln!(self.writer, "{}", json)?;
            }
            OutputFormat::Pretty => {
                let value = serde_json::to_value(value)?;
                self.write_tree(&value, 0)?;
            }
            OutputFormat::Table => {
                let value = serde_json::to_value(value)?;
                self.write_table(&value)?;
            }
        }
        Ok(())
    }

    /// Whether status lines should be printed next to structured output
    pub fn is_human(&self) -> bool {
        matches!(self.format, OutputFormat::Pretty | OutputFormat::Table)
    }

    fn write_tree(&mut self, value: &Value, depth: usize) -> Result<()> {
        let indent = "  ".repeat(depth);

        match value {
            Value::Object(map) => {
                for (key, item) in map {
                    let key = self.paint(key, Color::Blue);
                    if item.is_object() || item.is_array() {
                        writeln!(self.writer, "{}{}:", indent, key)?;
                        self.write_tree(item, depth + 1)?;
                    } else {
                        let item = self.styled_scalar(item);
                        writeln!(self.writer, "{}{}: {}", indent, key, item)?;
                    }
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if item.is_object() || item.is_array() {
                        writeln!(self.writer, "{}[{}]:", indent, index)?;
                        self.write_tree(item, depth + 1)?;
                    } else {
                        let item = self.styled_scalar(item);
                        writeln!(self.writer, "{}{}. {}", indent, index + 1, item)?;
                    }
                }
            }
            scalar => {
                let scalar = self.styled_scalar(scalar);
                writeln!(self.writer, "{}{}", indent, scalar)?;
            }
        }
        Ok(())
    }

    fn write_table(&mut self, value: &Value) -> Result<()> {
        let rows: Vec<(String, String)> = match value {
            Value::Object(map) => map
                .iter()
                .map(|(key, item)| (key.clone(), summarize(item)))
                .collect(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), summarize(item)))
                .collect(),
            scalar => {
                writeln!(self.writer, "{}", summarize(scalar))?;
                return Ok(());
            }
        };

        let key_width = rows
            .iter()
            .map(|(key, _)| key.chars().count())
            .max()
            .unwrap_or(0)
            .max(3);
        let rule = |left: &str, mid: &str, right: &str| {
            format!(
                "{}{}{}{}{}",
                left,
                "─".repeat(key_width + 2),
                mid,
                "─".repeat(TABLE_VALUE_WIDTH + 2),
                right
            )
        };

        writeln!(self.writer, "{}", rule("┌", "┬", "┐"))?;
        writeln!(
            self.writer,
            "│ {:<kw$} │ {:<vw$} │",
            "Key",
            "Value",
            kw = key_width,
            vw = TABLE_VALUE_WIDTH
        )?;
        writeln!(self.writer, "{}", rule("├", "┼", "┤"))?;
        for (key, item) in rows {
            writeln!(
                self.writer,
                "│ {:<kw$} │ {:<vw$} │",
                key,
                truncate(&item, TABLE_VALUE_WIDTH),
                kw = key_width,
                vw = TABLE_VALUE_WIDTH
            )?;
        }
        writeln!(self.writer, "{}", rule("└", "┴", "┘"))?;
        Ok(())
    }

    fn styled_scalar(&self, value: &Value) -> String {
        match value {
            Value::String(s) => self.paint(s, Color::Green),
            Value::Number(n) => self.paint(&n.to_string(), Color::Cyan),
            Value::Bool(b) => self.paint(&b.to_string(), Color::Magenta),
            Value::Null => self.paint("null", Color::Gray),
            other => summarize(other),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            format!("\x1b[{}m{}\x1b[0m", color as u8, text)
        } else {
            text.to_string()
        }
    }

    /// Write a plain line
    pub fn message(&mut self, msg: &str) -> Result<()> {
        writeln!(self.writer, "{}", msg)?;
        Ok(())
    }

    pub fn success(&mut self, msg: &str) -> Result<()> {
        self.status("✓", Color::Green, msg)
    }

    pub fn error(&mut self, msg: &str) -> Result<()> {
        self.status("✗", Color::Red, msg)
    }

    pub fn warning(&mut self, msg: &str) -> Result<()> {
        self.status("⚠", Color::Yellow, msg)
    }

    pub fn info(&mut self, msg: &str) -> Result<()> {
        self.status("ℹ", Color::Blue, msg)
    }

    fn status(&mut self, symbol: &str, color: Color, msg: &str) -> Result<()> {
        let symbol = self.paint(symbol, color);
        writeln!(self.writer, "{} {}", symbol, msg)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// One-line rendering of any JSON value
fn summarize(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(map) => format!("{{{} keys}}", map.len()),
        other => other.to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}
