//! Column descriptors and the "extra fields" view

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{value_to_text, LogRecord};

/// One column of the record table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Record field shown in this column
    pub name: String,
    pub title: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default = "default_width")]
    pub width: u16,
}

fn default_visible() -> bool {
    true
}

fn default_width() -> u16 {
    50
}

impl Column {
    pub fn new(name: &str, title: &str, visible: bool, width: u16) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            visible,
            width,
        }
    }
}

/// Columns a fresh tab shows
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::new("asctime", "Time", true, 125),
        Column::new("name", "Name", true, 80),
        Column::new("levelname", "Level", true, 60),
        Column::new("levelno", "#", false, 22),
        Column::new("funcName", "Function", false, 80),
        Column::new("pathname", "Path", false, 120),
        Column::new("filename", "File", false, 80),
        Column::new("lineno", "Line #", false, 40),
        Column::new("module", "Module", false, 80),
        Column::new("process", "PID", false, 40),
        Column::new("processName", "Process name", false, 80),
        Column::new("thread", "Thread", false, 80),
        Column::new("threadName", "Thread name", false, 80),
        Column::new("message", "Message", true, 10),
    ]
}

/// The visible column layout of a tab.
#[derive(Debug, Clone)]
pub struct HeaderLayout {
    columns: Vec<Column>,
    preset_name: String,
}

impl Default for HeaderLayout {
    fn default() -> Self {
        Self::new(crate::level::STOCK_PRESET, default_columns())
    }
}

impl HeaderLayout {
    pub fn new(preset_name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            columns,
            preset_name: preset_name.into(),
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.visible)
    }

    pub fn preset_name(&self) -> &str {
        &self.preset_name
    }

    /// Replace the layout with a named preset
    pub fn apply_preset(&mut self, preset_name: impl Into<String>, columns: Vec<Column>) {
        self.preset_name = preset_name.into();
        self.columns = columns;
    }

    /// Show or hide one column. Returns false if no column has that name.
    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => {
                column.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Extra fields of `record` that no visible column already shows
    pub fn extra_fields<'r>(&self, record: &'r LogRecord) -> Vec<(&'r str, &'r Value)> {
        let shown: HashSet<&str> = self.visible_columns().map(|c| c.name.as_str()).collect();
        record
            .extra_fields
            .iter()
            .filter(|(key, _)| !shown.contains(key.as_str()))
            .map(|(key, value)| (key.as_str(), value))
            .collect()
    }

    /// Message text with hidden fields appended as `key=value` lines.
    ///
    /// Without word wrap only the first line of a multi-line message is kept.
    pub fn message_with_extra(&self, record: &LogRecord, word_wrap: bool) -> String {
        let message = record.display_message().unwrap_or_default();
        let mut out = if word_wrap {
            message.to_string()
        } else {
            message.lines().next().unwrap_or_default().to_string()
        };
        for (key, value) in self.extra_fields(record) {
            out.push('\n');
            out.push_str(key);
            out.push('=');
            out.push_str(&value_to_text(value).unwrap_or_else(|| "None".to_string()));
        }
        out
    }
}
