//! Command results on stdout, as tables or JSON.
//!
//! Tables show formatted rows (units, `-` for unknown). JSON carries the
//! raw values so scripts never parse `1.5 kB` back into bytes.

use std::io::{self, Write};

use serde::Serialize;
use tabled::Tabled;
use tabled::settings::Style;

use meshdeck_core::history::HistoryEntry;
use meshdeck_core::stats::DataInfo;

use crate::display::{HistoryRow, MetricsRow};

const EMPTY_LIST: &str = "(none)";
const NO_TELEMETRY: &str = "(no telemetry yet)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    /// Anything but `json` renders as a table.
    pub fn from_str_arg(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Table,
        }
    }
}

fn table<T: Tabled>(items: impl IntoIterator<Item = T>) -> String {
    tabled::Table::new(items).with(Style::rounded()).to_string()
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

fn write_rows<W: Write, T: Tabled>(out: &mut W, rows: &[T], empty: &str) -> io::Result<()> {
    if rows.is_empty() {
        writeln!(out, "{}", empty)
    } else {
        writeln!(out, "{}", table(rows))
    }
}

fn write_list<W: Write, T: Serialize + Tabled>(
    out: &mut W,
    items: &[T],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Table => write_rows(out, items, EMPTY_LIST),
        OutputFormat::Json => write_json(out, items),
    }
}

fn write_metrics<W: Write>(out: &mut W, data: &[DataInfo], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<MetricsRow> = data.iter().map(MetricsRow::from_data).collect();
            write_rows(out, &rows, NO_TELEMETRY)
        }
        OutputFormat::Json => write_json(out, data),
    }
}

fn write_history<W: Write>(
    out: &mut W,
    entries: &[HistoryEntry],
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<HistoryRow> = entries.iter().map(HistoryRow::from_entry).collect();
            write_rows(out, &rows, NO_TELEMETRY)
        }
        OutputFormat::Json => write_json(out, entries),
    }
}

pub fn render_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) -> io::Result<()> {
    write_list(&mut io::stdout().lock(), items, format)
}

pub fn render_one<T: Serialize + Tabled>(item: &T, format: OutputFormat) -> io::Result<()> {
    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Table => writeln!(out, "{}", table(std::iter::once(item))),
        OutputFormat::Json => write_json(&mut out, item),
    }
}

/// Per-peer metrics of one snapshot.
pub fn render_metrics(data: &[DataInfo], format: OutputFormat) -> io::Result<()> {
    write_metrics(&mut io::stdout().lock(), data, format)
}

/// Per-snapshot totals, oldest first.
pub fn render_history(entries: &[HistoryEntry], format: OutputFormat) -> io::Result<()> {
    write_history(&mut io::stdout().lock(), entries, format)
}
