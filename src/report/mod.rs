//! Plain-text rendering of ledgers as aligned tables.

use std::fmt;
use std::str::FromStr;

use colored::Colorize;

use crate::ledger::{Ledger, TimeInterval};

/// Row granularity of a rendered or exported ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resolution {
    Daily,
    Monthly,
    #[default]
    Annual,
}

impl Resolution {
    /// Roll-up bucket, `None` for the daily ledger itself.
    pub fn interval(self) -> Option<TimeInterval> {
        match self {
            Resolution::Daily => None,
            Resolution::Monthly => Some(TimeInterval::months(1)),
            Resolution::Annual => Some(TimeInterval::years(1)),
        }
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Resolution::Daily),
            "monthly" | "month" => Ok(Resolution::Monthly),
            "annual" | "annually" | "yearly" | "year" => Ok(Resolution::Annual),
            other => Err(format!(
                "unknown resolution `{other}` (expected daily, monthly or annual)"
            )),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resolution::Daily => "daily",
            Resolution::Monthly => "monthly",
            Resolution::Annual => "annual",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableColumn {
    pub header: String,
    pub min_width: usize,
    pub max_width: Option<usize>,
    pub alignment: Alignment,
}

impl TableColumn {
    pub fn new(header: impl Into<String>, alignment: Alignment) -> Self {
        Self {
            header: header.into(),
            min_width: 0,
            max_width: None,
            alignment,
        }
    }
}

/// Column metadata plus rows of preformatted cells.
pub struct Table {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<String>>,
    pub show_headers: bool,
    pub padding: usize,
}

impl Table {
    /// Content width of each column from headers, rows and the column limits.
    pub fn compute_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let mut width = visible_width(&column.header).max(column.min_width);
                for row in &self.rows {
                    if let Some(cell) = row.get(idx) {
                        width = width.max(visible_width(cell));
                    }
                }
                if let Some(max_width) = column.max_width {
                    width = width.min(max_width);
                }
                width
            })
            .collect()
    }

    pub fn render_row(&self, row: &[String], widths: &[usize]) -> String {
        let cells: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let text = row.get(idx).map(String::as_str).unwrap_or("");
                render_cell(text, widths[idx], column.alignment, self.padding)
            })
            .collect();
        cells.join(" ").trim_end().to_string()
    }

    pub fn render(&self) -> String {
        let widths = self.compute_widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        if self.show_headers {
            let header: Vec<String> = self.columns.iter().map(|c| c.header.clone()).collect();
            lines.push(self.render_row(&header, &widths).bold().to_string());
            lines.push(horizontal_rule(&widths, self.padding));
        }
        for row in &self.rows {
            lines.push(self.render_row(row, &widths));
        }
        lines.join("\n")
    }
}

/// Character count ignoring ANSI escape sequences.
fn visible_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for next in chars.by_ref() {
                if ('\u{40}'..='\u{7e}').contains(&next) && next != '[' {
                    break;
                }
            }
            continue;
        }
        width += 1;
    }
    width
}

fn truncate_text(text: &str, width: usize) -> String {
    if visible_width(text) <= width {
        return text.to_string();
    }
    match width {
        0 => String::new(),
        1 => "…".to_string(),
        _ => {
            let mut out: String = text.chars().take(width - 1).collect();
            out.push('…');
            out
        }
    }
}

pub fn render_cell(text: &str, width: usize, alignment: Alignment, padding: usize) -> String {
    let fitted = truncate_text(text, width);
    let remaining = width.saturating_sub(visible_width(&fitted));
    let (left, right) = match alignment {
        Alignment::Left => (0, remaining),
        Alignment::Right => (remaining, 0),
    };
    format!(
        "{pad}{}{fitted}{}{pad}",
        " ".repeat(left),
        " ".repeat(right),
        pad = " ".repeat(padding)
    )
}

pub fn horizontal_rule(widths: &[usize], padding: usize) -> String {
    if widths.is_empty() {
        return String::new();
    }
    let total: usize =
        widths.iter().map(|w| w + padding * 2).sum::<usize>() + widths.len().saturating_sub(1);
    "-".repeat(total)
}

/// Two decimals with thousands separators; negatives in red.
pub fn format_amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let negative = rounded < 0.0;
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped}.{frac}").red().to_string()
    } else {
        format!("{grouped}.{frac}")
    }
}

/// One row per ledger date, one column per ledger column.
pub fn render_ledger(ledger: &Ledger) -> String {
    let names: Vec<&str> = ledger.column_names().collect();
    let mut columns = vec![TableColumn::new("Date", Alignment::Left)];
    columns.extend(names.iter().map(|name| TableColumn {
        max_width: Some(24),
        ..TableColumn::new(*name, Alignment::Right)
    }));
    let rows = ledger
        .dates()
        .iter()
        .enumerate()
        .map(|(row, date)| {
            let mut cells = vec![date.to_string()];
            for name in &names {
                let value = ledger.column(name).map_or(0.0, |values| values[row]);
                cells.push(format_amount(value));
            }
            cells
        })
        .collect();
    Table {
        columns,
        rows,
        show_headers: true,
        padding: 1,
    }
    .render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn amounts_group_thousands() {
        plain();
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(-950.0), "-950.00");
        assert_eq!(format_amount(0.004), "0.00");
    }

    #[test]
    fn cells_align_and_truncate() {
        assert_eq!(render_cell("ab", 4, Alignment::Right, 1), "   ab ");
        assert_eq!(render_cell("abcdef", 4, Alignment::Left, 0), "abc…");
    }

    #[test]
    fn ledger_renders_header_rule_and_rows() {
        plain();
        let dates = [2021, 2022].map(|y| chrono::NaiveDate::from_ymd_opt(y, 1, 1).unwrap());
        let mut ledger = Ledger::new(dates);
        ledger.set_column("Revenue", vec![1_000.0, 2_500.5]).unwrap();
        let text = render_ledger(&ledger);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Date") && lines[0].contains("Revenue"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[3].starts_with(" 2022-01-01"));
        assert!(lines[3].ends_with("2,500.50"));
    }

    #[test]
    fn resolution_parses_aliases() {
        assert_eq!("Monthly".parse::<Resolution>(), Ok(Resolution::Monthly));
        assert_eq!("year".parse::<Resolution>(), Ok(Resolution::Annual));
        assert!("weekly".parse::<Resolution>().is_err());
    }
}
