//! Text renderers. User-facing strings keep the product's original Korean
//! phrasing; match counts are reported as "N건".

use crate::analysis::{ChartKind, ChartSpec};
use crate::table::{FilterOp, FilterSet, Table};
use std::fmt::Write;

const MAX_BAR_WIDTH: usize = 40;

/// Aligned text grid for a table. Empty tables render a header plus an
/// informational line rather than nothing.
pub fn table_text(table: &Table) -> String {
    if table.column_count() == 0 {
        return info_line("표시할 컬럼이 없습니다.");
    }

    let mut widths: Vec<usize> = table.columns().iter().map(|c| c.chars().count()).collect();
    let rendered_rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.iter().map(|c| c.render()).collect())
        .collect();
    for row in &rendered_rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, c)| pad(c, widths[i]))
        .collect();
    let _ = writeln!(out, "{}", header.join("  "));
    let _ = writeln!(
        out,
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ")
    );
    for row in &rendered_rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| pad(cell, widths[i]))
            .collect();
        let _ = writeln!(out, "{}", line.join("  "));
    }
    if rendered_rows.is_empty() {
        out.push_str(&warn_line("선택하신 조건에 맞는 데이터가 없습니다."));
    }
    out
}

/// Search result summary. A single equality filter keeps the original
/// product's phrasing; broader filter sets get a generic count line.
pub fn search_summary(filters: &FilterSet, match_count: usize) -> String {
    match filters.predicates() {
        [p] if p.op == FilterOp::Equals => format!(
            "'{}' 컬럼에서 '{}'(으)로 검색된 결과 ({}건)",
            p.column, p.value, match_count
        ),
        [] => format!("전체 데이터 ({}건)", match_count),
        many => format!("{}개 조건으로 검색된 결과 ({}건)", many.len(), match_count),
    }
}

/// A failed plan execution, with the offending payload shown for diagnosis.
pub fn execution_failure_text(message: &str, payload: &str) -> String {
    let mut out = String::new();
    out.push_str(&error_line(&format!(
        "분석 실행 중 오류가 발생했습니다: {}",
        message
    )));
    out.push_str("모델이 반환한 계획:\n");
    for line in payload.lines() {
        let _ = writeln!(out, "    {}", line);
    }
    out
}

/// ASCII rendering of a chart spec. Bars for bar/line, percentage shares for
/// pie.
pub fn chart_text(chart: &ChartSpec) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[{} 차트] {} / {}",
        kind_label(chart.kind),
        chart.label_column,
        chart.value_column
    );
    if chart.values.is_empty() {
        out.push_str(&info_line("차트에 표시할 값이 없습니다."));
        return out;
    }

    let label_width = chart
        .labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);

    match chart.kind {
        ChartKind::Pie => {
            let total: f64 = chart.values.iter().sum();
            for (label, value) in chart.labels.iter().zip(&chart.values) {
                let share = if total == 0.0 { 0.0 } else { value / total * 100.0 };
                let _ = writeln!(
                    out,
                    "{}  {:>6.1}%  ({})",
                    pad(label, label_width),
                    share,
                    value
                );
            }
        }
        ChartKind::Bar | ChartKind::Line => {
            let max = chart.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            for (label, value) in chart.labels.iter().zip(&chart.values) {
                let width = if max <= 0.0 {
                    0
                } else {
                    ((value / max) * MAX_BAR_WIDTH as f64).round().max(0.0) as usize
                };
                let _ = writeln!(
                    out,
                    "{}  {} {}",
                    pad(label, label_width),
                    "█".repeat(width),
                    value
                );
            }
        }
    }
    out
}

pub fn info_line(message: &str) -> String {
    format!("[안내] {}\n", message)
}

pub fn warn_line(message: &str) -> String {
    format!("[주의] {}\n", message)
}

pub fn error_line(message: &str) -> String {
    format!("[오류] {}\n", message)
}

fn kind_label(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::Bar => "막대",
        ChartKind::Line => "선",
        ChartKind::Pie => "원형",
    }
}

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - len))
    }
}
