use std::fmt::Write;

use crate::distribution::{ChartKind, DashboardChart, Distribution, Orientation, DASHBOARD_CHARTS};
use crate::export::{self, ReportView};
use crate::filter::{Dimension, Selection};
use crate::metrics::{self, Metrics};
use crate::models::RecordTable;

const NO_DATA: &str = "Sem dados para exibir";

/// Grade average as the dashboard shows it: `N/A` unless positive.
pub fn grade_label(metrics: &Metrics) -> String {
    if metrics.average_grade > 0.0 {
        format!("{:.1}", metrics.average_grade)
    } else {
        "N/A".to_string()
    }
}

fn write_kpis(output: &mut String, metrics: &Metrics) {
    let _ = writeln!(output, "## Indicadores");
    let _ = writeln!(output, "- Total de Alunos: {}", metrics.total_count);
    let _ = writeln!(output, "- Conclusão: {:.1}%", metrics.completion_rate);
    let _ = writeln!(output, "- Frequência Média: {:.1}%", metrics.average_attendance);
    let _ = writeln!(output, "- Média de Notas: {}", grade_label(metrics));
}

fn write_chart(output: &mut String, table: &RecordTable, chart: &DashboardChart) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {}", chart.title);

    if !table.has_column(chart.column) {
        let _ = writeln!(output, "Coluna '{}' não encontrada", chart.column);
        return;
    }

    let distribution = chart.extract(table);
    if distribution.is_empty() {
        let _ = writeln!(output, "{NO_DATA}");
        return;
    }

    match chart.kind {
        ChartKind::Pie => write_shares(output, &distribution),
        ChartKind::Bar(_) => write_counts(output, &distribution),
    }
}

fn write_shares(output: &mut String, distribution: &Distribution) {
    for ((category, share), entry) in distribution.shares().iter().zip(&distribution.entries) {
        let _ = writeln!(output, "- {}: {} ({:.1}%)", category, entry.count, share);
    }
}

fn write_counts(output: &mut String, distribution: &Distribution) {
    // ranked listing reads top-down, so both orientations use the vertical order
    let series = distribution.series(Orientation::Vertical);
    for (label, count) in series.labels.iter().zip(&series.values) {
        let _ = writeln!(output, "- {label}: {count}");
    }
}

/// One-line description of the active filters, sentinels included.
pub fn selection_line(selection: &Selection) -> String {
    let labels: Vec<String> = Dimension::CASCADE
        .iter()
        .map(|dimension| format!("{}: {}", dimension, selection.get(*dimension).label(*dimension)))
        .collect();
    format!("Filtros: {}", labels.join(" | "))
}

/// Markdown rendering of the dashboard for an already filtered table.
pub fn build_report(source_name: &str, selection: &Selection, filtered: &RecordTable) -> String {
    let metrics = metrics::calculate(filtered);
    let mut output = String::new();

    let _ = writeln!(output, "# Dashboard das Turmas");
    let _ = writeln!(output, "Arquivo: {source_name}");
    let _ = writeln!(output, "{}", selection_line(selection));
    let _ = writeln!(output);
    write_kpis(&mut output, &metrics);

    for chart in DASHBOARD_CHARTS.iter() {
        write_chart(&mut output, filtered, chart);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Relatório de Alunos");
    match ReportView::from_table(filtered) {
        Some(view) => {
            let _ = writeln!(output, "| {} |", view.headers.join(" | "));
            let _ = writeln!(output, "|{}", "---|".repeat(view.headers.len()));
            for row in &view.rows {
                let _ = writeln!(output, "| {} |", row.join(" | "));
            }
        }
        None => {
            let _ = writeln!(output, "{}", export::unavailable_reason(filtered));
        }
    }

    output
}
