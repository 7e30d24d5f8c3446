use indexmap::IndexMap;
use serde::Serialize;

use crate::models::{RecordTable, CURSO, RESULTADO_FINAL, SITUACAO_ALUNO, TURNO};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Record counts per category, largest first. Ties keep the order in which
/// the categories first appear in the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub column: String,
    pub entries: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Vertical,
    /// Ranking bars; the biggest category is drawn last so it sits on top.
    Horizontal,
}

/// Parallel label/value arrays ready for a bar chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<usize>,
}

impl Distribution {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }

    pub fn get(&self, category: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.count)
    }

    pub fn series(&self, orientation: Orientation) -> ChartSeries {
        let mut ordered: Vec<&CategoryCount> = self.entries.iter().collect();
        if orientation == Orientation::Horizontal {
            // stable, so equal counts keep their first-seen order
            ordered.sort_by_key(|entry| entry.count);
        }
        let mut series = ChartSeries::default();
        for entry in ordered {
            series.labels.push(entry.category.clone());
            series.values.push(entry.count);
        }
        series
    }

    /// Percentage of the distribution total held by each category, for pie
    /// charts.
    pub fn shares(&self) -> Vec<(String, f64)> {
        let total = self.total();
        if total == 0 {
            return Vec::new();
        }
        self.entries
            .iter()
            .map(|entry| {
                (
                    entry.category.clone(),
                    entry.count as f64 / total as f64 * 100.0,
                )
            })
            .collect()
    }
}

/// Counts the non-null categories of `column`. An absent column or a table
/// with nothing to count yields an empty distribution. A `top_n` of zero
/// means no cap.
pub fn extract(table: &RecordTable, column: &str, top_n: Option<usize>) -> Distribution {
    let mut counts: IndexMap<String, usize> = IndexMap::new();

    if let Some(values) = table.column(column) {
        for category in values.categories() {
            *counts.entry(category.into_owned()).or_insert(0) += 1;
        }
    }

    let mut entries: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category, count })
        .collect();

    // sort_by is stable, which keeps first-seen order among equal counts
    entries.sort_by(|a, b| b.count.cmp(&a.count));

    if let Some(limit) = top_n.filter(|limit| *limit > 0) {
        entries.truncate(limit);
    }

    Distribution {
        column: column.to_string(),
        entries,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar(Orientation),
}

/// A chart on the dashboard: which column it breaks down and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardChart {
    pub title: &'static str,
    pub column: &'static str,
    pub kind: ChartKind,
    pub top_n: Option<usize>,
}

impl DashboardChart {
    pub fn extract(&self, table: &RecordTable) -> Distribution {
        extract(table, self.column, self.top_n)
    }
}

pub const DASHBOARD_CHARTS: [DashboardChart; 4] = [
    DashboardChart {
        title: "Situação dos Alunos",
        column: SITUACAO_ALUNO,
        kind: ChartKind::Pie,
        top_n: None,
    },
    DashboardChart {
        title: "Resultado Final",
        column: RESULTADO_FINAL,
        kind: ChartKind::Bar(Orientation::Vertical),
        top_n: None,
    },
    DashboardChart {
        title: "Alunos por Turno",
        column: TURNO,
        kind: ChartKind::Bar(Orientation::Vertical),
        top_n: None,
    },
    DashboardChart {
        title: "Alunos por Curso",
        column: CURSO,
        kind: ChartKind::Bar(Orientation::Horizontal),
        top_n: Some(10),
    },
];
