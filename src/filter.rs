use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::models::{RecordTable, DOCENTE, TURMA, TURNO};

/// The filterable columns, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dimension {
    Docente,
    Turma,
    Turno,
}

impl Dimension {
    pub const CASCADE: [Dimension; 3] = [Dimension::Docente, Dimension::Turma, Dimension::Turno];

    pub fn column(self) -> &'static str {
        match self {
            Dimension::Docente => DOCENTE,
            Dimension::Turma => TURMA,
            Dimension::Turno => TURNO,
        }
    }

    /// Label shown for the "no restriction" choice.
    pub fn all_label(self) -> &'static str {
        match self {
            Dimension::Turma => "Todas",
            Dimension::Docente | Dimension::Turno => "Todos",
        }
    }

    /// Dimensions that restrict the table before this one's options are built.
    pub fn upstream(self) -> &'static [Dimension] {
        match self {
            Dimension::Docente => &[],
            Dimension::Turma => &[Dimension::Docente],
            Dimension::Turno => &[Dimension::Docente, Dimension::Turma],
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One filter value: either unrestricted or an exact category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    pub fn only(value: impl Into<String>) -> Self {
        Choice::Only(value.into())
    }

    /// Reads a selector label. The dimension's sentinel and blank input both
    /// mean no restriction.
    pub fn from_label(dimension: Dimension, label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label == dimension.all_label() {
            Choice::All
        } else {
            Choice::Only(label.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Choice::All => None,
            Choice::Only(value) => Some(value.as_str()),
        }
    }

    pub fn label(&self, dimension: Dimension) -> &str {
        self.value().unwrap_or_else(|| dimension.all_label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub docente: Choice,
    pub turma: Choice,
    pub turno: Choice,
}

impl Selection {
    pub fn get(&self, dimension: Dimension) -> &Choice {
        match dimension {
            Dimension::Docente => &self.docente,
            Dimension::Turma => &self.turma,
            Dimension::Turno => &self.turno,
        }
    }

    pub fn with(mut self, dimension: Dimension, choice: Choice) -> Self {
        match dimension {
            Dimension::Docente => self.docente = choice,
            Dimension::Turma => self.turma = choice,
            Dimension::Turno => self.turno = choice,
        }
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        Dimension::CASCADE
            .iter()
            .all(|dimension| self.get(*dimension).is_all())
    }
}

/// Option lists for the three selectors, each already narrowed by its
/// upstream choices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeOptions {
    pub docente: Vec<Choice>,
    pub turma: Vec<Choice>,
    pub turno: Vec<Choice>,
}

impl CascadeOptions {
    pub fn get(&self, dimension: Dimension) -> &[Choice] {
        match dimension {
            Dimension::Docente => &self.docente,
            Dimension::Turma => &self.turma,
            Dimension::Turno => &self.turno,
        }
    }
}

/// Keeps only rows matching `choice` in the dimension's column. An
/// unrestricted choice or an absent column leaves the table as is.
pub fn restrict(table: &RecordTable, dimension: Dimension, choice: &Choice) -> RecordTable {
    let Some(wanted) = choice.value() else {
        return table.clone();
    };
    let Some(column) = table.column(dimension.column()) else {
        tracing::debug!(%dimension, "filter column absent, skipping restriction");
        return table.clone();
    };
    table.retain_rows(|record| column.get(record).category().as_deref() == Some(wanted))
}

/// Distinct values of `column` in `table`, sorted, with the sentinel first.
fn distinct_choices(table: &RecordTable, dimension: Dimension) -> Vec<Choice> {
    let mut choices = vec![Choice::All];
    if let Some(column) = table.column(dimension.column()) {
        let values: BTreeSet<String> = column.categories().map(|value| value.into_owned()).collect();
        choices.extend(values.into_iter().map(Choice::Only));
    }
    choices
}

/// Options for one selector given the choices made upstream of it.
pub fn options_for(dimension: Dimension, table: &RecordTable, upstream: &Selection) -> Vec<Choice> {
    let mut restricted = table.clone();
    for previous in dimension.upstream() {
        restricted = restrict(&restricted, *previous, upstream.get(*previous));
    }
    distinct_choices(&restricted, dimension)
}

/// All three option lists in one pass, threading the narrowed table from
/// each stage into the next.
pub fn cascade_options(table: &RecordTable, selection: &Selection) -> CascadeOptions {
    let docente = distinct_choices(table, Dimension::Docente);
    let by_docente = restrict(table, Dimension::Docente, &selection.docente);
    let turma = distinct_choices(&by_docente, Dimension::Turma);
    let by_turma = restrict(&by_docente, Dimension::Turma, &selection.turma);
    let turno = distinct_choices(&by_turma, Dimension::Turno);

    CascadeOptions { docente, turma, turno }
}

/// Applies every restricted dimension. Columns missing from the table are
/// skipped, never an error.
pub fn apply(table: &RecordTable, selection: &Selection) -> RecordTable {
    let mut filtered = table.clone();
    for dimension in Dimension::CASCADE {
        filtered = restrict(&filtered, dimension, selection.get(dimension));
    }
    tracing::debug!(
        before = table.len(),
        after = filtered.len(),
        "applied filter selection"
    );
    filtered
}

/// Resets any choice that its selector would no longer offer, walking the
/// cascade so a reset upstream is seen by the stages below it.
pub fn settle(table: &RecordTable, selection: &Selection) -> Selection {
    let mut settled = Selection::default();
    for dimension in Dimension::CASCADE {
        let options = options_for(dimension, table, &settled);
        let wanted = selection.get(dimension);
        let choice = if options.contains(wanted) {
            wanted.clone()
        } else {
            tracing::warn!(
                %dimension,
                value = wanted.label(dimension),
                "selection no longer available, resetting"
            );
            Choice::All
        };
        settled = settled.with(dimension, choice);
    }
    settled
}

/// Explicit choices in `requested` that `settle` had to reset, with the value
/// that was asked for.
pub fn dropped_choices(requested: &Selection, settled: &Selection) -> Vec<(Dimension, String)> {
    Dimension::CASCADE
        .into_iter()
        .filter_map(|dimension| {
            let wanted = requested.get(dimension).value()?;
            (settled.get(dimension).value() != Some(wanted)).then(|| (dimension, wanted.to_string()))
        })
        .collect()
}

/// Filter dimensions whose column the table lacks, in cascade order.
pub fn missing_filter_columns(table: &RecordTable) -> Vec<Dimension> {
    Dimension::CASCADE
        .into_iter()
        .filter(|dimension| !table.has_column(dimension.column()))
        .collect()
}
