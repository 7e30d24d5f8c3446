use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

pub const NOME: &str = "Nome";
pub const DOCENTE: &str = "Docente";
pub const TURMA: &str = "Turma";
pub const TURNO: &str = "Turno";
pub const CURSO: &str = "Curso";
pub const FREQUENCIA: &str = "Frequência";
pub const NOTA_FINAL: &str = "Nota Final";
pub const RESULTADO_FINAL: &str = "Resultado Final";
pub const SITUACAO_ALUNO: &str = "Situação do Aluno";

/// Columns typed as numbers at ingestion. Everything else stays text.
pub const NUMERIC_COLUMNS: [&str; 2] = [FREQUENCIA, NOTA_FINAL];

/// A single cell. Missing data is `Null`, never an empty string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric reading of the cell. Text is not coerced here: anything that
    /// was not typed as a finite number at ingestion counts as missing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// The text used for grouping and equality in categorical columns.
    pub fn category(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// One student row. Values are positional and line up with the owning
/// table's column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// In-memory student table. Nothing in the crate mutates a table after it is
/// built; filtering produces a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Record>,
}

/// Borrowed view of one column that is known to exist.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    table: &'a RecordTable,
    index: usize,
}

impl RecordTable {
    /// Builds a table, padding short rows with nulls and truncating long ones
    /// so every record matches the column list.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut values| {
                values.resize(width, Value::Null);
                Record::new(values)
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// The single place where "this column may not exist" is decided.
    pub fn column(&self, name: &str) -> Option<Column<'_>> {
        self.columns
            .iter()
            .position(|column| column == name)
            .map(|index| Column { table: self, index })
    }

    /// New table with the same schema holding only the rows `keep` accepts,
    /// in their original order.
    pub fn retain_rows<F>(&self, mut keep: F) -> RecordTable
    where
        F: FnMut(&Record) -> bool,
    {
        RecordTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }
}

impl<'a> Column<'a> {
    pub fn name(&self) -> &'a str {
        &self.table.columns[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get<'r>(&self, record: &'r Record) -> &'r Value {
        &record.values[self.index]
    }

    pub fn values(&self) -> impl Iterator<Item = &'a Value> + 'a {
        let (table, index) = (self.table, self.index);
        table.rows.iter().map(move |row| &row.values[index])
    }

    /// Non-null numeric cells only.
    pub fn numbers(&self) -> impl Iterator<Item = f64> + 'a {
        self.values().filter_map(Value::as_number)
    }

    /// Non-null category labels only.
    pub fn categories(&self) -> impl Iterator<Item = Cow<'a, str>> + 'a {
        self.values().filter_map(Value::category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> RecordTable {
        RecordTable::new(
            vec![TURMA.to_string(), NOTA_FINAL.to_string()],
            vec![
                vec!["3A".into(), Value::Number(10.0)],
                vec![Value::Number(301.0), Value::Null],
                vec![Value::Null],
            ],
        )
    }

    #[test]
    fn short_rows_are_padded_with_nulls() {
        let table = sample_table();
        assert_eq!(table.rows()[2].values(), &[Value::Null, Value::Null]);
    }

    #[test]
    fn missing_column_lookup_is_none() {
        let table = sample_table();
        assert!(table.column(DOCENTE).is_none());
        assert!(table.has_column(TURMA));
    }

    #[test]
    fn numeric_categories_render_without_trailing_zero() {
        let table = sample_table();
        let turma = table.column(TURMA).unwrap();
        let labels: Vec<_> = turma.categories().map(|c| c.into_owned()).collect();
        assert_eq!(labels, vec!["3A".to_string(), "301".to_string()]);
    }

    #[test]
    fn text_in_numeric_column_is_not_a_number() {
        assert_eq!(Value::from("12").as_number(), None);
        assert_eq!(Value::Number(f64::NAN).as_number(), None);
        assert_eq!(Value::Number(7.5).as_number(), Some(7.5));
    }

    #[test]
    fn retain_rows_leaves_source_untouched() {
        let table = sample_table();
        let graded = table.retain_rows(|row| !row.values()[1].is_null());
        assert_eq!(graded.len(), 1);
        assert_eq!(table.len(), 3);
        assert_eq!(graded.columns(), table.columns());
    }
}
