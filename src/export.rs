use std::io::Write;

use chrono::NaiveDateTime;

use crate::filter::Selection;
use crate::models::{
    RecordTable, Value, CURSO, DOCENTE, FREQUENCIA, NOME, NOTA_FINAL, RESULTADO_FINAL,
    SITUACAO_ALUNO, TURMA, TURNO,
};

const EXPORT_PREFIX: &str = "dados_alunos";

/// Columns shown in the student report and written to the export, in order.
pub const DISPLAY_COLUMNS: [&str; 9] = [
    NOME,
    TURMA,
    CURSO,
    DOCENTE,
    TURNO,
    FREQUENCIA,
    NOTA_FINAL,
    RESULTADO_FINAL,
    SITUACAO_ALUNO,
];

const MISSING: &str = "-";

/// Why a filtered table produced no report view: no rows at all, or rows
/// without any of the display columns.
pub fn unavailable_reason(filtered: &RecordTable) -> &'static str {
    if filtered.is_empty() {
        "Nenhum dado encontrado com os filtros atuais"
    } else {
        "Nenhuma coluna disponível para exibição"
    }
}

/// `dados_alunos_<YYYYMMDD_HHMM>` plus the docente and turma when they are
/// restricted. Spaces become underscores; nothing else is touched.
pub fn export_base_name(selection: &Selection, timestamp: NaiveDateTime) -> String {
    let mut name = format!("{EXPORT_PREFIX}_{}", timestamp.format("%Y%m%d_%H%M"));
    for choice in [&selection.docente, &selection.turma] {
        if let Some(value) = choice.value() {
            name.push('_');
            name.push_str(&value.replace(' ', "_"));
        }
    }
    name
}

pub fn export_file_name(selection: &Selection, timestamp: NaiveDateTime) -> String {
    format!("{}.csv", export_base_name(selection, timestamp))
}

/// The filtered table as display strings: the available report columns,
/// attendance as a percentage, grades with one decimal, `-` for gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn format_cell(column: &str, value: &Value) -> String {
    match column {
        FREQUENCIA => value
            .as_number()
            .map_or_else(|| MISSING.to_string(), |n| format!("{n:.1}%")),
        NOTA_FINAL => value
            .as_number()
            .map_or_else(|| MISSING.to_string(), |n| format!("{n:.1}")),
        _ if value.is_null() => MISSING.to_string(),
        _ => value.to_string(),
    }
}

impl ReportView {
    /// `None` when there are no rows or none of the display columns exist;
    /// the caller reports that instead of exporting an empty file.
    pub fn from_table(table: &RecordTable) -> Option<Self> {
        if table.is_empty() {
            return None;
        }
        let columns: Vec<_> = DISPLAY_COLUMNS
            .iter()
            .filter_map(|name| table.column(name))
            .collect();
        if columns.is_empty() {
            return None;
        }

        let headers = columns.iter().map(|column| column.name().to_string()).collect();
        let rows = table
            .rows()
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| format_cell(column.name(), column.get(record)))
                    .collect::<Vec<String>>()
            })
            .collect();

        Some(Self { headers, rows })
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
