use serde::Serialize;

use crate::models::{RecordTable, FREQUENCIA, NOTA_FINAL};

/// Headline numbers for a filtered table.
///
/// The two means read 0 both when they were computed as 0 and when there was
/// nothing to average; `graded_count` and `attendance_count` tell the cases
/// apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub total_count: usize,
    pub completion_rate: f64,
    pub average_attendance: f64,
    pub average_grade: f64,
    pub graded_count: usize,
    pub attendance_count: usize,
}

impl Metrics {
    pub fn has_grades(&self) -> bool {
        self.graded_count > 0
    }

    pub fn has_attendance(&self) -> bool {
        self.attendance_count > 0
    }
}

/// Count and sum of the numeric cells in `column`, or zeros when the column
/// is absent. Cells that are not finite numbers are skipped.
fn numeric_totals(table: &RecordTable, column: &str) -> (usize, f64) {
    table.column(column).map_or((0, 0.0), |column| {
        column
            .numbers()
            .fold((0, 0.0), |(count, sum), value| (count + 1, sum + value))
    })
}

fn mean(count: usize, sum: f64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn calculate(table: &RecordTable) -> Metrics {
    let total_count = table.len();
    let (graded_count, grade_sum) = numeric_totals(table, NOTA_FINAL);
    let (attendance_count, attendance_sum) = numeric_totals(table, FREQUENCIA);

    let completion_rate = if total_count == 0 {
        0.0
    } else {
        graded_count as f64 / total_count as f64 * 100.0
    };

    Metrics {
        total_count,
        completion_rate,
        average_attendance: mean(attendance_count, attendance_sum),
        average_grade: mean(graded_count, grade_sum),
        graded_count,
        attendance_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Value, TURMA};

    fn grades(values: &[Option<f64>]) -> RecordTable {
        RecordTable::new(
            vec![NOTA_FINAL.to_string(), FREQUENCIA.to_string()],
            values
                .iter()
                .map(|grade| vec![Value::from(*grade), Value::Null])
                .collect(),
        )
    }

    #[test]
    fn empty_table_is_all_zero() {
        let metrics = calculate(&RecordTable::default());
        assert_eq!(metrics.total_count, 0);
        assert_eq!(metrics.completion_rate, 0.0);
        assert_eq!(metrics.average_attendance, 0.0);
        assert_eq!(metrics.average_grade, 0.0);
    }

    #[test]
    fn nulls_are_excluded_from_grade_mean() {
        let metrics = calculate(&grades(&[Some(10.0), None, Some(20.0)]));
        assert_eq!(metrics.total_count, 3);
        assert!((metrics.average_grade - 15.0).abs() < 1e-9);
        assert!((metrics.completion_rate - 66.666_666).abs() < 0.001);
        assert_eq!(format!("{:.1}", metrics.completion_rate), "66.7");
        assert!(metrics.has_grades());
        assert!(!metrics.has_attendance());
    }

    #[test]
    fn attendance_mean_skips_null_rows() {
        let table = RecordTable::new(
            vec![FREQUENCIA.to_string()],
            vec![
                vec![Value::Number(90.0)],
                vec![Value::Null],
                vec![Value::Number(70.0)],
            ],
        );
        let metrics = calculate(&table);
        assert!((metrics.average_attendance - 80.0).abs() < 1e-9);
        assert_eq!(metrics.attendance_count, 2);
    }

    #[test]
    fn missing_columns_degrade_to_zero() {
        let table = RecordTable::new(vec![TURMA.to_string()], vec![vec!["3A".into()]]);
        let metrics = calculate(&table);
        assert_eq!(metrics.total_count, 1);
        assert_eq!(metrics.completion_rate, 0.0);
        assert_eq!(metrics.average_grade, 0.0);
        assert_eq!(metrics.average_attendance, 0.0);
    }

    #[test]
    fn malformed_grade_counts_as_missing() {
        let table = RecordTable::new(
            vec![NOTA_FINAL.to_string()],
            vec![vec![Value::Number(8.0)], vec!["dispensado".into()]],
        );
        let metrics = calculate(&table);
        assert_eq!(metrics.graded_count, 1);
        assert!((metrics.completion_rate - 50.0).abs() < 1e-9);
        assert!((metrics.average_grade - 8.0).abs() < 1e-9);
    }

    #[test]
    fn completion_rate_stays_within_bounds() {
        let metrics = calculate(&grades(&[Some(0.0), Some(5.0)]));
        assert_eq!(metrics.completion_rate, 100.0);
        assert_eq!(metrics.average_grade, 2.5);
    }
}
