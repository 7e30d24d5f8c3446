use std::collections::BTreeSet;

use chrono::NaiveDate;
use cohort_dashboard::distribution::{self, DASHBOARD_CHARTS};
use cohort_dashboard::export::{self, ReportView};
use cohort_dashboard::filter::{self, Choice, Dimension, Selection};
use cohort_dashboard::models::{DOCENTE, FREQUENCIA, NOTA_FINAL, TURMA, TURNO};
use cohort_dashboard::{ingest, metrics, RecordTable, Value};

/// 100 students spread across 10 teachers; each teacher covers two of the
/// twelve classes.
fn school() -> RecordTable {
    let turnos = ["Manhã", "Tarde", "Noite"];
    let rows = (0..100)
        .map(|i| {
            let docente = format!("Docente {:02}", i % 10);
            let turma = format!("T{:02}", (i % 10 + (i / 10) % 2 * 3) % 12);
            let turno = turnos[i % 3];
            let nota = if i % 4 == 0 { Value::Null } else { Value::Number((i % 10) as f64) };
            let frequencia = if i % 5 == 0 { Value::Null } else { Value::Number(60.0 + (i % 40) as f64) };
            vec![
                Value::from(docente),
                Value::from(turma),
                Value::from(turno),
                nota,
                frequencia,
            ]
        })
        .collect();

    RecordTable::new(
        vec![
            DOCENTE.to_string(),
            TURMA.to_string(),
            TURNO.to_string(),
            NOTA_FINAL.to_string(),
            FREQUENCIA.to_string(),
        ],
        rows,
    )
}

fn values(choices: &[Choice]) -> BTreeSet<String> {
    choices
        .iter()
        .filter_map(|choice| choice.value().map(str::to_string))
        .collect()
}

#[test]
fn selecting_a_teacher_never_widens_class_options() {
    let table = school();
    let all_turmas = values(&filter::options_for(Dimension::Turma, &table, &Selection::default()));
    assert_eq!(values(&filter::options_for(Dimension::Docente, &table, &Selection::default())).len(), 10);

    for docente in 0..10 {
        let name = format!("Docente {docente:02}");
        let selection = Selection::default().with(Dimension::Docente, Choice::only(name.clone()));
        let turmas = values(&filter::options_for(Dimension::Turma, &table, &selection));

        assert!(turmas.is_subset(&all_turmas));
        let taught: BTreeSet<String> = filter::apply(&table, &selection)
            .column(TURMA)
            .expect("turma column")
            .categories()
            .map(|turma| turma.into_owned())
            .collect();
        assert_eq!(turmas, taught);
    }
}

#[test]
fn filtered_metrics_and_export_agree() {
    let table = school();
    let selection = filter::settle(
        &table,
        &Selection::default()
            .with(Dimension::Docente, Choice::only("Docente 03"))
            .with(Dimension::Turma, Choice::only("T03")),
    );
    assert_eq!(selection.turma, Choice::only("T03"));

    let filtered = filter::apply(&table, &selection);
    assert_eq!(filtered.len(), 5);
    assert_eq!(filter::apply(&filtered, &selection), filtered);

    let summary = metrics::calculate(&filtered);
    assert_eq!(summary.total_count, 5);
    assert!(summary.completion_rate >= 0.0 && summary.completion_rate <= 100.0);

    let turnos = distribution::extract(&filtered, TURNO, None);
    assert_eq!(turnos.total(), 5);

    let timestamp = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|date| date.and_hms_opt(14, 5, 0))
        .expect("timestamp");
    assert_eq!(
        export::export_base_name(&selection, timestamp),
        "dados_alunos_20240301_1405_Docente_03_T03"
    );

    let view = ReportView::from_table(&filtered).expect("report view");
    assert_eq!(view.rows.len(), 5);
}

#[test]
fn csv_file_flows_through_the_dashboard() {
    let csv = "Nome,Docente,Turma,Turno,Curso,Frequência,Nota Final,Resultado Final,Situação do Aluno\n\
               Ana,Paula Reis,3A,Manhã,Química,95,8.5,Aprovado,Ativo\n\
               Bia,Paula Reis,3A,Manhã,Química,80,,Cursando,Ativo\n\
               Caio,Paula Reis,3B,Tarde,Física,n/a,4,Reprovado,Evadido\n\
               Davi,Rui Costa,2A,Noite,Física,70,6,Aprovado,Ativo\n";
    let table = ingest::read_table(csv.as_bytes()).expect("table");

    let selection = Selection::default().with(Dimension::Docente, Choice::only("Paula Reis"));
    let options = filter::cascade_options(&table, &selection);
    assert_eq!(values(&options.turma), BTreeSet::from(["3A".to_string(), "3B".to_string()]));

    let filtered = filter::apply(&table, &selection);
    let summary = metrics::calculate(&filtered);
    assert_eq!(summary.total_count, 3);
    assert!((summary.completion_rate - 200.0 / 3.0).abs() < 1e-9);
    assert!((summary.average_grade - 6.25).abs() < 1e-9);
    assert!((summary.average_attendance - 87.5).abs() < 1e-9);

    let charts: Vec<_> = DASHBOARD_CHARTS
        .iter()
        .map(|chart| chart.extract(&filtered))
        .collect();
    assert_eq!(charts[0].get("Ativo"), Some(2));
    assert_eq!(charts[3].get("Química"), Some(2));

    let view = ReportView::from_table(&filtered).expect("report view");
    let mut buffer = Vec::new();
    view.write_csv(&mut buffer).expect("csv");
    let written = ingest::read_table(buffer.as_slice()).expect("reread");
    assert_eq!(written.len(), 3);
    assert_eq!(table.len(), 4);
}
