use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cohort_dashboard::export::{self, ReportView};
use cohort_dashboard::filter::{self, Choice, Dimension, Selection};
use cohort_dashboard::{ingest, metrics, report, RecordTable};

#[derive(Parser)]
#[command(name = "cohort-dashboard")]
#[command(about = "Filtered summaries over a student results spreadsheet", long_about = None)]
struct Cli {
    /// CSV export of the student spreadsheet
    #[arg(long, global = true, env = "COHORT_DASHBOARD_FILE")]
    file: Option<PathBuf>,
    /// Field separator; detected from the header line when omitted
    #[arg(long, global = true)]
    delimiter: Option<char>,
    /// Log filter decisions and ingestion details
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Teacher to restrict to ("Todos" for everyone)
    #[arg(long)]
    docente: Option<String>,
    /// Class to restrict to ("Todas" for every class)
    #[arg(long)]
    turma: Option<String>,
    /// Shift to restrict to ("Todos" for every shift)
    #[arg(long)]
    turno: Option<String>,
}

impl FilterArgs {
    fn requested(&self) -> Selection {
        let choice = |dimension: Dimension, value: &Option<String>| {
            value
                .as_deref()
                .map_or(Choice::All, |label| Choice::from_label(dimension, label))
        };
        Selection {
            docente: choice(Dimension::Docente, &self.docente),
            turma: choice(Dimension::Turma, &self.turma),
            turno: choice(Dimension::Turno, &self.turno),
        }
    }

    /// The requested selection checked against the table. A value the table
    /// does not offer is an error rather than a silently widened filter.
    fn resolve(&self, table: &RecordTable) -> anyhow::Result<Selection> {
        let requested = self.requested();
        let settled = filter::settle(table, &requested);
        let dropped = filter::dropped_choices(&requested, &settled);
        if let Some((dimension, value)) = dropped.first() {
            let offered = filter::options_for(*dimension, table, &settled);
            let labels: Vec<&str> = offered.iter().map(|choice| choice.label(*dimension)).collect();
            bail!(
                "{dimension} {value:?} is not available under the current filters; options: {}",
                labels.join(", ")
            );
        }
        Ok(settled)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the selector options under the current filters
    Options {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print the headline metrics
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown dashboard report
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write the filtered student list as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(file: Option<&Path>, delimiter: Option<char>) -> anyhow::Result<(RecordTable, String)> {
    let path = file.context("no student file given; pass --file or set COHORT_DASHBOARD_FILE")?;
    let delimiter = delimiter
        .map(|separator| u8::try_from(separator).context("--delimiter must be a single-byte character"))
        .transpose()?;
    let table = ingest::load_csv(path, delimiter)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());

    tracing::info!(file = %name, records = table.len(), "student file ready");

    let missing = filter::missing_filter_columns(&table);
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|dimension| dimension.column()).collect();
        tracing::warn!(columns = %names.join(", "), "filter columns missing from file");
    }

    Ok((table, name))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (table, source_name) = load(cli.file.as_deref(), cli.delimiter)?;

    match cli.command {
        Commands::Options { filters } => {
            let selection = filters.resolve(&table)?;
            let options = filter::cascade_options(&table, &selection);
            for dimension in Dimension::CASCADE {
                let labels: Vec<&str> = options
                    .get(dimension)
                    .iter()
                    .map(|choice| choice.label(dimension))
                    .collect();
                println!(
                    "{} [{}]: {}",
                    dimension,
                    selection.get(dimension).label(dimension),
                    labels.join(", ")
                );
            }
        }
        Commands::Summary { filters, json } => {
            let selection = filters.resolve(&table)?;
            let filtered = filter::apply(&table, &selection);
            let metrics = metrics::calculate(&filtered);

            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                println!("{}", report::selection_line(&selection));
                println!("Total de Alunos: {}", metrics.total_count);
                println!("Conclusão: {:.1}%", metrics.completion_rate);
                println!("Frequência Média: {:.1}%", metrics.average_attendance);
                println!("Média de Notas: {}", report::grade_label(&metrics));
            }
        }
        Commands::Report { filters, out } => {
            let selection = filters.resolve(&table)?;
            let filtered = filter::apply(&table, &selection);
            let report = report::build_report(&source_name, &selection, &filtered);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { filters, out_dir } => {
            let selection = filters.resolve(&table)?;
            let filtered = filter::apply(&table, &selection);
            println!("{}", report::selection_line(&selection));

            let Some(view) = ReportView::from_table(&filtered) else {
                println!("{}.", export::unavailable_reason(&filtered));
                return Ok(());
            };

            let file_name = export::export_file_name(&selection, Local::now().naive_local());
            let path = out_dir.join(file_name);
            let file = std::fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            view.write_csv(file)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported {} students to {}.", view.rows.len(), path.display());
        }
    }

    Ok(())
}
