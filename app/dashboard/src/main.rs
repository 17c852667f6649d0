//! FILENAME: app/dashboard/src/main.rs
// PURPOSE: `popstats` command-line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use app_lib::{
    apply_selections, create_app_state, filtered_rows, get_filter_panel, init_logging, log_error, log_info,
    open_session, render, render_report, AppError, AppState, DashboardConfig, SessionId,
};
use clap::{Parser, Subcommand, ValueEnum};
use persistence::{save_report_xlsx, SourceConfig, DEFAULT_QUERY};

/// Exit status for a rejected filter value.
const EXIT_INVALID_SELECTION: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "popstats", version, about = "Population statistics dashboard")]
struct Cli {
    /// JSON configuration file (defaults to $POPSTATS_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read the population table from a CSV file
    #[arg(long, conflicts_with_all = ["xlsx", "sqlite"])]
    csv: Option<PathBuf>,

    /// Field delimiter for --csv (defaults to the configured one, then ',')
    #[arg(long, requires = "csv")]
    delimiter: Option<char>,

    /// Read the population table from an XLSX workbook
    #[arg(long, conflicts_with = "sqlite")]
    xlsx: Option<PathBuf>,

    /// Worksheet to read with --xlsx
    #[arg(long, requires = "xlsx")]
    sheet: Option<String>,

    /// Query a SQLite database
    #[arg(long)]
    sqlite: Option<PathBuf>,

    /// Query to run with --sqlite
    #[arg(long, requires = "sqlite")]
    query: Option<String>,

    /// Log level override (error, warn, info, debug, trace, off)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the filter panel
    Options {
        #[arg(short = 's', long = "select", value_parser = parse_pair)]
        selections: Vec<(String, String)>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Render the dashboard report
    Report {
        #[arg(short = 's', long = "select", value_parser = parse_pair)]
        selections: Vec<(String, String)>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Also write every aggregate to an XLSX workbook
        #[arg(long)]
        export_xlsx: Option<PathBuf>,
    },
    /// Show the rows of the filtered table
    Rows {
        #[arg(short = 's', long = "select", value_parser = parse_pair)]
        selections: Vec<(String, String)>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(facet, value)| (facet.trim().to_string(), value.to_string()))
        .filter(|(facet, _)| !facet.is_empty())
        .ok_or_else(|| format!("expected FACET=VALUE, got {:?}", raw))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log_error!("CLI", "{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<DashboardConfig, AppError> {
    let mut config = DashboardConfig::load(cli.config.as_deref())?;

    if let Some(path) = &cli.csv {
        let configured = match &config.source {
            SourceConfig::Csv { delimiter, .. } => Some(*delimiter),
            _ => None,
        };
        config.source = SourceConfig::Csv {
            path: path.clone(),
            delimiter: cli.delimiter.or(configured).unwrap_or(','),
        };
    } else if let Some(path) = &cli.xlsx {
        config.source = SourceConfig::Xlsx {
            path: path.clone(),
            sheet: cli.sheet.clone(),
        };
    } else if let Some(database) = &cli.sqlite {
        config.source = SourceConfig::Sql {
            database: database.clone(),
            query: cli.query.clone().unwrap_or_else(|| DEFAULT_QUERY.to_string()),
        };
    }

    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let config = load_config(&cli)?;
    init_logging(&config.log)?;
    let state = create_app_state(config)?;
    let id = open_session(&state)?;

    let selections = match &cli.command {
        Command::Options { selections, .. }
        | Command::Report { selections, .. }
        | Command::Rows { selections, .. } => selections,
    };
    if let Err(e) = apply_selections(&state, id, selections) {
        return report_selection_error(&state, id, selections, e);
    }

    match cli.command {
        Command::Options { format, .. } => {
            let panel = get_filter_panel(&state, id)?;
            match format {
                OutputFormat::Text => print!("{}", render::render_panel(&panel)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&panel)?),
            }
        }
        Command::Report {
            format, export_xlsx, ..
        } => {
            let report = render_report(&state, id)?;
            if let Some(path) = export_xlsx {
                let mut sheets = report.aggregates.clone();
                sheets.push(cascade_engine::NamedAggregate {
                    name: "top_districts".to_string(),
                    output: cascade_engine::AggregateOutput::Table(report.top_districts.table.clone()),
                });
                save_report_xlsx(&sheets, &path)?;
                log_info!("CLI", "exported report to {}", path.display());
            }
            match format {
                OutputFormat::Text => print!("{}", render::render_report(&report)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            }
        }
        Command::Rows { limit, format, .. } => {
            let view = filtered_rows(&state, id, Some(limit))?;
            match format {
                OutputFormat::Text => print!("{}", render::render_rows(&view)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints the rejected value with the options that were valid, then exits 2.
/// Other errors propagate unchanged.
fn report_selection_error(
    state: &AppState,
    id: SessionId,
    selections: &[(String, String)],
    error: AppError,
) -> Result<ExitCode, AppError> {
    let Some((facet, value)) = error.invalid_selection() else {
        return match error {
            AppError::Engine(cascade_engine::EngineError::UnknownFacet(name)) => {
                eprintln!("unknown facet {:?}", name);
                Ok(ExitCode::from(EXIT_INVALID_SELECTION))
            }
            other => Err(other),
        };
    };

    eprintln!("invalid selection {:?} for {}", value, facet);
    // Options shown are those of the earlier facets' narrowed subset.
    let panel = get_filter_panel(state, id)?;
    if let Some(position) = panel.widgets.iter().position(|w| w.label == facet) {
        let earlier = &panel.widgets[..position];
        let prefix: Vec<(String, String)> = selections
            .iter()
            .filter(|(name, _)| earlier.iter().any(|w| w.label == *name || w.column == *name))
            .cloned()
            .collect();
        let narrowed = apply_selections(state, id, &prefix)?;
        eprintln!("valid options: {}", narrowed.widgets[position].options.join(", "));
    }
    Ok(ExitCode::from(EXIT_INVALID_SELECTION))
}
