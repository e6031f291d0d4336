// File: ./src/cli.rs
//! Command-line front end: argument definitions, logger setup and command dispatch.
use crate::config::Config;
use crate::context::{AppContext, StandardContext};
use crate::controller::TaskController;
use crate::model::{DateType, RecurrenceRule, Task};
use crate::store::CompletionOutcome;
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "tasktide", version)]
#[command(about = "Recurring task scheduling: compute, preview and complete occurrences")]
pub struct Cli {
    /// Use a different directory for config and data
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the next occurrence of a rule after a date
    Next {
        /// Rule as JSON, e.g. '{"frequency":"weekly","interval":1,"weekDays":["monday"]}'
        #[arg(long, value_parser = parse_rule)]
        rule: RecurrenceRule,
        /// Date of the last completed occurrence (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
    },
    /// Print upcoming occurrences of a rule
    Preview {
        #[arg(long, value_parser = parse_rule)]
        rule: RecurrenceRule,
        /// First occurrence (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Number of upcoming dates to print, start date excluded (defaults to `preview_count` from the config)
        #[arg(short, long)]
        count: Option<usize>,
    },
    /// Add a task to local storage
    Add {
        summary: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Due time in UTC (HH:MM); requires --due
        #[arg(long, requires = "due")]
        time: Option<String>,
        #[arg(long, value_parser = parse_rule, requires = "due")]
        rule: Option<RecurrenceRule>,
    },
    /// Mark a task complete, creating its next occurrence if it recurs
    Complete { uid: String },
    /// List stored tasks
    List,
}

pub fn parse_rule(input: &str) -> Result<RecurrenceRule, String> {
    serde_json::from_str(input).map_err(|e| format!("invalid rule: {}", e))
}

fn parse_time(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input, "%H:%M")
        .with_context(|| format!("Invalid time '{}', expected HH:MM", input))
}

/// Logs go to stderr, or to the cache dir when `log_to_file` is set.
pub fn init_logging(config: &Config, ctx: &dyn AppContext, verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        config.log_level.to_filter()
    };
    let log_config = ConfigBuilder::new().set_time_level(LevelFilter::Off).build();

    if config.log_to_file {
        let path = ctx.get_log_path()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        WriteLogger::init(level, log_config, file)?;
    } else {
        TermLogger::init(level, log_config, TerminalMode::Stderr, ColorChoice::Auto)?;
    }
    Ok(())
}

/// The next `count` dates of `rule` after `from`. Fewer if the series ends first.
pub fn preview_dates(rule: &RecurrenceRule, from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    rule.occurrences(from).take(count).collect()
}

pub fn run(cli: Cli) -> Result<()> {
    let ctx: Arc<dyn AppContext> = Arc::new(StandardContext::new(cli.root.clone()));
    let config = Config::load_or_default(ctx.as_ref())?;
    init_logging(&config, ctx.as_ref(), cli.verbose)?;

    match cli.command {
        Commands::Next { rule, from } => match rule.next_after(from) {
            Some(next) => println!("{}", next),
            None => println!("none"),
        },
        Commands::Preview { rule, from, count } => {
            let count = count.unwrap_or(config.preview_count);
            for date in preview_dates(&rule, from, count) {
                println!("{}", date);
            }
        }
        Commands::Add {
            summary,
            due,
            time,
            rule,
        } => {
            let mut task = Task::new(&summary);
            if let Some(date) = due {
                task.due = Some(match time.as_deref() {
                    Some(t) => DateType::Specific(date.and_time(parse_time(t)?).and_utc()),
                    None => DateType::AllDay(date),
                });
            }
            task.recurrence = rule;
            let controller = TaskController::load(ctx)?;
            println!("{}", controller.create_task(task)?);
        }
        Commands::Complete { uid } => {
            let controller = TaskController::load(ctx)?;
            match controller.complete(&uid)? {
                CompletionOutcome::Completed => println!("Completed."),
                CompletionOutcome::SeriesEnded => println!("Completed. Series has ended."),
                CompletionOutcome::Spawned(next_uid) => {
                    println!("Completed. Next occurrence: {}", next_uid)
                }
                CompletionOutcome::AlreadyHandled => println!("Already completed."),
            }
        }
        Commands::List => {
            let controller = TaskController::load(ctx)?;
            for task in controller.tasks()? {
                let due = task.due.map(|d| d.format_short()).unwrap_or_default();
                let repeat = if task.is_recurring() {
                    format!(" (#{})", task.occurrence)
                } else {
                    String::new()
                };
                println!(
                    "{} {} {}{} [{}]",
                    task.checkbox_symbol(),
                    due,
                    task.summary,
                    repeat,
                    task.uid
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_next_command() {
        let cli = Cli::try_parse_from([
            "tasktide",
            "next",
            "--rule",
            r#"{"frequency":"daily","interval":3}"#,
            "--from",
            "2024-01-01",
        ])
        .unwrap();
        match cli.command {
            Commands::Next { rule, from } => {
                assert_eq!(rule.frequency.interval().get(), 3);
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn preview_prints_exactly_count_dates() {
        let rule: RecurrenceRule = parse_rule(r#"{"frequency":"daily","interval":1}"#).unwrap();
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = preview_dates(&rule, from, 3);
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            ]
        );
    }

    #[test]
    fn rejects_zero_interval_rule() {
        let result = Cli::try_parse_from([
            "tasktide",
            "next",
            "--rule",
            r#"{"frequency":"daily","interval":0}"#,
            "--from",
            "2024-01-01",
        ]);
        assert!(result.is_err());
    }
}
