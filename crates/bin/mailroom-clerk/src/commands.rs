use std::error::Error;
use std::io::{self, BufRead, Write};

use mailroom_core::control::{ClerkControlPlane, EventQuery, SubmitRequest};
use mailroom_core::store::LoadReport;
use mailroom_shell::{ClerkShell, ShellOutcome};
use mailroom_store::models::RecordKind;
use serde::Serialize;
use tracing::warn;

use crate::config::{ClerkCommand, ClerkConfig};

type CommandResult = Result<(), Box<dyn Error>>;

pub fn run(config: &ClerkConfig, control: &ClerkControlPlane) -> CommandResult {
    let json = config.json;
    match config.command.clone() {
        ClerkCommand::Init => {
            let created = control.init_stores()?;
            if json {
                print_json(&created)?;
            } else if created.is_empty() {
                println!("stores already present in {}", control.store().data_dir().display());
            } else {
                for path in created {
                    println!("created {}", path.display());
                }
            }
        }
        ClerkCommand::AddMail {
            day,
            to,
            from,
            priority,
        } => submit(
            control,
            json,
            SubmitRequest {
                kind: RecordKind::Mail,
                day,
                to,
                from,
                priority,
                weight: None,
                volume: None,
            },
        )?,
        ClerkCommand::AddParcel {
            day,
            to,
            from,
            weight,
            volume,
            priority,
        } => submit(
            control,
            json,
            SubmitRequest {
                kind: RecordKind::Parcel,
                day,
                to,
                from,
                priority,
                weight: Some(weight),
                volume: Some(volume),
            },
        )?,
        ClerkCommand::List { kind, sort } => {
            let query = EventQuery::default().with_kind(kind).sorted(sort);
            print_report(&control.list_events(&query)?, json)?;
        }
        ClerkCommand::Between {
            from,
            to,
            kind,
            sort,
        } => {
            let query = EventQuery::default()
                .with_kind(kind)
                .between(from, to)
                .sorted(sort);
            print_report(&control.list_events(&query)?, json)?;
        }
        ClerkCommand::Route {
            kind,
            from,
            to,
            sort,
        } => {
            let report = control.route_events(kind, from.as_deref(), to.as_deref(), sort)?;
            print_report(&report, json)?;
        }
        ClerkCommand::Countries => {
            let countries = control.countries()?;
            if json {
                print_json(&countries)?;
            } else {
                for country in countries {
                    println!("{country}");
                }
            }
        }
        ClerkCommand::Fields { store, tags } => {
            let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
            let columns = control.tag_columns(&store, &tags)?;
            if json {
                print_json(&columns)?;
            } else {
                for column in columns {
                    println!("{}: {}", column.tag, column.values.join(" | "));
                }
            }
        }
        ClerkCommand::Shell => run_shell(control.clone())?,
    }
    Ok(())
}

fn submit(control: &ClerkControlPlane, json: bool, request: SubmitRequest) -> CommandResult {
    let report = control.submit(&request)?;
    if json {
        print_json(&report)?;
    } else {
        println!("saved {} to {}", report.event, report.store_path);
    }
    Ok(())
}

fn print_report(report: &LoadReport, json: bool) -> CommandResult {
    if json {
        return print_json(report);
    }
    for event in &report.events {
        println!("{event}");
    }
    for skipped in &report.skipped {
        eprintln!("skipped {skipped}");
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_shell(control: ClerkControlPlane) -> CommandResult {
    let mut shell = ClerkShell::new(control);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    write!(stdout, "{}> ", shell.render())?;
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        match shell.handle_line(&line) {
            ShellOutcome::Continue(output) => write!(stdout, "{output}> ")?,
            ShellOutcome::Quit => return Ok(()),
        }
        stdout.flush()?;
    }
    warn!("stdin closed, leaving shell");
    writeln!(stdout)?;
    Ok(())
}
