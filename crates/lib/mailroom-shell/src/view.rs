use std::fmt::Write;

use mailroom_core::store::LoadReport;

use crate::command::{Command, Panel, Transition, dispatch};

pub fn top_bar(active: Panel) -> String {
    let buttons: Vec<String> = Command::ALL
        .into_iter()
        .map(|command| {
            if dispatch(command) == Transition::Show(active) {
                format!("[*{}*]", command.label())
            } else {
                format!("[ {} ]", command.label())
            }
        })
        .collect();
    buttons.join(" ")
}

/// Plain text table of the events in a load report.
///
/// Parcel columns are shown only when `with_parcels` is set.
pub fn event_table(report: &LoadReport, with_parcels: bool) -> String {
    let mut output = String::new();
    if with_parcels {
        let _ = writeln!(
            output,
            "  {:<7} {:<10} {:<16} {:<16} {:>8} {:>8} {:>8}",
            "kind", "day", "from", "to", "weight", "volume", "priority"
        );
    } else {
        let _ = writeln!(
            output,
            "  {:<7} {:<10} {:<16} {:<16} {:>8}",
            "kind", "day", "from", "to", "priority"
        );
    }

    for event in &report.events {
        let day = event.day.to_string();
        if with_parcels {
            let _ = writeln!(
                output,
                "  {:<7} {:<10} {:<16} {:<16} {:>8} {:>8} {:>8}",
                event.kind.tag(),
                day,
                event.from,
                event.to,
                event.weight.as_deref().unwrap_or("-"),
                event.volume.as_deref().unwrap_or("-"),
                event.priority
            );
        } else {
            let _ = writeln!(
                output,
                "  {:<7} {:<10} {:<16} {:<16} {:>8}",
                event.kind.tag(),
                day,
                event.from,
                event.to,
                event.priority
            );
        }
    }

    if report.events.is_empty() {
        output.push_str("  (no entries)\n");
    }
    for skipped in &report.skipped {
        let _ = writeln!(output, "  skipped {skipped}");
    }
    output
}
