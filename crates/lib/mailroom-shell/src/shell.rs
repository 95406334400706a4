use mailroom_core::control::ClerkControlPlane;
use mailroom_store::models::RecordKind;
use tracing::{debug, info, warn};

use crate::command::{Command, Panel, Transition, dispatch};
use crate::panels::{FormDraft, LookupFilter};
use crate::view::{event_table, top_bar};

const HELP: &str = "\
Buttons: mail | route | price | signout    Other: show | help | quit
Mail entry:   set <field> <value> | clear | submit
Route lookup: kind mail|parcel | from <party|*> | to <party|*> | range <dd/mm/yyyy> <dd/mm/yyyy> | range clear | sort <order>
Price lookup: from <party|*> | to <party|*> | range ... | sort <order>
Sort orders:  day-asc | day-desc | priority-asc | priority-desc
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutcome {
    Continue(String),
    Quit,
}

/// Clerk shell state: the visible panel plus each panel's inputs.
#[derive(Debug, Clone)]
pub struct ClerkShell {
    control: ClerkControlPlane,
    panel: Panel,
    form: FormDraft,
    routes: LookupFilter,
    route_kind: RecordKind,
    price: LookupFilter,
}

impl ClerkShell {
    #[must_use]
    pub fn new(control: ClerkControlPlane) -> Self {
        Self {
            control,
            panel: Panel::default(),
            form: FormDraft::default(),
            routes: LookupFilter::default(),
            route_kind: RecordKind::Mail,
            price: LookupFilter::default(),
        }
    }

    #[must_use]
    pub const fn panel(&self) -> Panel {
        self.panel
    }

    #[must_use]
    pub const fn form(&self) -> &FormDraft {
        &self.form
    }

    pub fn press(&mut self, command: Command) -> Transition {
        let transition = dispatch(command);
        match transition {
            Transition::Show(panel) => {
                debug!("{command} pressed, showing {}", panel.title());
                self.panel = panel;
            }
            Transition::SignedOut => info!("{command} pressed"),
        }
        transition
    }

    pub fn handle_line(&mut self, line: &str) -> ShellOutcome {
        let line = line.trim();
        if matches!(line, "quit" | "exit") {
            return ShellOutcome::Quit;
        }
        if line == "help" {
            return ShellOutcome::Continue(HELP.to_string());
        }
        if line.is_empty() || line == "show" {
            return ShellOutcome::Continue(self.render());
        }
        if let Ok(command) = line.parse::<Command>() {
            return ShellOutcome::Continue(match self.press(command) {
                Transition::Show(_) => self.render(),
                Transition::SignedOut => "signout recorded\n".to_string(),
            });
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let (verb, args) = words.split_first().map_or(("", &[][..]), |(verb, args)| (*verb, args));
        let result = match self.panel {
            Panel::Form => self.form_verb(verb, args),
            Panel::Routes => self.routes_verb(verb, args),
            Panel::Price => self.price.apply(verb, args).map(|()| self.render()),
        };
        ShellOutcome::Continue(result.unwrap_or_else(|message| format!("error: {message}\n")))
    }

    fn form_verb(&mut self, verb: &str, args: &[&str]) -> Result<String, String> {
        match (verb, args) {
            ("set", [field, value @ ..]) if !value.is_empty() => {
                self.form.set(field, &value.join(" "))?;
                Ok(self.render())
            }
            ("clear", []) => {
                self.form = FormDraft::default();
                Ok(self.render())
            }
            ("submit", []) => {
                let request = self.form.to_request();
                match self.control.submit(&request) {
                    Ok(report) => {
                        self.form = FormDraft::default();
                        Ok(format!("saved {} to {}\n", report.event, report.store_path))
                    }
                    Err(err) => {
                        warn!("form submission rejected: {err}");
                        Err(err.to_string())
                    }
                }
            }
            _ => Err(format!("unknown form input: {verb} (try 'help')")),
        }
    }

    fn routes_verb(&mut self, verb: &str, args: &[&str]) -> Result<String, String> {
        if verb == "kind" {
            let kind = args.join(" ");
            self.route_kind = kind.parse()?;
        } else {
            self.routes.apply(verb, args)?;
        }
        Ok(self.render())
    }

    /// Top bar plus the visible panel's contents.
    #[must_use]
    pub fn render(&self) -> String {
        let mut output = top_bar(self.panel);
        output.push('\n');
        output.push_str(&format!("== {} ==\n", self.panel.title()));
        let body = match self.panel {
            Panel::Form => Ok(self.form.render(&self.countries())),
            Panel::Routes => self
                .routes
                .run(&self.control, self.route_kind)
                .map(|report| {
                    format!(
                        "  {} {}\n{}",
                        self.route_kind,
                        self.routes.describe(),
                        event_table(&report, self.route_kind == RecordKind::Parcel)
                    )
                }),
            Panel::Price => self
                .price
                .run(&self.control, RecordKind::Parcel)
                .map(|report| {
                    format!(
                        "  parcels {}\n{}",
                        self.price.describe(),
                        event_table(&report, true)
                    )
                }),
        };
        match body {
            Ok(body) => output.push_str(&body),
            Err(err) => output.push_str(&format!("error: {err}\n")),
        }
        output
    }

    fn countries(&self) -> Vec<String> {
        self.control.countries().unwrap_or_else(|err| {
            debug!("country list unavailable: {err}");
            Vec::new()
        })
    }
}
