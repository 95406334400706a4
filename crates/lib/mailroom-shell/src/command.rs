use std::{fmt, str::FromStr};

/// Top bar buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Mail,
    Route,
    Price,
    Signout,
}

impl Command {
    pub const ALL: [Self; 4] = [Self::Mail, Self::Route, Self::Price, Self::Signout];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mail => "Mail",
            Self::Route => "Route",
            Self::Price => "Price",
            Self::Signout => "Signout",
        }
    }

    /// Slot in [`Command::ALL`] and in the dispatch table.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Mail => 0,
            Self::Route => 1,
            Self::Price => 2,
            Self::Signout => 3,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|command| command.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown command: {s}"))
    }
}

/// Content panels; exactly one is visible at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Panel {
    #[default]
    Form,
    Price,
    Routes,
}

impl Panel {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Form => "Mail entry",
            Self::Price => "Price lookup",
            Self::Routes => "Route lookup",
        }
    }
}

/// What pressing a button does to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Show(Panel),
    /// Logged only; the visible panel stays as it was.
    SignedOut,
}

/// Transitions in [`Command::index`] order.
const DISPATCH: [Transition; Command::ALL.len()] = [
    Transition::Show(Panel::Form),
    Transition::Show(Panel::Routes),
    Transition::Show(Panel::Price),
    Transition::SignedOut,
];

#[must_use]
pub const fn dispatch(command: Command) -> Transition {
    DISPATCH[command.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_owns_its_dispatch_slot() {
        for command in Command::ALL {
            assert_eq!(Command::ALL[command.index()], command, "{command}");
        }
        let panels: Vec<Transition> = Command::ALL.into_iter().map(dispatch).collect();
        assert_eq!(panels.len(), DISPATCH.len());
        assert_eq!(
            panels.iter().filter(|transition| **transition == Transition::SignedOut).count(),
            1
        );
    }

    #[test]
    fn buttons_switch_to_their_panels() {
        assert_eq!(dispatch(Command::Mail), Transition::Show(Panel::Form));
        assert_eq!(dispatch(Command::Route), Transition::Show(Panel::Routes));
        assert_eq!(dispatch(Command::Price), Transition::Show(Panel::Price));
        assert_eq!(dispatch(Command::Signout), Transition::SignedOut);
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("route".parse::<Command>(), Ok(Command::Route));
        assert_eq!(" SIGNOUT ".parse::<Command>(), Ok(Command::Signout));
        assert!("logout".parse::<Command>().is_err());
    }
}
