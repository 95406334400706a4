use clap::{Parser, Subcommand, builder::BoolishValueParser};
use mailroom_core::control::StoreNames;
use mailroom_core::query::SortOrder;
use mailroom_store::models::RecordKind;
use mailroom_store::schema::{STORE_COUNTRIES, STORE_MAIL_EVENTS};
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = ".";
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser, Debug)]
#[command(name = "mailroom-clerk", version, about = "Mail and parcel clerk over an XML store.")]
pub struct CliArgs {
    /// Directory holding `<store>.xml` documents.
    #[arg(long, env = "MAILROOM_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[arg(long, env = "MAILROOM_MAIL_STORE", global = true)]
    mail_store: Option<String>,

    #[arg(long, env = "MAILROOM_COUNTRIES_STORE", global = true)]
    countries_store: Option<String>,

    /// TOML file with defaults for the settings above.
    #[arg(long, env = "MAILROOM_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `mailroom_core=debug`.
    #[arg(long, env = "MAILROOM_LOG", global = true)]
    log: Option<String>,

    #[arg(
        long,
        env = "MAILROOM_JSON",
        global = true,
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    json: bool,

    #[command(subcommand)]
    command: ClerkCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ClerkCommand {
    /// Create empty mail event and country stores if they are missing.
    Init,
    /// Record a letter.
    AddMail {
        day: String,
        to: String,
        from: String,
        priority: String,
    },
    /// Record a parcel.
    AddParcel {
        day: String,
        to: String,
        from: String,
        weight: String,
        volume: String,
        priority: String,
    },
    /// List stored entries.
    List {
        #[arg(long)]
        kind: Option<RecordKind>,
        #[arg(long, default_value_t = SortOrder::DayAscending)]
        sort: SortOrder,
    },
    /// List entries between two days, inclusive, in either order.
    Between {
        from: String,
        to: String,
        #[arg(long)]
        kind: Option<RecordKind>,
        #[arg(long, default_value_t = SortOrder::DayAscending)]
        sort: SortOrder,
    },
    /// List entries of one kind sent between two parties.
    Route {
        #[arg(long, default_value_t = RecordKind::Mail)]
        kind: RecordKind,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long, default_value_t = SortOrder::DayAscending)]
        sort: SortOrder,
    },
    /// Print the country list.
    Countries,
    /// Print raw tag values from a store.
    Fields {
        store: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Interactive clerk shell on stdin.
    Shell,
}

/// Optional defaults read from `--config`.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    mail_store: Option<String>,
    countries_store: Option<String>,
    log: Option<String>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::InvalidSetting {
            name: "MAILROOM_CONFIG",
            value: format!("{}: {err}", path.display()),
        })?;
        toml::from_str(&text).map_err(|err| ConfigError::InvalidSetting {
            name: "MAILROOM_CONFIG",
            value: format!("{}: {err}", path.display()),
        })
    }
}

/// Runtime configuration loaded from CLI arguments, environment variables and
/// an optional TOML file, in that order of precedence.
#[derive(Debug, Clone)]
pub struct ClerkConfig {
    pub data_dir: PathBuf,
    pub stores: StoreNames,
    pub log_filter: String,
    pub json: bool,
    pub command: ClerkCommand,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl ClerkConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

impl TryFrom<CliArgs> for ClerkConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let file = match args.config.as_deref() {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let data_dir = args
            .data_dir
            .or(file.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        if data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingSetting("MAILROOM_DATA_DIR"));
        }

        let mail_events = store_name(
            "MAILROOM_MAIL_STORE",
            args.mail_store.or(file.mail_store),
            STORE_MAIL_EVENTS,
        )?;
        let countries = store_name(
            "MAILROOM_COUNTRIES_STORE",
            args.countries_store.or(file.countries_store),
            STORE_COUNTRIES,
        )?;

        let log_filter = args
            .log
            .or(file.log)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            data_dir,
            stores: StoreNames {
                mail_events,
                countries,
            },
            log_filter,
            json: args.json,
            command: args.command,
        })
    }
}

fn store_name(
    name: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<String, ConfigError> {
    let value = value.unwrap_or_else(|| default.to_string());
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) || trimmed.ends_with(".xml") {
        return Err(ConfigError::InvalidSetting { name, value });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            data_dir: None,
            mail_store: None,
            countries_store: None,
            config: None,
            log: None,
            json: false,
            command: ClerkCommand::Countries,
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ClerkConfig::try_from(base_args()).expect("config should parse");
        assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert_eq!(config.stores, StoreNames::default());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn file_values_fill_gaps_and_arguments_win() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("clerk.toml");
        std::fs::write(
            &path,
            "data_dir = \"/srv/mailroom\"\nmail_store = \"events2013\"\nlog = \"debug\"\n",
        )
        .expect("write config");

        let mut args = base_args();
        args.config = Some(path);
        args.mail_store = Some("events2014".to_string());
        let config = ClerkConfig::try_from(args).expect("config should parse");

        assert_eq!(config.data_dir, PathBuf::from("/srv/mailroom"));
        assert_eq!(config.stores.mail_events, "events2014");
        assert_eq!(config.stores.countries, STORE_COUNTRIES);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn store_names_must_be_bare_stems() {
        let mut args = base_args();
        args.mail_store = Some("mailevents.xml".to_string());
        assert!(matches!(
            ClerkConfig::try_from(args),
            Err(ConfigError::InvalidSetting { name: "MAILROOM_MAIL_STORE", .. })
        ));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("clerk.toml");
        std::fs::write(&path, "data_directory = \"x\"\n").expect("write config");
        let mut args = base_args();
        args.config = Some(path);
        assert!(ClerkConfig::try_from(args).is_err());
    }

    #[test]
    fn subcommands_parse_from_the_command_line() {
        let args = CliArgs::try_parse_from([
            "mailroom-clerk",
            "between",
            "09/06/2013",
            "10/05/2013",
            "--kind",
            "mail",
            "--sort",
            "priority-desc",
        ])
        .expect("arguments should parse");
        assert_eq!(
            args.command,
            ClerkCommand::Between {
                from: "09/06/2013".to_string(),
                to: "10/05/2013".to_string(),
                kind: Some(RecordKind::Mail),
                sort: SortOrder::PriorityDescending,
            }
        );
    }
}
