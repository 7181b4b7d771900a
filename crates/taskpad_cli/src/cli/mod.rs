use clap::{Parser, Subcommand};
use taskpad_core::config::{ConfigOverrides, canonical_key};

#[derive(Parser, Debug)]
#[command(name = "taskpad", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: taskpad add "Buy milk" -d "2 litres"
    Add {
        title: Option<String>,
        #[arg(short = 'd', long)]
        description: Option<String>,
    },
    /// List tasks, newest first
    ///
    /// Example: taskpad list
    /// Example: taskpad list pinned
    List {
        /// all, pending, completed or pinned
        #[arg(default_value = "all")]
        filter: String,
    },
    /// Show details of a task
    ///
    /// Example: taskpad show task-1
    Show { id: String },
    /// Edit task fields directly
    ///
    /// Example: taskpad edit task-1 --title "Buy oat milk" --status completed
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
    },
    /// Delete a task
    ///
    /// Example: taskpad delete task-1
    Delete { id: String },
    /// Pin or unpin a task
    ///
    /// Example: taskpad pin task-1
    Pin { id: String },
    /// Toggle a task between pending and completed
    ///
    /// Example: taskpad done task-1
    Done { id: String },
    /// Open a task in the editor (interactive mode)
    ///
    /// Example: open task-1
    Open { id: String },
    /// Change a field of the open task; saved after a quiet period
    ///
    /// Example: set title "Buy oat milk"
    /// Example: set pinned true
    Set {
        /// title, description, status, assignee or pinned
        field: String,
        value: Option<String>,
    },
    /// Save pending editor changes now
    Save,
    /// Close the editor, dropping unsaved changes
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Alias(String),
    AutosaveDelayMs,
    DefaultAssignee,
    LogLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field = canonical_key(field);
    if canonical_field.is_empty() {
        return Err("override key cannot be empty".to_string());
    }

    let target = match canonical_field.as_str() {
        "aliases" | "alias" => {
            let alias_name = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            return Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias_name.to_string()),
                value,
            });
        }
        "theme" => ConfigOverrideTarget::Theme,
        "autosave_delay_ms" | "autosave_delay" => ConfigOverrideTarget::AutosaveDelayMs,
        "default_assignee" | "assignee" => ConfigOverrideTarget::DefaultAssignee,
        "log_level" => ConfigOverrideTarget::LogLevel,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if remainder.is_some() {
        return Err(format!("{canonical_field} override cannot have subfields"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds every `--config-override` value into one [`ConfigOverrides`].
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Alias(name) => {
                overrides.aliases.insert(name, parsed.value);
            }
            ConfigOverrideTarget::AutosaveDelayMs => {
                let delay = parsed.value.parse::<u64>().map_err(|_| {
                    format!(
                        "autosave_delay_ms must be a whole number of milliseconds, got '{}'",
                        parsed.value
                    )
                })?;
                overrides.autosave_delay_ms = Some(delay);
            }
            ConfigOverrideTarget::DefaultAssignee => {
                overrides.default_assignee = Some(parsed.value)
            }
            ConfigOverrideTarget::LogLevel => overrides.log_level = Some(parsed.value),
        }
    }
    Ok(overrides)
}
