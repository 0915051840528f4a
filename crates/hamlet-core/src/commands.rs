//! Console command surface.
//!
//! A console collaborator hands us one line of text; we parse it into a
//! [`Command`] and run it against the engine, producing output lines and a
//! success flag. Parsing never touches the engine, so a bad line can't
//! change state.

use crate::engine::SimulationEngine;
use crate::events::EventSink;
use crate::persistence::save_file_name;
use crate::systems::Target;
use hamlet_logic::clock::{parse_hour, ParseHourError, MIN_DAY_LENGTH_SECS};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum AssignMode {
    /// Reassign everyone and write the assignments file
    New,
    /// Read the assignments file and apply it
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixKind {
    Sleepers,
    Homes,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Assign(AssignMode),
    Wake(Target),
    Sleep(Target),
    Fix(FixKind),
    /// `None` shows the current time
    Daytime(Option<f32>),
    /// Day length in seconds; `None` shows the current one
    Timespeed(Option<f32>),
    Houses,
    Save(String),
    Load(String),
    Status(String),
    Select(String),
    Help,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("Type 'help' for a list of commands")]
    Empty,
    #[error("Unknown command: '{0}'")]
    Unknown(String),
    #[error("{0}")]
    Usage(&'static str),
    #[error("Unknown option: '{option}'\n{usage}")]
    UnknownOption { option: String, usage: &'static str },
    #[error(transparent)]
    InvalidHour(#[from] ParseHourError),
    #[error("Day length must be at least {} seconds.", MIN_DAY_LENGTH_SECS)]
    DayTooShort(f32),
    #[error("Invalid day length '{0}'. Please provide a number of seconds.")]
    InvalidNumber(String),
}

const ASSIGN_USAGE: &str = "Usage: assign <new|reload>\n  \
     new - Generate new housing assignments\n  \
     reload - Reload existing assignments from file";
const FIX_USAGE: &str = "Available fixes:\n  \
     fix sleepers - Force all villagers to follow correct sleep schedule\n  \
     fix homes - Reset villagers to their home positions\n  \
     fix all - Apply all fixes";
const WAKE_USAGE: &str = "Please specify a villager name or use 'wake all'";
const SLEEP_USAGE: &str = "Please specify a villager name or use 'sleep all'";

const HELP: &[&str] = &[
    "Available commands:",
    "  assign <new|reload>      - Generate or reload housing assignments",
    "  wake <all|name>          - Force villagers awake",
    "  sleep <all|name>         - Force villagers to sleep",
    "  fix <sleepers|homes|all> - Repair sleep states or send everyone home",
    "  daytime [hour|hour:min]  - Show or set the time of day",
    "  timespeed [seconds]      - Show or set the day length",
    "  houses                   - List houses and their residents",
    "  status <name>            - Show a villager's state",
    "  select <name>            - Select a villager",
    "  save [file]              - Save the game",
    "  load [file]              - Load a saved game",
];

impl Command {
    /// Parse one console line. Command words are case-insensitive; villager
    /// names keep their case.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(CommandError::Empty)?.to_lowercase();
        let args: Vec<&str> = words.collect();
        let first = args.first().map(|a| a.to_lowercase());

        match name.as_str() {
            "assign" => match first.as_deref() {
                None => Err(CommandError::Usage(ASSIGN_USAGE)),
                Some("new") => Ok(Command::Assign(AssignMode::New)),
                Some("reload") => Ok(Command::Assign(AssignMode::Reload)),
                Some(other) => Err(CommandError::UnknownOption {
                    option: other.to_string(),
                    usage: "Use 'assign new' or 'assign reload'",
                }),
            },
            "wake" => parse_target(&args, WAKE_USAGE).map(Command::Wake),
            "sleep" => parse_target(&args, SLEEP_USAGE).map(Command::Sleep),
            "fix" => match first.as_deref() {
                None => Err(CommandError::Usage(FIX_USAGE)),
                Some("sleepers") => Ok(Command::Fix(FixKind::Sleepers)),
                Some("homes") => Ok(Command::Fix(FixKind::Homes)),
                Some("all") => Ok(Command::Fix(FixKind::All)),
                Some(other) => Err(CommandError::UnknownOption {
                    option: other.to_string(),
                    usage: "Use 'fix sleepers', 'fix homes', or 'fix all'",
                }),
            },
            "daytime" => match args.first() {
                None => Ok(Command::Daytime(None)),
                Some(text) => Ok(Command::Daytime(Some(parse_hour(text)?))),
            },
            "timespeed" => match args.first() {
                None => Ok(Command::Timespeed(None)),
                Some(text) => {
                    let seconds: f32 = text
                        .parse()
                        .map_err(|_| CommandError::InvalidNumber(text.to_string()))?;
                    if !seconds.is_finite() {
                        return Err(CommandError::InvalidNumber(text.to_string()));
                    }
                    if seconds < MIN_DAY_LENGTH_SECS {
                        return Err(CommandError::DayTooShort(seconds));
                    }
                    Ok(Command::Timespeed(Some(seconds)))
                }
            },
            "houses" => Ok(Command::Houses),
            "save" => Ok(Command::Save(save_file_name(args.first().copied()))),
            "load" => Ok(Command::Load(save_file_name(args.first().copied()))),
            "status" if !args.is_empty() => Ok(Command::Status(args.join(" "))),
            "status" => Err(CommandError::Usage("Usage: status <name>")),
            "select" if !args.is_empty() => Ok(Command::Select(args.join(" "))),
            "select" => Err(CommandError::Usage("Usage: select <name>")),
            "help" => Ok(Command::Help),
            _ => Err(CommandError::Unknown(name)),
        }
    }
}

fn parse_target(args: &[&str], usage: &'static str) -> Result<Target, CommandError> {
    match args {
        [] => Err(CommandError::Usage(usage)),
        [word] if word.eq_ignore_ascii_case("all") => Ok(Target::All),
        _ => Ok(Target::Named(args.join(" "))),
    }
}

/// What a command printed and whether it did what was asked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub lines: Vec<String>,
}

impl CommandOutput {
    fn ok() -> Self {
        Self {
            success: true,
            lines: Vec::new(),
        }
    }

    fn failed() -> Self {
        Self::default()
    }

    fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }
}

impl From<CommandError> for CommandOutput {
    fn from(error: CommandError) -> Self {
        Self {
            success: false,
            lines: error.to_string().lines().map(str::to_string).collect(),
        }
    }
}

/// `H:MM`, truncating seconds
fn short_time(hour: f32) -> String {
    let whole = hour.floor();
    let minutes = ((hour - whole) * 60.0) as u32;
    format!("{}:{:02}", whole as u32, minutes.min(59))
}

impl<S: EventSink> SimulationEngine<S> {
    /// Parse and run one console line
    pub fn run_command(&mut self, line: &str) -> CommandOutput {
        match Command::parse(line) {
            Ok(command) => self.execute(command),
            Err(error) => error.into(),
        }
    }

    pub fn execute(&mut self, command: Command) -> CommandOutput {
        match command {
            Command::Assign(AssignMode::New) => {
                let out = CommandOutput::ok().line("Generating new housing assignments...");
                match self.assign_new() {
                    Ok(_) => out.line(format!(
                        "Housing assignments created and saved to {}",
                        self.assignments_path().display()
                    )),
                    Err(e) => CommandOutput {
                        success: false,
                        ..out
                    }
                    .line(format!("Housing assigned but could not be saved: {}", e)),
                }
            }
            Command::Assign(AssignMode::Reload) => {
                let out = CommandOutput::ok().line("Reloading housing assignments from file...");
                match self.reload_assignments() {
                    Ok(count) => out.line(format!(
                        "Housing assignments loaded successfully ({} villagers)",
                        count
                    )),
                    Err(e) => CommandOutput {
                        success: false,
                        ..out
                    }
                    .line(format!("Failed to load assignments: {}", e)),
                }
            }
            Command::Wake(target) => {
                let outcome = self.wake(&target, None);
                match target {
                    Target::All => CommandOutput {
                        success: outcome.changed > 0,
                        lines: vec![format!("Forced {} villagers to wake up", outcome.changed)],
                    },
                    Target::Named(_) if outcome.changed > 0 => CommandOutput::ok()
                        .line(format!("{} has been woken up", outcome.matched.join(", "))),
                    Target::Named(query) => CommandOutput::failed().line(format!(
                        "Could not find villager: '{}' or villager was already awake",
                        query
                    )),
                }
            }
            Command::Sleep(target) => {
                let outcome = self.sleep(&target, None);
                match target {
                    Target::All => CommandOutput {
                        success: outcome.changed > 0,
                        lines: vec![format!("Forced {} villagers to sleep", outcome.changed)],
                    },
                    Target::Named(_) if outcome.changed > 0 => CommandOutput::ok()
                        .line(format!("{} has been put to sleep", outcome.matched.join(", "))),
                    Target::Named(query) => CommandOutput::failed().line(format!(
                        "Could not find villager: '{}' or villager was already sleeping",
                        query
                    )),
                }
            }
            Command::Fix(kind) => {
                let mut out = CommandOutput::failed();
                if matches!(kind, FixKind::Sleepers | FixKind::All) {
                    let fixed = self.fix_sleep_states();
                    out.success |= fixed > 0;
                    out.push(format!("Fixed sleep states for {} villagers", fixed));
                }
                if matches!(kind, FixKind::Homes | FixKind::All) {
                    let report = self.force_all_to_homes();
                    out.success = true;
                    out.push("Reset villagers to their home positions");
                    if report.without_home > 0 {
                        out.push(format!("{} villagers have no home", report.without_home));
                    }
                }
                if kind == FixKind::All {
                    out.push("Applied all fixes");
                }
                out
            }
            Command::Daytime(None) => CommandOutput::ok()
                .line(format!("Current time: {}", self.clock.time_string()))
                .line("Use 'daytime <hour>' to set time (0-24).")
                .line("Use 'daytime <hour:minute>' for precise time.")
                .line("Examples: 'daytime 12' for noon, 'daytime 18:30' for 6:30 PM"),
            Command::Daytime(Some(hour)) => {
                let old = self.hour_of_day();
                match self.set_time(hour) {
                    Ok(()) => CommandOutput::ok()
                        .line(format!(
                            "Time changed from {} to {}.",
                            short_time(old),
                            short_time(hour)
                        ))
                        .line(format!("Current time: {}", self.clock.time_string())),
                    Err(e) => CommandOutput::failed().line(e.to_string()),
                }
            }
            Command::Timespeed(None) => {
                let length = self.clock.day_length_seconds();
                CommandOutput::ok()
                    .line(format!("Current day length: {} seconds.", length))
                    .line(format!("({:.1} minutes per day)", length / 60.0))
                    .line("Use 'timespeed <seconds>' to set day length.")
            }
            Command::Timespeed(Some(seconds)) => {
                let old = self.clock.day_length_seconds();
                match self.set_day_length(seconds) {
                    Ok(()) => CommandOutput::ok()
                        .line(format!(
                            "Day length changed from {} to {} seconds.",
                            old, seconds
                        ))
                        .line(format!("({:.1} minutes per day)", seconds / 60.0)),
                    Err(e) => CommandOutput::failed().line(e.to_string()),
                }
            }
            Command::Houses => {
                let mut out = CommandOutput::ok().line("Houses and Residents:");
                for house in self.houses() {
                    out.push(format!("{} ({}):", house.name, house.building_type.label()));
                    for (name, job) in &house.residents {
                        out.push(format!("  - {} ({})", name, job));
                    }
                }
                out
            }
            Command::Save(file) => match self.save_to_path(&file) {
                Ok(()) => CommandOutput::ok().line(format!("Game saved to {}", file)),
                Err(e) => CommandOutput::failed().line(format!("Failed to save game: {}", e)),
            },
            Command::Load(file) => {
                let was_paused = self.is_paused();
                self.set_paused(true);
                match self.load_from_path(&file) {
                    Ok(()) => {
                        self.set_paused(false);
                        CommandOutput::ok().line(format!("Game loaded from {}", file))
                    }
                    Err(e) => {
                        self.set_paused(was_paused);
                        CommandOutput::failed().line(format!("Failed to load game: {}", e))
                    }
                }
            }
            Command::Status(name) => match self.villager_status(&name) {
                Some(status) => CommandOutput::ok()
                    .line(format!("{} ({})", status.name, status.job))
                    .line(format!("  Activity: {}", status.activity))
                    .line(format!(
                        "  Sleeping: {}  Talking: {}",
                        status.is_sleeping, status.is_talking
                    ))
                    .line(format!(
                        "  Position: ({:.0}, {:.0})",
                        status.position.x, status.position.y
                    ))
                    .line(format!(
                        "  Home: {}  Work: {}",
                        status.home,
                        status.workplace.as_deref().unwrap_or("none")
                    )),
                None => CommandOutput::failed().line(format!("Could not find villager: '{}'", name)),
            },
            Command::Select(name) => {
                if self.select_villager(&name) {
                    CommandOutput::ok().line(format!("Selected {}", name))
                } else {
                    CommandOutput::failed().line(format!("Could not find villager: '{}'", name))
                }
            }
            Command::Help => CommandOutput {
                success: true,
                lines: HELP.iter().map(|l| l.to_string()).collect(),
            },
        }
    }
}
