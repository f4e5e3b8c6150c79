//! Console commands: the driver's stand-in for a key-binding layer.
//!
//! Commands implement the [`Command`] trait and are registered in a
//! [`CommandRegistry`]. Each input line is `<trigger> [args...]`; the
//! registry resolves the trigger (name or alias), and the command turns it
//! into bus traffic or prints something. Extra commands can be registered at
//! runtime via `registry.register(Arc::new(MyCommand))`.

mod context;
mod emit;
mod help;
mod keys;
mod navigate;
mod quit;
mod session;

use std::cell::RefCell;
use std::sync::Arc;

use async_trait::async_trait;

use crate::events::EventBus;
use crate::nav::Navigator;
use crate::store::SessionStore;

/// What commands can reach while they run.
pub struct SessionInfo<'a> {
    pub bus: &'a EventBus,
    /// Read-only for commands; requests go through the bus.
    pub navigator: &'a RefCell<Navigator>,
    pub store: Option<&'a dyn SessionStore>,
    /// Name snapshots are saved and loaded under.
    pub session: &'a str,
}

/// What the REPL should do after a command runs.
#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    /// No command has this trigger.
    NotACommand,
    /// Command handled, continue the REPL loop.
    Handled,
    /// Exit the REPL.
    Quit,
}

/// A console command. Implement this trait to add new commands.
#[async_trait(?Send)]
pub trait Command {
    /// Primary trigger, e.g. `"back"`.
    fn name(&self) -> &str;

    /// Alternative triggers, e.g. `&["b"]`.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Argument synopsis shown by `help`, e.g. `"<ctx>"`.
    fn usage(&self) -> &str {
        ""
    }

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Run the command. `args` is the rest of the line, trimmed.
    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult;
}

/// Holds registered commands. Supports runtime registration.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with all built-in commands.
    pub fn new() -> Self {
        let mut commands: Vec<Arc<dyn Command>> = vec![Arc::new(help::HelpCommand)];
        commands.extend(keys::all());
        commands.extend(context::all());
        commands.push(Arc::new(navigate::GoCommand));
        commands.push(Arc::new(navigate::SetCommand));
        commands.push(Arc::new(emit::EmitCommand));
        commands.push(Arc::new(session::StatusCommand));
        commands.push(Arc::new(session::SaveCommand));
        commands.push(Arc::new(session::LoadCommand));
        commands.push(Arc::new(session::SessionsCommand));
        commands.push(Arc::new(quit::QuitCommand));
        Self { commands }
    }

    /// Register an additional command.
    pub fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.push(command);
    }

    /// Run the command named by the first word of `input`.
    pub async fn dispatch(&self, input: &str, info: &SessionInfo<'_>) -> CommandResult {
        let input = input.trim();
        let (trigger, args) = input
            .split_once(char::is_whitespace)
            .map_or((input, ""), |(trigger, args)| (trigger, args.trim()));

        for command in &self.commands {
            if trigger == command.name() || command.aliases().contains(&trigger) {
                // help needs the registry to list all commands
                if command.name() == help::NAME {
                    print!("{}", self.help_text());
                    return CommandResult::Handled;
                }
                tracing::debug!(command = command.name(), args, "console command");
                return command.execute(args, info).await;
            }
        }

        CommandResult::NotACommand
    }

    /// Generate help text from all registered commands.
    pub fn help_text(&self) -> String {
        let entries: Vec<(String, &str)> = self
            .commands
            .iter()
            .map(|c| (format_label(c.name(), c.usage(), c.aliases()), c.description()))
            .collect();

        let max_width = entries
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(10);

        let mut out = String::new();
        for (label, desc) in &entries {
            out.push_str(&format!("  {label:<max_width$}  {desc}\n"));
        }
        out
    }

    /// All registered command names (for testing).
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|c| c.name()).collect()
    }

    /// All registered names and aliases (for duplicate detection).
    pub fn all_triggers(&self) -> Vec<&str> {
        let mut triggers = Vec::new();
        for cmd in &self.commands {
            triggers.push(cmd.name());
            triggers.extend_from_slice(cmd.aliases());
        }
        triggers
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn format_label(name: &str, usage: &str, aliases: &[&str]) -> String {
    let mut label = name.to_string();
    if !usage.is_empty() {
        label.push(' ');
        label.push_str(usage);
    }
    if !aliases.is_empty() {
        label.push_str(&format!(" ({})", aliases.join(", ")));
    }
    label
}
