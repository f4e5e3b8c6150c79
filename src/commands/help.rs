use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

pub const NAME: &str = "help";

/// Listed like any command; the registry renders the text itself.
pub struct HelpCommand;

#[async_trait(?Send)]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        NAME
    }

    fn aliases(&self) -> &[&str] {
        &["?", "/help"]
    }

    fn description(&self) -> &str {
        "show this help"
    }

    async fn execute(&self, _args: &str, _info: &SessionInfo<'_>) -> CommandResult {
        CommandResult::Handled
    }
}
