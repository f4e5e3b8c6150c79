use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

pub struct QuitCommand;

#[async_trait(?Send)]
impl Command for QuitCommand {
    fn name(&self) -> &str {
        "quit"
    }

    fn aliases(&self) -> &[&str] {
        &["exit", "q", "/quit"]
    }

    fn description(&self) -> &str {
        "exit the console"
    }

    async fn execute(&self, _args: &str, _info: &SessionInfo<'_>) -> CommandResult {
        CommandResult::Quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::TestSession;

    #[tokio::test]
    async fn returns_quit() {
        let session = TestSession::new();
        assert_eq!(
            QuitCommand.execute("", &session.info()).await,
            CommandResult::Quit
        );
    }

    #[test]
    fn has_aliases() {
        let aliases = QuitCommand.aliases();
        assert!(aliases.contains(&"exit"));
        assert!(aliases.contains(&"q"));
    }
}
