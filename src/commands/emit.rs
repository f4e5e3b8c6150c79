use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::events::payload::Payload;

/// Publish an arbitrary event, the way any collaborator may.
pub struct EmitCommand;

#[async_trait(?Send)]
impl Command for EmitCommand {
    fn name(&self) -> &str {
        "emit"
    }

    fn usage(&self) -> &str {
        "<event> [json]"
    }

    fn description(&self) -> &str {
        "publish an event with an optional JSON payload"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let (name, json) = args
            .split_once(char::is_whitespace)
            .map_or((args, ""), |(name, json)| (name, json.trim()));
        if name.is_empty() {
            eprintln!("  usage: emit {}", self.usage());
            return CommandResult::Handled;
        }

        let payload = if json.is_empty() {
            Payload::Empty
        } else {
            match serde_json::from_str(json) {
                Ok(value) => Payload::Json(value),
                Err(e) => {
                    eprintln!("  ✗ invalid JSON: {e}");
                    return CommandResult::Handled;
                }
            }
        };

        let delivered = info.bus.publish(name, payload);
        println!("  {name} → {delivered} listener(s)");
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::TestSession;

    #[tokio::test]
    async fn json_payload_reaches_navigator() {
        let session = TestSession::new();
        EmitCommand
            .execute(r#"nav.context_push {"ctx_id": "text"}"#, &session.info())
            .await;
        EmitCommand
            .execute(
                r#"nav.navigate_to {"ctx_id": "text", "nav_id": "root", "total_items": 4}"#,
                &session.info(),
            )
            .await;

        let nav = session.navigator.borrow();
        assert_eq!(nav.active_context(), Some("text"));
        assert_eq!(nav.state("root").unwrap().total_items, 4);
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected_with_diagnostic() {
        let session = TestSession::new();
        EmitCommand
            .execute(r#"nav.context_push {"ctx": "text"}"#, &session.info())
            .await;
        assert_eq!(session.navigator.borrow().depth(), 0);
        assert!(session.seen_names().contains(&"log.warn".to_string()));
    }

    #[tokio::test]
    async fn invalid_json_publishes_nothing() {
        let session = TestSession::new();
        EmitCommand
            .execute("nav.context_push {not json", &session.info())
            .await;
        assert!(session.seen_names().is_empty());
    }
}
