use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::events::payload::{ContextRequest, Payload};
use crate::events::{Event, EventName};
use crate::nav::topics;

/// `push`, `pop` and `cleanup`: one context id argument.
pub struct ContextCommand {
    name: &'static str,
    description: &'static str,
    topic: EventName,
}

pub fn all() -> Vec<Arc<dyn Command>> {
    vec![
        Arc::new(ContextCommand {
            name: "push",
            description: "open a browsing context and make it active",
            topic: topics::CONTEXT_PUSH,
        }),
        Arc::new(ContextCommand {
            name: "pop",
            description: "close the active context",
            topic: topics::CONTEXT_POP,
        }),
        Arc::new(ContextCommand {
            name: "cleanup",
            description: "tear down the active context",
            topic: topics::CONTEXT_CLEANUP,
        }),
    ]
}

#[async_trait(?Send)]
impl Command for ContextCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn usage(&self) -> &str {
        "<ctx>"
    }

    fn description(&self) -> &str {
        self.description
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(ctx_id) = args.split_whitespace().next() else {
            eprintln!("  usage: {} <ctx>", self.name);
            return CommandResult::Handled;
        };
        info.bus.dispatch(&Event::new(
            self.topic.clone(),
            Payload::Context(ContextRequest {
                ctx_id: ctx_id.to_string(),
            }),
        ));
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::TestSession;

    fn command(name: &str) -> Arc<dyn Command> {
        all().into_iter().find(|c| c.name() == name).unwrap()
    }

    #[tokio::test]
    async fn push_then_pop() {
        let session = TestSession::new();
        command("push").execute("text", &session.info()).await;
        assert_eq!(session.navigator.borrow().active_context(), Some("text"));

        command("pop").execute("text", &session.info()).await;
        assert_eq!(session.navigator.borrow().depth(), 0);
        assert!(session.seen_names().contains(&"nav.context_popped".to_string()));
    }

    #[tokio::test]
    async fn missing_argument_publishes_nothing() {
        let session = TestSession::new();
        command("push").execute("", &session.info()).await;
        assert!(session.seen_names().is_empty());
    }
}
