use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::events::payload::Payload;
use crate::events::{Event, EventName};
use crate::nav::topics;

/// A bare key press: publishes one payload-less navigation request.
pub struct KeyCommand {
    name: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    topic: EventName,
}

pub fn all() -> Vec<Arc<dyn Command>> {
    let keys = [
        KeyCommand {
            name: "up",
            aliases: &["k"],
            description: "move the cursor up one row",
            topic: topics::UP,
        },
        KeyCommand {
            name: "down",
            aliases: &["j"],
            description: "move the cursor down one row",
            topic: topics::DOWN,
        },
        KeyCommand {
            name: "left",
            aliases: &["h"],
            description: "move the cursor left (grids only)",
            topic: topics::LEFT,
        },
        KeyCommand {
            name: "right",
            aliases: &["l"],
            description: "move the cursor right (grids only)",
            topic: topics::RIGHT,
        },
        KeyCommand {
            name: "back",
            aliases: &["b"],
            description: "return to the previous location",
            topic: topics::BACK,
        },
        KeyCommand {
            name: "select",
            aliases: &["enter"],
            description: "select the item under the cursor",
            topic: topics::SELECT,
        },
        KeyCommand {
            name: "multiselect",
            aliases: &["m"],
            description: "add the item under the cursor to the selection",
            topic: topics::MULTISELECT,
        },
    ];
    keys.into_iter()
        .map(|key| Arc::new(key) as Arc<dyn Command>)
        .collect()
}

#[async_trait(?Send)]
impl Command for KeyCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn aliases(&self) -> &[&str] {
        self.aliases
    }

    fn description(&self) -> &str {
        self.description
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        info.bus
            .dispatch(&Event::new(self.topic.clone(), Payload::Empty));
        CommandResult::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::TestSession;
    use crate::events::payload::NavigateRequest;

    fn key(name: &str) -> Arc<dyn Command> {
        all()
            .into_iter()
            .find(|c| c.name() == name)
            .unwrap()
    }

    #[tokio::test]
    async fn key_publishes_its_topic() {
        let session = TestSession::new();
        assert_eq!(
            key("back").execute("", &session.info()).await,
            CommandResult::Handled
        );
        assert!(session.seen_names().contains(&"nav.back".to_string()));
    }

    #[tokio::test]
    async fn down_moves_the_cursor() {
        let session = TestSession::new();
        session.navigator.borrow_mut().context_push("text");
        session.navigator.borrow_mut().navigate_to(&NavigateRequest {
            ctx_id: "text".to_string(),
            nav_id: "root".to_string(),
            columns: 1,
            position: 1,
            total_items: 3,
        });

        key("down").execute("", &session.info()).await;
        assert!(session.seen_names().contains(&"nav.pos_changed".to_string()));
        assert_eq!(session.navigator.borrow().state("root").unwrap().position, 2);
    }

    #[test]
    fn every_key_targets_an_inbound_topic() {
        for command in all() {
            let trigger = command.name();
            assert!(
                topics::INBOUND
                    .iter()
                    .any(|t| t.as_str().ends_with(trigger)),
                "{trigger} has no inbound topic"
            );
        }
    }
}
