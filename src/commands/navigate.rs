use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};
use crate::events::payload::{NavigateRequest, Payload, SetStateRequest};
use crate::events::Event;
use crate::nav::topics;

/// Navigate the active context to a location, as a content adapter would
/// after listing it.
pub struct GoCommand;

#[async_trait(?Send)]
impl Command for GoCommand {
    fn name(&self) -> &str {
        "go"
    }

    fn aliases(&self) -> &[&str] {
        &["cd"]
    }

    fn usage(&self) -> &str {
        "<nav_id> [columns] [position] [total]"
    }

    fn description(&self) -> &str {
        "navigate the active context to a location"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(ctx_id) = info.navigator.borrow().active_context().map(str::to_string) else {
            eprintln!("  no active context; push one first");
            return CommandResult::Handled;
        };
        let mut words = args.split_whitespace();
        let Some(nav_id) = words.next() else {
            eprintln!("  usage: go {}", self.usage());
            return CommandResult::Handled;
        };
        let numbers = match words.map(str::parse::<i64>).collect::<Result<Vec<_>, _>>() {
            Ok(numbers) => numbers,
            Err(e) => {
                eprintln!("  ✗ {e}");
                return CommandResult::Handled;
            }
        };

        let request = NavigateRequest {
            ctx_id,
            nav_id: nav_id.to_string(),
            columns: numbers.first().copied().unwrap_or(1),
            position: numbers.get(1).copied().unwrap_or(0),
            total_items: numbers.get(2).copied().unwrap_or(0),
        };
        info.bus
            .dispatch(&Event::new(topics::NAVIGATE_TO, Payload::Navigate(request)));
        CommandResult::Handled
    }
}

/// Override the cursor of any context, active or suspended.
pub struct SetCommand;

#[async_trait(?Send)]
impl Command for SetCommand {
    fn name(&self) -> &str {
        "set"
    }

    fn usage(&self) -> &str {
        "<ctx> [position]"
    }

    fn description(&self) -> &str {
        "set a context's cursor position"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let mut words = args.split_whitespace();
        let Some(ctx_id) = words.next() else {
            eprintln!("  usage: set {}", self.usage());
            return CommandResult::Handled;
        };
        let position = match words.next().map(str::parse::<i64>).transpose() {
            Ok(position) => position,
            Err(e) => {
                eprintln!("  ✗ {e}");
                return CommandResult::Handled;
            }
        };
        info.bus.dispatch(&Event::new(
            topics::SET_STATE,
            Payload::SetState(SetStateRequest {
                ctx_id: ctx_id.to_string(),
                position,
            }),
        ));
        CommandResult::Handled
    }
}
