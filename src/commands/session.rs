use async_trait::async_trait;

use super::{Command, CommandResult, SessionInfo};

/// Print the context stack, histories and the cursor of each context.
pub struct StatusCommand;

#[async_trait(?Send)]
impl Command for StatusCommand {
    fn name(&self) -> &str {
        "status"
    }

    fn aliases(&self) -> &[&str] {
        &["ls", "/state"]
    }

    fn description(&self) -> &str {
        "show contexts, histories and cursors"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        print!("{}", status_text(info));
        CommandResult::Handled
    }
}

pub(crate) fn status_text(info: &SessionInfo<'_>) -> String {
    let nav = info.navigator.borrow();
    if nav.depth() == 0 {
        return format!("  no contexts (policy {})\n", nav.policy());
    }

    let mut out = format!("  policy {}, {} context(s)\n", nav.policy(), nav.depth());
    let top = nav.depth() - 1;
    for (index, ctx_id) in nav.stack().iter().enumerate().rev() {
        let marker = if index == top { "*" } else { " " };
        let history = nav.history(ctx_id).unwrap_or_default();
        out.push_str(&format!("  {marker} {ctx_id}: {}\n", history.join(" > ")));
        if let Some((nav_id, state)) = nav.current(ctx_id) {
            out.push_str(&format!(
                "      {nav_id} @ {}/{} ({} col)\n",
                state.position, state.total_items, state.columns
            ));
        }
    }
    out
}

pub struct SaveCommand;

#[async_trait(?Send)]
impl Command for SaveCommand {
    fn name(&self) -> &str {
        "save"
    }

    fn usage(&self) -> &str {
        "[name]"
    }

    fn description(&self) -> &str {
        "save the navigator under the session name"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(store) = info.store else {
            eprintln!("  ✗ no session store");
            return CommandResult::Handled;
        };
        let name = if args.is_empty() { info.session } else { args };
        let snapshot = info.navigator.borrow().snapshot();
        match store.save(name, &snapshot).await {
            Ok(()) => println!("  ✓ saved {name:?} ({} context(s))", snapshot.stack.len()),
            Err(e) => eprintln!("  ✗ save failed: {e:#}"),
        }
        CommandResult::Handled
    }
}

pub struct LoadCommand;

#[async_trait(?Send)]
impl Command for LoadCommand {
    fn name(&self) -> &str {
        "load"
    }

    fn usage(&self) -> &str {
        "[name]"
    }

    fn description(&self) -> &str {
        "replace the navigator with a saved session"
    }

    async fn execute(&self, args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(store) = info.store else {
            eprintln!("  ✗ no session store");
            return CommandResult::Handled;
        };
        let name = if args.is_empty() { info.session } else { args };
        match store.load(name).await {
            Ok(Some(snapshot)) => {
                let events = info.navigator.borrow_mut().restore(snapshot);
                for event in &events {
                    info.bus.dispatch(event);
                }
            }
            Ok(None) => eprintln!("  no saved session {name:?}"),
            Err(e) => eprintln!("  ✗ load failed: {e:#}"),
        }
        CommandResult::Handled
    }
}

pub struct SessionsCommand;

#[async_trait(?Send)]
impl Command for SessionsCommand {
    fn name(&self) -> &str {
        "sessions"
    }

    fn description(&self) -> &str {
        "list saved sessions"
    }

    async fn execute(&self, _args: &str, info: &SessionInfo<'_>) -> CommandResult {
        let Some(store) = info.store else {
            eprintln!("  ✗ no session store");
            return CommandResult::Handled;
        };
        match store.names().await {
            Ok(names) if names.is_empty() => println!("  no saved sessions"),
            Ok(names) => {
                for name in names {
                    let marker = if name == info.session { " ← current" } else { "" };
                    println!("  {name}{marker}");
                }
            }
            Err(e) => eprintln!("  ✗ {e:#}"),
        }
        CommandResult::Handled
    }
}
