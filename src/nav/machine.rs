//! The navigation state machine.
//!
//! [`Navigator`] owns the context stack, one back-history per context, and
//! the NavID → [`NavState`] table. Operations never publish directly: each
//! returns the events it produced, so the caller can release its borrow on
//! the navigator before handing them to the bus. That keeps re-entrant
//! requests (a listener reacting to `navigated_to` by sending `back`) from
//! observing a half-applied operation.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::command::NavCommand;
use super::id::display_location;
use super::snapshot::Snapshot;
use super::state::{HistoryPolicy, Movement, NavState};
use super::{diagnostic_event, topics};
use crate::events::payload::{
    ContextChanged, Level, NavigateRequest, NavigatedTo, Payload, PositionChanged, Selection,
    SetStateRequest, StateCorrupted, Trigger,
};
use crate::events::{Event, EventName};

#[derive(Debug, Default)]
pub struct Navigator {
    stack: Vec<String>,
    histories: HashMap<String, Vec<String>>,
    states: HashMap<String, NavState>,
    policy: HistoryPolicy,
    outbox: Vec<Event>,
}

impl Navigator {
    pub fn new(policy: HistoryPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> HistoryPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: HistoryPolicy) {
        self.policy = policy;
    }

    // --- Read-only views ---

    pub fn active_context(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Bottom first.
    pub fn stack(&self) -> &[String] {
        &self.stack
    }

    pub fn history(&self, ctx_id: &str) -> Option<&[String]> {
        self.histories.get(ctx_id).map(Vec::as_slice)
    }

    pub fn state(&self, nav_id: &str) -> Option<&NavState> {
        self.states.get(nav_id)
    }

    /// Top-of-history location of `ctx_id` and its stored state, unvalidated.
    pub fn current(&self, ctx_id: &str) -> Option<(&str, &NavState)> {
        let nav_id = self.histories.get(ctx_id)?.last()?;
        Some((nav_id.as_str(), self.states.get(nav_id)?))
    }

    /// Run one decoded request.
    pub fn apply(&mut self, command: NavCommand) -> Vec<Event> {
        match command {
            NavCommand::Move(movement) => self.move_cursor(movement),
            NavCommand::Back => self.back(),
            NavCommand::Select => self.select(false),
            NavCommand::Multiselect => self.select(true),
            NavCommand::NavigateTo(request) => self.navigate_to(&request),
            NavCommand::ContextPush(ctx_id) => self.context_push(&ctx_id),
            NavCommand::ContextPop(ctx_id) => self.context_pop(&ctx_id),
            NavCommand::ContextCleanup(ctx_id) => self.context_cleanup(&ctx_id),
            NavCommand::SetState(request) => self.set_state(&request),
        }
    }

    // --- Context stack ---

    pub fn context_push(&mut self, ctx_id: &str) -> Vec<Event> {
        let old_ctx = self.active_context().map(str::to_string);
        if old_ctx.as_deref() == Some(ctx_id) {
            self.diagnose(Level::Debug, format!("context {ctx_id:?} is already active"));
            return self.take();
        }

        if self.stack.iter().any(|ctx| ctx == ctx_id) {
            // One history per id: a fresh push starts it over.
            self.drop_history(ctx_id);
            tracing::debug!(ctx_id, "suspended context pushed again, history reset");
        }
        self.stack.push(ctx_id.to_string());
        self.histories.insert(ctx_id.to_string(), Vec::new());

        self.emit(
            topics::CONTEXT_PUSHED,
            Payload::ContextChanged(ContextChanged {
                old_ctx,
                new_ctx: Some(ctx_id.to_string()),
            }),
        );
        self.take()
    }

    pub fn context_pop(&mut self, ctx_id: &str) -> Vec<Event> {
        self.close_context(ctx_id, topics::CONTEXT_POPPED);
        self.take()
    }

    pub fn context_cleanup(&mut self, ctx_id: &str) -> Vec<Event> {
        self.close_context(ctx_id, topics::CONTEXT_CLEANED);
        self.take()
    }

    fn close_context(&mut self, ctx_id: &str, topic: EventName) {
        match self.active_context() {
            None => {
                self.diagnose(
                    Level::Warn,
                    format!("cannot close {ctx_id:?}: context stack is empty"),
                );
            }
            Some(top) if top != ctx_id => {
                let message = format!("cannot close {ctx_id:?}: active context is {top:?}");
                self.diagnose(Level::Warn, message);
            }
            Some(_) => {
                self.stack.pop();
                self.drop_history(ctx_id);
                if self.stack.iter().any(|ctx| ctx == ctx_id) {
                    // the entry below is back to pushed-but-not-navigated
                    self.histories.insert(ctx_id.to_string(), Vec::new());
                }
                self.emit(
                    topic,
                    Payload::ContextChanged(ContextChanged {
                        old_ctx: Some(ctx_id.to_string()),
                        new_ctx: self.active_context().map(str::to_string),
                    }),
                );
            }
        }
    }

    /// Delete a context's history and every state only it referenced.
    fn drop_history(&mut self, ctx_id: &str) {
        let Some(history) = self.histories.remove(ctx_id) else {
            return;
        };
        let ids: BTreeSet<String> = history.into_iter().collect();
        for id in ids {
            if !self.is_referenced(&id) {
                self.states.remove(&id);
            }
        }
    }

    fn is_referenced(&self, nav_id: &str) -> bool {
        self.histories
            .values()
            .any(|history| history.iter().any(|id| id == nav_id))
    }

    // --- Navigation ---

    pub fn navigate_to(&mut self, request: &NavigateRequest) -> Vec<Event> {
        let ctx_id = request.ctx_id.as_str();
        if self.active_context() != Some(ctx_id) {
            let reason = if self.histories.contains_key(ctx_id) {
                "is not the active context"
            } else {
                "was never pushed"
            };
            self.diagnose(
                Level::Warn,
                format!("navigate_to {:?} rejected: {ctx_id:?} {reason}", request.nav_id),
            );
            return self.take();
        }

        let prior = match self.states.get(&request.nav_id).copied() {
            Some(state) if state.is_valid() => Some(state),
            Some(_) => {
                self.purge(&request.nav_id);
                if self.active_context() != Some(ctx_id) {
                    self.diagnose(
                        Level::Warn,
                        format!("navigate_to {:?} aborted: {ctx_id:?} was dropped while healing", request.nav_id),
                    );
                    return self.take();
                }
                None
            }
            None => None,
        };

        let position = match (request.position, prior) {
            (0, Some(old)) if old.position <= request.total_items => old.position,
            (0, _) => 1,
            (explicit, _) => explicit,
        };
        let state = NavState::new(request.columns, position, request.total_items);
        self.states.insert(request.nav_id.clone(), state);

        let history = self.histories.entry(ctx_id.to_string()).or_default();
        let repeat = history.last() == Some(&request.nav_id);
        if !(repeat && self.policy == HistoryPolicy::Dedup) {
            history.push(request.nav_id.clone());
        }

        self.emit(
            topics::NAVIGATED_TO,
            Payload::NavigatedTo(NavigatedTo {
                ctx_id: ctx_id.to_string(),
                nav_id: request.nav_id.clone(),
                columns: state.columns,
                position: state.position,
                total_items: state.total_items,
                trigger: Trigger::NavigateTo,
            }),
        );
        self.take()
    }

    /// Return to the previous location of the active context.
    ///
    /// Corrupted entries met on the way are purged and the step retried on
    /// the new previous entry. Each retry removes at least one history
    /// entry, so the loop ends at a valid entry, at the root, or with the
    /// context cleaned away.
    pub fn back(&mut self) -> Vec<Event> {
        let Some(ctx_id) = self.active_context().map(str::to_string) else {
            self.diagnose(Level::Debug, "back: no active context".to_string());
            return self.take();
        };

        loop {
            let Some(history) = self.histories.get(&ctx_id) else {
                break;
            };
            if history.len() < 2 {
                self.diagnose(Level::Debug, format!("back: {ctx_id:?} is at its root"));
                break;
            }

            let previous = history[history.len() - 2].clone();
            match self.states.get(&previous).copied().filter(NavState::is_valid) {
                Some(state) => {
                    if let Some(history) = self.histories.get_mut(&ctx_id) {
                        history.pop();
                    }
                    self.emit(
                        topics::NAVIGATED_TO,
                        Payload::NavigatedTo(NavigatedTo {
                            ctx_id: ctx_id.clone(),
                            nav_id: previous,
                            columns: state.columns,
                            position: state.position,
                            total_items: state.total_items,
                            trigger: Trigger::Back,
                        }),
                    );
                    break;
                }
                None => self.purge(&previous),
            }
        }
        self.take()
    }

    pub fn move_cursor(&mut self, movement: Movement) -> Vec<Event> {
        let Some((ctx_id, nav_id, state)) = self.read_current() else {
            return self.take();
        };

        if let Some(position) = state.moved(movement) {
            if position != state.position {
                self.states.insert(nav_id, NavState { position, ..state });
                self.emit(
                    topics::POS_CHANGED,
                    Payload::PositionChanged(PositionChanged {
                        ctx_id,
                        position,
                        old_position: state.position,
                    }),
                );
            }
        }
        self.take()
    }

    pub fn up(&mut self) -> Vec<Event> {
        self.move_cursor(Movement::Up)
    }

    pub fn down(&mut self) -> Vec<Event> {
        self.move_cursor(Movement::Down)
    }

    pub fn left(&mut self) -> Vec<Event> {
        self.move_cursor(Movement::Left)
    }

    pub fn right(&mut self) -> Vec<Event> {
        self.move_cursor(Movement::Right)
    }

    /// Announce the item under the cursor. `multi` picks `multiselected`.
    pub fn select(&mut self, multi: bool) -> Vec<Event> {
        if let Some((ctx_id, nav_id, state)) = self.read_current() {
            let topic = if multi {
                topics::MULTISELECTED
            } else {
                topics::SELECTED
            };
            self.emit(
                topic,
                Payload::Selected(Selection {
                    ctx_id,
                    nav_id: display_location(&nav_id).to_string(),
                    position: state.position,
                }),
            );
        }
        self.take()
    }

    /// Override the cursor of a context's latest location. Works on
    /// suspended contexts too. Without a position the current one is
    /// re-announced.
    pub fn set_state(&mut self, request: &SetStateRequest) -> Vec<Event> {
        let ctx_id = request.ctx_id.as_str();
        let Some(history) = self.histories.get(ctx_id) else {
            self.diagnose(Level::Warn, format!("set_state: unknown context {ctx_id:?}"));
            return self.take();
        };
        let Some(nav_id) = history.last().cloned() else {
            self.diagnose(
                Level::Warn,
                format!("set_state: {ctx_id:?} has not navigated anywhere"),
            );
            return self.take();
        };
        let Some(state) = self.read_state(&nav_id) else {
            return self.take();
        };

        let position = request.position.unwrap_or(state.position);
        let candidate = NavState { position, ..state };
        if !candidate.is_valid() {
            self.diagnose(
                Level::Warn,
                format!(
                    "set_state: position {position} out of range for {nav_id:?} ({} items)",
                    state.total_items
                ),
            );
            return self.take();
        }

        self.states.insert(nav_id, candidate);
        self.emit(
            topics::POS_CHANGED,
            Payload::PositionChanged(PositionChanged {
                ctx_id: ctx_id.to_string(),
                position,
                old_position: state.position,
            }),
        );
        self.take()
    }

    // --- Validation and healing ---

    /// Active context, its top location and that location's valid state.
    fn read_current(&mut self) -> Option<(String, String, NavState)> {
        let Some(ctx_id) = self.active_context().map(str::to_string) else {
            self.diagnose(Level::Debug, "no active context".to_string());
            return None;
        };
        let Some(nav_id) = self.histories.get(&ctx_id).and_then(|h| h.last()).cloned() else {
            self.diagnose(Level::Debug, format!("{ctx_id:?} has nothing to navigate"));
            return None;
        };
        let state = self.read_state(&nav_id)?;
        Some((ctx_id, nav_id, state))
    }

    /// Validated read. A missing or broken state is purged.
    fn read_state(&mut self, nav_id: &str) -> Option<NavState> {
        match self.states.get(nav_id).copied() {
            Some(state) if state.is_valid() => Some(state),
            _ => {
                self.purge(nav_id);
                None
            }
        }
    }

    /// Remove a corrupted location everywhere: its state, every history
    /// occurrence, and any context left with an empty history. Idempotent.
    fn purge(&mut self, nav_id: &str) {
        self.states.remove(nav_id);

        let mut emptied = Vec::new();
        for (ctx_id, history) in &mut self.histories {
            let before = history.len();
            history.retain(|id| id != nav_id);
            if history.len() < before && history.is_empty() {
                emptied.push(ctx_id.clone());
            }
        }

        self.emit(
            topics::STATE_CORRUPTED,
            Payload::StateCorrupted(StateCorrupted {
                nav_id: nav_id.to_string(),
            }),
        );
        self.diagnose(Level::Warn, format!("purged corrupted state {nav_id:?}"));

        emptied.sort_by_key(|ctx| Reverse(self.stack.iter().rposition(|c| c == ctx)));
        for ctx_id in emptied {
            self.histories.remove(&ctx_id);
            self.stack.retain(|ctx| *ctx != ctx_id);
            let new_ctx = self.active_context().map(str::to_string);
            self.emit(
                topics::CONTEXT_CLEANED,
                Payload::ContextChanged(ContextChanged {
                    old_ctx: Some(ctx_id),
                    new_ctx,
                }),
            );
        }
    }

    // --- Persistence ---

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            stack: self.stack.clone(),
            histories: self
                .histories
                .iter()
                .map(|(ctx, history)| (ctx.clone(), history.clone()))
                .collect(),
            states: self
                .states
                .iter()
                .map(|(id, state)| (id.clone(), *state))
                .collect(),
        }
    }

    /// Replace all tables with `snapshot`, then heal: empty context ids are
    /// dropped, histories of contexts not on the stack are
    /// discarded, every referenced state is validated and unreferenced
    /// states are removed.
    pub fn restore(&mut self, snapshot: Snapshot) -> Vec<Event> {
        let old_ctx = self.active_context().map(str::to_string);
        let Snapshot {
            stack,
            histories,
            states,
        } = snapshot;

        self.stack = stack.into_iter().filter(|ctx| !ctx.is_empty()).collect();
        self.histories = self
            .stack
            .iter()
            .map(|ctx| (ctx.clone(), histories.get(ctx).cloned().unwrap_or_default()))
            .collect();
        self.states = states.into_iter().collect();

        let referenced: BTreeSet<String> = self.histories.values().flatten().cloned().collect();
        for nav_id in &referenced {
            if !self.states.get(nav_id).is_some_and(NavState::is_valid) {
                self.purge(nav_id);
            }
        }
        let referenced: HashSet<&String> = self.histories.values().flatten().collect();
        let orphans: Vec<String> = self
            .states
            .keys()
            .filter(|id| !referenced.contains(id))
            .cloned()
            .collect();
        for id in orphans {
            self.states.remove(&id);
        }

        tracing::info!(
            contexts = self.stack.len(),
            states = self.states.len(),
            "navigator restored"
        );
        self.emit(
            topics::RESTORED,
            Payload::ContextChanged(ContextChanged {
                old_ctx,
                new_ctx: self.active_context().map(str::to_string),
            }),
        );
        self.take()
    }

    // --- Outbox ---

    fn emit(&mut self, name: EventName, payload: Payload) {
        self.outbox.push(Event::new(name, payload));
    }

    fn diagnose(&mut self, level: Level, message: String) {
        match level {
            Level::Debug => tracing::debug!("{message}"),
            Level::Info => tracing::info!("{message}"),
            Level::Warn => tracing::warn!("{message}"),
            Level::Error => tracing::error!("{message}"),
        }
        self.outbox.push(diagnostic_event(level, message));
    }

    fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }
}
