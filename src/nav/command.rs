//! Decoding inbound bus events into typed navigator requests.
//!
//! This is the schema boundary: a request arrives either as its typed
//! [`Payload`] variant or as [`Payload::Json`], which is decoded against the
//! request struct. Anything else is refused before the navigator sees it.

use serde::de::DeserializeOwned;

use super::state::Movement;
use super::topics;
use crate::error::PayloadError;
use crate::events::Event;
use crate::events::payload::{ContextRequest, NavigateRequest, Payload, SetStateRequest};

#[derive(Debug, Clone, PartialEq)]
pub enum NavCommand {
    Move(Movement),
    Back,
    Select,
    Multiselect,
    NavigateTo(NavigateRequest),
    ContextPush(String),
    ContextPop(String),
    ContextCleanup(String),
    SetState(SetStateRequest),
}

impl NavCommand {
    pub fn from_event(event: &Event) -> Result<Self, PayloadError> {
        let topic = event.name.as_str();
        let payload = &event.payload;

        let command = match &event.name {
            name if *name == topics::UP => NavCommand::Move(Movement::Up),
            name if *name == topics::DOWN => NavCommand::Move(Movement::Down),
            name if *name == topics::LEFT => NavCommand::Move(Movement::Left),
            name if *name == topics::RIGHT => NavCommand::Move(Movement::Right),
            name if *name == topics::BACK => NavCommand::Back,
            name if *name == topics::SELECT => NavCommand::Select,
            name if *name == topics::MULTISELECT => NavCommand::Multiselect,
            name if *name == topics::NAVIGATE_TO => {
                let request: NavigateRequest = decode(topic, payload, "navigate", |p| match p {
                    Payload::Navigate(r) => Some(r.clone()),
                    _ => None,
                })?;
                check_navigate(topic, &request)?;
                NavCommand::NavigateTo(request)
            }
            name if *name == topics::CONTEXT_PUSH => {
                NavCommand::ContextPush(context_id(topic, payload)?)
            }
            name if *name == topics::CONTEXT_POP => {
                NavCommand::ContextPop(context_id(topic, payload)?)
            }
            name if *name == topics::CONTEXT_CLEANUP => {
                NavCommand::ContextCleanup(context_id(topic, payload)?)
            }
            name if *name == topics::SET_STATE => {
                let request: SetStateRequest = decode(topic, payload, "set_state", |p| match p {
                    Payload::SetState(r) => Some(r.clone()),
                    _ => None,
                })?;
                require_ctx(topic, &request.ctx_id)?;
                if let Some(position) = request.position {
                    if position < 1 {
                        return Err(out_of_range(topic, format!("position {position} < 1")));
                    }
                }
                NavCommand::SetState(request)
            }
            _ => {
                return Err(PayloadError::UnknownTopic {
                    topic: topic.to_string(),
                });
            }
        };
        Ok(command)
    }
}

fn decode<T: DeserializeOwned>(
    topic: &str,
    payload: &Payload,
    expected: &'static str,
    typed: impl Fn(&Payload) -> Option<T>,
) -> Result<T, PayloadError> {
    if let Some(value) = typed(payload) {
        return Ok(value);
    }
    match payload {
        Payload::Json(value) => {
            serde_json::from_value(value.clone()).map_err(|source| PayloadError::Schema {
                topic: topic.to_string(),
                source,
            })
        }
        other => Err(PayloadError::Mismatch {
            topic: topic.to_string(),
            expected,
            found: other.kind(),
        }),
    }
}

fn context_id(topic: &str, payload: &Payload) -> Result<String, PayloadError> {
    let request: ContextRequest = decode(topic, payload, "context", |p| match p {
        Payload::Context(r) => Some(r.clone()),
        _ => None,
    })?;
    require_ctx(topic, &request.ctx_id)?;
    Ok(request.ctx_id)
}

fn require_ctx(topic: &str, ctx_id: &str) -> Result<(), PayloadError> {
    if ctx_id.is_empty() {
        return Err(out_of_range(topic, "ctx_id is empty".to_string()));
    }
    Ok(())
}

fn check_navigate(topic: &str, request: &NavigateRequest) -> Result<(), PayloadError> {
    require_ctx(topic, &request.ctx_id)?;
    if request.nav_id.is_empty() {
        return Err(out_of_range(topic, "nav_id is empty".to_string()));
    }
    if request.columns < 1 {
        return Err(out_of_range(topic, format!("columns {} < 1", request.columns)));
    }
    if request.position < 0 {
        return Err(out_of_range(topic, format!("position {} < 0", request.position)));
    }
    if request.total_items < 0 {
        return Err(out_of_range(
            topic,
            format!("total_items {} < 0", request.total_items),
        ));
    }
    if request.total_items > 0 && request.position > request.total_items {
        return Err(out_of_range(
            topic,
            format!(
                "position {} beyond total_items {}",
                request.position, request.total_items
            ),
        ));
    }
    Ok(())
}

fn out_of_range(topic: &str, reason: String) -> PayloadError {
    PayloadError::OutOfRange {
        topic: topic.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventName;
    use serde_json::json;

    fn event(name: EventName, payload: Payload) -> Event {
        Event::new(name, payload)
    }

    #[test]
    fn movement_ignores_payload() {
        let cmd = NavCommand::from_event(&event(topics::LEFT, Payload::Json(json!(42)))).unwrap();
        assert_eq!(cmd, NavCommand::Move(Movement::Left));
    }

    #[test]
    fn typed_navigate_payload_accepted() {
        let request = NavigateRequest {
            ctx_id: "text".to_string(),
            nav_id: "root".to_string(),
            columns: 1,
            position: 1,
            total_items: 10,
        };
        let cmd = NavCommand::from_event(&event(
            topics::NAVIGATE_TO,
            Payload::Navigate(request.clone()),
        ))
        .unwrap();
        assert_eq!(cmd, NavCommand::NavigateTo(request));
    }

    #[test]
    fn json_navigate_payload_decoded() {
        let cmd = NavCommand::from_event(&event(
            topics::NAVIGATE_TO,
            Payload::Json(json!({"ctx_id": "text", "nav_id": "root", "total_items": 3})),
        ))
        .unwrap();
        match cmd {
            NavCommand::NavigateTo(req) => {
                assert_eq!(req.columns, 1);
                assert_eq!(req.position, 0);
                assert_eq!(req.total_items, 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_variant_is_mismatch() {
        let err = NavCommand::from_event(&event(topics::CONTEXT_PUSH, Payload::Empty)).unwrap_err();
        assert!(matches!(err, PayloadError::Mismatch { found: "empty", .. }));
    }

    #[test]
    fn missing_field_is_schema_error() {
        let err = NavCommand::from_event(&event(
            topics::NAVIGATE_TO,
            Payload::Json(json!({"ctx_id": "text"})),
        ))
        .unwrap_err();
        assert!(matches!(err, PayloadError::Schema { .. }));
    }

    #[test]
    fn out_of_range_navigate_rejected() {
        for bad in [
            json!({"ctx_id": "t", "nav_id": "n", "columns": 0}),
            json!({"ctx_id": "t", "nav_id": "n", "position": -1}),
            json!({"ctx_id": "t", "nav_id": "n", "position": 6, "total_items": 5}),
            json!({"ctx_id": "", "nav_id": "n"}),
            json!({"ctx_id": "t", "nav_id": ""}),
        ] {
            let err = NavCommand::from_event(&event(topics::NAVIGATE_TO, Payload::Json(bad.clone())))
                .unwrap_err();
            assert!(matches!(err, PayloadError::OutOfRange { .. }), "{bad}");
        }
    }

    #[test]
    fn set_state_position_optional() {
        let cmd = NavCommand::from_event(&event(
            topics::SET_STATE,
            Payload::Json(json!({"ctx_id": "text"})),
        ))
        .unwrap();
        assert_eq!(
            cmd,
            NavCommand::SetState(SetStateRequest {
                ctx_id: "text".to_string(),
                position: None,
            })
        );
    }

    #[test]
    fn outbound_topic_is_not_a_request() {
        let err = NavCommand::from_event(&event(topics::POS_CHANGED, Payload::Empty)).unwrap_err();
        assert!(matches!(err, PayloadError::UnknownTopic { .. }));
    }
}
