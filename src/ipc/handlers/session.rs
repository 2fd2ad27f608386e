use super::params::{required_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

fn handle_open(state: &mut AppState) -> Result<Value, HandlerErr> {
    let session = state.sessions.open();
    tracing::info!(session = %session.id, "session opened");
    Ok(json!({
        "sessionId": session.id,
        "createdAt": session.created_at.to_rfc3339(),
    }))
}

fn handle_reset(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let id = required_str(&req.params, "sessionId")?;
    if !state.sessions.reset(&id) {
        return Err(HandlerErr::new("unknown_session", "session not found"));
    }
    tracing::info!(session = %id, "session reset");
    Ok(json!({ "sessionId": id }))
}

fn handle_close(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let id = required_str(&req.params, "sessionId")?;
    if !state.sessions.close(&id) {
        return Err(HandlerErr::new("unknown_session", "session not found"));
    }
    tracing::info!(session = %id, "session closed");
    Ok(json!({ "closed": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "session.open" => handle_open(state),
        "session.reset" => handle_reset(state, req),
        "session.close" => handle_close(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
