use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "sessionCount": state.sessions.len(),
            "defaults": {
                "idColumn": state.config.id_column,
                "includeColumn": state.config.include_column,
                "maxClassrooms": state.config.max_classrooms,
                "maxCapacity": state.config.max_capacity,
            }
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}
