use super::params::{optional_str, respond, session_mut, HandlerErr};
use crate::allocate::{self, AllocationMode, Classroom};
use crate::error::PlanError;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};

pub(super) fn parse_mode(raw: Option<String>) -> Result<Option<AllocationMode>, HandlerErr> {
    match raw {
        None => Ok(None),
        Some(m) => AllocationMode::parse(&m).map(Some).ok_or_else(|| {
            HandlerErr::bad_params("mode must be one of: sequential, proportional")
                .with_details(json!({ "mode": m }))
        }),
    }
}

fn parse_classrooms(raw: &Value, max_classrooms: usize, max_capacity: u32) -> Result<Vec<Classroom>, HandlerErr> {
    let items = raw
        .as_array()
        .ok_or_else(|| HandlerErr::bad_params("missing classrooms"))?;
    if items.len() > max_classrooms {
        return Err(PlanError::validation(format!(
            "at most {} classrooms are allowed",
            max_classrooms
        ))
        .into());
    }

    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let name = item
            .get("name")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| HandlerErr::bad_params(format!("classrooms[{}].name must be a string", i)))?;
        let capacity = item
            .get("capacity")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| HandlerErr::bad_params(format!("classrooms[{}].capacity must be an integer", i)))?;
        if capacity < 1 || capacity > i64::from(max_capacity) {
            return Err(HandlerErr::from(PlanError::validation(format!(
                "capacity of {} must be between 1 and {}",
                if name.is_empty() { format!("classroom {}", i + 1) } else { name },
                max_capacity
            )))
            .with_details(json!({ "index": i, "capacity": capacity })));
        }
        out.push(Classroom::new(name, capacity as u32));
    }
    allocate::validate_classrooms(&out)?;
    Ok(out)
}

fn handle_set(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let classrooms = parse_classrooms(
        req.params.get("classrooms").unwrap_or(&Value::Null),
        state.config.max_classrooms,
        state.config.max_capacity,
    )?;
    let mode = parse_mode(optional_str(&req.params, "mode")?)?;

    let session = session_mut(state, req)?;
    if let Some(mode) = mode {
        session.mode = mode;
    }
    let total = allocate::total_capacity(&classrooms);
    tracing::info!(
        session = %session.id,
        classrooms = classrooms.len(),
        total_capacity = total,
        mode = session.mode.as_str(),
        "classrooms declared"
    );
    session.classrooms = classrooms;
    Ok(json!({
        "classroomCount": session.classrooms.len(),
        "totalCapacity": total,
        "mode": session.mode.as_str(),
    }))
}

fn handle_get(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let session = session_mut(state, req)?;
    Ok(json!({
        "classrooms": session.classrooms,
        "totalCapacity": allocate::total_capacity(&session.classrooms),
        "mode": session.mode.as_str(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "classrooms.set" => handle_set(state, req),
        "classrooms.get" => handle_get(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
