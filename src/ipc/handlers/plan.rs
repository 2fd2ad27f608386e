use super::classrooms::parse_mode;
use super::params::{optional_bool, optional_str, optional_u64, respond, session_mut, HandlerErr};
use crate::bundle;
use crate::ipc::types::{AppState, Request};
use crate::plan::{self, PlanRequest};
use crate::roster::{self, SortDirection};
use serde_json::{json, Value};

fn handle_generate(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let include_column = state.config.include_column.clone();
    let default_id = state.config.id_column.clone();
    let id_param = optional_str(&req.params, "idColumn")?;
    let sort_param = optional_str(&req.params, "sortBy")?;
    let descending = optional_bool(&req.params, "descending")?;
    let seed = optional_u64(&req.params, "seed")?;
    let mode = parse_mode(optional_str(&req.params, "mode")?)?;

    let session = session_mut(state, req)?;
    let table = session
        .table
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_roster", "load a roster first"))?;
    if session.classrooms.is_empty() {
        return Err(HandlerErr::new("no_classrooms", "declare classrooms first"));
    }

    let id_column = id_param
        .or_else(|| session.id_column.clone())
        .unwrap_or(default_id);
    let sort_by = sort_param
        .or_else(|| session.sort_by.clone())
        .or_else(|| roster::default_sort_column(table, &include_column).map(str::to_string));
    let direction = descending
        .map(SortDirection::from_descending)
        .unwrap_or(session.direction);
    let mode = mode.unwrap_or(session.mode);

    let outcome = plan::generate(
        table,
        &PlanRequest {
            sort_by: sort_by.as_deref(),
            direction,
            id_column: &id_column,
            include_column: &include_column,
            classrooms: &session.classrooms,
            mode,
            seed,
        },
    )?;

    let docs = &outcome.documents;
    let assignments: Vec<Value> = docs
        .assignment
        .rooms
        .iter()
        .map(|room| {
            json!({
                "classroom": room.classroom.name,
                "capacity": room.classroom.capacity,
                "studentIds": room.student_ids,
            })
        })
        .collect();
    let result = json!({
        "seed": docs.seed,
        "mode": mode.as_str(),
        "admittedCount": docs.admitted_count,
        "assignedCount": docs.assignment.assigned_count(),
        "assignments": assignments,
        "unassigned": docs.assignment.unassigned,
        "warnings": outcome.warnings,
        "documents": {
            "seating": { "fileName": bundle::SEATING_ENTRY, "bytes": docs.seating_pdf.len() },
            "signature": { "fileName": bundle::SIGNATURE_ENTRY, "bytes": docs.signature_pdf.len() },
            "bundle": { "fileName": bundle::BUNDLE_NAME, "bytes": docs.bundle_zip.len() },
        },
        "generatedAt": docs.generated_at.to_rfc3339(),
    });

    session.id_column = Some(id_column);
    session.sort_by = sort_by;
    session.direction = direction;
    session.mode = mode;
    session.documents = Some(outcome.documents);
    Ok(result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "plan.generate" => Some(respond(req, handle_generate(state, req))),
        _ => None,
    }
}
