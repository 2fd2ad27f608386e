use super::params::{optional_bool, optional_str, required_str, respond, session_mut, HandlerErr};
use crate::error::PlanError;
use crate::ipc::types::{AppState, Request};
use crate::roster::{self, RosterTable, SortDirection};
use serde_json::{json, Value};
use std::path::PathBuf;

fn display_columns<'a>(table: &'a RosterTable, include_column: &'a str) -> Vec<(usize, &'a str)> {
    table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.as_str() != include_column)
        .map(|(i, c)| (i, c.as_str()))
        .collect()
}

fn handle_load(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let path = PathBuf::from(required_str(&req.params, "path")?);
    let include_column = state.config.include_column.clone();
    let default_id = state.config.id_column.clone();
    let session = session_mut(state, req)?;

    let mut table = roster::load_table(&path).map_err(|e| {
        HandlerErr::new("load_failed", format!("{e:#}"))
            .with_details(json!({ "path": path.to_string_lossy() }))
    })?;
    let include_present = table.ensure_include_column(&include_column);
    let id_column = session.id_column.clone().unwrap_or(default_id);

    let result = json!({
        "columns": display_columns(&table, &include_column)
            .into_iter()
            .map(|(_, c)| c)
            .collect::<Vec<_>>(),
        "rowCount": table.row_count(),
        "includedCount": table.included_count(&include_column),
        "includeColumnPresent": include_present,
        "idColumn": id_column,
        "idColumnPresent": table.column_index(&id_column).is_some(),
    });

    tracing::info!(
        session = %session.id,
        path = %path.to_string_lossy(),
        rows = table.row_count(),
        "roster loaded"
    );
    session.source_path = Some(path);
    session.sort_by = None;
    session.table = Some(table);
    Ok(result)
}

fn handle_preview(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let include_column = state.config.include_column.clone();
    let sort_param = optional_str(&req.params, "sortBy")?;
    let descending = optional_bool(&req.params, "descending")?;
    let session = session_mut(state, req)?;
    let table = session
        .table
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_roster", "load a roster first"))?;

    let columns = display_columns(table, &include_column);
    let sort_by = sort_param
        .or_else(|| session.sort_by.clone())
        .or_else(|| roster::default_sort_column(table, &include_column).map(str::to_string));
    if sort_by.as_deref() == Some(include_column.as_str()) {
        return Err(PlanError::validation(format!(
            "cannot sort by the inclusion column {}",
            include_column
        ))
        .into());
    }
    let direction = descending
        .map(SortDirection::from_descending)
        .unwrap_or(session.direction);

    let order = roster::sorted_order(table, sort_by.as_deref(), direction)?;
    let rows: Vec<Value> = order
        .iter()
        .map(|&r| {
            json!({
                "rowIndex": r,
                "included": table.is_included(r, &include_column),
                "cells": columns
                    .iter()
                    .map(|(c, _)| table.rows[r][*c].to_json())
                    .collect::<Vec<_>>(),
            })
        })
        .collect();
    let result = json!({
        "columns": columns.iter().map(|(_, c)| *c).collect::<Vec<_>>(),
        "rows": rows,
        "sortBy": sort_by,
        "descending": direction.is_descending(),
        "sourcePath": session.source_path.as_ref().map(|p| p.to_string_lossy()),
    });

    session.sort_by = sort_by;
    session.direction = direction;
    Ok(result)
}

fn handle_set_included(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let include_column = state.config.include_column.clone();
    let rows: Vec<usize> = req
        .params
        .get("rows")
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::bad_params("missing rows"))?
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| HandlerErr::bad_params("rows must be non-negative integers"))
        })
        .collect::<Result<_, _>>()?;
    let included = optional_bool(&req.params, "included")?
        .ok_or_else(|| HandlerErr::bad_params("missing included"))?;

    let session = session_mut(state, req)?;
    let table = session
        .table
        .as_mut()
        .ok_or_else(|| HandlerErr::new("no_roster", "load a roster first"))?;
    let count = table.set_included(&include_column, &rows, included)?;
    Ok(json!({ "includedCount": count }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "roster.load" => handle_load(state, req),
        "roster.preview" => handle_preview(state, req),
        "roster.setIncluded" => handle_set_included(state, req),
        _ => return None,
    };
    Some(respond(req, result))
}
