use super::params::{optional_str, required_str, respond, session_mut, HandlerErr};
use crate::bundle;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Seating,
    Signature,
    Bundle,
}

impl DocumentKind {
    fn parse(raw: Option<&str>) -> Result<Self, HandlerErr> {
        match raw {
            None | Some("bundle") => Ok(DocumentKind::Bundle),
            Some("seating") => Ok(DocumentKind::Seating),
            Some("signature") => Ok(DocumentKind::Signature),
            Some(other) => Err(HandlerErr::bad_params(
                "kind must be one of: bundle, seating, signature",
            )
            .with_details(json!({ "kind": other }))),
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            DocumentKind::Seating => bundle::SEATING_ENTRY,
            DocumentKind::Signature => bundle::SIGNATURE_ENTRY,
            DocumentKind::Bundle => bundle::BUNDLE_NAME,
        }
    }
}

fn handle_export(state: &mut AppState, req: &Request) -> Result<Value, HandlerErr> {
    let out_path = PathBuf::from(required_str(&req.params, "outPath")?);
    let kind = DocumentKind::parse(optional_str(&req.params, "kind")?.as_deref())?;

    let session = session_mut(state, req)?;
    let docs = session
        .documents
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_documents", "generate documents first"))?;
    let bytes = match kind {
        DocumentKind::Seating => &docs.seating_pdf,
        DocumentKind::Signature => &docs.signature_pdf,
        DocumentKind::Bundle => &docs.bundle_zip,
    };

    let target = bundle::resolve_out_path(&out_path, kind.file_name());
    let summary = bundle::write_artifact(&target, bytes).map_err(|e| {
        HandlerErr::new("export_failed", format!("{e:#}"))
            .with_details(json!({ "path": target.to_string_lossy() }))
    })?;
    tracing::info!(
        session = %session.id,
        path = %summary.path.to_string_lossy(),
        bytes = summary.bytes,
        "document exported"
    );

    Ok(json!({
        "path": summary.path.to_string_lossy(),
        "fileName": kind.file_name(),
        "bytes": summary.bytes,
        "sha256": summary.sha256,
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "documents.export" => Some(respond(req, handle_export(state, req))),
        _ => None,
    }
}
