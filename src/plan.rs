use crate::allocate::{self, AllocationMode, Assignment, Classroom};
use crate::bundle;
use crate::error::{PlanError, Warning};
use crate::layout::{build_seat_grid, Variant};
use crate::render::{render_document, ClassroomPage};
use crate::roster::{admitted_ids, RosterQuery, RosterTable, SortDirection};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    pub sort_by: Option<&'a str>,
    pub direction: SortDirection,
    pub id_column: &'a str,
    pub include_column: &'a str,
    pub classrooms: &'a [Classroom],
    pub mode: AllocationMode,
    /// Fixed shuffle seed; a fresh one is drawn when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct GeneratedDocuments {
    pub seed: u64,
    pub admitted_count: usize,
    pub assignment: Assignment,
    pub seating_pdf: Vec<u8>,
    pub signature_pdf: Vec<u8>,
    pub bundle_zip: Vec<u8>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub documents: GeneratedDocuments,
    pub warnings: Vec<Warning>,
}

/// In-place shuffle driven only by `seed`.
pub fn shuffle_roster(ids: &mut [String], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    ids.shuffle(&mut rng);
}

pub fn classroom_pages(assignment: &Assignment, variant: Variant) -> Vec<ClassroomPage> {
    assignment
        .rooms
        .iter()
        .map(|room| ClassroomPage {
            classroom: room.classroom.name.clone(),
            grid: build_seat_grid(&room.student_ids, variant),
        })
        .collect()
}

/// Filter, shuffle, allocate, lay out and render. Nothing is returned unless every step succeeds.
pub fn generate(table: &RosterTable, req: &PlanRequest<'_>) -> Result<PlanOutcome, PlanError> {
    allocate::validate_classrooms(req.classrooms)?;

    let roster = admitted_ids(
        table,
        &RosterQuery {
            sort_by: req.sort_by,
            direction: req.direction,
            id_column: req.id_column,
            include_column: req.include_column,
        },
    )?;
    let mut warnings = Vec::new();
    if roster.duplicates_dropped > 0 {
        tracing::warn!(dropped = roster.duplicates_dropped, "duplicate student ids ignored");
        warnings.push(Warning::duplicate_ids(roster.duplicates_dropped));
    }

    let seed = req.seed.unwrap_or_else(rand::random);
    let mut ids = roster.ids;
    shuffle_roster(&mut ids, seed);

    let assignment = allocate::allocate(&ids, req.classrooms, req.mode)?;
    if !assignment.unassigned.is_empty() {
        let total = allocate::total_capacity(req.classrooms);
        tracing::warn!(
            unassigned = assignment.unassigned.len(),
            total_capacity = total,
            "roster exceeds total classroom capacity"
        );
        warnings.push(Warning::allocation_overflow(&assignment.unassigned, total));
    }

    let seating_pdf = render_document(
        &classroom_pages(&assignment, Variant::Seating),
        "Exam Seating",
    )?;
    let signature_pdf = render_document(
        &classroom_pages(&assignment, Variant::Signature),
        "Signature Sheets",
    )?;
    let bundle_zip = bundle::pack_documents(&seating_pdf, &signature_pdf)
        .map_err(|e| PlanError::render(format!("{e:#}")))?;

    tracing::info!(
        admitted = ids.len(),
        classrooms = assignment.rooms.len(),
        mode = req.mode.as_str(),
        seed,
        "generated seating documents"
    );

    Ok(PlanOutcome {
        documents: GeneratedDocuments {
            seed,
            admitted_count: ids.len(),
            assignment,
            seating_pdf,
            signature_pdf,
            bundle_zip,
            generated_at: Utc::now(),
        },
        warnings,
    })
}
