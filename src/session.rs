use crate::allocate::{AllocationMode, Classroom};
use crate::plan::GeneratedDocuments;
use crate::roster::{RosterTable, SortDirection};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Everything one front-end session owns. Nothing here is shared across sessions.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub source_path: Option<PathBuf>,
    pub table: Option<RosterTable>,
    pub sort_by: Option<String>,
    pub direction: SortDirection,
    pub id_column: Option<String>,
    pub classrooms: Vec<Classroom>,
    pub mode: AllocationMode,
    pub documents: Option<GeneratedDocuments>,
}

impl Session {
    fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            source_path: None,
            table: None,
            sort_by: None,
            direction: SortDirection::Ascending,
            id_column: None,
            classrooms: Vec::new(),
            mode: AllocationMode::default(),
            documents: None,
        }
    }

    /// Drops roster, classrooms and documents; keeps the id and creation time.
    pub fn reset(&mut self) {
        let created_at = self.created_at;
        *self = Session::new(std::mem::take(&mut self.id));
        self.created_at = created_at;
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) -> &Session {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn reset(&mut self, id: &str) -> bool {
        match self.sessions.get_mut(id) {
            Some(s) => {
                s.reset();
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut store = SessionStore::new();
        let a = store.open().id.clone();
        let b = store.open().id.clone();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);

        {
            let s = store.get_mut(&a).expect("session a");
            s.classrooms.push(Classroom::new("Lab", 10));
            s.sort_by = Some("Name".into());
        }
        let created = store.get_mut(&a).expect("session a").created_at;
        assert!(store.reset(&a));
        let s = store.get_mut(&a).expect("session a");
        assert!(s.classrooms.is_empty());
        assert!(s.sort_by.is_none());
        assert_eq!(s.id, a);
        assert_eq!(s.created_at, created);

        assert!(store.close(&b));
        assert!(!store.close(&b));
        assert!(!store.reset("missing"));
        assert_eq!(store.len(), 1);
    }
}
