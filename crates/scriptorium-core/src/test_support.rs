use crate::{
    document::{Document, Element},
    types::{ElementId, EntryId},
};
use serde::{Deserialize, Serialize};

///
/// Manuscript
///
/// Small nested document used across core tests: folios carry notes, so
/// partial scopes can be exercised two levels deep.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub(crate) struct Manuscript {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub folios: Vec<Folio>,
}

impl Document for Manuscript {
    const PATH: &'static str = "test::Manuscript";

    fn blank(entry_id: &EntryId) -> Self {
        Self {
            id: entry_id.to_string(),
            ..Self::default()
        }
    }
}

impl Manuscript {
    pub(crate) fn folio(&self, id: ElementId) -> Option<&Folio> {
        self.folios.iter().find(|folio| folio.id == id)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Folio {
    pub id: ElementId,
    pub label: String,
    pub notes: Vec<Note>,
}

impl Folio {
    pub(crate) fn new(id: ElementId) -> Self {
        Self {
            id,
            label: String::new(),
            notes: Vec::new(),
        }
    }
}

impl Element for Folio {
    fn element_id(&self) -> ElementId {
        self.id
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Note {
    pub id: ElementId,
    pub text: String,
}

impl Element for Note {
    fn element_id(&self) -> ElementId {
        self.id
    }
}

/// Borrow the folio list; used as the list selector in tests.
pub(crate) fn folios(manuscript: &mut Manuscript) -> &mut Vec<Folio> {
    &mut manuscript.folios
}

/// Borrow the note list of one folio.
pub(crate) fn notes(folio: &mut Folio) -> &mut Vec<Note> {
    &mut folio.notes
}
