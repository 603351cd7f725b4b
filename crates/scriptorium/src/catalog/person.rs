use crate::error::Error;
use scriptorium_core::prelude::*;
use serde::{Deserialize, Serialize};

///
/// Person
///
/// Biographical entry.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Person {
    pub id: String,
    pub display_name: String,
    pub summary: String,
    pub lifespan: Lifespan,
    /// Name variants, preferred form first.
    pub names: Vec<PersonName>,
}

impl Document for Person {
    const PATH: &'static str = "catalog::Person";

    fn blank(entry_id: &EntryId) -> Self {
        Self {
            id: entry_id.to_string(),
            ..Self::default()
        }
    }
}

impl Person {
    #[must_use]
    pub fn name(&self, id: ElementId) -> Option<&PersonName> {
        self.names.iter().find(|name| name.id == id)
    }
}

///
/// Lifespan
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Lifespan {
    pub born: Option<String>,
    pub died: Option<String>,
}

///
/// PersonName
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PersonName {
    pub id: ElementId,
    pub given: String,
    pub family: String,
    pub kind: NameKind,
}

impl Element for PersonName {
    fn element_id(&self) -> ElementId {
        self.id
    }
}

///
/// NameKind
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKind {
    #[default]
    Variant,
    Preferred,
    Pseudonym,
}

fn names(person: &mut Person) -> &mut Vec<PersonName> {
    &mut person.names
}

///
/// PersonEdit
///

#[derive(Debug)]
pub struct PersonEdit {
    command: EditCommand<Person>,
}

impl PersonEdit {
    pub(crate) const fn new(command: EditCommand<Person>) -> Self {
        Self { command }
    }

    #[must_use]
    pub const fn entry_id(&self) -> &EntryId {
        self.command.entry_id()
    }

    #[must_use]
    pub fn by(self, actor: impl Into<Actor>) -> Self {
        Self {
            command: self.command.with_actor(actor),
        }
    }

    #[must_use]
    pub const fn changes(&self) -> &ChangeSet<Person> {
        self.command.changes()
    }

    pub fn set_display_name(&self, display_name: impl Into<String>) -> &Self {
        let display_name = display_name.into();
        self.changes().add("display_name", move |person| {
            person.display_name.clone_from(&display_name);
        });
        self
    }

    pub fn set_summary(&self, summary: impl Into<String>) -> &Self {
        let summary = summary.into();
        self.changes()
            .add("summary", move |person| person.summary.clone_from(&summary));
        self
    }

    pub fn set_born(&self, born: Option<String>) -> &Self {
        self.lifespan()
            .add("born", move |lifespan| lifespan.born.clone_from(&born));
        self
    }

    pub fn set_died(&self, died: Option<String>) -> &Self {
        self.lifespan()
            .add("died", move |lifespan| lifespan.died.clone_from(&died));
        self
    }

    fn lifespan(&self) -> PartialChangeSet<Lifespan> {
        self.changes()
            .partial("lifespan", |person: &mut Person| Some(&mut person.lifespan))
    }

    // ======================================================================
    // Names
    // ======================================================================

    pub fn add_name(&self, given: impl Into<String>, family: impl Into<String>) -> NameEdit {
        let given = given.into();
        let family = family.into();
        let (id, scope) = self.changes().append_element("names", names, move |id| PersonName {
            id,
            given: given.clone(),
            family: family.clone(),
            kind: NameKind::default(),
        });

        NameEdit { id, scope }
    }

    #[must_use]
    pub fn name(&self, id: ElementId) -> NameEdit {
        NameEdit {
            id,
            scope: self.changes().element("names", names, id),
        }
    }

    pub fn remove_name(&self, id: ElementId) -> &Self {
        self.changes().remove_element("names", names, id);
        self
    }

    pub fn move_name(&self, id: ElementId, index: usize) -> &Self {
        self.changes().move_element("names", names, id, index);
        self
    }

    pub async fn execute(&self) -> Result<EntryId, Error> {
        Ok(self.command.execute().await?)
    }
}

///
/// NameEdit
///

#[derive(Clone, Debug)]
pub struct NameEdit {
    id: ElementId,
    scope: PartialChangeSet<PersonName>,
}

impl NameEdit {
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    pub fn set_given(&self, given: impl Into<String>) -> &Self {
        let given = given.into();
        self.scope
            .add("given", move |name| name.given.clone_from(&given));
        self
    }

    pub fn set_family(&self, family: impl Into<String>) -> &Self {
        let family = family.into();
        self.scope
            .add("family", move |name| name.family.clone_from(&family));
        self
    }

    pub fn set_kind(&self, kind: NameKind) -> &Self {
        self.scope.add("kind", move |name| name.kind = kind);
        self
    }
}
