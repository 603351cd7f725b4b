use crate::error::Error;
use scriptorium_core::prelude::*;
use serde::{Deserialize, Serialize};

///
/// Work
///
/// Bibliographic work: a text, manuscript or edition.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Work {
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Display date as catalogued ("c. 1450", "1623").
    pub date: Option<String>,
    pub keywords: Vec<String>,
    pub authors: Vec<Author>,
}

impl Document for Work {
    const PATH: &'static str = "catalog::Work";

    fn blank(entry_id: &EntryId) -> Self {
        Self {
            id: entry_id.to_string(),
            ..Self::default()
        }
    }
}

impl Work {
    #[must_use]
    pub fn author(&self, id: ElementId) -> Option<&Author> {
        self.authors.iter().find(|author| author.id == id)
    }
}

///
/// Author
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Author {
    pub id: ElementId,
    /// Linked person entry, when the author has been identified.
    pub person: Option<EntryId>,
    pub name: String,
    pub role: AuthorRole,
}

impl Element for Author {
    fn element_id(&self) -> ElementId {
        self.id
    }
}

///
/// AuthorRole
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorRole {
    #[default]
    Author,
    Editor,
    Translator,
    Compiler,
}

fn authors(work: &mut Work) -> &mut Vec<Author> {
    &mut work.authors
}

///
/// WorkEdit
///
/// Typed edit of one work. Every setter only records a change; call
/// `execute` to commit them.
///

#[derive(Debug)]
pub struct WorkEdit {
    command: EditCommand<Work>,
}

impl WorkEdit {
    pub(crate) const fn new(command: EditCommand<Work>) -> Self {
        Self { command }
    }

    #[must_use]
    pub const fn entry_id(&self) -> &EntryId {
        self.command.entry_id()
    }

    /// Attribute the edit to `actor`.
    #[must_use]
    pub fn by(self, actor: impl Into<Actor>) -> Self {
        Self {
            command: self.command.with_actor(actor),
        }
    }

    /// Raw change set, for edits without a typed setter.
    #[must_use]
    pub const fn changes(&self) -> &ChangeSet<Work> {
        self.command.changes()
    }

    // ======================================================================
    // Fields
    // ======================================================================

    pub fn set_title(&self, title: impl Into<String>) -> &Self {
        let title = title.into();
        self.changes()
            .add("title", move |work| work.title.clone_from(&title));
        self
    }

    pub fn set_summary(&self, summary: impl Into<String>) -> &Self {
        let summary = summary.into();
        self.changes()
            .add("summary", move |work| work.summary.clone_from(&summary));
        self
    }

    pub fn set_date(&self, date: Option<String>) -> &Self {
        self.changes()
            .add("date", move |work| work.date.clone_from(&date));
        self
    }

    /// Add a keyword; duplicates are ignored.
    pub fn add_keyword(&self, keyword: impl Into<String>) -> &Self {
        let keyword = keyword.into();
        self.changes().add("keywords[+]", move |work| {
            if !work.keywords.contains(&keyword) {
                work.keywords.push(keyword.clone());
            }
        });
        self
    }

    pub fn remove_keyword(&self, keyword: impl Into<String>) -> &Self {
        let keyword = keyword.into();
        self.changes()
            .add("keywords[-]", move |work| work.keywords.retain(|k| *k != keyword));
        self
    }

    // ======================================================================
    // Authors
    // ======================================================================

    /// Append an author; the returned edit targets the new entry.
    pub fn add_author(&self, name: impl Into<String>) -> AuthorEdit {
        let name = name.into();
        let (id, scope) = self.changes().append_element("authors", authors, move |id| Author {
            id,
            person: None,
            name: name.clone(),
            role: AuthorRole::default(),
        });

        AuthorEdit { id, scope }
    }

    /// Edit an existing author. The apply fails if `id` is gone by then.
    #[must_use]
    pub fn author(&self, id: ElementId) -> AuthorEdit {
        AuthorEdit {
            id,
            scope: self.changes().element("authors", authors, id),
        }
    }

    pub fn remove_author(&self, id: ElementId) -> &Self {
        self.changes().remove_element("authors", authors, id);
        self
    }

    pub fn move_author(&self, id: ElementId, index: usize) -> &Self {
        self.changes().move_element("authors", authors, id, index);
        self
    }

    // ======================================================================
    // Commit
    // ======================================================================

    pub async fn execute(&self) -> Result<EntryId, Error> {
        Ok(self.command.execute().await?)
    }
}

///
/// AuthorEdit
///

#[derive(Clone, Debug)]
pub struct AuthorEdit {
    id: ElementId,
    scope: PartialChangeSet<Author>,
}

impl AuthorEdit {
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    pub fn set_name(&self, name: impl Into<String>) -> &Self {
        let name = name.into();
        self.scope
            .add("name", move |author| author.name.clone_from(&name));
        self
    }

    pub fn set_role(&self, role: AuthorRole) -> &Self {
        self.scope.add("role", move |author| author.role = role);
        self
    }

    /// Link the author to a person entry.
    pub fn link_person(&self, person: impl Into<EntryId>) -> &Self {
        let person = person.into();
        self.scope
            .add("person", move |author| author.person = Some(person.clone()));
        self
    }

    pub fn unlink_person(&self) -> &Self {
        self.scope.add("person", |author| author.person = None);
        self
    }
}
