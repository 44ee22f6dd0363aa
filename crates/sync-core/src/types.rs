//! Data types flowing through the sync pipeline.
//!
//! `ChangeRecord` is what the extractor hands over: every column is optional
//! because the relational side may legitimately return NULLs from its
//! aggregates. `FilmDocument` is what ends up in the search index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the independent criteria that can mark a film as changed.
///
/// The orchestrator walks the dimensions in [`Dimension::ALL`] order on
/// every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// The film's own fields changed
    Film,
    /// A person related to the film changed
    Person,
    /// A genre related to the film changed
    Genre,
}

impl Dimension {
    /// Processing order within one cycle.
    pub const ALL: [Dimension; 3] = [Dimension::Film, Dimension::Person, Dimension::Genre];

    /// Convert to string representation for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Film => "film",
            Dimension::Person => "person",
            Dimension::Genre => "genre",
        }
    }

    /// The dimension processed after this one, or `None` after the last.
    pub fn next(&self) -> Option<Dimension> {
        match self {
            Dimension::Film => Some(Dimension::Person),
            Dimension::Person => Some(Dimension::Genre),
            Dimension::Genre => None,
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role a person plays in a film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    Director,
    Writer,
    Actor,
}

impl PersonRole {
    pub const ALL: [PersonRole; 3] = [PersonRole::Director, PersonRole::Writer, PersonRole::Actor];

    /// Value stored in the `role` column of the person/film link table.
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonRole::Director => "director",
            PersonRole::Writer => "writer",
            PersonRole::Actor => "actor",
        }
    }
}

impl std::fmt::Display for PersonRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person reference embedded in a film document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Uuid,
    pub name: String,
}

/// Raw joined projection of a film, as returned by a change query.
///
/// Name lists may contain `None` entries (SQL `ARRAY_AGG` over an outer
/// join); person lists are kept as the raw JSON aggregate and parsed during
/// transformation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeRecord {
    pub id: Option<Uuid>,
    pub rating: Option<f64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub genres: Option<Vec<Option<String>>>,
    pub directors_names: Option<Vec<Option<String>>>,
    pub actors_names: Option<Vec<Option<String>>>,
    pub writers_names: Option<Vec<Option<String>>>,
    pub directors: Option<serde_json::Value>,
    pub actors: Option<serde_json::Value>,
    pub writers: Option<serde_json::Value>,
    /// Effective modification time for the dimension that produced the row
    pub updated_at: Option<DateTime<Utc>>,
}

impl ChangeRecord {
    /// Raw name list for the given role.
    pub fn names(&self, role: PersonRole) -> Option<&Vec<Option<String>>> {
        match role {
            PersonRole::Director => self.directors_names.as_ref(),
            PersonRole::Writer => self.writers_names.as_ref(),
            PersonRole::Actor => self.actors_names.as_ref(),
        }
    }

    /// Raw `{id, name}` aggregate for the given role.
    pub fn persons(&self, role: PersonRole) -> Option<&serde_json::Value> {
        match role {
            PersonRole::Director => self.directors.as_ref(),
            PersonRole::Writer => self.writers.as_ref(),
            PersonRole::Actor => self.actors.as_ref(),
        }
    }
}

/// Denormalized film document written to the search index.
///
/// Field order matches the index mapping and is the serialization order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmDocument {
    pub id: Uuid,
    pub imdb_rating: Option<f64>,
    pub genres: Vec<String>,
    pub title: String,
    pub description: Option<String>,
    pub directors_names: Vec<String>,
    pub actors_names: Vec<String>,
    pub writers_names: Vec<String>,
    pub directors: Vec<PersonRef>,
    pub actors: Vec<PersonRef>,
    pub writers: Vec<PersonRef>,
}
