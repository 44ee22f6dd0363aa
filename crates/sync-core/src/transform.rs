//! Record shaping: raw change rows to search documents and bulk payloads.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::types::{ChangeRecord, FilmDocument, PersonRef, PersonRole};

/// Errors raised while shaping change records into documents.
///
/// These are data-integrity problems; retrying the same input cannot fix
/// them, so callers should surface them.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A required column was NULL
    #[error("Record {position} (film {film}) is missing required field '{field}'")]
    MissingField {
        position: usize,
        field: &'static str,
        film: String,
    },

    /// A `{id, name}` aggregate could not be decoded
    #[error("Film {film}: malformed {role} list: {source}")]
    MalformedPerson {
        film: Uuid,
        role: PersonRole,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a document or action line failed
    #[error("Failed to serialize bulk payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A validated document together with the timestamp it was extracted at.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedFilm {
    pub document: FilmDocument,
    /// Sync metadata; never written to the index
    pub updated_at: DateTime<Utc>,
}

/// One extracted page, validated and ready to load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentBatch {
    films: Vec<IndexedFilm>,
}

impl DocumentBatch {
    /// Validate and coerce a page of raw records, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns an error on the first record that is missing `id`, `title`
    /// or `updated_at`, or whose person aggregate cannot be decoded.
    pub fn from_records(records: Vec<ChangeRecord>) -> Result<Self, TransformError> {
        let films = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| shape_record(position, record))
            .collect::<Result<Vec<_>, _>>()?;

        if !films.is_empty() {
            info!("{} entities transformed for the search index", films.len());
        }

        Ok(Self { films })
    }

    pub fn len(&self) -> usize {
        self.films.len()
    }

    pub fn is_empty(&self) -> bool {
        self.films.is_empty()
    }

    pub fn films(&self) -> &[IndexedFilm] {
        &self.films
    }

    pub fn documents(&self) -> impl Iterator<Item = &FilmDocument> {
        self.films.iter().map(|film| &film.document)
    }

    /// Render the newline-delimited bulk body for `index`.
    ///
    /// Each document is preceded by an `index` action keyed by the film id,
    /// so replaying the same payload overwrites rather than duplicates.
    /// The result ends with a newline; an empty batch renders as `""`.
    pub fn bulk_payload(&self, index: &str) -> Result<String, TransformError> {
        let mut lines = Vec::with_capacity(self.films.len() * 2);
        for film in &self.films {
            let action = serde_json::json!({
                "index": { "_index": index, "_id": film.document.id }
            });
            lines.push(serde_json::to_string(&action)?);
            lines.push(serde_json::to_string(&film.document)?);
        }

        if lines.is_empty() {
            return Ok(String::new());
        }

        let mut payload = lines.join("\n");
        payload.push('\n');
        Ok(payload)
    }

    /// Effective timestamp of the last record in the page.
    ///
    /// Pages are ordered ascending, so this is also the maximum.
    pub fn last_effective_timestamp(&self) -> Option<DateTime<Utc>> {
        self.films.last().map(|film| film.updated_at)
    }
}

fn shape_record(position: usize, record: ChangeRecord) -> Result<IndexedFilm, TransformError> {
    let missing = |field: &'static str| TransformError::MissingField {
        position,
        field,
        film: record
            .id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<unknown>".to_string()),
    };

    let id = record.id.ok_or_else(|| missing("id"))?;
    let title = record.title.clone().ok_or_else(|| missing("title"))?;
    let updated_at = record.updated_at.ok_or_else(|| missing("updated_at"))?;

    let document = FilmDocument {
        id,
        imdb_rating: record.rating,
        genres: flatten_names(record.genres.as_ref()),
        title,
        description: record.description.clone(),
        directors_names: flatten_names(record.names(PersonRole::Director)),
        actors_names: flatten_names(record.names(PersonRole::Actor)),
        writers_names: flatten_names(record.names(PersonRole::Writer)),
        directors: parse_persons(id, PersonRole::Director, record.persons(PersonRole::Director))?,
        actors: parse_persons(id, PersonRole::Actor, record.persons(PersonRole::Actor))?,
        writers: parse_persons(id, PersonRole::Writer, record.persons(PersonRole::Writer))?,
    };

    Ok(IndexedFilm {
        document,
        updated_at,
    })
}

fn flatten_names(names: Option<&Vec<Option<String>>>) -> Vec<String> {
    names
        .map(|names| names.iter().flatten().cloned().collect())
        .unwrap_or_default()
}

fn parse_persons(
    film: Uuid,
    role: PersonRole,
    raw: Option<&serde_json::Value>,
) -> Result<Vec<PersonRef>, TransformError> {
    let entries = match raw {
        None | Some(serde_json::Value::Null) => return Ok(Vec::new()),
        Some(serde_json::Value::Array(entries)) => entries,
        Some(other) => {
            // A lone object is not a list; let serde explain why.
            return serde_json::from_value::<Vec<PersonRef>>(other.clone())
                .map_err(|source| TransformError::MalformedPerson { film, role, source });
        }
    };

    entries
        .iter()
        .filter(|entry| !entry.is_null())
        .map(|entry| {
            serde_json::from_value::<PersonRef>(entry.clone())
                .map_err(|source| TransformError::MalformedPerson { film, role, source })
        })
        .collect()
}
