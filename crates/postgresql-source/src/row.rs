//! Row decoding for the change queries.

use sync_core::ChangeRecord;
use tokio_postgres::Row;

use crate::queries::EFFECTIVE_AT;

pub(crate) fn record_from_row(row: &Row) -> Result<ChangeRecord, tokio_postgres::Error> {
    Ok(ChangeRecord {
        id: row.try_get("id")?,
        rating: row.try_get("rating")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        genres: row.try_get("genres")?,
        directors_names: row.try_get("directors_names")?,
        actors_names: row.try_get("actors_names")?,
        writers_names: row.try_get("writers_names")?,
        directors: row.try_get("directors")?,
        actors: row.try_get("actors")?,
        writers: row.try_get("writers")?,
        updated_at: row.try_get(EFFECTIVE_AT)?,
    })
}
