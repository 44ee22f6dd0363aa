//! SQL for the three change dimensions.
//!
//! All queries share one projection: the film's own columns, distinct genre
//! names, and per-role distinct person names plus `{id, name}` objects. They
//! differ only in the filter and in what counts as the row's effective
//! modification time. Every query takes `$1 timestamptz` (the cursor) and
//! `$2 bigint` (the page size).

use sync_core::{Dimension, PersonRole};

/// Column alias carrying the effective modification time.
pub const EFFECTIVE_AT: &str = "effective_at";

/// Prebuilt change queries for one schema.
#[derive(Debug, Clone)]
pub struct ChangeQueries {
    film: String,
    person: String,
    genre: String,
}

impl ChangeQueries {
    pub fn new(schema: &str) -> Self {
        Self {
            film: build(schema, Dimension::Film),
            person: build(schema, Dimension::Person),
            genre: build(schema, Dimension::Genre),
        }
    }

    pub fn for_dimension(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Film => &self.film,
            Dimension::Person => &self.person,
            Dimension::Genre => &self.genre,
        }
    }
}

fn build(schema: &str, dimension: Dimension) -> String {
    let (effective, filter) = match dimension {
        Dimension::Film => ("fw.updated_at".to_string(), "fw.updated_at > $1".to_string()),
        Dimension::Person => (
            "MAX(p.updated_at)".to_string(),
            format!(
                "fw.id IN (SELECT cpfw.film_work_id FROM {schema}.person_film_work cpfw \
                 JOIN {schema}.person cp ON cp.id = cpfw.person_id \
                 WHERE cp.updated_at > $1)"
            ),
        ),
        Dimension::Genre => (
            "MAX(g.updated_at)".to_string(),
            format!(
                "fw.id IN (SELECT cgfw.film_work_id FROM {schema}.genre_film_work cgfw \
                 JOIN {schema}.genre cg ON cg.id = cgfw.genre_id \
                 WHERE cg.updated_at > $1)"
            ),
        ),
    };

    let mut columns = vec![
        "fw.id".to_string(),
        "fw.rating".to_string(),
        "fw.title".to_string(),
        "fw.description".to_string(),
        "ARRAY_AGG(DISTINCT g.name) AS genres".to_string(),
    ];
    for role in PersonRole::ALL {
        columns.push(format!(
            "ARRAY_AGG(DISTINCT p.full_name) FILTER (WHERE pfw.role = '{role}') AS {role}s_names"
        ));
    }
    for role in PersonRole::ALL {
        columns.push(format!(
            "JSONB_AGG(DISTINCT jsonb_build_object('id', p.id, 'name', p.full_name)) \
             FILTER (WHERE pfw.role = '{role}') AS {role}s"
        ));
    }
    columns.push(format!("{effective} AS {EFFECTIVE_AT}"));

    format!(
        "SELECT {columns} \
         FROM {schema}.film_work fw \
         LEFT JOIN {schema}.person_film_work pfw ON pfw.film_work_id = fw.id \
         LEFT JOIN {schema}.person p ON p.id = pfw.person_id \
         LEFT JOIN {schema}.genre_film_work gfw ON gfw.film_work_id = fw.id \
         LEFT JOIN {schema}.genre g ON g.id = gfw.genre_id \
         WHERE {filter} \
         GROUP BY fw.id \
         ORDER BY {EFFECTIVE_AT}, fw.id \
         LIMIT $2",
        columns = columns.join(", "),
    )
}
