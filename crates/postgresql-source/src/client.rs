//! PostgreSQL client utilities

use std::error::Error as _;

use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls};
use tracing::error;

/// Open a connection and make sure it answers a trivial query.
pub async fn connect(connection_string: &str) -> Result<Client, tokio_postgres::Error> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

    // Spawn connection handler
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("PostgreSQL connection error: {e}");
        }
    });

    client.simple_query("SELECT 1").await?;
    Ok(client)
}

/// Whether `error` means the server could not be reached or went away.
///
/// Socket failures and closed connections qualify, as do server errors of
/// SQLSTATE class 08 and the shutdown/startup codes. Authentication
/// failures, bad SQL and row decoding errors do not.
pub fn is_connection_error(error: &tokio_postgres::Error) -> bool {
    if let Some(db) = error.as_db_error() {
        let code = db.code();
        return code.code().starts_with("08")
            || *code == SqlState::ADMIN_SHUTDOWN
            || *code == SqlState::CRASH_SHUTDOWN
            || *code == SqlState::CANNOT_CONNECT_NOW;
    }

    if error.is_closed() {
        return true;
    }

    let mut source = error.source();
    while let Some(cause) = source {
        if cause.is::<std::io::Error>() {
            return true;
        }
        source = cause.source();
    }
    false
}
