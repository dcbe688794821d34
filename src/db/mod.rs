pub mod models;
pub mod schema;


use std::sync::{Mutex, MutexGuard};

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::info;

use crate::error::{Error, Result};
use crate::store::BucketStore;
use models::*;
use schema::buckets::dsl::{self as b_dsl};


const CREATE_BUCKETS: &'static str = "CREATE TABLE IF NOT EXISTS buckets (
    key TEXT PRIMARY KEY NOT NULL,
    body TEXT NOT NULL
)";


/// Bucket store kept in an embedded SQLite database, one row per bucket.
pub struct SqliteStore {
    conn: Mutex<SqliteConnection>,
}

impl SqliteStore {
    pub fn open(database_url: &str) -> Result<Self> {
        let mut conn = SqliteConnection::establish(database_url)?;
        diesel::sql_query(CREATE_BUCKETS).execute(&mut conn)?;

        info!("Bucket store opened at {}", database_url);

        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, SqliteConnection>> {
        self.conn.lock()
            .map_err(|_| Error::Storage("connection poisoned".into()))
    }

    pub fn bucket_keys(&self) -> Result<Vec<String>> {
        let mut conn = self.conn()?;
        let rows = b_dsl::buckets
            .select(BucketRow::as_select())
            .load(&mut *conn)?;

        Ok(rows.into_iter().map(|row| row.key).collect())
    }
}

impl BucketStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn()?;
        let row = b_dsl::buckets
            .find(key)
            .select(BucketRow::as_select())
            .first(&mut *conn)
            .optional()?;

        Ok(row.map(|row| row.body))
    }

    fn set(&self, key: &str, body: &str) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::replace_into(b_dsl::buckets)
            .values(&NewBucketRow { key, body })
            .execute(&mut *conn)?;

        Ok(())
    }
}
