//! Partition and entry operations on the SQLite backend.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::hash::CacheKey;
use super::store::CacheStorage;
use crate::{Error, Response};

/// A stored entry with its bookkeeping columns.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoredEntry {
    pub partition: String,
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    #[serde(skip)]
    pub body: Vec<u8>,
    pub body_bytes: usize,
    pub stored_at: String,
}

impl StoredEntry {
    pub fn into_response(self) -> Response {
        Response { status: self.status, headers: self.headers, body: Bytes::from(self.body) }
    }
}

/// Size summary of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionStats {
    pub name: String,
    pub entries: u64,
    pub total_bytes: u64,
    pub created_at: String,
}

fn upsert_entry(
    conn: &rusqlite::Connection, partition: &str, key: &CacheKey, response: &Response, now: &str,
) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)?;
    conn.execute(
        "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
        params![partition, now],
    )?;
    conn.execute(
        "INSERT INTO entries (partition, key_hash, method, url, status, headers_json, body, stored_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(partition, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            partition,
            &key.hash,
            &key.method,
            &key.url,
            response.status as i64,
            headers_json,
            response.body.as_ref(),
            now,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Get a stored entry with its metadata.
    ///
    /// Returns None if the partition or key doesn't exist.
    pub async fn get_entry(&self, partition: &str, key: &CacheKey) -> Result<Option<StoredEntry>, Error> {
        let partition = partition.to_string();
        let hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Option<StoredEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT partition, key_hash, method, url, status, headers_json, body, stored_at
                    FROM entries WHERE partition = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![partition, hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Vec<u8>>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                });

                let (partition, key_hash, method, url, status, headers_json, body, stored_at) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let status = u16::try_from(status).map_err(|e| Error::CorruptEntry(e.to_string()))?;
                let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;

                Ok(Some(StoredEntry {
                    partition,
                    key_hash,
                    method,
                    url,
                    status,
                    headers,
                    body_bytes: body.len(),
                    body,
                    stored_at,
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// Entry count and byte size of every partition.
    pub async fn partition_stats(&self) -> Result<Vec<PartitionStats>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionStats>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, COUNT(e.key_hash), COALESCE(SUM(LENGTH(e.body)), 0), p.created_at
                    FROM partitions p LEFT JOIN entries e ON e.partition = p.name
                    GROUP BY p.name ORDER BY p.name",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok(PartitionStats {
                        name: row.get(0)?,
                        entries: row.get::<_, i64>(1)? as u64,
                        total_bytes: row.get::<_, i64>(2)? as u64,
                        created_at: row.get(3)?,
                    })
                })?;

                let mut stats = Vec::new();
                for row in rows {
                    stats.push(row?);
                }
                Ok(stats)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn get(&self, partition: &str, key: &CacheKey) -> Result<Option<Response>, Error> {
        Ok(self.get_entry(partition, key).await?.map(StoredEntry::into_response))
    }

    async fn put(&self, partition: &str, key: &CacheKey, response: &Response) -> Result<(), Error> {
        let partition = partition.to_string();
        let key = key.clone();
        let response = response.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> { upsert_entry(conn, &partition, &key, &response, &now) })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, partition: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error> {
        let partition = partition.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![&partition, &now],
                )?;
                for (key, response) in &entries {
                    upsert_entry(&tx, &partition, key, response, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY name")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
