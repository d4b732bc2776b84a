// SQLite snapshot store

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, Row};
use tracing::debug;
use treesync_core::{CanonicalTreeRecord, TreeId};
use treesync_recon::{SnapshotStore, StoreError};

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS trees (
    id TEXT PRIMARY KEY,
    lat TEXT NOT NULL,
    lng TEXT NOT NULL,
    artdtsch TEXT,
    artbot TEXT,
    gattungdeutsch TEXT,
    gattung TEXT,
    strname TEXT,
    kronedurch TEXT,
    stammumfg TEXT,
    baumhoehe TEXT,
    pflanzjahr INTEGER,
    geom TEXT NOT NULL,
    gmlid TEXT NOT NULL,
    source TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS trees_source_gmlid ON trees (source, gmlid);

CREATE TABLE IF NOT EXISTS trees_adopted (
    id INTEGER PRIMARY KEY,
    tree_id TEXT NOT NULL REFERENCES trees (id),
    uuid TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS trees_watered (
    id INTEGER PRIMARY KEY,
    tree_id TEXT NOT NULL REFERENCES trees (id),
    uuid TEXT,
    amount TEXT,
    timestamp TEXT
);
"#;

const SELECT_COLUMNS: &str = "id, gmlid, source, lat, lng, artdtsch, artbot, gattungdeutsch, gattung, \
     strname, kronedurch, stammumfg, baumhoehe, pflanzjahr, geom";

/// The `trees` table plus its dependent tables in a SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(StoreError::backend)?;
        debug!(path = %path.display(), "opened tree database");
        Self::init(conn)
    }

    /// Open an existing database without creating tables or writing to it.
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(StoreError::backend)?;
        debug!(path = %path.display(), "opened tree database read-only");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory().map_err(StoreError::backend)?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(StoreError::backend)?;
        Ok(Self { conn })
    }

    /// Begin a transaction. Mutations through it are discarded unless
    /// [`SqliteTransaction::commit`] is called.
    pub fn transaction(&mut self) -> Result<SqliteTransaction<'_>, StoreError> {
        let tx = self.conn.transaction().map_err(StoreError::backend)?;
        Ok(SqliteTransaction { tx })
    }

    /// Trees of every source except `source`.
    pub fn read_all_except(&self, source: &str) -> Result<Vec<CanonicalTreeRecord>, StoreError> {
        select(&self.conn, "source != ?1", source)
    }

    pub fn count(&self, source: &str) -> Result<usize, StoreError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM trees WHERE source = ?1", params![source], |row| {
                row.get::<_, i64>(0)
            })
            .map(|n| n as usize)
            .map_err(StoreError::backend)
    }
}

impl SnapshotStore for SqliteStore {
    fn read_snapshot(&mut self, source: &str) -> Result<Vec<CanonicalTreeRecord>, StoreError> {
        select(&self.conn, "source = ?1", source)
    }

    fn delete_dependents(&mut self, ids: &[TreeId]) -> Result<(), StoreError> {
        delete_dependents(&self.conn, ids)
    }

    fn delete(&mut self, ids: &[TreeId]) -> Result<(), StoreError> {
        delete(&self.conn, ids)
    }

    fn update(&mut self, records: &[CanonicalTreeRecord]) -> Result<(), StoreError> {
        update(&self.conn, records)
    }

    fn insert(&mut self, records: &[CanonicalTreeRecord]) -> Result<(), StoreError> {
        insert(&self.conn, records)
    }
}

/// An open transaction on a [`SqliteStore`]. Rolls back on drop.
pub struct SqliteTransaction<'a> {
    tx: rusqlite::Transaction<'a>,
}

impl SqliteTransaction<'_> {
    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().map_err(StoreError::backend)
    }
}

impl SnapshotStore for SqliteTransaction<'_> {
    fn read_snapshot(&mut self, source: &str) -> Result<Vec<CanonicalTreeRecord>, StoreError> {
        select(&self.tx, "source = ?1", source)
    }

    fn delete_dependents(&mut self, ids: &[TreeId]) -> Result<(), StoreError> {
        delete_dependents(&self.tx, ids)
    }

    fn delete(&mut self, ids: &[TreeId]) -> Result<(), StoreError> {
        delete(&self.tx, ids)
    }

    fn update(&mut self, records: &[CanonicalTreeRecord]) -> Result<(), StoreError> {
        update(&self.tx, records)
    }

    fn insert(&mut self, records: &[CanonicalTreeRecord]) -> Result<(), StoreError> {
        insert(&self.tx, records)
    }
}

// ---------------------------------------------------------------------------
// Statements shared by the store and its transactions
// ---------------------------------------------------------------------------

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<CanonicalTreeRecord> {
    Ok(CanonicalTreeRecord {
        id: TreeId::from(row.get::<_, String>(0)?),
        natural_key: row.get(1)?,
        source: row.get(2)?,
        lat: row.get(3)?,
        lng: row.get(4)?,
        common_name: row.get(5)?,
        scientific_name: row.get(6)?,
        genus_common: row.get(7)?,
        genus: row.get(8)?,
        street: row.get(9)?,
        crown_diameter: row.get(10)?,
        trunk_girth: row.get(11)?,
        height: row.get(12)?,
        planting_year: row.get(13)?,
        geom: row.get(14)?,
    })
}

fn select(conn: &Connection, filter: &str, source: &str) -> Result<Vec<CanonicalTreeRecord>, StoreError> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM trees WHERE {filter} ORDER BY rowid");
    let mut stmt = conn.prepare(&sql).map_err(StoreError::backend)?;
    let rows = stmt
        .query_map(params![source], row_to_record)
        .map_err(StoreError::backend)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::backend)
}

fn delete_dependents(conn: &Connection, ids: &[TreeId]) -> Result<(), StoreError> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut adopted = conn
        .prepare("DELETE FROM trees_adopted WHERE tree_id = ?1")
        .map_err(StoreError::backend)?;
    let mut watered = conn
        .prepare("DELETE FROM trees_watered WHERE tree_id = ?1")
        .map_err(StoreError::backend)?;
    for id in ids {
        adopted.execute(params![id.as_str()]).map_err(StoreError::backend)?;
        watered.execute(params![id.as_str()]).map_err(StoreError::backend)?;
    }
    Ok(())
}

fn delete(conn: &Connection, ids: &[TreeId]) -> Result<(), StoreError> {
    if ids.is_empty() {
        return Ok(());
    }
    let mut stmt = conn
        .prepare("DELETE FROM trees WHERE id = ?1")
        .map_err(StoreError::backend)?;
    for id in ids {
        stmt.execute(params![id.as_str()]).map_err(StoreError::backend)?;
    }
    Ok(())
}

fn update(conn: &Connection, records: &[CanonicalTreeRecord]) -> Result<(), StoreError> {
    if records.is_empty() {
        return Ok(());
    }
    let mut stmt = conn
        .prepare(
            "UPDATE trees SET lat = ?1, lng = ?2, artdtsch = ?3, artbot = ?4, gattungdeutsch = ?5, \
             gattung = ?6, strname = ?7, kronedurch = ?8, stammumfg = ?9, baumhoehe = ?10, \
             pflanzjahr = ?11, geom = ?12 WHERE gmlid = ?13 AND source = ?14",
        )
        .map_err(StoreError::backend)?;
    for r in records {
        stmt.execute(params![
            r.lat,
            r.lng,
            r.common_name,
            r.scientific_name,
            r.genus_common,
            r.genus,
            r.street,
            r.crown_diameter,
            r.trunk_girth,
            r.height,
            r.planting_year,
            r.geom,
            r.natural_key,
            r.source,
        ])
        .map_err(StoreError::backend)?;
    }
    Ok(())
}

fn insert(conn: &Connection, records: &[CanonicalTreeRecord]) -> Result<(), StoreError> {
    if records.is_empty() {
        return Ok(());
    }
    let mut stmt = conn
        .prepare(&format!(
            "INSERT INTO trees ({SELECT_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ))
        .map_err(StoreError::backend)?;
    for r in records {
        stmt.execute(params![
            r.id.as_str(),
            r.natural_key,
            r.source,
            r.lat,
            r.lng,
            r.common_name,
            r.scientific_name,
            r.genus_common,
            r.genus,
            r.street,
            r.crown_diameter,
            r.trunk_girth,
            r.height,
            r.planting_year,
            r.geom,
        ])
        .map_err(StoreError::backend)?;
    }
    Ok(())
}
