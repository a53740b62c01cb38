use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

use super::data::{CustomerType, DraftRecord, LocationRecord, RecordId};
use crate::assets::AssetPath;
use crate::error::{Error, StorageError};
use crate::geo::Coordinate;

/// How long a writer waits for another process holding the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_COLUMNS: &str =
    "SELECT id, name, phone, type, address, lat, lon, notes, image_path, created_at FROM locations";

/// The LocationRepository owns the SQLite customer location log.
/// Records are append-only: there is no update or delete path.
pub struct LocationRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl LocationRepository {
    /// Open (or create) the database at `db_path` and initialize the schema.
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        info!("Database opened at: {}", db_path.display());

        let repository = LocationRepository {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
        };
        repository.init()?;

        Ok(repository)
    }

    /// Create the locations table if it doesn't exist.
    /// Safe to call on every startup.
    pub fn init(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS locations (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                phone       TEXT NOT NULL,
                type        TEXT NOT NULL,
                address     TEXT,
                lat         REAL NOT NULL CHECK (lat BETWEEN -90.0 AND 90.0),
                lon         REAL NOT NULL CHECK (lon BETWEEN -180.0 AND 180.0),
                notes       TEXT,
                image_path  TEXT,
                created_at  INTEGER NOT NULL
            )",
            [],
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Get a count of stored records
    pub fn count(&self) -> Result<i64, StorageError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Validate and store a new record, returning its freshly assigned id.
    ///
    /// The row is written inside an immediate transaction: either every
    /// column is committed and a new id comes back, or nothing is stored.
    pub fn insert(&self, draft: &DraftRecord) -> Result<RecordId, Error> {
        draft.validate()?;

        let now = Utc::now().timestamp();

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO locations
             (name, phone, type, address, lat, lon, notes, image_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                draft.name,
                draft.phone,
                draft.customer_type.as_str(),
                draft.address.as_deref(),
                draft.coordinate.lat,
                draft.coordinate.lon,
                draft.notes.as_deref(),
                draft.image_path.as_ref().map(AssetPath::as_str),
                now,
            ],
        )?;
        let id = RecordId(tx.last_insert_rowid());
        tx.commit()?;

        info!("Stored customer location {} ({})", id, draft.customer_type);
        Ok(id)
    }

    /// Get every record, ordered by ascending id.
    /// This is a full scan, O(n) per call.
    pub fn load_all(&self) -> Result<Vec<LocationRecord>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY id ASC"))?;

        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Loaded {} customer locations", records.len());
        Ok(records)
    }

    /// Every asset path referenced by at least one record
    pub fn referenced_assets(&self) -> Result<HashSet<AssetPath>, StorageError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT image_path FROM locations WHERE image_path IS NOT NULL")?;

        let paths = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .map(|r| r.map(AssetPath::from))
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(paths)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

/// Build a typed record from a row selected with `SELECT_COLUMNS`
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<LocationRecord> {
    let created_secs: i64 = row.get(9)?;
    let created_at = DateTime::<Utc>::from_timestamp(created_secs, 0)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(9, created_secs))?;
    let customer_type: String = row.get(3)?;
    let image_path: Option<String> = row.get(8)?;

    Ok(LocationRecord {
        id: RecordId(row.get(0)?),
        name: row.get(1)?,
        phone: row.get(2)?,
        customer_type: CustomerType::from_stored(&customer_type),
        address: row.get(4)?,
        coordinate: Coordinate {
            lat: row.get(5)?,
            lon: row.get(6)?,
        },
        notes: row.get(7)?,
        image_path: image_path.map(AssetPath::from),
        created_at,
    })
}

// Implement Debug for better error messages
impl std::fmt::Debug for LocationRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationRepository")
            .field("db_path", &self.db_path)
            .finish()
    }
}
