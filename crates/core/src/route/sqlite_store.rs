//! SQLite-backed route store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use super::{
    NewRoute, RiskBucket, RiskLevel, RiskSummary, Route, RouteError, RouteFilter, RoutePoint,
    RouteStatus, RouteStore,
};

const SELECT_COLUMNS: &str = "id, route_name, from_code, to_code, customer_name, location, \
     route_points, total_distance_km, status, risk, processing_errors, created_at, updated_at, \
     processing_started_at, processing_completed_at";

/// SQLite-backed route store.
pub struct SqliteRouteStore {
    conn: Mutex<Connection>,
}

impl SqliteRouteStore {
    /// Create a new SQLite route store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, RouteError> {
        let conn = Connection::open(path).map_err(|e| RouteError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing database without creating it.
    ///
    /// Fails with [`RouteError::Unreachable`] when the file is missing or does
    /// not answer a trivial query.
    pub fn open_existing(path: &Path) -> Result<Self, RouteError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| RouteError::Unreachable(format!("{}: {}", path.display(), e)))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| RouteError::Unreachable(format!("{}: {}", path.display(), e)))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite route store (useful for testing).
    pub fn in_memory() -> Result<Self, RouteError> {
        let conn = Connection::open_in_memory().map_err(|e| RouteError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RouteError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS routes (
                id TEXT PRIMARY KEY,
                route_name TEXT NOT NULL,
                from_code TEXT NOT NULL,
                to_code TEXT NOT NULL,
                customer_name TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT '',
                route_points TEXT NOT NULL DEFAULT '[]',
                total_distance_km REAL NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                risk TEXT,
                risk_level TEXT,
                processing_errors TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                processing_started_at TEXT,
                processing_completed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_routes_status ON routes(status);
            CREATE INDEX IF NOT EXISTS idx_routes_codes ON routes(from_code, to_code);
            CREATE INDEX IF NOT EXISTS idx_routes_created_at ON routes(created_at);
            "#,
        )
        .map_err(|e| RouteError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, RouteError> {
        self.conn
            .lock()
            .map_err(|_| RouteError::Database("connection lock poisoned".to_string()))
    }

    fn timestamp(dt: DateTime<Utc>) -> String {
        // Fixed precision keeps lexical order equal to chronological order.
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn build_where_clause(filter: &RouteFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if filter.statuses.is_empty() {
            return (String::new(), params);
        }

        let placeholders = vec!["?"; filter.statuses.len()].join(", ");
        for status in &filter.statuses {
            params.push(Box::new(status.as_str().to_string()));
        }

        (format!("WHERE status IN ({})", placeholders), params)
    }

    fn row_to_route(row: &rusqlite::Row) -> rusqlite::Result<Route> {
        let route_points_json: String = row.get(6)?;
        let status_str: String = row.get(8)?;
        let risk_json: Option<String> = row.get(9)?;
        let errors_json: String = row.get(10)?;
        let created_at: String = row.get(11)?;
        let updated_at: String = row.get(12)?;
        let started_at: Option<String> = row.get(13)?;
        let completed_at: Option<String> = row.get(14)?;

        let route_points: Vec<RoutePoint> =
            serde_json::from_str(&route_points_json).unwrap_or_default();
        let risk: Option<RiskSummary> = risk_json.and_then(|json| serde_json::from_str(&json).ok());
        let processing_errors: Vec<String> =
            serde_json::from_str(&errors_json).unwrap_or_default();

        Ok(Route {
            id: row.get(0)?,
            route_name: row.get(1)?,
            from_code: row.get(2)?,
            to_code: row.get(3)?,
            customer_name: row.get(4)?,
            location: row.get(5)?,
            route_points,
            total_distance_km: row.get(7)?,
            status: RouteStatus::parse(&status_str).unwrap_or(RouteStatus::Pending),
            risk,
            processing_errors,
            created_at: Self::parse_timestamp(&created_at),
            updated_at: Self::parse_timestamp(&updated_at),
            processing_started_at: started_at.as_deref().map(Self::parse_timestamp),
            processing_completed_at: completed_at.as_deref().map(Self::parse_timestamp),
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Route>, RouteError> {
        conn.query_row(
            &format!("SELECT {} FROM routes WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_route,
        )
        .optional()
        .map_err(|e| RouteError::Database(e.to_string()))
    }

    fn fetch_existing(conn: &Connection, id: &str) -> Result<Route, RouteError> {
        Self::fetch(conn, id)?.ok_or_else(|| RouteError::NotFound(id.to_string()))
    }
}

impl RouteStore for SqliteRouteStore {
    fn create(&self, request: NewRoute) -> Result<Route, RouteError> {
        let conn = self.lock()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let route_name = request.display_name();
        let route_points_json = serde_json::to_string(&request.route_points)
            .map_err(|e| RouteError::Database(e.to_string()))?;

        conn.execute(
            "INSERT INTO routes (id, route_name, from_code, to_code, customer_name, location, route_points, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                route_name,
                request.from_code,
                request.to_code,
                request.customer_name,
                request.location,
                route_points_json,
                RouteStatus::Pending.as_str(),
                Self::timestamp(now),
                Self::timestamp(now),
            ],
        )
        .map_err(|e| RouteError::Database(e.to_string()))?;

        Ok(Route {
            id,
            route_name,
            from_code: request.from_code,
            to_code: request.to_code,
            customer_name: request.customer_name,
            location: request.location,
            route_points: request.route_points,
            total_distance_km: 0.0,
            status: RouteStatus::Pending,
            risk: None,
            processing_errors: Vec::new(),
            created_at: now,
            updated_at: now,
            processing_started_at: None,
            processing_completed_at: None,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Route>, RouteError> {
        let conn = self.lock()?;
        Self::fetch(&conn, id)
    }

    fn find_by_codes(&self, from_code: &str, to_code: &str) -> Result<Option<Route>, RouteError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM routes WHERE from_code = ? AND to_code = ? ORDER BY created_at DESC LIMIT 1",
                SELECT_COLUMNS
            ),
            params![from_code, to_code],
            Self::row_to_route,
        )
        .optional()
        .map_err(|e| RouteError::Database(e.to_string()))
    }

    fn list(&self, filter: &RouteFilter) -> Result<Vec<Route>, RouteError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!(
            "SELECT {} FROM routes {} ORDER BY created_at DESC, id ASC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| RouteError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_route)
            .map_err(|e| RouteError::Database(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| RouteError::Database(e.to_string()))
    }

    fn count(&self, filter: &RouteFilter) -> Result<i64, RouteError> {
        let conn = self.lock()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM routes {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| RouteError::Database(e.to_string()))
    }

    fn update_status(
        &self,
        id: &str,
        status: RouteStatus,
        error: Option<String>,
    ) -> Result<Route, RouteError> {
        let conn = self.lock()?;
        let mut route = Self::fetch_existing(&conn, id)?;

        if !route.status.can_transition_to(status) {
            return Err(RouteError::InvalidTransition {
                route_id: id.to_string(),
                from: route.status,
                to: status,
            });
        }

        let now = Utc::now();
        match status {
            RouteStatus::Processing => {
                route.processing_started_at = Some(now);
                route.processing_completed_at = None;
            }
            RouteStatus::Completed => route.processing_completed_at = Some(now),
            RouteStatus::Failed => {
                if let Some(message) = error {
                    route.processing_errors.push(message);
                }
            }
            RouteStatus::Pending => {}
        }
        route.status = status;
        route.updated_at = now;

        let errors_json = serde_json::to_string(&route.processing_errors)
            .map_err(|e| RouteError::Database(e.to_string()))?;

        conn.execute(
            "UPDATE routes SET status = ?, processing_errors = ?, updated_at = ?, processing_started_at = ?, processing_completed_at = ? WHERE id = ?",
            params![
                status.as_str(),
                errors_json,
                Self::timestamp(now),
                route.processing_started_at.map(Self::timestamp),
                route.processing_completed_at.map(Self::timestamp),
                id,
            ],
        )
        .map_err(|e| RouteError::Database(e.to_string()))?;

        Ok(route)
    }

    fn reset(&self, id: &str) -> Result<Route, RouteError> {
        let conn = self.lock()?;
        let route = Self::fetch_existing(&conn, id)?;

        match route.status {
            RouteStatus::Pending => return Ok(route),
            RouteStatus::Processing => {
                return Err(RouteError::InvalidTransition {
                    route_id: id.to_string(),
                    from: route.status,
                    to: RouteStatus::Pending,
                })
            }
            RouteStatus::Completed | RouteStatus::Failed => {}
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE routes SET status = ?, risk = NULL, risk_level = NULL, processing_errors = '[]', processing_started_at = NULL, processing_completed_at = NULL, updated_at = ? WHERE id = ?",
            params![RouteStatus::Pending.as_str(), Self::timestamp(now), id],
        )
        .map_err(|e| RouteError::Database(e.to_string()))?;

        Ok(Route {
            status: RouteStatus::Pending,
            risk: None,
            processing_errors: Vec::new(),
            processing_started_at: None,
            processing_completed_at: None,
            updated_at: now,
            ..route
        })
    }

    fn record_risk(
        &self,
        id: &str,
        risk: RiskSummary,
        total_distance_km: f64,
    ) -> Result<Route, RouteError> {
        let conn = self.lock()?;
        let route = Self::fetch_existing(&conn, id)?;

        let now = Utc::now();
        let risk_json =
            serde_json::to_string(&risk).map_err(|e| RouteError::Database(e.to_string()))?;

        conn.execute(
            "UPDATE routes SET risk = ?, risk_level = ?, total_distance_km = ?, updated_at = ? WHERE id = ?",
            params![
                risk_json,
                risk.risk_level.as_str(),
                total_distance_km,
                Self::timestamp(now),
                id
            ],
        )
        .map_err(|e| RouteError::Database(e.to_string()))?;

        Ok(Route {
            risk: Some(risk),
            total_distance_km,
            updated_at: now,
            ..route
        })
    }

    fn risk_distribution(&self) -> Result<Vec<RiskBucket>, RouteError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT risk_level, COUNT(*) FROM routes WHERE status = ? AND risk_level IS NOT NULL GROUP BY risk_level ORDER BY risk_level",
            )
            .map_err(|e| RouteError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![RouteStatus::Completed.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| RouteError::Database(e.to_string()))?;

        let mut buckets = Vec::new();
        for row in rows {
            let (level, count) = row.map_err(|e| RouteError::Database(e.to_string()))?;
            if let Some(risk_level) = RiskLevel::parse(&level) {
                buckets.push(RiskBucket {
                    risk_level,
                    count: count.max(0) as u64,
                });
            }
        }

        Ok(buckets)
    }

    fn ping(&self) -> Result<(), RouteError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|e| RouteError::Unreachable(e.to_string()))
    }
}
