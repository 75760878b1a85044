use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlDatabaseError;
use sqlx::{FromRow, MySql, MySqlPool, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::engine::error::EngineError;
use crate::ledger::locks::{KeyedLocks, ScopeGuard};
use crate::ledger::{Ledger, LedgerQuery, LedgerTx, LockScope};
use crate::model::leave_request::LeaveRequest;
use crate::model::request::{Decision, Request, RequestStatus};
use crate::model::wfh_request::{WfhRequest, WorkReport};

// MySQL error numbers that mean "lost a race, try again"
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
const ER_LOCK_DEADLOCK: u16 = 1213;

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, requested_at, start_date, end_date,
    CAST(category AS CHAR) AS category, leave_days, reason,
    CAST(status AS CHAR) AS status, approver_id, decided_at, approver_note
"#;

const WFH_COLUMNS: &str = r#"
    id, employee_id, requested_at, wfh_date,
    CAST(status AS CHAR) AS status, approver_id, decided_at, approver_note,
    work_report, work_report_submitted_at
"#;

impl From<sqlx::Error> for EngineError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if let Some(mysql) = db_err.try_downcast_ref::<MySqlDatabaseError>() {
                if matches!(mysql.number(), ER_LOCK_WAIT_TIMEOUT | ER_LOCK_DEADLOCK) {
                    tracing::warn!(error = %e, "ledger transaction lost a lock race");
                    return EngineError::ConcurrentModification;
                }
            }
        }
        tracing::error!(error = %e, "ledger query failed");
        EngineError::Storage(e.to_string())
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: String,
    employee_id: u64,
    requested_at: DateTime<Utc>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    category: String,
    leave_days: u32,
    reason: Option<String>,
    status: String,
    approver_id: Option<u64>,
    decided_at: Option<DateTime<Utc>>,
    approver_note: Option<String>,
}

#[derive(FromRow)]
struct WfhRow {
    id: String,
    employee_id: u64,
    requested_at: DateTime<Utc>,
    wfh_date: NaiveDate,
    status: String,
    approver_id: Option<u64>,
    decided_at: Option<DateTime<Utc>>,
    approver_note: Option<String>,
    work_report: Option<String>,
    work_report_submitted_at: Option<DateTime<Utc>>,
}

fn corrupt(column: &str, value: &str) -> EngineError {
    EngineError::Storage(format!("unreadable {} value {:?} in ledger", column, value))
}

fn decision(
    approver_id: Option<u64>,
    decided_at: Option<DateTime<Utc>>,
    note: Option<String>,
) -> Option<Decision> {
    match (approver_id, decided_at) {
        (Some(approver_id), Some(decided_at)) => Some(Decision {
            approver_id,
            decided_at,
            note,
        }),
        _ => None,
    }
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = EngineError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        Ok(LeaveRequest {
            id: row.id.parse().map_err(|_| corrupt("id", &row.id))?,
            employee_id: row.employee_id,
            requested_at: row.requested_at,
            start_date: row.start_date,
            end_date: row.end_date,
            category: row.category.parse().map_err(|_| corrupt("category", &row.category))?,
            leave_days: row.leave_days,
            reason: row.reason,
            status: row.status.parse().map_err(|_| corrupt("status", &row.status))?,
            decision: decision(row.approver_id, row.decided_at, row.approver_note),
        })
    }
}

impl TryFrom<WfhRow> for WfhRequest {
    type Error = EngineError;

    fn try_from(row: WfhRow) -> Result<Self, Self::Error> {
        let work_report = match (row.work_report, row.work_report_submitted_at) {
            (Some(text), Some(submitted_at)) => Some(WorkReport { text, submitted_at }),
            _ => None,
        };
        Ok(WfhRequest {
            id: row.id.parse().map_err(|_| corrupt("id", &row.id))?,
            employee_id: row.employee_id,
            requested_at: row.requested_at,
            wfh_date: row.wfh_date,
            status: row.status.parse().map_err(|_| corrupt("status", &row.status))?,
            decision: decision(row.approver_id, row.decided_at, row.approver_note),
            work_report,
        })
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

fn status_clause(query: &LedgerQuery, where_sql: &mut String, args: &mut Vec<FilterValue>) {
    if query.statuses.is_empty() {
        return;
    }
    let placeholders = vec!["?"; query.statuses.len()].join(", ");
    where_sql.push_str(&format!(" AND status IN ({})", placeholders));
    args.extend(query.statuses.iter().map(|s| FilterValue::Str(s.to_string())));
}

fn leave_filter(query: &LedgerQuery) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(employee_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }
    status_clause(query, &mut where_sql, &mut args);
    if let Some(window) = query.window {
        where_sql.push_str(" AND start_date <= ? AND end_date >= ?");
        args.push(FilterValue::Date(window.end()));
        args.push(FilterValue::Date(window.start()));
    }
    if let Some(category) = query.category {
        where_sql.push_str(" AND category = ?");
        args.push(FilterValue::Str(category.to_string()));
    }
    (where_sql, args)
}

fn wfh_filter(query: &LedgerQuery) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(employee_id) = query.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }
    status_clause(query, &mut where_sql, &mut args);
    if let Some(window) = query.window {
        where_sql.push_str(" AND wfh_date BETWEEN ? AND ?");
        args.push(FilterValue::Date(window.start()));
        args.push(FilterValue::Date(window.end()));
    }
    (where_sql, args)
}

fn locking(for_update: bool) -> &'static str {
    if for_update { " FOR UPDATE" } else { "" }
}

async fn fetch_leave<'e, E>(executor: E, query: &LedgerQuery, for_update: bool) -> Result<Vec<LeaveRequest>, EngineError>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let (where_sql, args) = leave_filter(query);
    let sql = format!(
        "SELECT {} FROM leave_requests{} ORDER BY start_date, requested_at{}",
        LEAVE_COLUMNS,
        where_sql,
        locking(for_update)
    );

    let mut data_q = sqlx::query_as::<_, LeaveRow>(&sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let rows = data_q.fetch_all(executor).await?;
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

async fn fetch_wfh<'e, E>(executor: E, query: &LedgerQuery, for_update: bool) -> Result<Vec<WfhRequest>, EngineError>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let (where_sql, args) = wfh_filter(query);
    let sql = format!(
        "SELECT {} FROM wfh_requests{} ORDER BY wfh_date, requested_at{}",
        WFH_COLUMNS,
        where_sql,
        locking(for_update)
    );

    let mut data_q = sqlx::query_as::<_, WfhRow>(&sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
            FilterValue::Date(d) => data_q.bind(d),
        };
    }

    let rows = data_q.fetch_all(executor).await?;
    rows.into_iter().map(WfhRequest::try_from).collect()
}

/// MySQL-backed ledger (see `db/schema.sql`).
///
/// Transactions hold the in-process keyed locks and read with `FOR UPDATE`, so a
/// competing writer in another process blocks on the same rows/gaps or loses
/// with a deadlock, which surfaces as `ConcurrentModification`.
pub struct MySqlLedger {
    pool: MySqlPool,
    locks: KeyedLocks,
}

impl MySqlLedger {
    pub fn new(pool: MySqlPool, lock_timeout: Duration) -> Self {
        Self {
            pool,
            locks: KeyedLocks::new(lock_timeout),
        }
    }
}

#[async_trait]
impl Ledger for MySqlLedger {
    async fn begin(&self, scope: LockScope) -> Result<Box<dyn LedgerTx>, EngineError> {
        let guard = self.locks.acquire(&scope).await?;
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlTx { tx, _guard: guard }))
    }

    async fn leave_requests(&self, query: &LedgerQuery) -> Result<Vec<LeaveRequest>, EngineError> {
        fetch_leave(&self.pool, query, false).await
    }

    async fn wfh_requests(&self, query: &LedgerQuery) -> Result<Vec<WfhRequest>, EngineError> {
        fetch_wfh(&self.pool, query, false).await
    }

    async fn find(&self, id: Uuid) -> Result<Option<Request>, EngineError> {
        let mut conn = self.pool.acquire().await?;
        find_by_id(&mut conn, id, false).await
    }
}

async fn find_by_id(
    conn: &mut sqlx::MySqlConnection,
    id: Uuid,
    for_update: bool,
) -> Result<Option<Request>, EngineError> {
    let sql = format!("SELECT {} FROM leave_requests WHERE id = ?{}", LEAVE_COLUMNS, locking(for_update));
    let leave = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(row) = leave {
        return Ok(Some(Request::Leave(row.try_into()?)));
    }

    let sql = format!("SELECT {} FROM wfh_requests WHERE id = ?{}", WFH_COLUMNS, locking(for_update));
    let wfh = sqlx::query_as::<_, WfhRow>(&sql)
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;
    match wfh {
        Some(row) => Ok(Some(Request::Wfh(row.try_into()?))),
        None => Ok(None),
    }
}

struct MySqlTx {
    tx: Transaction<'static, MySql>,
    _guard: ScopeGuard,
}

#[async_trait]
impl LedgerTx for MySqlTx {
    async fn leave_requests(&mut self, query: &LedgerQuery) -> Result<Vec<LeaveRequest>, EngineError> {
        fetch_leave(&mut *self.tx, query, true).await
    }

    async fn wfh_requests(&mut self, query: &LedgerQuery) -> Result<Vec<WfhRequest>, EngineError> {
        fetch_wfh(&mut *self.tx, query, true).await
    }

    async fn find(&mut self, id: Uuid) -> Result<Option<Request>, EngineError> {
        find_by_id(&mut self.tx, id, true).await
    }

    async fn insert_leave(&mut self, request: &LeaveRequest) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO leave_requests
                (id, employee_id, requested_at, start_date, end_date, category, leave_days, reason, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.id.to_string())
        .bind(request.employee_id)
        .bind(request.requested_at)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.category.to_string())
        .bind(request.leave_days)
        .bind(request.reason.as_deref())
        .bind(request.status.to_string())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_wfh(&mut self, request: &WfhRequest) -> Result<(), EngineError> {
        sqlx::query(
            r#"
            INSERT INTO wfh_requests (id, employee_id, requested_at, wfh_date, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.id.to_string())
        .bind(request.employee_id)
        .bind(request.requested_at)
        .bind(request.wfh_date)
        .bind(request.status.to_string())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn decide(&mut self, id: Uuid, status: RequestStatus, decision: &Decision) -> Result<bool, EngineError> {
        for table in ["leave_requests", "wfh_requests"] {
            let sql = format!(
                r#"
                UPDATE {}
                SET status = ?, approver_id = ?, decided_at = ?, approver_note = ?
                WHERE id = ?
                AND status = 'pending'
                "#,
                table
            );
            let result = sqlx::query(&sql)
                .bind(status.to_string())
                .bind(decision.approver_id)
                .bind(decision.decided_at)
                .bind(decision.note.as_deref())
                .bind(id.to_string())
                .execute(&mut *self.tx)
                .await?;
            if result.rows_affected() > 0 {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn attach_work_report(&mut self, id: Uuid, report: &WorkReport) -> Result<bool, EngineError> {
        let result = sqlx::query(
            r#"
            UPDATE wfh_requests
            SET work_report = ?, work_report_submitted_at = ?
            WHERE id = ?
            AND status = 'approved'
            AND work_report IS NULL
            "#,
        )
        .bind(&report.text)
        .bind(report.submitted_at)
        .bind(id.to_string())
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), EngineError> {
        let this = *self;
        this.tx.commit().await?;
        Ok(())
    }
}
