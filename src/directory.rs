//! Read-only lookup into the HR employee master data.

use anyhow::Context;
use async_trait::async_trait;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::engine::error::EngineError;
use crate::model::employee::EmployeeProfile;
use crate::model::request::EmployeeId;

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<EmployeeProfile>, EngineError>;
}

/// `employees` joined to `job_titles`, with a TTL cache in front.
pub struct MySqlDirectory {
    pool: MySqlPool,
    cache: Cache<EmployeeId, EmployeeProfile>,
}

impl MySqlDirectory {
    pub fn new(pool: MySqlPool, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(50_000)
            .time_to_live(ttl)
            .build();
        Self { pool, cache }
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlDirectory {
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<EmployeeProfile>, EngineError> {
        if let Some(profile) = self.cache.get(&id).await {
            return Ok(Some(profile));
        }

        let profile = sqlx::query_as::<_, EmployeeProfile>(
            r#"
            SELECT
                e.id,
                CONCAT(e.first_name, ' ', e.last_name) AS full_name,
                COALESCE(jt.title, '') AS position,
                e.hire_date
            FROM employees e
            LEFT JOIN job_titles jt ON jt.id = e.job_title_id
            WHERE e.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        // misses are not cached; a new hire must be visible right away
        if let Some(profile) = &profile {
            self.cache.insert(id, profile.clone()).await;
        }
        Ok(profile)
    }
}

/// Fixed set of profiles, for the in-memory backend and tests.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    profiles: HashMap<EmployeeId, EmployeeProfile>,
}

impl StaticDirectory {
    pub fn new(profiles: impl IntoIterator<Item = EmployeeProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    /// Loads a JSON array of profiles.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading employee seed file {}", path.display()))?;
        let profiles: Vec<EmployeeProfile> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing employee seed file {}", path.display()))?;
        tracing::info!(count = profiles.len(), "loaded employee seed file");
        Ok(Self::new(profiles))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }
}

#[async_trait]
impl EmployeeDirectory for StaticDirectory {
    async fn get_employee(&self, id: EmployeeId) -> Result<Option<EmployeeProfile>, EngineError> {
        Ok(self.profiles.get(&id).cloned())
    }
}
