use crate::domain::niche::ScoredNiche;
use crate::storage::NicheStore;
use std::collections::BTreeMap;

/// In-process store with the same transaction semantics as the Postgres one. Used for dry runs
/// and for exercising rollback.
#[derive(Debug, Default)]
pub struct MemoryNicheStore {
    rows: tokio::sync::Mutex<BTreeMap<String, ScoredNiche>>,
    fail_on: Option<String>,
}

impl MemoryNicheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every batch that contains `name` fail when that row is written.
    pub fn failing_on(name: impl Into<String>) -> Self {
        Self {
            rows: Default::default(),
            fail_on: Some(name.into()),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    pub async fn names(&self) -> Vec<String> {
        self.rows.lock().await.keys().cloned().collect()
    }
}

#[async_trait::async_trait]
impl NicheStore for MemoryNicheStore {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn save_niches(&self, niches: &[ScoredNiche]) -> anyhow::Result<usize> {
        let mut rows = self.rows.lock().await;
        let mut staged = rows.clone();

        for (idx, scored) in niches.iter().enumerate() {
            if self.fail_on.as_deref() == Some(scored.niche.name.as_str()) {
                anyhow::bail!(
                    "write failed for niche {} (row {idx}); batch rolled back",
                    scored.niche.name
                );
            }
            staged.insert(scored.niche.name.clone(), scored.clone());
        }

        *rows = staged;
        Ok(niches.len())
    }

    async fn load_niche(&self, name: &str) -> anyhow::Result<Option<ScoredNiche>> {
        Ok(self.rows.lock().await.get(name).cloned())
    }
}
