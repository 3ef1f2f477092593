pub mod memory;
pub mod niches;

use crate::domain::niche::ScoredNiche;
use anyhow::Context;

pub use memory::MemoryNicheStore;
pub use niches::PgNicheStore;

/// Persistence for scored niches, keyed by niche name.
///
/// `save_niches` is all-or-nothing: if any row fails, none of the batch is visible afterwards.
/// Related keywords and competitors are replaced on every save, not merged.
#[async_trait::async_trait]
pub trait NicheStore: Send + Sync {
    fn store_name(&self) -> &'static str;

    async fn save_niches(&self, niches: &[ScoredNiche]) -> anyhow::Result<usize>;

    async fn load_niche(&self, name: &str) -> anyhow::Result<Option<ScoredNiche>>;
}

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
