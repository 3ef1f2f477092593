use crate::domain::niche::{CandidateNiche, Competitor, ScoredNiche};
use crate::storage::NicheStore;
use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PgNicheStore {
    pool: sqlx::PgPool,
}

impl PgNicheStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl NicheStore for PgNicheStore {
    fn store_name(&self) -> &'static str {
        "postgres"
    }

    async fn save_niches(&self, niches: &[ScoredNiche]) -> anyhow::Result<usize> {
        if niches.is_empty() {
            return Ok(0);
        }

        // Dropping `tx` without commit rolls the whole batch back.
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;

        for scored in niches {
            let niche_id = upsert_niche(&mut tx, scored).await?;
            replace_keywords(&mut tx, niche_id, &scored.niche.related_keywords).await?;
            replace_competitors(&mut tx, niche_id, &scored.niche.top_competitors).await?;
        }

        tx.commit().await.context("commit transaction failed")?;
        Ok(niches.len())
    }

    async fn load_niche(&self, name: &str) -> anyhow::Result<Option<ScoredNiche>> {
        let row = sqlx::query_as::<_, (Uuid, String, i64, f64, f64, f64, f64, f64)>(
            "SELECT id, name, monthly_search_volume, competition, estimated_cpc, \
                    competition_score, monetization_potential, trending_score \
             FROM niches \
             WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("select niches failed")?;

        let Some((id, name, volume, competition, cpc, competition_score, monetization, trending)) =
            row
        else {
            return Ok(None);
        };

        let related_keywords: Vec<String> = sqlx::query_scalar(
            "SELECT keyword FROM niche_keywords WHERE niche_id = $1 ORDER BY position ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("select niche_keywords failed")?;

        let competitor_rows = sqlx::query_as::<_, (String, f64, i64)>(
            "SELECT domain, authority, traffic FROM niche_competitors \
             WHERE niche_id = $1 ORDER BY position ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .context("select niche_competitors failed")?;

        Ok(Some(ScoredNiche {
            niche: CandidateNiche {
                name,
                monthly_search_volume: volume.max(0) as u64,
                competition,
                estimated_cpc: cpc,
                related_keywords,
                top_competitors: competitor_rows
                    .into_iter()
                    .map(|(domain, authority, traffic)| Competitor {
                        domain,
                        authority,
                        traffic: traffic.max(0) as u64,
                    })
                    .collect(),
            },
            competition_score,
            monetization_potential: monetization,
            trending_score: trending,
        }))
    }
}

async fn upsert_niche(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    scored: &ScoredNiche,
) -> anyhow::Result<Uuid> {
    let niche = &scored.niche;
    let volume = i64::try_from(niche.monthly_search_volume)
        .with_context(|| format!("search volume out of range for niche {}", niche.name))?;

    let niche_id: Uuid = sqlx::query_scalar(
        "INSERT INTO niches (id, name, monthly_search_volume, competition, estimated_cpc, \
                             competition_score, monetization_potential, trending_score, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (name) DO UPDATE \
           SET monthly_search_volume = EXCLUDED.monthly_search_volume, \
               competition = EXCLUDED.competition, \
               estimated_cpc = EXCLUDED.estimated_cpc, \
               competition_score = EXCLUDED.competition_score, \
               monetization_potential = EXCLUDED.monetization_potential, \
               trending_score = EXCLUDED.trending_score, \
               updated_at = EXCLUDED.updated_at \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(&niche.name)
    .bind(volume)
    .bind(niche.competition)
    .bind(niche.estimated_cpc)
    .bind(scored.competition_score)
    .bind(scored.monetization_potential)
    .bind(scored.trending_score)
    .bind(Utc::now())
    .fetch_one(&mut **tx)
    .await
    .with_context(|| format!("upsert niches failed for {}", niche.name))?;

    Ok(niche_id)
}

async fn replace_keywords(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    niche_id: Uuid,
    keywords: &[String],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM niche_keywords WHERE niche_id = $1")
        .bind(niche_id)
        .execute(&mut **tx)
        .await
        .context("delete niche_keywords failed")?;

    if keywords.is_empty() {
        return Ok(());
    }

    let mut qb =
        sqlx::QueryBuilder::new("INSERT INTO niche_keywords (niche_id, position, keyword) ");
    qb.push_values(keywords.iter().enumerate(), |mut b, (position, keyword)| {
        b.push_bind(niche_id)
            .push_bind(position as i32)
            .push_bind(keyword.as_str());
    });
    qb.build()
        .execute(&mut **tx)
        .await
        .context("insert niche_keywords failed")?;

    Ok(())
}

async fn replace_competitors(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    niche_id: Uuid,
    competitors: &[Competitor],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM niche_competitors WHERE niche_id = $1")
        .bind(niche_id)
        .execute(&mut **tx)
        .await
        .context("delete niche_competitors failed")?;

    if competitors.is_empty() {
        return Ok(());
    }

    let mut qb = sqlx::QueryBuilder::new(
        "INSERT INTO niche_competitors (niche_id, position, domain, authority, traffic) ",
    );
    qb.push_values(competitors.iter().enumerate(), |mut b, (position, c)| {
        b.push_bind(niche_id)
            .push_bind(position as i32)
            .push_bind(c.domain.as_str())
            .push_bind(c.authority)
            .push_bind(i64::try_from(c.traffic).unwrap_or(i64::MAX));
    });
    qb.build()
        .execute(&mut **tx)
        .await
        .context("insert niche_competitors failed")?;

    Ok(())
}
