use sqlx::{Executor, PgPool};
use tracing::info;

/// Idempotent bootstrap run once at startup. There is no versioned
/// migration history; every statement is `IF NOT EXISTS`.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    tx.execute(
        r#"
        CREATE SCHEMA IF NOT EXISTS portfolio;
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS portfolio.profiles (
          id              BIGSERIAL PRIMARY KEY,
          name            TEXT NOT NULL,
          title           TEXT NOT NULL,
          summary         TEXT NOT NULL DEFAULT '',
          bio             TEXT NOT NULL DEFAULT '',
          email           TEXT NOT NULL DEFAULT '',
          phone           TEXT,
          location        TEXT,
          linkedin        TEXT,
          profile_image   TEXT,
          created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS portfolio.job_history (
          id            BIGSERIAL PRIMARY KEY,
          company       TEXT NOT NULL,
          position      TEXT NOT NULL,
          start_date    TIMESTAMPTZ NOT NULL,
          end_date      TIMESTAMPTZ,
          current       BOOLEAN NOT NULL DEFAULT FALSE,
          description   TEXT NOT NULL DEFAULT '',
          sort_order    INTEGER NOT NULL DEFAULT 0,
          created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS portfolio.certifications (
          id               BIGSERIAL PRIMARY KEY,
          name             TEXT NOT NULL,
          issuer           TEXT NOT NULL,
          issue_date       TIMESTAMPTZ NOT NULL,
          expiry_date      TIMESTAMPTZ,
          credential_id    TEXT,
          credential_url   TEXT,
          description      TEXT,
          sort_order       INTEGER NOT NULL DEFAULT 0,
          created_at       TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          updated_at       TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS portfolio.blog_posts (
          id             BIGSERIAL PRIMARY KEY,
          title          TEXT NOT NULL,
          slug           TEXT NOT NULL UNIQUE,
          excerpt        TEXT,
          content        TEXT NOT NULL DEFAULT '',
          cover_image    TEXT,
          published      BOOLEAN NOT NULL DEFAULT FALSE,
          published_at   TIMESTAMPTZ,
          created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          updated_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_job_history_order ON portfolio.job_history(sort_order, start_date DESC);
        CREATE INDEX IF NOT EXISTS idx_certifications_order ON portfolio.certifications(sort_order, issue_date DESC);
        CREATE INDEX IF NOT EXISTS idx_blog_posts_published ON portfolio.blog_posts(published, published_at DESC);
        "#,
    )
    .await?;

    tx.commit().await?;
    info!("database schema ready");
    Ok(())
}
