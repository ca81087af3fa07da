use chrono::Utc;
use serde::Serialize;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use crate::{
    error::Result,
    types::{Competition, CompetitionSeasonTeam, CompetitionSeasonTeamPlayer, Country},
};

#[allow(async_fn_in_trait)]
pub trait RecordSink {
    async fn write_countries(&mut self, rows: &[Country]) -> Result<()>;
    async fn write_competitions(&mut self, rows: &[Competition]) -> Result<()>;
    async fn write_teams(&mut self, rows: &[CompetitionSeasonTeam]) -> Result<()>;
    async fn write_players(&mut self, rows: &[CompetitionSeasonTeamPlayer]) -> Result<()>;
}

/// Writes one CSV file per record kind into a directory.
pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(output_dir.as_ref())?;
        Ok(Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        })
    }

    fn write<T: Serialize>(&self, file_name: &str, rows: &[T]) -> Result<()> {
        let csv_path = self.output_dir.join(file_name);
        info!("Writing {} rows to {:?}", rows.len(), csv_path);

        let mut wtr = csv::Writer::from_path(&csv_path)?;
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl RecordSink for CsvSink {
    async fn write_countries(&mut self, rows: &[Country]) -> Result<()> {
        self.write("countries.csv", rows)
    }

    async fn write_competitions(&mut self, rows: &[Competition]) -> Result<()> {
        self.write("competitions.csv", rows)
    }

    async fn write_teams(&mut self, rows: &[CompetitionSeasonTeam]) -> Result<()> {
        self.write("comps_seasons_teams.csv", rows)
    }

    async fn write_players(&mut self, rows: &[CompetitionSeasonTeamPlayer]) -> Result<()> {
        self.write("comps_seasons_teams_players.csv", rows)
    }
}

const SCHEMA: &[&str] = &[
    "CREATE SCHEMA IF NOT EXISTS tm",
    r#"
    CREATE TABLE IF NOT EXISTS tm.countries (
        country_id BIGINT PRIMARY KEY,
        country_name TEXT NOT NULL,
        country_url TEXT NOT NULL,
        created TIMESTAMPTZ NOT NULL,
        last_updated TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tm.competitions (
        competition_code TEXT PRIMARY KEY,
        competition_name TEXT NOT NULL,
        competition_url TEXT NOT NULL,
        competition_tier TEXT NOT NULL,
        country_name TEXT NOT NULL,
        country_id BIGINT NOT NULL,
        country_url TEXT NOT NULL,
        created TIMESTAMPTZ NOT NULL,
        last_updated TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tm.comps_seasons_teams (
        team_id BIGINT PRIMARY KEY,
        competition_name TEXT,
        competition_code TEXT,
        season_name TEXT,
        team_name TEXT,
        team_url TEXT,
        created TIMESTAMPTZ NOT NULL,
        last_updated TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tm.comps_seasons_teams_players (
        team_id BIGINT NOT NULL,
        player_id BIGINT NOT NULL,
        competition_name TEXT,
        competition_code TEXT,
        season_name TEXT,
        team_name TEXT,
        team_url TEXT,
        player_name TEXT,
        player_url TEXT,
        created TIMESTAMPTZ NOT NULL,
        last_updated TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (team_id, player_id)
    )
    "#,
];

/// Upserts records into the `tm` schema, keeping `created` on conflict.
pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let sink = Self { pool };
        sink.ensure_schema().await?;
        Ok(sink)
    }

    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }
}

impl RecordSink for PostgresSink {
    async fn write_countries(&mut self, rows: &[Country]) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO tm.countries (country_id, country_name, country_url, created, last_updated)
                VALUES ($1, $2, $3, $4, $4)
                ON CONFLICT (country_id) DO UPDATE SET
                    country_name = EXCLUDED.country_name,
                    country_url = EXCLUDED.country_url,
                    last_updated = EXCLUDED.last_updated
                "#,
            )
            .bind(row.country_id)
            .bind(&row.country_name)
            .bind(&row.country_url)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!("Upserted {} countries", rows.len());
        Ok(())
    }

    async fn write_competitions(&mut self, rows: &[Competition]) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO tm.competitions (
                    competition_code, competition_name, competition_url, competition_tier,
                    country_name, country_id, country_url, created, last_updated
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
                ON CONFLICT (competition_code) DO UPDATE SET
                    competition_name = EXCLUDED.competition_name,
                    competition_url = EXCLUDED.competition_url,
                    competition_tier = EXCLUDED.competition_tier,
                    country_name = EXCLUDED.country_name,
                    country_id = EXCLUDED.country_id,
                    country_url = EXCLUDED.country_url,
                    last_updated = EXCLUDED.last_updated
                "#,
            )
            .bind(&row.competition_code)
            .bind(&row.competition_name)
            .bind(&row.competition_url)
            .bind(&row.competition_tier)
            .bind(&row.country_name)
            .bind(row.country_id)
            .bind(&row.country_url)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!("Upserted {} competitions", rows.len());
        Ok(())
    }

    async fn write_teams(&mut self, rows: &[CompetitionSeasonTeam]) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO tm.comps_seasons_teams (
                    team_id, competition_name, competition_code, season_name,
                    team_name, team_url, created, last_updated
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
                ON CONFLICT (team_id) DO UPDATE SET
                    competition_name = EXCLUDED.competition_name,
                    competition_code = EXCLUDED.competition_code,
                    season_name = EXCLUDED.season_name,
                    team_name = EXCLUDED.team_name,
                    team_url = EXCLUDED.team_url,
                    last_updated = EXCLUDED.last_updated
                "#,
            )
            .bind(row.team_id)
            .bind(&row.competition_name)
            .bind(&row.competition_code)
            .bind(&row.season_name)
            .bind(&row.team_name)
            .bind(&row.team_url)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!("Upserted {} team season rows", rows.len());
        Ok(())
    }

    async fn write_players(&mut self, rows: &[CompetitionSeasonTeamPlayer]) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO tm.comps_seasons_teams_players (
                    team_id, player_id, competition_name, competition_code, season_name,
                    team_name, team_url, player_name, player_url, created, last_updated
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
                ON CONFLICT (team_id, player_id) DO UPDATE SET
                    competition_name = EXCLUDED.competition_name,
                    competition_code = EXCLUDED.competition_code,
                    season_name = EXCLUDED.season_name,
                    team_name = EXCLUDED.team_name,
                    team_url = EXCLUDED.team_url,
                    player_name = EXCLUDED.player_name,
                    player_url = EXCLUDED.player_url,
                    last_updated = EXCLUDED.last_updated
                "#,
            )
            .bind(row.team_id)
            .bind(row.player_id)
            .bind(&row.competition_name)
            .bind(&row.competition_code)
            .bind(&row.season_name)
            .bind(&row.team_name)
            .bind(&row.team_url)
            .bind(&row.player_name)
            .bind(&row.player_url)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!("Upserted {} player rows", rows.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_csv_sink_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path()).unwrap();
        let rows = vec![CompetitionSeasonTeam {
            competition_name: "Serie B".to_string(),
            competition_code: "IT2".to_string(),
            season_name: "2020/2021".to_string(),
            team_id: 4172,
            team_name: "Pisa Sporting Club".to_string(),
            team_url: "/pisa-sporting-club/startseite/verein/4172".to_string(),
        }];

        sink.write_teams(&rows).await.unwrap();

        let written = fs::read_to_string(dir.path().join("comps_seasons_teams.csv")).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(
            lines,
            vec![
                "competition_name,competition_code,season_name,team_id,team_name,team_url",
                "Serie B,IT2,2020/2021,4172,Pisa Sporting Club,/pisa-sporting-club/startseite/verein/4172",
            ]
        );
    }

    #[tokio::test]
    async fn test_csv_sink_competition_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path().join("nested")).unwrap();
        let rows = vec![Competition {
            competition_name: "UEFA Champions League".to_string(),
            competition_code: "CL".to_string(),
            competition_url: "/uefa-champions-league/startseite/pokalwettbewerb/CL".to_string(),
            competition_tier: "Not Available".to_string(),
            country_name: "International".to_string(),
            country_id: 0,
            country_url: String::new(),
        }];

        sink.write_competitions(&rows).await.unwrap();

        let written =
            fs::read_to_string(dir.path().join("nested").join("competitions.csv")).unwrap();
        let header = written.lines().next().unwrap();
        assert_eq!(
            header,
            "competition_name,competition_code,competition_url,competition_tier,country_name,country_id,country_url"
        );
        assert!(written.contains("International,0,"));
    }
}
