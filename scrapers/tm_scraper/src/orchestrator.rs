use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::{
    competition::CompetitionScraper,
    config::ScraperConfig,
    error::Result,
    fetcher::PageFetcher,
    players::parse_players,
    season,
    session_cache::BrowserSession,
    teams::parse_teams,
    types::{Competition, CompetitionSeasonTeam, CompetitionSeasonTeamPlayer},
    utils,
};

/// Which part of the site a batch covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeTarget {
    /// The whole site, restricted to these countries.
    Site { country_ids: Vec<i64> },
    /// A single page listing competitions, e.g. one country's page.
    SubSite { url: String },
}

/// Teams of every competition for every season, competitions outermost.
///
/// A competition season that cannot be fetched or lists no teams is logged
/// and skipped.
pub async fn competitions_seasons_teams<F: PageFetcher>(
    fetcher: &F,
    base_url: &str,
    competitions: &[Competition],
    seasons: &[String],
) -> Result<Vec<CompetitionSeasonTeam>> {
    let tokens = seasons
        .iter()
        .map(|s| season::url_token(s))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    for competition in competitions {
        for (season_name, token) in seasons.iter().zip(&tokens) {
            info!(
                "Processing competition {} for season {}.",
                competition.competition_name, season_name
            );
            let full_url = utils::competition_season_url(base_url, &competition.competition_url, token);
            info!("Processing competition with url: {}", full_url);

            let document = match fetcher.fetch_document(&full_url).await {
                Ok(document) => document,
                Err(e) => {
                    error!("Could not fetch {}: {}", full_url, e);
                    continue;
                }
            };
            let teams = parse_teams(&document, &full_url);
            if teams.is_empty() {
                info!(
                    "No data found for competition {}, season {} and competition_code {}. Url: {}",
                    competition.competition_name, season_name, competition.competition_code, full_url
                );
                continue;
            }

            rows.extend(
                teams
                    .into_iter()
                    .map(|team| CompetitionSeasonTeam::new(competition, season_name, team)),
            );
        }
    }
    Ok(rows)
}

/// Squad of every team season row. Teams that fail or list nobody are logged and skipped.
pub async fn competitions_seasons_teams_players<F: PageFetcher>(
    fetcher: &F,
    base_url: &str,
    teams: &[CompetitionSeasonTeam],
) -> Vec<CompetitionSeasonTeamPlayer> {
    let progress = ProgressBar::new(teams.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} teams ({eta})")
    {
        progress.set_style(style.progress_chars("#>-"));
    }

    let mut rows = Vec::new();
    for team in teams {
        progress.inc(1);
        info!(
            "Processing team {} for competition {} and season {}.",
            team.team_name, team.competition_name, team.season_name
        );

        let token = match season::url_token(&team.season_name) {
            Ok(token) => token,
            Err(e) => {
                error!("Skipping team {}: {}", team.team_name, e);
                continue;
            }
        };
        let full_url = utils::team_season_url(base_url, &team.team_url, &token);

        let players = match fetcher.fetch_document(&full_url).await {
            Ok(document) => parse_players(&document, &full_url),
            Err(e) => Err(e),
        };
        let players = match players {
            Ok(players) => players,
            Err(e) => {
                error!("Error while scraping player data for url: {}. Exception: {}", full_url, e);
                continue;
            }
        };
        if players.is_empty() {
            info!("No players found for team {} at {}", team.team_name, full_url);
            continue;
        }

        rows.extend(
            players
                .into_iter()
                .map(|player| CompetitionSeasonTeamPlayer::new(team, player)),
        );
    }

    progress.finish_and_clear();
    rows
}

pub struct CompetitionsSeasonsTeamsScraper<'a, F: PageFetcher, B: BrowserSession> {
    fetcher: &'a F,
    competitions: CompetitionScraper<'a, F, B>,
    target: ScrapeTarget,
    seasons: Vec<String>,
}

impl<'a, F: PageFetcher, B: BrowserSession> CompetitionsSeasonsTeamsScraper<'a, F, B> {
    pub fn new(
        fetcher: &'a F,
        browser: &'a B,
        config: &ScraperConfig,
        target: ScrapeTarget,
        seasons: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            competitions: CompetitionScraper::new(fetcher, browser, config),
            target,
            seasons,
        }
    }

    pub fn base_url(&self) -> &str {
        self.competitions.base_url()
    }

    pub fn competition_scraper(&mut self) -> &mut CompetitionScraper<'a, F, B> {
        &mut self.competitions
    }

    /// Competitions covered by the target, without the ones lacking a url.
    pub async fn competitions_to_update(&mut self) -> Result<Vec<Competition>> {
        let mut competitions = match self.target.clone() {
            ScrapeTarget::Site { country_ids } => {
                let country_urls: Vec<String> = self
                    .competitions
                    .countries()
                    .await?
                    .iter()
                    .filter(|c| country_ids.contains(&c.country_id))
                    .map(|c| c.country_url.clone())
                    .collect();

                let mut competitions = Vec::new();
                for country_url in country_urls {
                    let url = utils::absolute_url(self.base_url(), &country_url);
                    competitions.extend(self.competitions.competitions_from_cache(&url).await?);
                }
                competitions
            }
            ScrapeTarget::SubSite { url } => self.competitions.competitions_from_cache(&url).await?,
        };

        competitions.retain(|c| !c.competition_url.is_empty());
        Ok(competitions)
    }

    pub async fn competitions_seasons_teams_data(&mut self) -> Result<Vec<CompetitionSeasonTeam>> {
        info!("Executing competitions_seasons_teams_data.");
        let competitions = self.competitions_to_update().await?;
        if competitions.is_empty() {
            return Ok(Vec::new());
        }
        competitions_seasons_teams(self.fetcher, self.base_url(), &competitions, &self.seasons).await
    }
}

pub struct CompetitionsSeasonsTeamsPlayersScraper<'a, F: PageFetcher, B: BrowserSession> {
    teams_scraper: CompetitionsSeasonsTeamsScraper<'a, F, B>,
    competitions_seasons_teams: Option<Vec<CompetitionSeasonTeam>>,
}

impl<'a, F: PageFetcher, B: BrowserSession> CompetitionsSeasonsTeamsPlayersScraper<'a, F, B> {
    pub fn new(teams_scraper: CompetitionsSeasonsTeamsScraper<'a, F, B>) -> Self {
        Self {
            teams_scraper,
            competitions_seasons_teams: None,
        }
    }

    /// Uses these team season rows instead of scraping them.
    pub fn with_teams(mut self, teams: Vec<CompetitionSeasonTeam>) -> Self {
        self.competitions_seasons_teams = Some(teams);
        self
    }

    pub async fn competitions_seasons_teams(&mut self) -> Result<&[CompetitionSeasonTeam]> {
        if self.competitions_seasons_teams.is_none() {
            let teams = self.teams_scraper.competitions_seasons_teams_data().await?;
            self.competitions_seasons_teams = Some(teams);
        }
        Ok(self.competitions_seasons_teams.as_deref().unwrap_or_default())
    }

    pub async fn competitions_seasons_teams_players_data(
        &mut self,
    ) -> Result<Vec<CompetitionSeasonTeamPlayer>> {
        let fetcher = self.teams_scraper.fetcher;
        let base_url = self.teams_scraper.base_url().to_string();
        let teams = self.competitions_seasons_teams().await?;
        Ok(competitions_seasons_teams_players(fetcher, &base_url, teams).await)
    }
}
