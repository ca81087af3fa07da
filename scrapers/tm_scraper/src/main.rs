use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info};

use tm_scraper::{
    competition::CompetitionScraper,
    config::ScraperConfig,
    fetcher::HttpPageFetcher,
    orchestrator::{
        CompetitionsSeasonsTeamsPlayersScraper, CompetitionsSeasonsTeamsScraper, ScrapeTarget,
    },
    season,
    sink::{CsvSink, PostgresSink, RecordSink},
    webdriver::WebDriverSession,
};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory the CSV files are written to
    #[arg(long, global = true, default_value = "output")]
    output_dir: PathBuf,

    /// Upsert into PostgreSQL (DATABASE_URL) instead of writing CSV files
    #[arg(long, global = true)]
    database: bool,
}

#[derive(Debug, Args)]
struct TargetArgs {
    /// Page whose session storage lists the competitions, e.g. a country page
    #[arg(long, conflicts_with = "country_ids")]
    url: Option<String>,

    /// Countries to cover when scraping the whole site
    #[arg(long = "country-id")]
    country_ids: Vec<i64>,
}

impl TargetArgs {
    fn into_target(self) -> Result<ScrapeTarget> {
        match self.url {
            Some(url) => Ok(ScrapeTarget::SubSite { url }),
            None if self.country_ids.is_empty() => {
                bail!("pass --url or at least one --country-id")
            }
            None => Ok(ScrapeTarget::Site {
                country_ids: self.country_ids,
            }),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the season labels covering a year
    Seasons {
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Dump the country table from the site's session storage
    Countries,
    /// Scrape competitions
    Competitions {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Scrape the teams of every competition season
    Teams {
        /// Season label such as 2023 or 2023/2024; defaults to the current seasons
        #[arg(long = "season")]
        seasons: Vec<String>,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Scrape teams and their squads
    Players {
        #[arg(long = "season")]
        seasons: Vec<String>,
        #[command(flatten)]
        target: TargetArgs,
    },
}

fn seasons_or_current(seasons: Vec<String>) -> Result<Vec<String>> {
    if seasons.is_empty() {
        Ok(season::current_seasons(Local::now().date_naive())?)
    } else {
        Ok(seasons)
    }
}

async fn scrape<S: RecordSink>(
    command: Commands,
    config: &ScraperConfig,
    fetcher: &HttpPageFetcher,
    browser: &WebDriverSession,
    sink: &mut S,
) -> Result<()> {
    match command {
        Commands::Seasons { .. } => {}
        Commands::Countries => {
            let mut scraper = CompetitionScraper::new(fetcher, browser, config);
            let countries = scraper.countries().await?.to_vec();
            info!("Found {} countries", countries.len());
            sink.write_countries(&countries).await?;
        }
        Commands::Competitions { target } => {
            let mut scraper = CompetitionsSeasonsTeamsScraper::new(
                fetcher,
                browser,
                config,
                target.into_target()?,
                Vec::new(),
            );
            let competitions = scraper.competitions_to_update().await?;
            info!("Found {} competitions", competitions.len());
            sink.write_competitions(&competitions).await?;
        }
        Commands::Teams { seasons, target } => {
            let seasons = seasons_or_current(seasons)?;
            info!("Scraping teams for seasons {:?}", seasons);
            let mut scraper = CompetitionsSeasonsTeamsScraper::new(
                fetcher,
                browser,
                config,
                target.into_target()?,
                seasons,
            );
            let teams = scraper.competitions_seasons_teams_data().await?;
            info!("Found {} team season rows", teams.len());
            sink.write_teams(&teams).await?;
        }
        Commands::Players { seasons, target } => {
            let seasons = seasons_or_current(seasons)?;
            info!("Scraping players for seasons {:?}", seasons);
            let teams_scraper = CompetitionsSeasonsTeamsScraper::new(
                fetcher,
                browser,
                config,
                target.into_target()?,
                seasons,
            );
            let mut scraper = CompetitionsSeasonsTeamsPlayersScraper::new(teams_scraper);

            let teams = scraper.competitions_seasons_teams().await?.to_vec();
            sink.write_teams(&teams).await?;

            let players = scraper.competitions_seasons_teams_players_data().await?;
            info!("Found {} player rows", players.len());
            sink.write_players(&players).await?;
        }
    }
    Ok(())
}

async fn run<S: RecordSink>(command: Commands, config: &ScraperConfig, sink: &mut S) -> Result<()> {
    let fetcher = HttpPageFetcher::new(config).context("Failed to build HTTP client")?;
    let browser = WebDriverSession::start(&config.webdriver)
        .await
        .with_context(|| format!("Failed to start WebDriver session at {}", config.webdriver.url))?;

    let result = scrape(command, config, &fetcher, &browser, sink).await;

    let session_id = browser.session_id().to_string();
    if let Err(e) = browser.close().await {
        error!("Failed to close WebDriver session {}: {}", session_id, e);
    }
    result
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = ScraperConfig::from_env();

    if let Commands::Seasons { year, month } = cli.command {
        for season_name in season::seasons_for_year(year, month)? {
            println!("{}", season_name);
        }
        return Ok(());
    }

    if cli.database {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set with --database")?;
        let mut sink = PostgresSink::connect(&database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        run(cli.command, &config, &mut sink).await
    } else {
        let mut sink = CsvSink::new(&cli.output_dir)
            .with_context(|| format!("Failed to create {:?}", cli.output_dir))?;
        run(cli.command, &config, &mut sink).await
    }
}
