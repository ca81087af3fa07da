use scraper::Html;
use tracing::{info, warn};

use crate::{
    config::ScraperConfig,
    document::{first_text, selector, text_of},
    error::{Result, ScrapeError},
    fetcher::PageFetcher,
    season,
    session_cache::{BrowserSession, SessionCacheReader},
    types::{
        Competition, CompetitionKind, Country, DUMMY_ID_VALUE, INTERNATIONAL_COUNTRY_NAME,
        NO_COUNTRY_URL, NO_TIER,
    },
    utils,
};

pub const CUP_COMPETITION: &str = "pokalwettbewerb";
pub const LEAGUE_COMPETITION: &str = "wettbewerb";
const TYPE_OF_CUP: &str = "Type of cup";
const DOMESTIC_TYPE: &str = "Domestic";
const TIER: &str = "tier";
const YOUTH: &str = "youth";

/// Where the country fields of a competition come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryField {
    International,
    /// Domestic cup: only the name is on the page, the rest is looked up.
    Named(String),
    Linked(Country),
}

/// Everything read from a competition page before the country lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionPage {
    pub kind: CompetitionKind,
    pub competition_name: String,
    pub competition_code: String,
    pub competition_url: String,
    pub competition_tier: String,
    pub country: CountryField,
}

impl CompetitionPage {
    pub fn needs_country_lookup(&self) -> bool {
        matches!(self.country, CountryField::Named(_))
    }

    /// Resolves the country fields. The first country with a matching name wins.
    pub fn into_competition(self, countries: &[Country]) -> Result<Competition> {
        let country = match self.country {
            CountryField::International => Country {
                country_id: DUMMY_ID_VALUE,
                country_name: INTERNATIONAL_COUNTRY_NAME.to_string(),
                country_url: NO_COUNTRY_URL.to_string(),
            },
            CountryField::Named(name) => countries
                .iter()
                .find(|c| c.country_name == name)
                .cloned()
                .ok_or(ScrapeError::UnknownCountry(name))?,
            CountryField::Linked(country) => country,
        };

        Ok(Competition {
            competition_name: self.competition_name,
            competition_code: self.competition_code,
            competition_url: self.competition_url,
            competition_tier: self.competition_tier,
            country_name: country.country_name,
            country_id: country.country_id,
            country_url: country.country_url,
        })
    }
}

pub fn classify(document: &Html, url: &str) -> Result<CompetitionKind> {
    let header_label = first_text(document, "li.data-header__label")?.unwrap_or_default();
    if url.contains(CUP_COMPETITION) || header_label.contains(TYPE_OF_CUP) {
        Ok(CompetitionKind::Cup)
    } else if url.contains(LEAGUE_COMPETITION) {
        Ok(CompetitionKind::League)
    } else {
        Err(ScrapeError::UnrecognizedCompetitionPageShape(url.to_string()))
    }
}

pub fn parse_competition_page(html: &str, url: &str, base_url: &str) -> Result<CompetitionPage> {
    let document = Html::parse_document(html);
    let competition_code = utils::competition_code(url)?;
    let competition_name =
        first_text(&document, "h1")?.ok_or_else(|| ScrapeError::missing("h1", url))?;

    let kind = classify(&document, url)?;
    let (country, competition_tier) = match kind {
        CompetitionKind::Cup => (extract_cup_country(&document, url)?, NO_TIER.to_string()),
        CompetitionKind::League => (
            extract_league_country(&document, url)?,
            extract_tier(&document)?.unwrap_or_else(|| NO_TIER.to_string()),
        ),
    };

    Ok(CompetitionPage {
        kind,
        competition_name,
        competition_code,
        competition_url: utils::short_url(url, base_url).to_string(),
        competition_tier,
        country,
    })
}

fn extract_cup_country(document: &Html, url: &str) -> Result<CountryField> {
    let details_selector = selector("div.data-header__details")?;
    let label_selector = selector("li.data-header__label")?;
    let img_selector = selector("img")?;

    let Some(details) = document.select(&details_selector).next() else {
        return Err(ScrapeError::missing("div.data-header__details", url));
    };
    let type_of_cup = details
        .select(&label_selector)
        .next()
        .map(text_of)
        .unwrap_or_default();
    if !type_of_cup.contains(DOMESTIC_TYPE) {
        return Ok(CountryField::International);
    }

    details
        .select(&img_selector)
        .next()
        .and_then(|img| img.value().attr("title"))
        .map(|title| CountryField::Named(title.trim().to_string()))
        .ok_or_else(|| ScrapeError::missing("data-header__details img[title]", url))
}

fn extract_league_country(document: &Html, url: &str) -> Result<CountryField> {
    let anchor_selector = selector("div.data-header__club-info a")?;
    let anchor = document
        .select(&anchor_selector)
        .next()
        .ok_or_else(|| ScrapeError::missing("div.data-header__club-info a", url))?;
    let country_url = anchor
        .value()
        .attr("href")
        .ok_or_else(|| ScrapeError::missing("data-header__club-info a[href]", url))?
        .to_string();

    Ok(CountryField::Linked(Country {
        country_id: utils::id_from_url(&country_url)?,
        country_name: text_of(anchor).trim().to_string(),
        country_url,
    }))
}

/// Tier from the first header label, when that label is about league level.
///
/// The label reads "League level:" on its first line and the tier two lines down.
fn extract_tier(document: &Html) -> Result<Option<String>> {
    let label_selector = selector("span.data-header__label")?;
    let Some(label) = document.select(&label_selector).next() else {
        return Ok(None);
    };
    let text = text_of(label);
    let lower = text.to_lowercase();
    if !(lower.contains(TIER) || lower.contains(YOUTH)) {
        return Ok(None);
    }
    Ok(text.split('\n').nth(2).map(|line| line.trim().to_string()))
}

/// Extracts competitions, reading the country table at most once.
pub struct CompetitionScraper<'a, F: PageFetcher, B: BrowserSession> {
    fetcher: &'a F,
    cache: SessionCacheReader<'a, B>,
    base_url: String,
    countries: Option<Vec<Country>>,
}

impl<'a, F: PageFetcher, B: BrowserSession> CompetitionScraper<'a, F, B> {
    pub fn new(fetcher: &'a F, browser: &'a B, config: &ScraperConfig) -> Self {
        Self {
            fetcher,
            cache: SessionCacheReader::new(browser, config.session_cache.clone()),
            base_url: config.scraping.base_url.clone(),
            countries: None,
        }
    }

    /// Seeds the country table, e.g. with one read earlier in the run.
    pub fn with_countries(mut self, countries: Vec<Country>) -> Self {
        self.countries = Some(countries);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn countries(&mut self) -> Result<&[Country]> {
        if self.countries.is_none() {
            let countries = self.cache.countries(&self.base_url).await?;
            info!("Read {} countries from session storage", countries.len());
            self.countries = Some(countries);
        }
        Ok(self.countries.as_deref().unwrap_or_default())
    }

    pub async fn competition_from_url(&mut self, url: &str) -> Result<Competition> {
        let page = self.competition_page(url).await?;
        if page.needs_country_lookup() {
            let countries = self.countries().await?;
            page.into_competition(countries)
        } else {
            page.into_competition(&[])
        }
    }

    async fn competition_page(&self, url: &str) -> Result<CompetitionPage> {
        let competition_code = utils::competition_code(url)?;
        info!("Getting competition data for competition_code: {}", competition_code);
        let html = self.fetcher.fetch_html(url).await?;
        parse_competition_page(&html, url, &self.base_url)
    }

    /// Every competition listed in the session storage of `url`.
    ///
    /// Listed entries without a link are dropped. A competition that fails to
    /// extract is logged and skipped.
    pub async fn competitions_from_cache(&mut self, url: &str) -> Result<Vec<Competition>> {
        let links = self.cache.competition_links(url).await?;
        if links.is_empty() {
            warn!("No competitions listed in session storage for {}", url);
        }

        let mut competitions = Vec::new();
        for record in links {
            let Some(link) = record.link else {
                continue;
            };
            let competition_url = utils::absolute_url(&self.base_url, &link);
            match self.competition_from_url(&competition_url).await {
                Ok(competition) => competitions.push(competition),
                Err(e) => {
                    info!("Error while getting competition info for {}: {}", link, e);
                    continue;
                }
            }
        }
        Ok(competitions)
    }

    /// Finds a competition's url on its country's competition list for a season,
    /// for competitions missing from the session storage.
    pub async fn competition_url_when_missing(
        &self,
        competition_code: &str,
        country_id: i64,
        season_name: &str,
    ) -> Result<Option<String>> {
        let token = season::url_token(season_name)?;
        let url = utils::country_competitions_url(&self.base_url, country_id, &token);
        let document = self.fetcher.fetch_document(&url).await?;
        let anchor_selector = selector("a[href]")?;

        Ok(document
            .select(&anchor_selector)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| href.contains(competition_code))
            .map(|href| utils::strip_season_suffix(href).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BASE: &str = "https://www.transfermarkt.com";

    fn league_page(label: &str) -> String {
        format!(
            r#"<html><body>
            <h1 class="data-header__headline-wrapper">
                Serie B
            </h1>
            <div class="data-header__club-info">
                <span class="data-header__club">
                    <a href="/wettbewerbe/national/wettbewerbe/75">Italy</a>
                </span>
            </div>
            <ul><li class="data-header__label">Reigning champion: <span>Venezia</span></li></ul>
            {}
            </body></html>"#,
            label
        )
    }

    #[test]
    fn test_league_page_with_tier() {
        let html = league_page(
            "<span class=\"data-header__label\">League level:\n    <span class=\"data-header__content\">\n        Second Tier\n    </span></span>",
        );
        let url = "https://www.transfermarkt.com/serie-b/startseite/wettbewerb/IT2/saison_id/2022";
        let competition = parse_competition_page(&html, url, BASE)
            .unwrap()
            .into_competition(&[])
            .unwrap();

        assert_eq!(
            competition,
            Competition {
                competition_name: "Serie B".to_string(),
                competition_code: "IT2".to_string(),
                competition_url: "/serie-b/startseite/wettbewerb/IT2".to_string(),
                competition_tier: "Second Tier".to_string(),
                country_name: "Italy".to_string(),
                country_id: 75,
                country_url: "/wettbewerbe/national/wettbewerbe/75".to_string(),
            }
        );
    }

    #[test]
    fn test_league_page_without_tier_label() {
        let html = league_page("<span class=\"data-header__label\">Participants: 20</span>");
        let url = "https://www.transfermarkt.com/serie-b/startseite/wettbewerb/IT2";
        let page = parse_competition_page(&html, url, BASE).unwrap();
        assert_eq!(page.kind, CompetitionKind::League);
        assert_eq!(page.competition_tier, NO_TIER);
        assert!(!page.needs_country_lookup());
    }

    #[test]
    fn test_international_cup_keeps_sentinels() {
        let html = r#"<html><body>
            <h1>UEFA Champions League</h1>
            <div class="data-header__details">
                <ul><li class="data-header__label">Type of cup: <span>International cup</span></li></ul>
            </div>
            </body></html>"#;
        let url = "https://www.transfermarkt.com/uefa-champions-league/startseite/pokalwettbewerb/CL";
        let page = parse_competition_page(html, url, BASE).unwrap();
        assert_eq!(page.kind, CompetitionKind::Cup);
        assert_eq!(page.country, CountryField::International);

        let competition = page.into_competition(&[]).unwrap();
        assert_eq!(competition.country_name, INTERNATIONAL_COUNTRY_NAME);
        assert_eq!(competition.country_id, 0);
        assert_eq!(competition.country_url, "");
        assert_eq!(competition.competition_tier, NO_TIER);
    }

    #[test]
    fn test_cup_detected_from_label_when_url_is_a_league_url() {
        let html = r#"<html><body>
            <h1>Super Cup</h1>
            <ul><li class="data-header__label">Type of cup: Domestic cup</li></ul>
            <div class="data-header__details">
                <ul><li class="data-header__label">Type of cup: Domestic cup</li></ul>
                <img title=" India " src="flag.png">
            </div>
            </body></html>"#;
        let url = "https://www.transfermarkt.com/super-cup/startseite/wettbewerb/INSC";
        let page = parse_competition_page(html, url, BASE).unwrap();
        assert_eq!(page.kind, CompetitionKind::Cup);
        assert_eq!(page.country, CountryField::Named("India".to_string()));
    }

    #[test]
    fn test_domestic_cup_country_lookup() {
        let countries = vec![
            Country {
                country_id: 67,
                country_name: "India".to_string(),
                country_url: "/wettbewerbe/national/wettbewerbe/67".to_string(),
            },
            Country {
                country_id: 999,
                country_name: "India".to_string(),
                country_url: "/duplicate".to_string(),
            },
        ];
        let page = CompetitionPage {
            kind: CompetitionKind::Cup,
            competition_name: "Hero Super Cup".to_string(),
            competition_code: "INSC".to_string(),
            competition_url: "/hero-super-cup/startseite/pokalwettbewerb/INSC".to_string(),
            competition_tier: NO_TIER.to_string(),
            country: CountryField::Named("India".to_string()),
        };

        let competition = page.clone().into_competition(&countries).unwrap();
        assert_eq!(competition.country_id, 67);

        assert!(matches!(
            page.into_competition(&countries[..0]),
            Err(ScrapeError::UnknownCountry(name)) if name == "India"
        ));
    }

    #[test]
    fn test_unrecognized_url_shape() {
        let html = "<html><h1>Something</h1></html>";
        let url = "https://www.transfermarkt.com/something/startseite/verein/12";
        assert!(matches!(
            parse_competition_page(html, url, BASE),
            Err(ScrapeError::UnrecognizedCompetitionPageShape(_))
        ));
    }
}
