use scraper::{ElementRef, Html};
use tracing::{error, warn};

use crate::{
    document::{locate_table, odd_then_even_rows, selector, HeaderKeyword},
    error::{Result, ScrapeError},
    types::Team,
    utils,
};

/// Teams listed in the clubs table of a competition season page.
///
/// A page without a clubs table, or a table without a body, has no teams.
/// Rows that cannot be read are logged and skipped.
pub fn parse_teams(document: &Html, url: &str) -> Vec<Team> {
    match try_parse_teams(document, url) {
        Ok(teams) => teams,
        Err(e) => {
            error!("Error while scraping teams for url: {}. {}", url, e);
            Vec::new()
        }
    }
}

fn try_parse_teams(document: &Html, url: &str) -> Result<Vec<Team>> {
    let Some(table) = locate_table(document, HeaderKeyword::Club)? else {
        return Ok(Vec::new());
    };
    let Some(rows) = odd_then_even_rows(table)? else {
        warn!(
            "Tbody not found for clubs table. Probably something is different than expected in HTML structure. Url: {}",
            url
        );
        return Ok(Vec::new());
    };

    let mut teams = Vec::with_capacity(rows.len());
    for row in rows {
        match team_from_row(row, url) {
            Ok(team) => teams.push(team),
            Err(e) => {
                error!("Error while scraping team row for url: {}. {}", url, e);
                continue;
            }
        }
    }
    Ok(teams)
}

fn team_from_row(row: ElementRef<'_>, url: &str) -> Result<Team> {
    let anchor_selector = selector("a")?;
    let anchor = row
        .select(&anchor_selector)
        .next()
        .ok_or_else(|| ScrapeError::missing("team anchor", url))?;
    let team_name = anchor
        .value()
        .attr("title")
        .ok_or_else(|| ScrapeError::missing("team anchor title", url))?
        .to_string();
    let href = anchor
        .value()
        .attr("href")
        .ok_or_else(|| ScrapeError::missing("team anchor href", url))?;
    let team_url = utils::strip_season_suffix(href).to_string();

    Ok(Team {
        team_name,
        team_id: utils::id_from_url(&team_url)?,
        team_url,
    })
}
