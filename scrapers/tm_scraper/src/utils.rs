use crate::error::{Result, ScrapeError};

const SEASON_MARKER: &str = "/saison_id";

/// Drops everything from `/saison_id` onward.
pub fn strip_season_suffix(url: &str) -> &str {
    url.split(SEASON_MARKER).next().unwrap_or(url)
}

/// Last path segment before the season suffix, e.g. `GB1` for
/// `/premier-league/startseite/wettbewerb/GB1/saison_id/2023`.
pub fn competition_code(url: &str) -> Result<String> {
    strip_season_suffix(url)
        .rsplit_once('/')
        .map(|(_, code)| code.to_string())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ScrapeError::InvalidId(url.to_string()))
}

/// Integer after the last `/` of a team, player or country url.
pub fn id_from_url(url: &str) -> Result<i64> {
    url.rsplit_once('/')
        .and_then(|(_, id)| id.trim().parse::<i64>().ok())
        .ok_or_else(|| ScrapeError::InvalidId(url.to_string()))
}

/// Site-relative path of `url`, without the season suffix.
pub fn short_url<'a>(url: &'a str, base_url: &str) -> &'a str {
    let path = match url.strip_prefix(base_url) {
        Some(path) => path,
        None => match url.split_once("://") {
            Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or(""),
            None => url,
        },
    };
    strip_season_suffix(path)
}

pub fn absolute_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}{}", base_url, path)
    }
}

pub fn competition_season_url(base_url: &str, competition_url: &str, season_token: &str) -> String {
    format!("{}{}/plus/?saison_id={}", base_url, competition_url, season_token)
}

pub fn team_season_url(base_url: &str, team_url: &str, season_token: &str) -> String {
    format!("{}{}/plus/1?saison_id={}", base_url, team_url, season_token)
}

pub fn country_competitions_url(base_url: &str, country_id: i64, season_token: &str) -> String {
    format!(
        "{}/wettbewerbe/national/wettbewerbe/{}/plus/?saison_id={}",
        base_url, country_id, season_token
    )
}
