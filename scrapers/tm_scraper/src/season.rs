use chrono::{Datelike, NaiveDate};

use crate::error::{Result, ScrapeError};

/// First month of a split-year season.
pub const SEASON_START_MONTH: u32 = 7;

/// Season labels worth processing for `year`, oldest first.
///
/// Without a month the whole window around `year` is returned. With a month,
/// only the seasons still running at that point of the year.
pub fn seasons_for_year(year: i32, month: Option<u32>) -> Result<Vec<String>> {
    let out_of_range = || ScrapeError::YearOutOfRange(year);
    let previous = format!("{}/{}", year.checked_sub(1).ok_or_else(out_of_range)?, year);
    let single = year.to_string();
    let next = format!("{}/{}", year, year.checked_add(1).ok_or_else(out_of_range)?);

    Ok(match month {
        None => vec![previous, single, next],
        Some(m) if m >= SEASON_START_MONTH => vec![single, next],
        Some(_) => vec![previous, single],
    })
}

pub fn current_seasons(today: NaiveDate) -> Result<Vec<String>> {
    seasons_for_year(today.year(), Some(today.month()))
}

/// Token used in `?saison_id=` for a season label: the first year of a split
/// label, the year before for a single-year label.
pub fn url_token(season_name: &str) -> Result<String> {
    let invalid = || ScrapeError::InvalidSeasonLabel(season_name.to_string());

    match season_name.split_once('/') {
        Some((start, _)) => {
            let start = start.trim().parse::<i32>().map_err(|_| invalid())?;
            Ok(start.to_string())
        }
        None => {
            let year = season_name.trim().parse::<i32>().map_err(|_| invalid())?;
            year
                .checked_sub(1)
                .map(|token| token.to_string())
                .ok_or_else(invalid)
        }
    }
}
