use scraper::{ElementRef, Html};
use tracing::{error, warn};

use crate::{
    document::{locate_table, odd_then_even_rows, selector, HeaderKeyword},
    error::{Result, ScrapeError},
    types::Player,
    utils,
};

/// Players listed in the squad table of a team season page.
///
/// Rows that cannot be read are logged and skipped; the other rows are kept.
pub fn parse_players(document: &Html, url: &str) -> Result<Vec<Player>> {
    let Some(table) = locate_table(document, HeaderKeyword::Player)? else {
        return Ok(Vec::new());
    };
    let Some(rows) = odd_then_even_rows(table)? else {
        warn!("Tbody not found for players table. Url: {}", url);
        return Ok(Vec::new());
    };

    let mut players = Vec::with_capacity(rows.len());
    for row in rows {
        match player_from_row(row, url) {
            Ok(player) => players.push(player),
            Err(e) => {
                error!("Error while scraping player data for url: {}. Exception: {}", url, e);
                continue;
            }
        }
    }
    Ok(players)
}

fn player_from_row(row: ElementRef<'_>, url: &str) -> Result<Player> {
    let inline_table_selector = selector("table.inline-table")?;
    let anchor_selector = selector("a")?;
    let img_selector = selector("img")?;

    let inline_table = row
        .select(&inline_table_selector)
        .next()
        .ok_or_else(|| ScrapeError::missing("table.inline-table", url))?;
    let anchor = inline_table
        .select(&anchor_selector)
        .next()
        .ok_or_else(|| ScrapeError::missing("player anchor", url))?;
    let player_url = anchor
        .value()
        .attr("href")
        .ok_or_else(|| ScrapeError::missing("player anchor href", url))?
        .to_string();

    // the photo sits inside the profile link on most pages, next to it on others
    let img = anchor
        .select(&img_selector)
        .next()
        .or_else(|| inline_table.select(&img_selector).next())
        .ok_or_else(|| ScrapeError::missing("player image", url))?;
    let alt = img
        .value()
        .attr("alt")
        .ok_or_else(|| ScrapeError::missing("player image alt", url))?;
    let decoded = urlencoding::decode_binary(alt.as_bytes());
    let player_name = String::from_utf8_lossy(&decoded).into_owned();

    Ok(Player {
        player_id: utils::id_from_url(&player_url)?,
        player_name,
        player_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn squad_page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <div class="responsive-table"><table class="items">
              <thead><tr><th>#</th><th>Player</th><th>Market value</th></tr></thead>
              <tbody>{}</tbody>
            </table></div>
            </body></html>"#,
            rows
        )
    }

    fn player_row(parity: &str, slug: &str, id: i64, alt: &str) -> String {
        format!(
            r#"<tr class="{parity}"><td class="posrela"><table class="inline-table"><tr>
                <td rowspan="2"><a href="/{slug}/profil/spieler/{id}"><img alt="{alt}" class="bilderrahmen-fixed"></a></td>
                <td class="hauptlink"><a href="/{slug}/profil/spieler/{id}">{alt}</a></td>
            </tr></table></td></tr>"#
        )
    }

    #[test]
    fn test_players_are_decoded_and_ordered_odd_first() {
        let rows = [
            player_row("odd", "drake-callender", 465849, "Drake Callender"),
            player_row("even", "lionel-messi", 28003, "Lionel Messi"),
            player_row("odd", "sergio-busquets", 65230, "Sergio%20Busquets"),
        ]
        .concat();
        let document = Html::parse_document(&squad_page(&rows));
        let players = parse_players(&document, "https://tm/inter-miami").unwrap();

        let names: Vec<_> = players.iter().map(|p| p.player_name.as_str()).collect();
        assert_eq!(names, vec!["Drake Callender", "Sergio Busquets", "Lionel Messi"]);
        assert_eq!(
            players[2],
            Player {
                player_id: 28003,
                player_name: "Lionel Messi".to_string(),
                player_url: "/lionel-messi/profil/spieler/28003".to_string(),
            }
        );
    }

    #[test]
    fn test_image_outside_the_profile_link_is_used() {
        let row = r#"<tr class="odd"><td><table class="inline-table"><tr>
                <td><img alt="Jos%C3%A9 Mauri" src="p.png"></td>
                <td><a href="/jose-mauri/profil/spieler/123">José Mauri</a></td>
            </tr></table></td></tr>"#;
        let document = Html::parse_document(&squad_page(row));
        let players = parse_players(&document, "https://tm/pisa").unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].player_name, "José Mauri");
        assert_eq!(players[0].player_id, 123);
    }

    #[test]
    fn test_non_utf8_escape_is_replaced_not_dropped() {
        let row = r#"<tr class="odd"><td><table class="inline-table"><tr>
                <td><a href="/jose-mauri/profil/spieler/123"><img alt="Jos%E9 Mauri"></a></td>
            </tr></table></td></tr>"#;
        let document = Html::parse_document(&squad_page(row));
        let players = parse_players(&document, "https://tm/pisa").unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].player_name, "Jos\u{FFFD} Mauri");
        assert_eq!(players[0].player_id, 123);
    }

    #[test]
    fn test_broken_row_is_skipped() {
        let rows = [
            player_row("odd", "a-player", 1, "A Player"),
            r#"<tr class="even"><td>No inline table here</td></tr>"#.to_string(),
            player_row("even", "b-player", 2, "B Player"),
        ]
        .concat();
        let document = Html::parse_document(&squad_page(&rows));
        let players = parse_players(&document, "https://tm/x").unwrap();
        let ids: Vec<_> = players.iter().map(|p| p.player_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_page_without_players_table() {
        let document = Html::parse_document("<html><body><p>Nothing here</p></body></html>");
        assert!(parse_players(&document, "https://tm/x").unwrap().is_empty());
    }
}
