use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("{}: {:?}", css, e)))
}

pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Trimmed text of the first element matching `css`.
pub fn first_text(document: &Html, css: &str) -> Result<Option<String>> {
    let sel = selector(css)?;
    Ok(document
        .select(&sel)
        .next()
        .map(|el| text_of(el).trim().to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKeyword {
    Club,
    Player,
}

impl HeaderKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderKeyword::Club => "club",
            HeaderKeyword::Player => "player",
        }
    }
}

/// First responsive table with a header cell containing `keyword`, ignoring case.
pub fn locate_table(document: &Html, keyword: HeaderKeyword) -> Result<Option<ElementRef<'_>>> {
    let table_selector = selector("div.responsive-table")?;
    let header_selector = selector("th")?;
    let needle = keyword.as_str();

    Ok(document.select(&table_selector).find(|table| {
        table
            .select(&header_selector)
            .any(|th| text_of(th).to_lowercase().contains(needle))
    }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowParity {
    Odd,
    Even,
    Unclassified,
}

impl RowParity {
    pub fn of(row: ElementRef<'_>) -> Self {
        let mut parity = RowParity::Unclassified;
        for class in row.value().classes() {
            match class {
                "odd" => return RowParity::Odd,
                "even" => parity = RowParity::Even,
                _ => {}
            }
        }
        parity
    }
}

/// Rows of the table's first `tbody`, odd rows before even rows.
///
/// Returns `None` when the table has no `tbody`. Rows without a parity class
/// are left out.
pub fn odd_then_even_rows<'a>(table: ElementRef<'a>) -> Result<Option<Vec<ElementRef<'a>>>> {
    let tbody_selector = selector("tbody")?;
    let row_selector = selector("tr")?;

    let Some(tbody) = table.select(&tbody_selector).next() else {
        return Ok(None);
    };

    let mut odd = Vec::new();
    let mut even = Vec::new();
    for row in tbody.select(&row_selector) {
        match RowParity::of(row) {
            RowParity::Odd => odd.push(row),
            RowParity::Even => even.push(row),
            RowParity::Unclassified => {}
        }
    }
    odd.extend(even);
    Ok(Some(odd))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="responsive-table">
            <table><thead><tr><th>Competition</th></tr></thead>
              <tbody><tr class="odd"><td>wrong table</td></tr></tbody>
            </table>
          </div>
          <div class="responsive-table">
            <table><thead><tr><th>#</th><th>Club name</th></tr></thead>
              <tbody>
                <tr class="odd"><td>first</td></tr>
                <tr class="even"><td>second</td></tr>
                <tr class="odd"><td>third</td></tr>
                <tr class="even"><td>fourth</td></tr>
                <tr class="bg_blau_20"><td>separator</td></tr>
                <tr class="odd"><td>fifth</td></tr>
              </tbody>
            </table>
          </div>
        </body></html>
    "#;

    fn row_texts(rows: &[ElementRef<'_>]) -> Vec<String> {
        rows.iter().map(|r| text_of(*r).trim().to_string()).collect()
    }

    #[test]
    fn test_locate_table_by_header_keyword() {
        let document = Html::parse_document(PAGE);
        let table = locate_table(&document, HeaderKeyword::Club).unwrap().unwrap();
        assert!(text_of(table).contains("first"));
        assert!(locate_table(&document, HeaderKeyword::Player).unwrap().is_none());
    }

    #[test]
    fn test_odd_rows_come_before_even_rows() {
        let document = Html::parse_document(PAGE);
        let table = locate_table(&document, HeaderKeyword::Club).unwrap().unwrap();
        let rows = odd_then_even_rows(table).unwrap().unwrap();
        assert_eq!(
            row_texts(&rows),
            vec!["first", "third", "fifth", "second", "fourth"]
        );
    }

    #[test]
    fn test_table_without_body() {
        let document = Html::parse_fragment(
            r#"<div class="responsive-table"><table><tr><th>Player</th></tr></table></div>"#,
        );
        let table = locate_table(&document, HeaderKeyword::Player).unwrap().unwrap();
        // html5ever inserts an implicit tbody around bare rows
        let rows = odd_then_even_rows(table).unwrap().unwrap();
        assert!(rows.is_empty());

        let div_only = Html::parse_fragment(
            r#"<div class="responsive-table"><div><span>Player</span></div></div>"#,
        );
        assert!(locate_table(&div_only, HeaderKeyword::Player).unwrap().is_none());
    }

    #[test]
    fn test_row_parity() {
        let document = Html::parse_fragment(
            r#"<table><tr class="even selected"><td>a</td></tr><tr class="odd"><td>b</td></tr><tr><td>c</td></tr></table>"#,
        );
        let sel = selector("tr").unwrap();
        let parities: Vec<_> = document.select(&sel).map(RowParity::of).collect();
        assert_eq!(
            parities,
            vec![RowParity::Even, RowParity::Odd, RowParity::Unclassified]
        );
    }
}
