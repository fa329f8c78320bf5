// src/fetch/page.rs

use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::{debug, trace};

use crate::process::RawRow;

/// One table-like block of a report page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBlock {
    pub caption: String,
    /// Header row text, one header cell per line, with a boundary line
    /// break on either side (`"\nA\nB\n"`).
    pub header_text: String,
    /// One entry per physical `<tr>`; header rows come through empty.
    pub rows: Vec<RawRow>,
}

/// The parts of a report page the extractor needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDocument {
    pub blocks: Vec<TableBlock>,
    /// Region selector options: identifier → display name.
    pub regions: BTreeMap<u32, String>,
}

impl PageDocument {
    pub fn region_name(&self, id: u32) -> Option<&str> {
        self.regions.get(&id).map(String::as_str)
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static CSS selector should be valid")
}

/// Text content of an element, whitespace collapsed.
fn cell_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a rendered state report page into its table blocks and region options.
pub fn parse_page(html: &str) -> PageDocument {
    let doc = Html::parse_document(html);

    let article_sel = selector("article");
    let caption_sel = selector("caption");
    let header_row_sel = selector("thead tr");
    let header_cell_sel = selector("th, td");
    let row_sel = selector("tr");
    let data_cell_sel = selector("td");
    let option_sel = selector("option[value]");

    let mut blocks = Vec::new();
    for article in doc.select(&article_sel) {
        let caption = article
            .select(&caption_sel)
            .next()
            .map(cell_text)
            .unwrap_or_default();

        let header_text = article
            .select(&header_row_sel)
            .next()
            .map(|tr| {
                let cells: Vec<String> = tr.select(&header_cell_sel).map(cell_text).collect();
                if cells.is_empty() {
                    String::new()
                } else {
                    format!("\n{}\n", cells.join("\n"))
                }
            })
            .unwrap_or_default();

        let rows: Vec<RawRow> = article
            .select(&row_sel)
            .map(|tr| tr.select(&data_cell_sel).map(cell_text).collect())
            .collect();

        trace!(caption = %caption, rows = rows.len(), "parsed table block");
        blocks.push(TableBlock {
            caption,
            header_text,
            rows,
        });
    }

    let regions: BTreeMap<u32, String> = doc
        .select(&option_sel)
        .filter_map(|opt| {
            let id = opt.value().attr("value")?.trim().parse::<u32>().ok()?;
            Some((id, cell_text(opt)))
        })
        .collect();

    debug!(blocks = blocks.len(), regions = regions.len(), "parsed page");
    PageDocument { blocks, regions }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<select id="state">
  <option value="1">Alabama</option>
  <option value="9">District of Columbia</option>
  <option value="">Choose</option>
</select>
<article>
  <table>
    <caption>Crime Type by Subject Count</caption>
    <thead>
      <tr>
        <th>Crime Type</th><th>Subject Count</th>
        <th>Crime Type</th><th>Subject Count</th>
      </tr>
    </thead>
    <tbody>
      <tr><td> Phishing </td><td>1,024</td><td>Extortion</td><td>87</td></tr>
      <tr><td colspan="4">Totals</td></tr>
    </tbody>
  </table>
</article>
</body></html>"#;

    #[test]
    fn parses_blocks_and_regions() {
        let page = parse_page(PAGE);

        assert_eq!(page.region_name(1), Some("Alabama"));
        assert_eq!(page.region_name(9), Some("District of Columbia"));
        assert_eq!(page.regions.len(), 2);

        assert_eq!(page.blocks.len(), 1);
        let block = &page.blocks[0];
        assert_eq!(block.caption, "Crime Type by Subject Count");
        assert_eq!(
            block.header_text,
            "\nCrime Type\nSubject Count\nCrime Type\nSubject Count\n"
        );
        assert_eq!(block.rows.len(), 3);
        assert!(block.rows[0].is_empty());
        assert_eq!(block.rows[1], vec!["Phishing", "1,024", "Extortion", "87"]);
        assert_eq!(block.rows[2], vec!["Totals"]);
    }

    #[test]
    fn page_without_articles_is_empty() {
        let page = parse_page("<html><body><p>maintenance</p></body></html>");
        assert!(page.blocks.is_empty());
        assert!(page.regions.is_empty());
    }
}
