// src/fetch/urls.rs
use anyhow::{Context, Result};
use url::Url;

/// Default report page: one page per (year, state), the state picked by the fragment.
pub const DEFAULT_PAGE_TEMPLATE: &str =
    "https://www.ic3.gov/Media/PDF/AnnualReport/{period}State/StateReport.aspx#?s={region}";

/// Fill `{period}` and `{region}` in `template` and parse the result.
pub fn page_url(template: &str, period: u32, region: u32) -> Result<Url> {
    let raw = template
        .replace("{period}", &period.to_string())
        .replace("{region}", &region.to_string());
    Url::parse(&raw).with_context(|| format!("parsing page URL {}", raw))
}

/// True when `{region}` only appears after `#`. Fragments are never sent
/// to the server, so every region would fetch the same document.
pub fn region_only_in_fragment(template: &str) -> bool {
    match template.split_once('#') {
        Some((before, after)) => !before.contains("{region}") && after.contains("{region}"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_template() -> Result<()> {
        let url = page_url(DEFAULT_PAGE_TEMPLATE, 2021, 5)?;
        assert_eq!(
            url.as_str(),
            "https://www.ic3.gov/Media/PDF/AnnualReport/2021State/StateReport.aspx#?s=5"
        );
        assert_eq!(url.fragment(), Some("?s=5"));
        Ok(())
    }

    #[test]
    fn detects_fragment_only_region() {
        assert!(region_only_in_fragment(DEFAULT_PAGE_TEMPLATE));
        assert!(!region_only_in_fragment(
            "https://example.org/{period}/state?s={region}"
        ));
        assert!(!region_only_in_fragment(
            "https://example.org/{period}/{region}#top"
        ));
    }

    #[test]
    fn rejects_bad_template() {
        assert!(page_url("not a url {period}", 2020, 1).is_err());
    }
}
