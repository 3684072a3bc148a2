// src/utils/url.rs

//! URL helpers for paginated sources.

/// Build the URL of page `page` under `base`.
///
/// # Examples
/// ```
/// use harvester::utils::url::page_url;
///
/// assert_eq!(
///     page_url("https://quotes.toscrape.com", 3),
///     "https://quotes.toscrape.com/page/3/"
/// );
/// ```
pub fn page_url(base: &str, page: u32) -> String {
    format!("{}/page/{}/", base.trim_end_matches('/'), page)
}
