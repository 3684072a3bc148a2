//! Quote extraction from page markup.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ExtractConfig, Quote};

const OPEN_QUOTE: char = '\u{201C}';
const CLOSE_QUOTE: char = '\u{201D}';

/// Strip one pair of typographic quotation marks bounding `text`.
///
/// Text not both opened by `“` and closed by `”` is returned unchanged.
pub fn clean_quote_text(text: &str) -> &str {
    text.strip_prefix(OPEN_QUOTE)
        .and_then(|inner| inner.strip_suffix(CLOSE_QUOTE))
        .unwrap_or(text)
}

/// Parses quote containers out of a page using configured selectors.
pub struct QuoteExtractor {
    container: Selector,
    text: Selector,
    author: Selector,
}

impl QuoteExtractor {
    pub fn new(config: &ExtractConfig) -> Result<Self> {
        Ok(Self {
            container: Self::parse_selector(&config.container_selector)?,
            text: Self::parse_selector(&config.text_selector)?,
            author: Self::parse_selector(&config.author_selector)?,
        })
    }

    /// Extract one quote per container in `markup`.
    ///
    /// Every container yields a quote. A missing text or author element
    /// gives an empty field. Text is kept as found apart from the bounding
    /// quotation marks; the author is trimmed.
    pub fn extract(&self, markup: &str) -> Vec<Quote> {
        let document = Html::parse_document(markup);
        document
            .select(&self.container)
            .map(|container| self.parse_container(&container))
            .collect()
    }

    fn parse_container(&self, container: &ElementRef) -> Quote {
        let raw_text = Self::first_text(container, &self.text);
        let raw_author = Self::first_text(container, &self.author);
        Quote::new(clean_quote_text(&raw_text), raw_author.trim())
    }

    fn first_text(container: &ElementRef, selector: &Selector) -> String {
        container
            .select(selector)
            .next()
            .map_or(String::new(), |el| el.text().collect())
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div class="quote">
            <span class="text">“The world as we have created it is a process of our thinking.”</span>
            <span>by <small class="author">Albert Einstein</small></span>
        </div>
        <div class="quote">
            <span class="text">“It is our choices, Harry, that show what we truly are.”</span>
            <span>by <small class="author">J.K. Rowling</small></span>
        </div>
        <div class="quote">
            <span class="text">A day without sunshine is like, you know, night.</span>
        </div>
        <div class="quote"><small class="author">Nobody</small></div>
    </body></html>"#;

    fn extractor() -> QuoteExtractor {
        QuoteExtractor::new(&ExtractConfig::default()).unwrap()
    }

    #[test]
    fn test_clean_strips_outer_pair_only() {
        assert_eq!(clean_quote_text("“Hello”"), "Hello");
        assert_eq!(clean_quote_text("““Nested””"), "“Nested”");
        assert_eq!(
            clean_quote_text("“He said \"hi\" to me”"),
            "He said \"hi\" to me"
        );
        assert_eq!(clean_quote_text("“”"), "");
    }

    #[test]
    fn test_clean_is_identity_without_pair() {
        for text in [
            "",
            "“",
            "”",
            "x",
            "\"straight quotes\"",
            "“only opening",
            "only closing”",
            "”reversed“",
        ] {
            assert_eq!(clean_quote_text(text), text);
        }
    }

    #[test]
    fn test_extract_quotes() {
        let quotes = extractor().extract(PAGE);

        assert_eq!(quotes.len(), 4);
        assert_eq!(
            quotes[0],
            Quote::new(
                "The world as we have created it is a process of our thinking.",
                "Albert Einstein"
            )
        );
        assert_eq!(quotes[1].author, "J.K. Rowling");
        assert_eq!(
            quotes[2].text,
            "A day without sunshine is like, you know, night."
        );
        // No author element: empty on write, never the read-side sentinel.
        assert_eq!(quotes[2].author, "");
    }

    #[test]
    fn test_every_container_yields_a_quote() {
        let quotes = extractor().extract(PAGE);
        assert_eq!(quotes[3], Quote::new("", "Nobody"));
    }

    #[test]
    fn test_text_kept_untrimmed_author_trimmed() {
        let quotes = extractor().extract(
            r#"<div class="quote"><span class="text"> “Padded” </span>
            <small class="author">
                Jane Austen
            </small></div>"#,
        );
        // Surrounding whitespace means the marks do not bound the text.
        assert_eq!(quotes, vec![Quote::new(" “Padded” ", "Jane Austen")]);
    }

    #[test]
    fn test_extract_empty_page() {
        let quotes = extractor().extract("<html><body><p>No quotes found!</p></body></html>");
        assert!(quotes.is_empty());
    }

    #[test]
    fn test_extract_tolerates_malformed_markup() {
        let quotes = extractor().extract(
            r#"<div class="quote"><span class="text">“Unclosed”</span><small class="author">Anon"#,
        );
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0], Quote::new("Unclosed", "Anon"));
    }

    #[test]
    fn test_extract_keeps_replacement_characters() {
        let quotes = extractor().extract(
            "<div class=\"quote\"><span class=\"text\">“Caf\u{FFFD}”</span></div>",
        );
        assert_eq!(quotes, vec![Quote::new("Caf\u{FFFD}", "")]);
    }

    #[test]
    fn test_custom_selectors() {
        let config = ExtractConfig {
            container_selector: "blockquote".into(),
            text_selector: "p".into(),
            author_selector: "cite".into(),
        };
        let extractor = QuoteExtractor::new(&config).unwrap();
        let quotes = extractor
            .extract("<blockquote><p>“Less is more.”</p><cite>Mies</cite></blockquote>");
        assert_eq!(quotes, vec![Quote::new("Less is more.", "Mies")]);
    }

    #[test]
    fn test_invalid_selector() {
        let config = ExtractConfig {
            container_selector: "[[invalid".into(),
            ..ExtractConfig::default()
        };
        assert!(QuoteExtractor::new(&config).is_err());
    }
}
