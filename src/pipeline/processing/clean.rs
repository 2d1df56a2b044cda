use once_cell::sync::Lazy;
use regex::Regex;

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("valid url regex"));
static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").expect("valid mention regex"));
// Anything that is not a word character, whitespace or a quote mark
static NOISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\w\s'"]"#).expect("valid noise regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Strip URLs, @mentions and punctuation from free text, then collapse
/// whitespace. Missing input yields an empty string.
pub fn clean_text(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };
    let s = URL_RE.replace_all(text, "");
    let s = MENTION_RE.replace_all(&s, "");
    let s = NOISE_RE.replace_all(&s, " ");
    let s = WHITESPACE_RE.replace_all(&s, " ");
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_empty() {
        assert_eq!(clean_text(None), "");
    }

    #[test]
    fn test_strips_mentions_urls_and_punctuation() {
        assert_eq!(
            clean_text(Some("Stocks @elonmusk surge! http://x.co")),
            "Stocks surge"
        );
        assert_eq!(
            clean_text(Some("see https://a.b/c?d=1, then   go")),
            "see then go"
        );
    }

    #[test]
    fn test_keeps_quotes_and_word_characters() {
        assert_eq!(
            clean_text(Some("It's \"big\" ~ ümlaut_ok #1")),
            "It's \"big\" ümlaut_ok 1"
        );
    }

    #[test]
    fn test_punctuation_only_becomes_empty() {
        assert_eq!(clean_text(Some("!!! ... ???")), "");
        assert_eq!(clean_text(Some("   ")), "");
    }

    #[test]
    fn test_is_deterministic() {
        let input = Some("b'Georgia @user downs #2 http://t.co/x Tech!'");
        assert_eq!(clean_text(input), clean_text(input));
    }
}
