//! Approximate token counts for generated bundles.

use std::sync::OnceLock;
use tiktoken_rs::{cl100k_base, CoreBPE};

static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn encoder() -> Option<&'static CoreBPE> {
    ENCODER
        .get_or_init(|| match cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!("cl100k tokenizer unavailable, using a rough estimate: {}", e);
                None
            }
        })
        .as_ref()
}

/// Counts tokens with the cl100k encoding, or estimates four characters per
/// token when the encoding cannot be loaded.
pub fn estimate_tokens(text: &str) -> usize {
    match encoder() {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => rough_estimate(text),
    }
}

fn rough_estimate(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_no_tokens() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_estimate_grows_with_text() {
        let short = estimate_tokens("fn main() {}");
        let long = estimate_tokens(&"fn main() {}\n".repeat(50));
        assert!(short > 0);
        assert!(long > short);
    }

    #[test]
    fn test_rough_estimate() {
        assert_eq!(rough_estimate("abcd"), 1);
        assert_eq!(rough_estimate("abcde"), 2);
        assert_eq!(rough_estimate("ééé"), 1);
    }
}
