/*
 * This module provides token estimates for finished bundles, so a run summary
 * shows roughly how much model context each bundle would take. It defines an
 * abstraction `TokenCounterOperations` and two implementations:
 * `CoreTikTokenCounter` backed by `tiktoken-rs` and `SimpleWhitespaceTokenCounter`
 * for a cheap word count.
 */
use log::error;
use tiktoken_rs::{CoreBPE, cl100k_base};

pub trait TokenCounterOperations {
    fn count_tokens(&self, text: &str) -> usize;
}

/*
 * Counts tokens with the "cl100k_base" encoding. The BPE tables are loaded
 * once at construction; if loading fails, the error is logged and every count
 * falls back to a whitespace split.
 */
pub struct CoreTikTokenCounter {
    bpe: Option<CoreBPE>,
}

impl CoreTikTokenCounter {
    pub fn new() -> Self {
        let bpe = match cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                error!(
                    "Failed to initialize TikToken BPE (cl100k_base): {e:?}. Falling back to whitespace token count."
                );
                None
            }
        };
        CoreTikTokenCounter { bpe }
    }
}

impl Default for CoreTikTokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounterOperations for CoreTikTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => text.split_whitespace().count(),
        }
    }
}

pub struct SimpleWhitespaceTokenCounter;

impl SimpleWhitespaceTokenCounter {
    pub fn new() -> Self {
        SimpleWhitespaceTokenCounter
    }
}

impl Default for SimpleWhitespaceTokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounterOperations for SimpleWhitespaceTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_whitespace_counter_empty_string() {
        let counter = SimpleWhitespaceTokenCounter::new();
        assert_eq!(counter.count_tokens(""), 0);
    }

    #[test]
    fn test_simple_whitespace_counter_mixed_whitespace() {
        let counter = SimpleWhitespaceTokenCounter::new();
        assert_eq!(counter.count_tokens("hello\tworld\r\nexample"), 3);
    }

    #[test]
    fn test_simple_whitespace_counter_bundle_header() {
        let counter = SimpleWhitespaceTokenCounter::new();
        assert_eq!(counter.count_tokens("# FILE: ui/Panel.tsx\n"), 3);
    }

    #[test]
    fn test_core_tiktoken_counter_empty_string() {
        let counter = CoreTikTokenCounter::new();
        assert_eq!(counter.count_tokens(""), 0);
    }

    #[test]
    fn test_core_tiktoken_counter_simple_text() {
        let counter = CoreTikTokenCounter::new();
        // "hello world" is 2 tokens with cl100k_base.
        assert_eq!(counter.count_tokens("hello world"), 2);
    }

    #[test]
    fn test_core_tiktoken_counter_reused_across_calls() {
        let counter = CoreTikTokenCounter::new();
        let first = counter.count_tokens("This is a test sentence for the tokenizer.");
        let second = counter.count_tokens("This is a test sentence for the tokenizer.");
        assert_eq!(first, 9);
        assert_eq!(first, second);
    }
}
