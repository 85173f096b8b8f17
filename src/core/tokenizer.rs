//! Tokenizer Selection Module
//!
//! Maps a model name to the tokenizer that model uses and counts tokens with
//! it. Production uses tiktoken encodings; the registry is a trait so the
//! count endpoint can be exercised with a stub.

use dashmap::DashMap;
use std::sync::Arc;
use tiktoken_rs::tokenizer::{get_tokenizer, Tokenizer as Encoding};
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Something that can count the tokens of a text.
pub trait Tokenizer: Send + Sync {
    /// Number of tokens in `text`.
    ///
    /// Special tokens such as `<|endoftext|>` are encoded as ordinary text,
    /// never as control tokens.
    fn count_tokens(&self, text: &str) -> usize;
}

/// Resolves model names to tokenizers.
pub trait TokenizerRegistry: Send + Sync {
    /// Tokenizer for `model`, or `None` if the model is unknown.
    fn tokenizer_for_model(&self, model: &str) -> Option<Arc<dyn Tokenizer>>;
}

/// A tiktoken BPE encoding.
pub struct TiktokenTokenizer {
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    pub fn new(bpe: CoreBPE) -> Self {
        Self { bpe }
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Registry backed by tiktoken's model table.
///
/// Loading an encoding parses its whole rank file, so each encoding is built
/// once and shared. The cache is keyed by encoding rather than by model name,
/// which keeps it bounded no matter how many model aliases callers send.
#[derive(Default)]
pub struct TiktokenRegistry {
    cache: DashMap<String, Arc<dyn Tokenizer>>,
}

impl TiktokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn load(name: &str, encoding: Encoding) -> Option<Arc<dyn Tokenizer>> {
        debug!(encoding = name, "Loading tiktoken encoding");
        match tiktoken_rs::get_bpe_from_tokenizer(encoding) {
            Ok(bpe) => Some(Arc::new(TiktokenTokenizer::new(bpe))),
            Err(e) => {
                warn!(encoding = name, "Failed to load tiktoken encoding: {}", e);
                None
            }
        }
    }
}

impl TokenizerRegistry for TiktokenRegistry {
    fn tokenizer_for_model(&self, model: &str) -> Option<Arc<dyn Tokenizer>> {
        let encoding = get_tokenizer(model)?;
        let key = format!("{:?}", encoding);

        if let Some(tokenizer) = self.cache.get(&key) {
            return Some(tokenizer.clone());
        }

        let tokenizer = Self::load(&key, encoding)?;
        Some(
            self.cache
                .entry(key)
                .or_insert(tokenizer)
                .value()
                .clone(),
        )
    }
}
