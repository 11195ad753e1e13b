//! Character-window chunking.
//!
//! The input is treated as one flat character stream: windows of
//! `window_size` characters are cut with a stride of `window_size -
//! overlap_size`, starting at offset 0, until the stream is exhausted. The
//! final window may be shorter. This is deliberately character-based over
//! the whole joined text, not line-based segmentation, because it fixes the
//! exact chunk boundaries and thus the exact summarization inputs.

/// Window parameters for chunking.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Characters per window.
    pub window_size: usize,

    /// Characters shared between consecutive windows. Must be smaller than
    /// `window_size`.
    pub overlap_size: usize,
}

impl ChunkerConfig {
    pub fn new(window_size: usize, overlap_size: usize) -> Self {
        Self {
            window_size,
            overlap_size,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.window_size == 0 {
            return Err("window_size must be positive".to_string());
        }
        if self.overlap_size >= self.window_size {
            return Err(format!(
                "overlap_size ({}) must be less than window_size ({})",
                self.overlap_size, self.window_size
            ));
        }
        Ok(())
    }

    /// Characters advanced between window starts.
    pub fn stride(&self) -> usize {
        self.window_size - self.overlap_size
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            window_size: 200,
            overlap_size: 50,
        }
    }
}

/// A contiguous character-range slice of the flattened input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Character range in the source (start, end).
    pub char_range: (usize, usize),

    /// The text content of this window.
    pub content: String,
}

impl Chunk {
    /// Window length in characters.
    pub fn char_count(&self) -> usize {
        self.char_range.1 - self.char_range.0
    }
}

/// Cut a text into overlapping character windows.
///
/// Callers must have validated `config`; an empty text yields no chunks.
pub fn chunk_text(text: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let stride = config.stride();
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + config.window_size).min(chars.len());
        chunks.push(Chunk {
            char_range: (start, end),
            content: chars[start..end].iter().collect(),
        });
        start += stride;
    }

    chunks
}
