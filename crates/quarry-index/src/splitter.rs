//! Boundary-aware text splitter. Prefers paragraph breaks, then line
//! breaks, then word boundaries; text without usable boundaries falls back
//! to a hard character window. Lengths are counted in characters, not bytes.

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// A contiguous piece of the corpus, tagged with its position in split order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub index: usize,
}

/// Separator precedence, coarsest first.
const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            chunk_overlap: config.chunk_overlap.min(config.chunk_size.saturating_sub(1)),
        }
    }

    /// Split `text` into chunks of at most `chunk_size` characters, with
    /// consecutive chunks sharing up to `chunk_overlap` characters. Every
    /// chunk is an exact substring of `text`.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let chunks = if text.chars().count() <= self.chunk_size {
            vec![text.to_owned()]
        } else {
            let units = self.split_units(text, SEPARATORS);
            self.merge_units(&units)
        };

        chunks
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk { content, index })
            .collect()
    }

    /// Break `text` into units no longer than `chunk_size`, splitting at the
    /// coarsest separator that works. Separators stay attached to the
    /// preceding unit so that concatenating units reconstructs the input.
    fn split_units(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let Some((sep, finer)) = separators.split_first() else {
            return self.split_chars(text);
        };

        let mut units = Vec::new();
        for piece in split_after(text, sep) {
            if piece.chars().count() <= self.chunk_size {
                units.push(piece);
            } else {
                units.extend(self.split_units(&piece, finer));
            }
        }
        units
    }

    /// Merge units into chunks, respecting size and overlap.
    fn merge_units(&self, units: &[String]) -> Vec<String> {
        let lens: Vec<usize> = units.iter().map(|u| u.chars().count()).collect();
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;
        // Sliding window: track only the unit indices contributing to the
        // current chunk.
        let mut window_start = 0;

        for (idx, unit) in units.iter().enumerate() {
            if current_len > 0 && current_len + lens[idx] > self.chunk_size {
                chunks.push(std::mem::take(&mut current));

                // Build overlap from trailing units, walking backwards while
                // both the overlap budget and the chunk size allow it.
                let mut overlap_len = 0;
                let mut overlap_start = idx;
                for i in (window_start..idx).rev() {
                    if overlap_len + lens[i] > self.chunk_overlap
                        || overlap_len + lens[i] + lens[idx] > self.chunk_size
                    {
                        break;
                    }
                    overlap_len += lens[i];
                    overlap_start = i;
                }
                for seed in &units[overlap_start..idx] {
                    current.push_str(seed);
                }
                current_len = overlap_len;
                window_start = overlap_start;
            }

            current.push_str(unit);
            current_len += lens[idx];
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    /// Hard character window. Consecutive windows share exactly
    /// `chunk_overlap` characters; the final window may be shorter.
    fn split_chars(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

fn split_after(text: &str, sep: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(sep) {
        let end = pos + sep.len();
        pieces.push(rest[..end].to_owned());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest.to_owned());
    }
    pieces
}
