/// A sentence borrowed from the source text, terminator included when present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    text: &'a str,
}

impl<'a> Sentence<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Length in characters (not bytes)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A sentence-aligned slice of the source submitted to the extractor as one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// 0-based position in source order
    pub index: usize,
    /// Sentences in source order
    pub sentences: Vec<Sentence<'a>>,
    /// Sum of the sentences' character lengths
    pub char_len: usize,
}

impl<'a> Chunk<'a> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            sentences: Vec::new(),
            char_len: 0,
        }
    }

    pub fn push(&mut self, sentence: Sentence<'a>) {
        self.char_len += sentence.char_len();
        self.sentences.push(sentence);
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Concatenated text of all sentences
    pub fn text(&self) -> String {
        self.sentences.iter().map(|s| s.as_str()).collect()
    }

    /// True if this chunk exceeds the limit, which only a single long sentence may do
    pub fn is_oversized(&self, max_chars: usize) -> bool {
        self.char_len > max_chars
    }
}
