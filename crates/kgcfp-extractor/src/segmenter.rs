//! Heading segmentation and overlapping chunking of Markdown documents

use crate::config::{ExtractorConfig, HeadlessPolicy};

/// A heading-delimited section of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    /// Heading text without the `#` markers
    pub heading: &'a str,
    /// Trimmed section body
    pub body: &'a str,
}

/// A slice of section text sized for one completion call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunk<'a> {
    /// Chunk text
    pub text: &'a str,
    /// Offset of the first character, in characters
    pub start: usize,
    /// Offset one past the last character, in characters
    pub end: usize,
}

/// Splits documents into sections and sections into chunks
#[derive(Debug, Clone)]
pub struct Segmenter {
    headless: HeadlessPolicy,
    min_section_chars: usize,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Segmenter {
    /// Create a segmenter from the extractor configuration
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            headless: config.headless.clone(),
            min_section_chars: config.min_section_chars,
            chunk_size: config.chunk_size.max(1),
            chunk_overlap: config.chunk_overlap,
        }
    }

    /// Sections of `text` whose body reaches the minimum length
    ///
    /// The iterator is lazy; cloning it or calling this again restarts the
    /// sequence.
    pub fn sections<'a>(&'a self, text: &'a str) -> Sections<'a> {
        let heading = match &self.headless {
            HeadlessPolicy::Drop => None,
            HeadlessPolicy::DefaultSection(heading) => Some(heading.as_str()),
        };

        Sections {
            text,
            pos: 0,
            heading,
            body_start: 0,
            min_chars: self.min_section_chars,
            finished: false,
        }
    }

    /// Overlapping chunks of `text`
    pub fn chunks<'a>(&self, text: &'a str) -> Chunks<'a> {
        Chunks {
            text,
            total: text.chars().count(),
            size: self.chunk_size,
            overlap: self.chunk_overlap,
            start: 0,
            start_byte: 0,
            prev_end: 0,
            finished: false,
        }
    }
}

/// Parse a Markdown ATX heading (`#` to `######`, whitespace, text)
pub fn parse_heading(line: &str) -> Option<&str> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }

    let rest = &line[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let title = rest.trim();
    (!title.is_empty()).then_some(title)
}

/// Iterator over the sections of a document
#[derive(Debug, Clone)]
pub struct Sections<'a> {
    text: &'a str,
    pos: usize,
    heading: Option<&'a str>,
    body_start: usize,
    min_chars: usize,
    finished: bool,
}

impl<'a> Sections<'a> {
    fn close(&self, heading: Option<&'a str>, body_end: usize) -> Option<Section<'a>> {
        let heading = heading?;
        let body = self.text[self.body_start..body_end].trim();
        if body.is_empty() || body.chars().count() < self.min_chars {
            return None;
        }
        Some(Section { heading, body })
    }
}

impl<'a> Iterator for Sections<'a> {
    type Item = Section<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            if self.pos >= self.text.len() {
                self.finished = true;
                return self.close(self.heading, self.text.len());
            }

            let line_start = self.pos;
            let line_end = self.text[line_start..]
                .find('\n')
                .map_or(self.text.len(), |i| line_start + i);
            self.pos = (line_end + 1).min(self.text.len());

            if let Some(heading) = parse_heading(&self.text[line_start..line_end]) {
                let section = self.close(self.heading, line_start);
                self.heading = Some(heading);
                self.body_start = self.pos;
                if section.is_some() {
                    return section;
                }
            }
        }
        None
    }
}

/// Iterator over overlapping chunks of a text
///
/// Each chunk holds at most `chunk_size` characters. A non-final chunk ends at
/// the last newline inside its window when that newline lies beyond both the
/// overlap and the previous chunk's end; otherwise the window is cut hard.
/// Starts and ends strictly increase, and consecutive chunks share exactly
/// `chunk_overlap` characters.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    total: usize,
    size: usize,
    overlap: usize,
    start: usize,
    start_byte: usize,
    prev_end: usize,
    finished: bool,
}

impl<'a> Chunks<'a> {
    /// Byte offset reached by walking `chars` characters forward from `from`
    fn forward(&self, from: usize, chars: usize) -> usize {
        self.text[from..]
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(i, _)| from + i)
    }

    /// Byte offset reached by walking `chars` characters back from `from`
    fn backward(&self, from: usize, chars: usize) -> usize {
        if chars == 0 {
            return from;
        }
        self.text[..from]
            .char_indices()
            .rev()
            .nth(chars - 1)
            .map_or(0, |(i, _)| i)
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = TextChunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.start >= self.total {
            return None;
        }

        let start = self.start;
        let start_byte = self.start_byte;

        if start + self.size >= self.total {
            self.finished = true;
            return Some(TextChunk {
                text: &self.text[start_byte..],
                start,
                end: self.total,
            });
        }

        let mut end = start + self.size;
        let mut end_byte = self.forward(start_byte, self.size);
        if let Some(newline) = self.text[start_byte..end_byte].rfind('\n') {
            let snapped = self.text[start_byte..start_byte + newline].chars().count();
            if snapped > self.overlap && start + snapped > self.prev_end {
                end_byte = start_byte + newline;
                end = start + snapped;
            }
        }
        self.prev_end = end;

        let next = end.saturating_sub(self.overlap);
        if next > start {
            self.start = next;
            self.start_byte = self.backward(end_byte, end - next);
        } else {
            self.start = end;
            self.start_byte = end_byte;
        }

        Some(TextChunk {
            text: &self.text[start_byte..end_byte],
            start,
            end,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn segmenter(min_section_chars: usize, chunk_size: usize, chunk_overlap: usize) -> Segmenter {
        Segmenter::new(&ExtractorConfig {
            min_section_chars,
            chunk_size,
            chunk_overlap,
            ..Default::default()
        })
    }

    #[test]
    fn test_parse_heading() {
        assert_eq!(parse_heading("# 画家小传"), Some("画家小传"));
        assert_eq!(parse_heading("###### 深"), Some("深"));
        assert_eq!(parse_heading("##\t卷一  "), Some("卷一"));
        assert_eq!(parse_heading("####### 太深"), None);
        assert_eq!(parse_heading("#没有空格"), None);
        assert_eq!(parse_heading("#   "), None);
        assert_eq!(parse_heading("正文 # 不是标题"), None);
    }

    #[test]
    fn test_sections_by_heading() {
        let seg = segmenter(1, 3000, 200);
        let text = "前言被丢弃\n# 卷一\n顾恺之\n## 卷二\n\n吴道子\n";
        let sections: Vec<_> = seg.sections(text).collect();

        assert_eq!(
            sections,
            vec![
                Section { heading: "卷一", body: "顾恺之" },
                Section { heading: "卷二", body: "吴道子" },
            ]
        );
    }

    #[test]
    fn test_short_sections_are_skipped() {
        let seg = segmenter(100, 3000, 200);
        let long = "画".repeat(100);
        let text = format!("# 短\n太短了\n# 长\n{}\n", long);

        let sections: Vec<_> = seg.sections(&text).collect();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "长");
        // counted in characters, not bytes
        assert_eq!(sections[0].body.chars().count(), 100);
    }

    #[test]
    fn test_empty_heading_sections_are_skipped() {
        let seg = segmenter(1, 3000, 200);
        let sections: Vec<_> = seg.sections("# 一\n# 二\n正文\n").collect();
        assert_eq!(sections, vec![Section { heading: "二", body: "正文" }]);
    }

    #[test]
    fn test_headless_document_dropped_by_default() {
        let seg = segmenter(1, 3000, 200);
        assert_eq!(seg.sections("没有任何标题的文档").count(), 0);
        assert_eq!(seg.sections("").count(), 0);
    }

    #[test]
    fn test_headless_document_as_default_section() {
        let seg = Segmenter::new(&ExtractorConfig {
            min_section_chars: 1,
            headless: HeadlessPolicy::DefaultSection("正文".to_string()),
            ..Default::default()
        });

        let sections: Vec<_> = seg.sections("序言\n# 卷一\n内容").collect();
        assert_eq!(sections[0], Section { heading: "正文", body: "序言" });
        assert_eq!(sections[1], Section { heading: "卷一", body: "内容" });

        let whole: Vec<_> = seg.sections("没有标题").collect();
        assert_eq!(whole, vec![Section { heading: "正文", body: "没有标题" }]);
        assert_eq!(seg.sections("").count(), 0);
    }

    #[test]
    fn test_sections_restart() {
        let seg = segmenter(1, 3000, 200);
        let text = "# A\nx\n# B\ny";
        let sections = seg.sections(text);
        let first: Vec<_> = sections.clone().collect();
        let second: Vec<_> = sections.collect();
        assert_eq!(first, second);
        assert_eq!(seg.sections(text).count(), 2);
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let seg = segmenter(1, 100, 10);
        let chunks: Vec<_> = seg.chunks("短文本").collect();
        assert_eq!(chunks, vec![TextChunk { text: "短文本", start: 0, end: 3 }]);
        assert_eq!(seg.chunks("").count(), 0);
    }

    #[test]
    fn test_chunks_snap_to_newline() {
        let seg = segmenter(1, 10, 2);
        let text = "一二三四五六\n七八九十甲乙丙丁";
        let chunks: Vec<_> = seg.chunks(text).collect();

        assert_eq!(
            chunks,
            vec![
                TextChunk { text: "一二三四五六", start: 0, end: 6 },
                // the newline is inside the overlap, so this window is cut hard
                TextChunk { text: "五六\n七八九十甲乙丙", start: 4, end: 14 },
                TextChunk { text: "乙丙丁", start: 12, end: 15 },
            ]
        );
    }

    #[test]
    fn test_long_paragraph_after_newline_keeps_overlap() {
        let seg = segmenter(1, 10, 3);
        let text = format!("aaaaaaa\n{}", "b".repeat(20));
        let chunks: Vec<_> = seg.chunks(&text).collect();

        assert_eq!(chunks[0], TextChunk { text: "aaaaaaa", start: 0, end: 7 });
        assert_eq!((chunks[1].start, chunks[1].end), (4, 14));
        for pair in chunks.windows(2) {
            assert!(pair[1].end > pair[0].end, "chunk {:?} adds no new text", pair[1].text);
            assert_eq!(pair[0].end - pair[1].start, 3);
        }
    }

    #[test]
    fn test_no_redundant_tail_chunk() {
        let seg = segmenter(1, 10, 3);
        let text = "a".repeat(17);
        let chunks: Vec<_> = seg.chunks(&text).collect();

        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start, chunks[0].end), (0, 10));
        assert_eq!((chunks[1].start, chunks[1].end), (7, 17));
    }

    #[test]
    fn test_chunks_always_advance() {
        // the newline right after the start leaves a window shorter than the overlap
        let seg = segmenter(1, 10, 8);
        let text = format!("ab\n{}", "c".repeat(30));
        let chunks: Vec<_> = seg.chunks(&text).collect();

        for pair in chunks.windows(2) {
            assert!(pair[1].start > pair[0].start);
        }
        assert_eq!(chunks.last().unwrap().end, text.chars().count());
    }

    proptest! {
        #[test]
        fn prop_chunks_cover_text(
            text in "[a-z\n中文]{0,300}",
            size in 1usize..60,
            overlap_seed in 0usize..60,
        ) {
            let overlap = overlap_seed % size;
            let seg = segmenter(1, size, overlap);
            let chars: Vec<char> = text.chars().collect();
            let chunks: Vec<_> = seg.chunks(&text).collect();

            if chars.is_empty() {
                prop_assert!(chunks.is_empty());
            } else {
                prop_assert_eq!(chunks[0].start, 0);
                prop_assert_eq!(chunks.last().unwrap().end, chars.len());
                for chunk in &chunks {
                    prop_assert!(chunk.end - chunk.start <= size);
                    let expected: String = chars[chunk.start..chunk.end].iter().collect();
                    prop_assert_eq!(chunk.text, expected.as_str());
                }
                for pair in chunks.windows(2) {
                    prop_assert!(pair[1].start > pair[0].start);
                    prop_assert!(pair[1].end > pair[0].end);
                    let shared = pair[0].end - pair[1].start;
                    prop_assert_eq!(shared, overlap.min(pair[0].end - pair[0].start));
                }
            }
        }
    }
}
