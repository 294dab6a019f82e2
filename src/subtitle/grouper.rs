//! Groups transcribed words into subtitle blocks.
//!
//! Word-level segments are packed greedily: words are appended until the text
//! reaches `min_chars`, then the block is cut. There is no look-ahead and the
//! last block of a segment may stay short. Flat segments pass through as one
//! block each. Indices run from 1 across the whole transcription.

use std::time::Duration;

use crate::subtitle::{SubtitleBlock, seconds_to_duration};
use crate::transcribe::{Segment, Word};

pub const DEFAULT_MIN_CHARS: usize = 10;

/// Block under construction. Timing lives next to the text, so a non-empty
/// block always knows where it starts.
struct Pending {
    text: String,
    chars: usize,
    start: Duration,
    end: Duration,
}

impl Pending {
    fn push_word(&mut self, word: &str) {
        if self.chars > 0 {
            self.text.push(' ');
            self.chars += 1;
        }
        self.text.push_str(word);
        self.chars += word.chars().count();
    }

    fn into_block(self, index: usize) -> SubtitleBlock {
        SubtitleBlock::new(index, self.start, self.end, self.text)
    }
}

pub fn group_all(segments: &[Segment], min_chars: usize) -> Vec<SubtitleBlock> {
    let (blocks, next_index) = segments.iter().fold(
        (Vec::new(), 1),
        |(mut blocks, index), segment| {
            let next = match segment {
                Segment::Words { words } => group_words(words, min_chars, index, &mut blocks),
                Segment::Flat { start, end, text } => {
                    blocks.push(SubtitleBlock::new(
                        index,
                        seconds_to_duration(*start),
                        seconds_to_duration(*end),
                        text.trim(),
                    ));
                    index + 1
                }
            };
            (blocks, next)
        },
    );

    log::debug!(
        "grouped {} segments into {} blocks (min_chars={})",
        segments.len(),
        next_index - 1,
        min_chars
    );
    blocks
}

/// Accumulates one word-level segment into `out`, numbering from `index`.
/// Returns the index the next segment should start from.
pub fn group_words(
    words: &[Word],
    min_chars: usize,
    mut index: usize,
    out: &mut Vec<SubtitleBlock>,
) -> usize {
    let mut pending: Option<Pending> = None;

    for word in words {
        let text = word.text.trim();
        if text.is_empty() {
            continue;
        }

        let block = pending.get_or_insert_with(|| Pending {
            text: String::new(),
            chars: 0,
            start: seconds_to_duration(word.start),
            end: Duration::ZERO,
        });
        block.push_word(text);
        block.end = seconds_to_duration(word.end);

        if block.chars >= min_chars {
            if let Some(full) = pending.take() {
                out.push(full.into_block(index));
                index += 1;
            }
        }
    }

    // trailing block may be shorter than min_chars
    if let Some(rest) = pending {
        out.push(rest.into_block(index));
        index += 1;
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn hi_there_friend() -> Segment {
        Segment::Words {
            words: vec![
                Word::new("Hi", 0.0, 0.5),
                Word::new("there", 0.5, 1.0),
                Word::new("friend", 1.0, 1.6),
            ],
        }
    }

    fn hello_world() -> Segment {
        Segment::Flat {
            start: 2.0,
            end: 4.0,
            text: " Hello world ".to_string(),
        }
    }

    #[test]
    fn test_single_block_when_threshold_reached_at_last_word() {
        let blocks = group_all(&[hi_there_friend()], 10);
        assert_eq!(
            blocks,
            vec![SubtitleBlock::new(1, ms(0), ms(1600), "Hi there friend")]
        );
    }

    #[test]
    fn test_small_threshold_cuts_every_word() {
        let blocks = group_all(&[hi_there_friend()], 2);
        assert_eq!(
            blocks,
            vec![
                SubtitleBlock::new(1, ms(0), ms(500), "Hi"),
                SubtitleBlock::new(2, ms(500), ms(1000), "there"),
                SubtitleBlock::new(3, ms(1000), ms(1600), "friend"),
            ]
        );
    }

    #[test]
    fn test_flat_segment_is_trimmed_and_indexed_after_words() {
        let blocks = group_all(&[hi_there_friend(), hello_world()], 10);
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[1],
            SubtitleBlock::new(2, ms(2000), ms(4000), "Hello world")
        );

        let blocks = group_all(&[hi_there_friend(), hello_world()], 2);
        assert_eq!(
            blocks[3],
            SubtitleBlock::new(4, ms(2000), ms(4000), "Hello world")
        );
    }

    #[test]
    fn test_blank_word_segment_emits_nothing() {
        let blank = Segment::Words {
            words: vec![Word::new("   ", 0.0, 0.3)],
        };
        let blocks = group_all(&[blank, hello_world()], 10);
        assert_eq!(
            blocks,
            vec![SubtitleBlock::new(1, ms(2000), ms(4000), "Hello world")]
        );
    }

    #[test]
    fn test_blank_word_does_not_start_timing() {
        let segment = Segment::Words {
            words: vec![
                Word::new("", 0.0, 0.2),
                Word::new(" ok ", 0.3, 0.6),
                Word::new("\t", 0.6, 0.9),
                Word::new("go", 1.0, 1.2),
            ],
        };
        let blocks = group_all(&[segment], 50);
        assert_eq!(blocks, vec![SubtitleBlock::new(1, ms(300), ms(1200), "ok go")]);
    }

    #[test]
    fn test_trailing_block_may_be_short() {
        let segment = Segment::Words {
            words: vec![
                Word::new("Subtitles", 0.0, 0.6),
                Word::new("are", 0.6, 0.8),
                Word::new("fun", 0.8, 1.1),
            ],
        };
        let blocks = group_all(&[segment], 10);
        assert_eq!(
            blocks,
            vec![
                SubtitleBlock::new(1, ms(0), ms(800), "Subtitles are"),
                SubtitleBlock::new(2, ms(800), ms(1100), "fun"),
            ]
        );
    }

    #[test]
    fn test_threshold_counts_characters_not_bytes() {
        // "été" is 3 chars but 5 bytes
        let segment = Segment::Words {
            words: vec![Word::new("été", 0.0, 0.4), Word::new("là", 0.4, 0.7)],
        };
        let blocks = group_all(&[segment], 4);
        assert_eq!(blocks, vec![SubtitleBlock::new(1, ms(0), ms(700), "été là")]);
    }

    #[test]
    fn test_pending_char_count_includes_separators() {
        let mut pending = Pending {
            text: String::new(),
            chars: 0,
            start: Duration::ZERO,
            end: Duration::ZERO,
        };
        for word in ["ab", "été", "ü"] {
            pending.push_word(word);
            assert_eq!(pending.chars, pending.text.chars().count());
        }
        assert_eq!(pending.text, "ab été ü");
        assert_eq!(pending.chars, 8);

        // "ab cd" is exactly 5 chars: cut there at 5, not at 6
        let segment = Segment::Words {
            words: vec![
                Word::new("ab", 0.0, 0.1),
                Word::new("cd", 0.1, 0.2),
                Word::new("ef", 0.2, 0.3),
            ],
        };
        assert_eq!(
            group_all(std::slice::from_ref(&segment), 5),
            vec![
                SubtitleBlock::new(1, ms(0), ms(200), "ab cd"),
                SubtitleBlock::new(2, ms(200), ms(300), "ef"),
            ]
        );
        assert_eq!(
            group_all(&[segment], 6),
            vec![SubtitleBlock::new(1, ms(0), ms(300), "ab cd ef")]
        );
    }

    #[test]
    fn test_index_is_continuous_across_segments() {
        let segments = vec![
            hi_there_friend(),
            Segment::Words { words: vec![] },
            hello_world(),
            hi_there_friend(),
            Segment::Flat {
                start: 9.0,
                end: 9.5,
                text: String::new(),
            },
        ];
        let blocks = group_all(&segments, 3);
        let indices: Vec<usize> = blocks.iter().map(|b| b.index).collect();
        let expected: Vec<usize> = (1..=blocks.len()).collect();
        assert_eq!(indices, expected);
        // flat segments pass through even when empty
        assert_eq!(blocks.last().unwrap().content, "");
    }

    #[test]
    fn test_group_words_returns_next_index() {
        let mut out = Vec::new();
        let Segment::Words { words } = hi_there_friend() else {
            unreachable!()
        };
        let next = group_words(&words, 2, 7, &mut out);
        assert_eq!(next, 10);
        assert_eq!(out.first().unwrap().index, 7);
    }

    #[test]
    fn test_properties_hold_for_longer_segment() {
        let text = "the quick brown fox jumps over the lazy dog while a b c watch";
        let words: Vec<Word> = text
            .split(' ')
            .enumerate()
            .map(|(i, w)| Word::new(w, i as f64 * 0.25, i as f64 * 0.25 + 0.2))
            .collect();
        let starts: Vec<Duration> = words.iter().map(|w| seconds_to_duration(w.start)).collect();
        let segment = Segment::Words { words };

        for min_chars in [1, 4, 10, 17, 200] {
            let blocks = group_all(std::slice::from_ref(&segment), min_chars);

            let joined = blocks
                .iter()
                .map(|b| b.content.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            assert_eq!(joined, text);

            let (last, rest) = blocks.split_last().unwrap();
            assert!(rest.iter().all(|b| b.content.chars().count() >= min_chars));
            assert!(!last.content.is_empty());

            assert!(blocks.windows(2).all(|pair| pair[0].start <= pair[1].start));
            assert!(blocks.iter().all(|b| starts.contains(&b.start)));
        }
    }
}
