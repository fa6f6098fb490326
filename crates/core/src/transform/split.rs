//! Line wrapping for long subtitle lines, aware of CJK text which has no spaces.

use crate::error::{Error, Result};
use crate::script::has_cjk;
use crate::srt::{self, renumber, Cue};
use tracing::{debug, trace};

pub const DEFAULT_MAX_CHARS: usize = 42;

/// Most lines a single cue may show after wrapping.
const MAX_LINES_PER_CUE: usize = 2;

const CJK_SENTENCE_END: [char; 3] = ['。', '！', '？'];
const CJK_COMMA: [char; 2] = ['，', '、'];
const LATIN_SENTENCE_END: [char; 3] = ['.', '!', '?'];

/// Last position `p` in the CJK window whose character is in `set`, as a head length.
fn last_in_window(chars: &[char], max: usize, set: &[char]) -> Option<usize> {
    let lo = (max as f64 * 0.4).ceil() as usize;
    (lo.saturating_sub(1)..max)
        .rev()
        .find(|&p| set.contains(&chars[p]))
        .map(|p| p + 1)
}

fn cjk_break(chars: &[char], max: usize) -> usize {
    last_in_window(chars, max, &CJK_SENTENCE_END)
        .or_else(|| last_in_window(chars, max, &CJK_COMMA))
        .unwrap_or(max)
}

fn latin_break(chars: &[char], max: usize) -> usize {
    let sentence = (0..max).rev().find(|&p| {
        LATIN_SENTENCE_END.contains(&chars[p])
            && chars.get(p + 1) == Some(&' ')
            && (p + 1) as f64 > max as f64 * 0.3
    });
    if let Some(p) = sentence {
        return p + 1;
    }
    // Never leave two characters or fewer dangling on the next line.
    let backward = (1..=max)
        .rev()
        .find(|&s| chars[s] == ' ' && chars.len() - s - 1 > 2);
    if let Some(s) = backward {
        return s;
    }
    (max + 1..chars.len())
        .find(|&s| chars[s] == ' ')
        .unwrap_or(max)
}

/// Wrap a single line so that no piece exceeds `max_chars` characters where a
/// break is possible.
pub fn split_line(line: &str, max_chars: usize) -> Vec<String> {
    let cjk = has_cjk(line);
    let mut rest: Vec<char> = line.trim().chars().collect();
    let mut pieces = Vec::new();
    while rest.len() > max_chars {
        let at = if cjk {
            cjk_break(&rest, max_chars)
        } else {
            latin_break(&rest, max_chars)
        };
        let head: String = rest[..at].iter().collect();
        pieces.push(head.trim_end().to_string());
        rest = rest[at..].iter().copied().skip_while(|c| c.is_whitespace()).collect();
    }
    if !rest.is_empty() || pieces.is_empty() {
        pieces.push(rest.into_iter().collect());
    }
    pieces
}

/// Split a cue showing more than two lines in two, dividing its time in
/// proportion to the text length of each half.
fn split_cue(cue: Cue, out: &mut Vec<Cue>) {
    let lines: Vec<&str> = cue.text.lines().collect();
    if lines.len() <= MAX_LINES_PER_CUE {
        out.push(cue);
        return;
    }
    let mid = (lines.len() + 1) / 2;
    let (first, second) = lines.split_at(mid);
    let first_len: usize = first.iter().map(|l| l.chars().count()).sum();
    let second_len: usize = second.iter().map(|l| l.chars().count()).sum();
    let ratio = match first_len + second_len {
        0 => 0.5,
        total => first_len as f64 / total as f64,
    };
    let split_time = cue.start + cue.duration() * ratio;
    let head = Cue::new(cue.index, cue.start, split_time, first.join("\n"));
    let tail = Cue::new(cue.index, split_time, cue.end, second.join("\n"));
    split_cue(head, out);
    split_cue(tail, out);
}

/// Wrap every line of every cue at `max_chars`, then split crowded cues.
pub fn split_cues(cues: &[Cue], max_chars: usize) -> Result<Vec<Cue>> {
    trace!("split_cues(count={}, max_chars={})", cues.len(), max_chars);
    if max_chars == 0 {
        return Err(Error::Validation("maximum characters per line must be positive".into()));
    }
    let mut out = Vec::with_capacity(cues.len());
    for cue in cues {
        let text = cue
            .text
            .lines()
            .flat_map(|line| split_line(line, max_chars))
            .collect::<Vec<_>>()
            .join("\n");
        split_cue(Cue { text, ..cue.clone() }, &mut out);
    }
    renumber(&mut out);
    debug!("split {} cues into {}", cues.len(), out.len());
    Ok(out)
}

/// Parse, wrap and re-serialize SRT text.
pub fn split_srt(input: &str, max_chars: usize) -> Result<String> {
    let cues = srt::parse(input)?;
    Ok(srt::format(&split_cues(&cues, max_chars)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_sentence_end() {
        let pieces = split_line("I came here. Then I left again", 20);
        assert_eq!(pieces, vec!["I came here.", "Then I left again"]);
    }

    #[test]
    fn breaks_at_last_space() {
        let pieces = split_line("the quick brown fox jumps over", 16);
        assert_eq!(pieces, vec!["the quick brown", "fox jumps over"]);
    }

    /// Ensure a break that would orphan a tiny word moves backwards.
    #[test]
    fn avoids_tiny_tail() {
        let pieces = split_line("abcdefgh ijklmnop a", 18);
        assert_eq!(pieces, vec!["abcdefgh", "ijklmnop a"]);
    }

    #[test]
    fn long_word_breaks_at_next_space_or_hard() {
        assert_eq!(split_line("abcdefghijkl mn", 5), vec!["abcdefghijkl", "mn"]);
        assert_eq!(split_line("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn cjk_prefers_punctuation() {
        let pieces = split_line("今天天气很好。我们去公园散步吧", 10);
        assert_eq!(pieces, vec!["今天天气很好。", "我们去公园散步吧"]);
        let pieces = split_line("一二三四五六七八九十一二", 5);
        assert_eq!(pieces, vec!["一二三四五", "六七八九十", "一二"]);
    }

    /// Ensure a CJK comma is used when no sentence end falls in the window.
    #[test]
    fn cjk_falls_back_to_comma() {
        let pieces = split_line("一二三四五，六七八九十一二", 10);
        assert_eq!(pieces, vec!["一二三四五，", "六七八九十一二"]);
        // A comma before 40% of the width is ignored.
        let pieces = split_line("春夏、秋冬和四季变化真大", 8);
        assert_eq!(pieces, vec!["春夏、秋冬和四季", "变化真大"]);
    }

    /// Ensure a cue that wraps to more than two lines is split in time.
    #[test]
    fn splits_crowded_cue() {
        let cue = Cue::new(1, 0.0, 10.0, "aaaa bbbb\ncccc dddd\neeee");
        let out = split_cues(&[cue], 9).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "aaaa bbbb\ncccc dddd");
        assert_eq!(out[1].text, "eeee");
        assert!((out[0].end - 10.0 * 18.0 / 22.0).abs() < 1e-9);
        assert_eq!(out[1].start, out[0].end);
        assert_eq!(out[1].index, 2);
    }

    #[test]
    fn rejects_zero_width() {
        assert!(split_cues(&[], 0).is_err());
    }
}
