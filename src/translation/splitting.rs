/*!
 * Re-splitting of a translated block onto its original segments.
 *
 * Each segment receives a share of the translation proportional to its share
 * of the original characters. Cuts snap to nearby sentence punctuation or
 * whitespace so subtitles do not break mid-word.
 */

use crate::translation::blocking::is_sentence_terminal;

/// Distance, in characters, searched around an ideal cut
pub const SEARCH_WINDOW: usize = 20;

/// Longest clause moved into an empty piece
const MAX_BORROW_CHARS: usize = 30;

/// Text used for a piece that could not receive any translation
pub const EMPTY_PLACEHOLDER: &str = "…";

fn is_closing_mark(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | '”' | '’' | '」' | '』' | '）' | '》')
}

fn is_clause_boundary(c: char) -> bool {
    is_sentence_terminal(c) || c.is_whitespace() || matches!(c, ',' | ':' | '，' | '、' | '：')
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || is_sentence_terminal(c)
        || is_closing_mark(c)
        || matches!(c, '，' | '、' | '：' | '「' | '『' | '“' | '‘' | '（' | '《' | '—' | '～')
}

fn is_punctuation_only(text: &str) -> bool {
    text.chars().all(|c| is_punctuation(c) || c.is_whitespace())
}

/// Cut offsets (in chars) splitting `chars` into `weights.len()` pieces.
///
/// Cuts are strictly increasing whenever the text has at least one character
/// per piece; otherwise they never decrease.
pub fn compute_cut_points(chars: &[char], weights: &[usize]) -> Vec<usize> {
    let pieces = weights.len();
    if pieces < 2 {
        return Vec::new();
    }

    let len = chars.len();
    let total: usize = weights.iter().sum();
    let mut cuts = Vec::with_capacity(pieces - 1);
    let mut cumulative = 0;
    let mut previous = 0;

    for (i, weight) in weights.iter().take(pieces - 1).enumerate() {
        cumulative += weight;
        let ideal = if total == 0 {
            0
        } else {
            ((len * cumulative) as f64 / total as f64).round() as usize
        };

        // Leave at least one character for this piece and each remaining one
        let lo = previous + 1;
        let hi = len.saturating_sub(pieces - 1 - i);

        let cut = if lo > hi {
            ideal.clamp(previous, len)
        } else {
            snap_cut(chars, ideal.clamp(lo, hi), lo, hi)
        };

        cuts.push(cut);
        previous = cut;
    }

    cuts
}

/// Move `ideal` to a nearby punctuation or whitespace boundary within `[lo, hi]`
fn snap_cut(chars: &[char], ideal: usize, lo: usize, hi: usize) -> usize {
    let after_terminal = |p: usize| is_sentence_terminal(chars[p - 1]);
    let before_space = |p: usize| chars[p].is_whitespace();

    if let Some(mut cut) = nearest(ideal, lo, hi, after_terminal) {
        while cut < hi && is_closing_mark(chars[cut]) {
            cut += 1;
        }
        return cut;
    }

    nearest(ideal, lo, hi, before_space).unwrap_or(ideal)
}

/// Closest offset to `ideal` satisfying `accept`, looking forward first at each distance
fn nearest(ideal: usize, lo: usize, hi: usize, accept: impl Fn(usize) -> bool) -> Option<usize> {
    for distance in 0..=SEARCH_WINDOW {
        let forward = ideal + distance;
        if forward <= hi && accept(forward) {
            return Some(forward);
        }
        if distance > 0 && ideal >= lo + distance && accept(ideal - distance) {
            return Some(ideal - distance);
        }
    }
    None
}

/// Split a translated block into one text per original segment.
///
/// Always returns exactly `original_texts.len()` strings.
pub fn split_translated_text_by_ratio<S: AsRef<str>>(translated: &str, original_texts: &[S]) -> Vec<String> {
    let count = original_texts.len();
    let text = translated.trim();

    match count {
        0 => return Vec::new(),
        1 => return vec![text.to_string()],
        _ => {}
    }

    let weights: Vec<usize> = original_texts
        .iter()
        .map(|original| original.as_ref().trim().chars().count())
        .collect();

    if weights.iter().sum::<usize>() == 0 {
        let mut pieces = vec![String::new(); count];
        pieces[0] = text.to_string();
        return pieces;
    }

    let chars: Vec<char> = text.chars().collect();
    let cuts = compute_cut_points(&chars, &weights);

    let mut pieces = Vec::with_capacity(count);
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(chars.len())) {
        pieces.push(chars[start..cut].iter().collect::<String>().trim().to_string());
        start = cut;
    }

    merge_punctuation_pieces(&mut pieces);
    fill_empty_pieces(&mut pieces);
    pieces
}

/// Append pieces made only of punctuation to the preceding non-empty piece
fn merge_punctuation_pieces(pieces: &mut [String]) {
    for i in 1..pieces.len() {
        if pieces[i].is_empty() || !is_punctuation_only(&pieces[i]) {
            continue;
        }
        if let Some(target) = (0..i).rev().find(|&j| !pieces[j].is_empty()) {
            let punctuation = std::mem::take(&mut pieces[i]);
            pieces[target].push_str(&punctuation);
        }
    }
}

/// Give every empty piece a clause from a neighbour, or the placeholder
fn fill_empty_pieces(pieces: &mut [String]) {
    let count = pieces.len();

    for i in 0..count {
        if !pieces[i].is_empty() {
            continue;
        }

        if let Some(next) = (i + 1..count).find(|&j| !pieces[j].is_empty()) {
            if let Some((head, rest)) = leading_clause(&pieces[next]) {
                pieces[i] = head;
                pieces[next] = rest;
                continue;
            }
        }

        if let Some(prev) = (0..i).rev().find(|&j| !pieces[j].is_empty()) {
            if let Some((rest, tail)) = trailing_clause(&pieces[prev]) {
                pieces[prev] = rest;
                pieces[i] = tail;
                continue;
            }
        }

        pieces[i] = EMPTY_PLACEHOLDER.to_string();
    }
}

fn split_at_char(chars: &[char], at: usize) -> (String, String) {
    let head: String = chars[..at].iter().collect();
    let tail: String = chars[at..].iter().collect();
    (head.trim().to_string(), tail.trim().to_string())
}

/// First clause of `text` (at most `MAX_BORROW_CHARS`), leaving a real remainder
fn leading_clause(text: &str) -> Option<(String, String)> {
    let chars: Vec<char> = text.chars().collect();
    let limit = chars.len().min(MAX_BORROW_CHARS);

    (0..limit)
        .filter(|&k| is_clause_boundary(chars[k]))
        .map(|k| split_at_char(&chars, k + 1))
        .find(|(head, rest)| !head.is_empty() && !rest.is_empty() && !is_punctuation_only(rest))
}

/// Last clause of `text` (at most `MAX_BORROW_CHARS`), leaving a real remainder
fn trailing_clause(text: &str) -> Option<(String, String)> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 2 {
        return None;
    }
    let lowest = chars.len().saturating_sub(MAX_BORROW_CHARS + 1);

    (lowest..chars.len() - 1)
        .rev()
        .filter(|&k| is_clause_boundary(chars[k]))
        .map(|k| split_at_char(&chars, k + 1))
        .find(|(rest, tail)| {
            !rest.is_empty() && !tail.is_empty() && !is_punctuation_only(rest) && !is_punctuation_only(tail)
        })
}
