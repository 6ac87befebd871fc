//! Transposition Transformer
//!
//! Letter-based transposition of ABC text. Each note letter is placed in a
//! twelve-slot chromatic reference where accidental slots repeat the natural
//! below them, shifted, and written back with its case and octave marks
//! unchanged. Key signatures and explicit accidentals are left alone.
//!
//! The mapping is lossy: a letter that lands on a repeated slot cannot be
//! shifted back to where it came from (C +1 gives C, and C -1 from there
//! gives B).

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Chromatic reference: index is semitones above C
pub const CHROMATIC_REFERENCE: [char; 12] =
    ['C', 'C', 'D', 'D', 'E', 'F', 'F', 'G', 'G', 'A', 'A', 'B'];

/// Header/metadata line: single letter followed by a colon
static DIRECTIVE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]:").expect("valid directive regex"));

/// Note letter with any trailing octave marks
static NOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Ga-g][',]*").expect("valid note regex"));

/// True for header lines such as `K:G` or `Q:1/4=120`
pub fn is_directive_line(line: &str) -> bool {
    DIRECTIVE_LINE_RE.is_match(line)
}

/// Position of a note letter in the reference (first matching slot)
pub fn reference_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    CHROMATIC_REFERENCE.iter().position(|&c| c == upper)
}

/// Shift a single note letter, keeping its case
pub fn transpose_letter(letter: char, semitones: i32) -> char {
    let Some(index) = reference_index(letter) else {
        return letter;
    };
    let shifted = (index as i32 + semitones).rem_euclid(12) as usize;
    let target = CHROMATIC_REFERENCE[shifted];
    if letter.is_ascii_lowercase() {
        target.to_ascii_lowercase()
    } else {
        target
    }
}

/// Transpose the body lines of an ABC text by `semitones`.
///
/// Directive lines pass through byte-for-byte, as does every line separator.
pub fn transpose(abc: &str, semitones: i32) -> String {
    if semitones.rem_euclid(12) == 0 {
        // Every letter maps to itself on a whole-octave shift
        return abc.to_string();
    }

    abc.split('\n')
        .map(|line| transpose_line(line, semitones))
        .collect::<Vec<_>>()
        .join("\n")
}

fn transpose_line(line: &str, semitones: i32) -> Cow<'_, str> {
    if is_directive_line(line) {
        return Cow::Borrowed(line);
    }
    NOTE_RE.replace_all(line, |caps: &Captures| {
        let matched = &caps[0];
        let mut chars = matched.chars();
        // The regex guarantees a leading note letter
        let letter = chars.next().unwrap_or_default();
        let mut out = String::with_capacity(matched.len());
        out.push(transpose_letter(letter, semitones));
        out.push_str(chars.as_str());
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_index_naturals() {
        let expected = [('C', 0), ('D', 2), ('E', 4), ('F', 5), ('G', 7), ('A', 9), ('B', 11)];
        for (letter, index) in expected {
            assert_eq!(reference_index(letter), Some(index));
            assert_eq!(reference_index(letter.to_ascii_lowercase()), Some(index));
        }
        assert_eq!(reference_index('H'), None);
    }

    #[test]
    fn test_transpose_letter_by_two() {
        assert_eq!(transpose_letter('C', 2), 'D');
        assert_eq!(transpose_letter('E', 2), 'F');
        assert_eq!(transpose_letter('B', 2), 'C');
        assert_eq!(transpose_letter('a', 2), 'b');
        assert_eq!(transpose_letter('c', -1), 'b');
    }

    #[test]
    fn test_directive_lines_untouched() {
        let abc = "X:1\nT:Bach Air\nK:D\nDEFG ABcd|";
        let out = transpose(abc, 3);
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(&lines[..3], &["X:1", "T:Bach Air", "K:D"]);
        assert_ne!(lines[3], "DEFG ABcd|");
    }

    #[test]
    fn test_octave_marks_preserved() {
        assert_eq!(transpose("C, c' C,, e''", 2), "D, d' D,, f''");
    }

    #[test]
    fn test_octave_shift_is_identity() {
        let abc = "X:1\nK:C\nCDEF GABc|defg abc'd'|\n";
        assert_eq!(transpose(abc, 12), abc);
        assert_eq!(transpose(abc, -12), abc);
        assert_eq!(transpose(abc, 0), abc);
    }

    #[test]
    fn test_repeated_slot_is_lossy() {
        // C and C# share a letter, so the round trip lands a semitone low
        let up = transpose("C", 1);
        assert_eq!(up, "C");
        assert_eq!(transpose(&up, -1), "B");
    }

    #[test]
    fn test_line_separators_preserved() {
        let abc = "K:C\r\nCDE\r\n\r\nFGA";
        let out = transpose(abc, 2);
        assert_eq!(out, "K:C\r\nDEF\r\n\r\nGAB");
    }
}
