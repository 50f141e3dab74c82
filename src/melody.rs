//! Buzzer melodies.
//!
//! Melodies are written as whitespace-separated triples
//! `<note><octave?> <duration_ms> <pause_ms>`, for example
//! `"G4 100 20 C5 100 20"`.  Notes are the letters `A`..`G`; the octave
//! defaults to 5.  Anything that is not a note letter is skipped.

use heapless::Vec;

/// Maximum number of notes in one melody.
pub const MAX_NOTES: usize = 32;

/// Rising arpeggio played at boot and from the menu.
pub const BOOT_CHIME: &str = "G4 100 20 C5 100 20 E5 100 20 G5 100 20 C6 100 20 D6 100 20 E6 200 200";

/// Frequencies of A..G in the 4th octave (Hz).  Index 0 is unused.
const BASE_FREQ: [u32; 8] = [0, 262, 294, 330, 349, 392, 440, 494];

/// One tone of a melody.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Note {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    pub pause_ms: u32,
}

/// A parsed melody.
pub type Melody = Vec<Note, MAX_NOTES>;

/// Buzzer collaborator.
pub trait Buzzer {
    /// Play `melody`.  Implementations may queue it and return immediately.
    fn play(&mut self, melody: &Melody);
}

/// Parse a melody string.  Notes past [`MAX_NOTES`] are dropped.
pub fn parse(sequence: &str) -> Melody {
    let mut notes = Melody::new();
    let bytes = sequence.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let letter = bytes[i];
        i += 1;
        if !(b'A'..=b'G').contains(&letter) {
            continue;
        }

        let octave = match bytes.get(i) {
            Some(d) if d.is_ascii_digit() => {
                i += 1;
                (d - b'0') as i32
            }
            _ => 5,
        };

        let duration_ms = parse_number(bytes, &mut i);
        let pause_ms = parse_number(bytes, &mut i);

        let note = Note {
            frequency_hz: note_frequency(letter, octave),
            duration_ms,
            pause_ms,
        };
        if notes.push(note).is_err() {
            break;
        }
    }

    notes
}

/// Frequency of a note letter in the given octave, in Hz.
pub fn note_frequency(letter: u8, octave: i32) -> u32 {
    let index = (letter.wrapping_sub(b'A') as usize) + 1;
    let Some(&base) = BASE_FREQ.get(index).filter(|_| index >= 1) else {
        return 0;
    };

    let shift = octave - 4;
    if shift >= 0 {
        base << shift.min(8)
    } else {
        base >> (-shift).min(8)
    }
}

fn parse_number(bytes: &[u8], i: &mut usize) -> u32 {
    while bytes.get(*i) == Some(&b' ') {
        *i += 1;
    }
    let mut value: u32 = 0;
    while let Some(d) = bytes.get(*i).filter(|d| d.is_ascii_digit()) {
        value = value.saturating_mul(10).saturating_add((d - b'0') as u32);
        *i += 1;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_boot_chime() {
        let melody = parse(BOOT_CHIME);
        assert_eq!(melody.len(), 7);
        assert_eq!(
            melody[0],
            Note {
                frequency_hz: 392,
                duration_ms: 100,
                pause_ms: 20
            }
        );
        assert_eq!(melody[6].frequency_hz, 330 * 4);
        assert_eq!(melody[6].duration_ms, 200);
        assert_eq!(melody[6].pause_ms, 200);
    }

    #[test]
    fn octave_defaults_to_five() {
        let melody = parse("A 50 0");
        assert_eq!(melody[0].frequency_hz, 262 * 2);
    }

    #[test]
    fn lower_octaves_halve() {
        assert_eq!(note_frequency(b'F', 3), 392 / 2);
        assert_eq!(note_frequency(b'F', 4), 392);
    }

    #[test]
    fn junk_is_skipped() {
        let melody = parse("x y C4 10 5 ?? ");
        assert_eq!(melody.len(), 1);
        assert_eq!(melody[0].frequency_hz, 294);
    }

    #[test]
    fn long_sequences_are_truncated() {
        let mut text: heapless::String<512> = heapless::String::new();
        for _ in 0..40 {
            let _ = text.push_str("C4 1 1 ");
        }
        assert_eq!(parse(&text).len(), MAX_NOTES);
    }
}
