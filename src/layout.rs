//! Placement of strings on digits and number formatting, independent of the bus.

use core::iter::Peekable;
use core::str::Chars;

use heapless::String;
use ufmt::uwrite;

use crate::{Alignment, DecimalPoint};

/// A character bound for one digit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) digit: u8,
    pub(crate) character: char,
    pub(crate) dp: DecimalPoint,
}

/// Yields cells from a start digit towards digit 0, one per character.
///
/// A `'.'` right after any other character becomes that character's decimal point
/// instead of taking a digit of its own.
pub(crate) struct Cells<'t> {
    chars: Peekable<Chars<'t>>,
    next_digit: Option<u8>,
}

impl<'t> Cells<'t> {
    /// Starts at the leftmost digit, whatever the length of `text`.
    pub(crate) fn fixed(text: &'t str, digits: u8) -> Self {
        Self::starting_at(text, digits.checked_sub(1))
    }

    pub(crate) fn aligned(text: &'t str, digits: u8, alignment: Alignment) -> Self {
        let start = match alignment {
            Alignment::Left => digits.checked_sub(1),
            Alignment::Right => effective_len(text, digits).checked_sub(1),
            Alignment::RightZeros => None,
        };
        Self::starting_at(text, start)
    }

    fn starting_at(text: &'t str, start: Option<u8>) -> Self {
        Self {
            chars: text.chars().peekable(),
            next_digit: start,
        }
    }
}

impl Iterator for Cells<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        let digit = self.next_digit?;
        let character = self.chars.next()?;
        let dp = if character != '.' && self.chars.peek() == Some(&'.') {
            self.chars.next();
            DecimalPoint::On
        } else {
            DecimalPoint::Off
        };
        self.next_digit = digit.checked_sub(1);
        Some(Cell {
            digit,
            character,
            dp,
        })
    }
}

/// Characters that need a digit, dots excluded, capped at `digits`.
pub(crate) fn effective_len(text: &str, digits: u8) -> u8 {
    let len = text.chars().filter(|&c| c != '.').count();
    len.min(digits as usize) as u8
}

/// Longest text a number field can hold: a `u32` is 10 characters.
const FIELD_CAPACITY: usize = 16;

/// Text of a formatted number. Characters past its capacity are dropped.
pub(crate) type Field = String<FIELD_CAPACITY>;

fn fill(field: &mut Field, c: char, count: usize) {
    for _ in 0..count {
        let _ = field.push(c);
    }
}

/// How a number fills its field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Pad {
    /// Just the digits.
    None,
    /// Right justified with leading spaces.
    Spaces,
    /// Right justified with leading zeros.
    Zeros,
    /// Left justified with trailing spaces.
    Trailing,
}

impl Pad {
    /// Padding for a number spanning the whole display.
    pub(crate) fn whole(alignment: Alignment) -> Self {
        match alignment {
            Alignment::Left => Pad::None,
            Alignment::Right => Pad::Spaces,
            Alignment::RightZeros => Pad::Zeros,
        }
    }

    /// Padding for a number sharing the display with another one.
    pub(crate) fn half(alignment: Alignment) -> Self {
        match alignment {
            Alignment::Left => Pad::Trailing,
            Alignment::Right => Pad::Spaces,
            Alignment::RightZeros => Pad::Zeros,
        }
    }
}

/// Formats `value` into a field `width` characters wide. Numbers wider than the field
/// keep their leading characters.
pub(crate) fn number(value: u32, width: u8, pad: Pad) -> Field {
    let mut text = Field::new();
    let _ = uwrite!(text, "{}", value);

    let width = width as usize;
    let gap = width.saturating_sub(text.len());
    let mut field = Field::new();
    match pad {
        Pad::None => {
            let _ = field.push_str(&text);
        }
        Pad::Spaces => {
            fill(&mut field, ' ', gap);
            let _ = field.push_str(&text);
        }
        Pad::Zeros => {
            fill(&mut field, '0', gap);
            let _ = field.push_str(&text);
        }
        Pad::Trailing => {
            let _ = field.push_str(&text);
            fill(&mut field, ' ', gap);
        }
    }
    field.truncate(width);
    field
}
