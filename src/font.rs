//! Segment patterns for printable ASCII and the chip's Code B glyph codes.
//!
//! A segment byte is `dp a b c d e f g`, bit 7 being the decimal point:
//!
//! ```text
//!    aaa
//!   f   b
//!   f   b
//!    ggg
//!   e   c
//!   e   c
//!    ddd  dp
//! ```

/// First character covered by [`ASCII`].
pub const ASCII_FIRST: u8 = 0x20;
/// Last character covered by [`ASCII`].
pub const ASCII_LAST: u8 = 0x7A;

/// Segment patterns for `' '` (0x20) through `'z'` (0x7A).
#[rustfmt::skip]
pub const ASCII: [u8; (ASCII_LAST - ASCII_FIRST + 1) as usize] = [
    // space ! " # $ % & ' ( ) * + , - . /
    0x00, 0xB0, 0x22, 0x36, 0x5B, 0x25, 0x00, 0x02, 0x4E, 0x78, 0x63, 0x07, 0x80, 0x01, 0x80, 0x25,
    // 0 1 2 3 4 5 6 7 8 9 : ; < = > ?
    0x7E, 0x30, 0x6D, 0x79, 0x33, 0x5B, 0x5F, 0x70, 0x7F, 0x7B, 0x48, 0x88, 0x0D, 0x09, 0x19, 0x65,
    // @ A B C D E F G H I J K L M N O
    0x7D, 0x77, 0x7F, 0x4E, 0x7E, 0x4F, 0x47, 0x5E, 0x37, 0x30, 0x3C, 0x57, 0x0E, 0x54, 0x76, 0x7E,
    // P Q R S T U V W X Y Z [ \ ] ^ _
    0x67, 0x73, 0x46, 0x5B, 0x0F, 0x3E, 0x3E, 0x2A, 0x37, 0x3B, 0x6D, 0x4E, 0x13, 0x78, 0x62, 0x08,
    // ` a b c d e f g h i j k l m n o
    0x20, 0x7D, 0x1F, 0x0D, 0x3D, 0x6F, 0x47, 0x7B, 0x17, 0x10, 0x18, 0x57, 0x06, 0x55, 0x15, 0x1D,
    // p q r s t u v w x y z
    0x67, 0x73, 0x05, 0x5B, 0x0F, 0x1C, 0x1C, 0x2A, 0x37, 0x3B, 0x6D,
];

/// Segment pattern for an ASCII code, blank outside `0x20..=0x7A`.
pub fn glyph(character: u8) -> u8 {
    if (ASCII_FIRST..=ASCII_LAST).contains(&character) {
        ASCII[(character - ASCII_FIRST) as usize]
    } else {
        0x00
    }
}

/// Glyphs of the chip's built-in Code B font, used by digits in decode mode.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodeB {
    Zero = 0x00,
    One = 0x01,
    Two = 0x02,
    Three = 0x03,
    Four = 0x04,
    Five = 0x05,
    Six = 0x06,
    Seven = 0x07,
    Eight = 0x08,
    Nine = 0x09,
    Dash = 0x0A,
    E = 0x0B,
    H = 0x0C,
    L = 0x0D,
    P = 0x0E,
    Blank = 0x0F,
}

impl CodeB {
    /// Closest Code B glyph for a character, [`CodeB::Blank`] when there is none.
    pub fn from_char(character: char) -> Self {
        match character {
            '0' => CodeB::Zero,
            '1' => CodeB::One,
            '2' => CodeB::Two,
            '3' => CodeB::Three,
            '4' => CodeB::Four,
            '5' => CodeB::Five,
            '6' => CodeB::Six,
            '7' => CodeB::Seven,
            '8' => CodeB::Eight,
            '9' => CodeB::Nine,
            '-' => CodeB::Dash,
            'E' | 'e' => CodeB::E,
            'H' | 'h' => CodeB::H,
            'L' | 'l' => CodeB::L,
            'P' | 'p' => CodeB::P,
            _ => CodeB::Blank,
        }
    }
}

impl From<CodeB> for u8 {
    fn from(code: CodeB) -> u8 {
        code as u8
    }
}
