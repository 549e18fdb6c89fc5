//! RGB colors as sent by comment servers

use core::fmt;

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// Fallback color for missing or unparsable values
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);

    /// Create a color from its channels
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a packed `0xRRGGBB` value, ignoring higher bits
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        Self::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Packed `0xRRGGBB` value
    #[must_use]
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Parse a server color string
    ///
    /// Accepts `#RRGGBB`, `#RGB`, `#AARRGGBB` (alpha dropped), bare hex
    /// digits, and plain decimal integers. A string made only of decimal
    /// digits and without `#` is read as a decimal packed value.
    ///
    /// ```rust
    /// use danmaku_core::Rgb;
    ///
    /// assert_eq!(Rgb::parse("#FF0000"), Some(Rgb::new(255, 0, 0)));
    /// assert_eq!(Rgb::parse("#0f0"), Some(Rgb::new(0, 255, 0)));
    /// assert_eq!(Rgb::parse("16777215"), Some(Rgb::WHITE));
    /// assert_eq!(Rgb::parse("blue"), None);
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::from_hex_digits(hex);
        }
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            return value
                .parse::<u32>()
                .ok()
                .filter(|packed| *packed <= 0x00FF_FFFF)
                .map(Self::from_u32);
        }
        Self::from_hex_digits(value)
    }

    /// Parse a color, falling back to white
    #[must_use]
    pub fn parse_or_white(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or(Self::WHITE)
    }

    fn from_hex_digits(hex: &str) -> Option<Self> {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            6 | 8 => u32::from_str_radix(hex, 16).ok().map(Self::from_u32),
            3 => {
                let packed = u32::from_str_radix(hex, 16).ok()?;
                let expand = |nibble: u32| (nibble & 0xF) as u8 * 17;
                Some(Self::new(
                    expand(packed >> 8),
                    expand(packed >> 4),
                    expand(packed),
                ))
            }
            _ => None,
        }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgb::parse("#00FF7F"), Some(Rgb::new(0, 255, 127)));
        assert_eq!(Rgb::parse("00ff7f"), Some(Rgb::new(0, 255, 127)));
        assert_eq!(Rgb::parse("#abc"), Some(Rgb::new(0xAA, 0xBB, 0xCC)));
        assert_eq!(Rgb::parse("#80FF0000"), Some(Rgb::new(255, 0, 0)));
    }

    #[test]
    fn parses_decimal_values() {
        assert_eq!(Rgb::parse("255"), Some(Rgb::new(0, 0, 255)));
        assert_eq!(Rgb::parse("99999999"), None);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(Rgb::parse(""), None);
        assert_eq!(Rgb::parse("#12345"), None);
        assert_eq!(Rgb::parse("#GGGGGG"), None);
        assert_eq!(Rgb::parse_or_white(Some("nope")), Rgb::WHITE);
        assert_eq!(Rgb::parse_or_white(None), Rgb::WHITE);
    }

    #[test]
    fn display_round_trips_through_parse() {
        let color = Rgb::new(0x12, 0xAB, 0x03);
        assert_eq!(color.to_string(), "#12AB03");
        assert_eq!(Rgb::parse(&color.to_string()), Some(color));
        assert_eq!(color.to_u32(), 0x0012_AB03);
    }
}
