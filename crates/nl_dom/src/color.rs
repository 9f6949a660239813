use std::fmt;
use std::str::FromStr;

use nl_core::Error;

/// An sRGB color as written in inline styles or `bgcolor` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HtmlColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl HtmlColor {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Exact component-wise comparison.
    pub fn matches(&self, other: &HtmlColor) -> bool {
        self == other
    }

    /// Accepts `#rgb`, `#rrggbb` and `rgb(r, g, b)`.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().trim_end_matches("!important").trim().to_lowercase();

        if let Some(hex) = value.strip_prefix('#') {
            if !hex.is_ascii() {
                return None;
            }
            return match hex.len() {
                3 => {
                    let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
                    Some(Self::new(digit(0)?, digit(1)?, digit(2)?))
                }
                6 => {
                    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                    Some(Self::new(pair(0)?, pair(2)?, pair(4)?))
                }
                _ => None,
            };
        }

        let inner = value.strip_prefix("rgb(")?.strip_suffix(')')?;
        let components = inner
            .split(',')
            .map(|c| c.trim().parse::<u8>().ok())
            .collect::<Option<Vec<_>>>()?;
        match components.as_slice() {
            [r, g, b] => Some(Self::new(*r, *g, *b)),
            _ => None,
        }
    }

    /// Reads one property of an inline `style` attribute.
    pub fn of_style(style: &str, property: &str) -> Option<Self> {
        style
            .split(';')
            .filter_map(|declaration| declaration.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(property))
            .and_then(|(_, value)| Self::parse(value))
    }
}

impl FromStr for HtmlColor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::Dom(format!("Invalid color: {}", s)))
    }
}

impl fmt::Display for HtmlColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        let expected = HtmlColor::new(0xff, 0x66, 0x00);
        assert_eq!(HtmlColor::parse("#FF6600"), Some(expected));
        assert_eq!(HtmlColor::parse("#f60"), Some(expected));
        assert_eq!(HtmlColor::parse("rgb(255, 102, 0)"), Some(expected));
        assert_eq!(HtmlColor::parse(" #ff6600 !important"), Some(expected));
        assert_eq!(HtmlColor::parse("orange"), None);
        assert_eq!(HtmlColor::parse("#ff66"), None);
        assert_eq!(HtmlColor::parse("rgb(256, 0, 0)"), None);
    }

    #[test]
    fn test_of_style() {
        let style = "padding: 4px; Background-Color:#7F52FF; color: #fff";
        assert_eq!(HtmlColor::of_style(style, "background-color"), Some(HtmlColor::new(0x7f, 0x52, 0xff)));
        assert_eq!(HtmlColor::of_style(style, "color"), Some(HtmlColor::new(255, 255, 255)));
        assert_eq!(HtmlColor::of_style(style, "border-color"), None);
    }

    #[test]
    fn test_matches_is_exact() {
        let purple = HtmlColor::new(0x7f, 0x52, 0xff);
        assert!(purple.matches(&HtmlColor::new(0x7f, 0x52, 0xff)));
        assert!(!purple.matches(&HtmlColor::new(0x7f, 0x52, 0xfe)));
        assert_eq!(purple.to_string(), "#7f52ff");
        assert_eq!("#7f52ff".parse::<HtmlColor>().unwrap(), purple);
    }
}
