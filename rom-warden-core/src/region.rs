use serde::{Deserialize, Serialize};

/// Geographic regions for game releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Japan
    Japan,
    /// USA / North America
    Usa,
    /// Europe (PAL regions)
    Europe,
    /// Australia
    Australia,
    /// Korea
    Korea,
    /// China
    China,
    /// Asia (multi-country releases)
    Asia,
    /// Brazil
    Brazil,
    /// World / Region-free
    World,
    /// Unknown region
    Unknown,
}

impl Region {
    /// Returns the standard abbreviation for this region.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Japan => "JPN",
            Self::Usa => "USA",
            Self::Europe => "EUR",
            Self::Australia => "AUS",
            Self::Korea => "KOR",
            Self::China => "CHN",
            Self::Asia => "ASI",
            Self::Brazil => "BRA",
            Self::World => "WLD",
            Self::Unknown => "UNK",
        }
    }

    /// Returns the full name of this region.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Japan => "Japan",
            Self::Usa => "USA",
            Self::Europe => "Europe",
            Self::Australia => "Australia",
            Self::Korea => "Korea",
            Self::China => "China",
            Self::Asia => "Asia",
            Self::Brazil => "Brazil",
            Self::World => "World",
            Self::Unknown => "Unknown",
        }
    }

    /// Attempt to parse a region from a code character (common in serial numbers).
    pub fn from_code_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'J' => Some(Self::Japan),
            'U' | 'E' => Some(Self::Usa), // E is sometimes used for "English/USA"
            'P' => Some(Self::Europe),    // PAL
            'A' => Some(Self::Australia),
            'K' => Some(Self::Korea),
            'C' => Some(Self::China),
            'W' => Some(Self::World),
            _ => None,
        }
    }

    /// Parse a region from a filename tag like "USA", "Europe", or "En".
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "usa" | "us" | "u" => Some(Self::Usa),
            "japan" | "jpn" | "jp" | "j" => Some(Self::Japan),
            "europe" | "eur" | "eu" | "e" | "pal" => Some(Self::Europe),
            "australia" | "aus" => Some(Self::Australia),
            "korea" | "kor" | "k" => Some(Self::Korea),
            "china" | "chn" => Some(Self::China),
            "asia" => Some(Self::Asia),
            "brazil" | "bra" => Some(Self::Brazil),
            "world" | "wld" | "w" => Some(Self::World),
            _ => None,
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse() {
        assert_eq!(Region::from_tag("USA"), Some(Region::Usa));
        assert_eq!(Region::from_tag("Europe"), Some(Region::Europe));
        assert_eq!(Region::from_tag(" japan "), Some(Region::Japan));
        assert_eq!(Region::from_tag("Fr"), None);
    }

    #[test]
    fn code_chars_parse() {
        assert_eq!(Region::from_code_char('j'), Some(Region::Japan));
        assert_eq!(Region::from_code_char('P'), Some(Region::Europe));
        assert_eq!(Region::from_code_char('X'), None);
    }
}
