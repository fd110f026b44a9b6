/// Platform/console identifiers for all supported systems.
///
/// This enum centralizes console identity — short names, display names,
/// manufacturer, and aliases — in one place, replacing ad-hoc string
/// matching throughout the codebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    // Nintendo
    Nes,
    Snes,
    N64,
    GameBoy,
    Gba,
    GameCube,
    Wii,
    N3ds,
    Switch,

    // Sega
    Genesis,

    // Sony
    Ps1,
    Ps2,
    Psp,
}

/// All platform variants in registration order.
const ALL_PLATFORMS: &[Platform] = &[
    Platform::Nes,
    Platform::Snes,
    Platform::N64,
    Platform::GameBoy,
    Platform::Gba,
    Platform::GameCube,
    Platform::Wii,
    Platform::N3ds,
    Platform::Switch,
    Platform::Genesis,
    Platform::Ps1,
    Platform::Ps2,
    Platform::Psp,
];

impl Platform {
    /// Canonical short name used for folder paths, catalog rows, and identifiers.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Nes => "nes",
            Self::Snes => "snes",
            Self::N64 => "n64",
            Self::GameBoy => "gb",
            Self::Gba => "gba",
            Self::GameCube => "gamecube",
            Self::Wii => "wii",
            Self::N3ds => "3ds",
            Self::Switch => "switch",
            Self::Genesis => "genesis",
            Self::Ps1 => "ps1",
            Self::Ps2 => "ps2",
            Self::Psp => "psp",
        }
    }

    /// Full display name for the platform.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Nes => "Nintendo Entertainment System",
            Self::Snes => "Super Nintendo Entertainment System",
            Self::N64 => "Nintendo 64",
            Self::GameBoy => "Game Boy / Game Boy Color",
            Self::Gba => "Game Boy Advance",
            Self::GameCube => "Nintendo GameCube",
            Self::Wii => "Nintendo Wii",
            Self::N3ds => "Nintendo 3DS",
            Self::Switch => "Nintendo Switch",
            Self::Genesis => "Sega Genesis / Mega Drive",
            Self::Ps1 => "Sony PlayStation",
            Self::Ps2 => "Sony PlayStation 2",
            Self::Psp => "Sony PlayStation Portable",
        }
    }

    /// Console manufacturer.
    pub fn manufacturer(&self) -> &'static str {
        match self {
            Self::Nes
            | Self::Snes
            | Self::N64
            | Self::GameBoy
            | Self::Gba
            | Self::GameCube
            | Self::Wii
            | Self::N3ds
            | Self::Switch => "Nintendo",

            Self::Genesis => "Sega",

            Self::Ps1 | Self::Ps2 | Self::Psp => "Sony",
        }
    }

    /// All accepted names for this platform (case-insensitive matching).
    ///
    /// Includes the canonical short name plus any common alternatives
    /// used for folder names, configuration, etc.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Nes => &["nes", "famicom", "fc"],
            Self::Snes => &["snes", "sfc", "super famicom", "super nintendo"],
            Self::N64 => &["n64", "nintendo 64", "nintendo64"],
            Self::GameBoy => &["gb", "gbc", "gameboy", "game boy"],
            Self::Gba => &["gba", "game boy advance", "gameboy advance"],
            Self::GameCube => &["gamecube", "gcn", "gc", "ngc", "dolphin"],
            Self::Wii => &["wii"],
            Self::N3ds => &["3ds", "nintendo 3ds", "n3ds"],
            Self::Switch => &["switch", "nintendo switch", "nx"],
            Self::Genesis => &["genesis", "megadrive", "mega drive", "md", "gen"],
            Self::Ps1 => &["ps1", "psx", "playstation", "playstation1"],
            Self::Ps2 => &["ps2", "playstation2", "playstation 2"],
            Self::Psp => &["psp", "playstation portable"],
        }
    }

    /// All supported platform variants.
    pub fn all() -> &'static [Platform] {
        ALL_PLATFORMS
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Error returned when a string cannot be parsed into a `Platform`.
#[derive(Debug, Clone)]
pub struct PlatformParseError(pub String);

impl std::fmt::Display for PlatformParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown platform: '{}'", self.0)
    }
}

impl std::error::Error for PlatformParseError {}

impl std::str::FromStr for Platform {
    type Err = PlatformParseError;

    /// Parse a platform from any recognized name (case-insensitive).
    ///
    /// Matches against `short_name()` and all entries in `aliases()`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        for &platform in ALL_PLATFORMS {
            if platform.short_name() == lower {
                return Ok(platform);
            }
            for alias in platform.aliases() {
                if *alias == lower {
                    return Ok(platform);
                }
            }
        }
        Err(PlatformParseError(s.to_string()))
    }
}

impl serde::Serialize for Platform {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.short_name())
    }
}

impl<'de> serde::Deserialize<'de> for Platform {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip() {
        for &platform in Platform::all() {
            let parsed: Platform = platform.short_name().parse().unwrap();
            assert_eq!(parsed, platform, "round-trip failed for {:?}", platform);
        }
    }

    #[test]
    fn aliases_resolve_correctly() {
        let cases = [
            ("gc", Platform::GameCube),
            ("psx", Platform::Ps1),
            ("sfc", Platform::Snes),
            ("mega drive", Platform::Genesis),
            ("gbc", Platform::GameBoy),
            ("n3ds", Platform::N3ds),
            ("nx", Platform::Switch),
        ];
        for (input, expected) in cases {
            let parsed: Platform = input.parse().unwrap();
            assert_eq!(
                parsed, expected,
                "alias '{}' should parse to {:?}",
                input, expected
            );
        }
    }

    #[test]
    fn case_insensitive_parsing() {
        let parsed: Platform = "SNES".parse().unwrap();
        assert_eq!(parsed, Platform::Snes);
        let parsed: Platform = "PlayStation".parse().unwrap();
        assert_eq!(parsed, Platform::Ps1);
    }

    #[test]
    fn unknown_string_returns_err() {
        let result: Result<Platform, _> = "commodore64".parse();
        assert!(result.is_err());
    }

    #[test]
    fn short_name_is_first_alias() {
        for &platform in Platform::all() {
            assert_eq!(
                platform.short_name(),
                platform.aliases()[0],
                "short_name should be first alias for {:?}",
                platform,
            );
        }
    }
}
