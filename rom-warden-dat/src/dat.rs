//! Reference-database (DAT) parsing.
//!
//! Supports the two formats community DATs ship in:
//! - Logiqx XML (`<datafile><game><rom .../></game></datafile>`)
//! - ClrMamePro text (`game ( name "..." rom ( ... ) )`)
//!
//! The format is auto-detected from the first non-whitespace byte.

use std::io::{BufRead, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::DatError;

/// A parsed reference database.
#[derive(Debug, Clone, Default)]
pub struct DatFile {
    pub name: String,
    pub description: String,
    pub version: String,
    pub games: Vec<DatGame>,
}

/// One game entry, holding one or more ROM dumps.
#[derive(Debug, Clone, Default)]
pub struct DatGame {
    pub name: String,
    pub roms: Vec<DatRom>,
}

/// A known-good dump: checksums are lowercase hex.
#[derive(Debug, Clone, Default)]
pub struct DatRom {
    pub name: String,
    pub size: u64,
    pub crc: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub serial: Option<String>,
}

/// Parse a DAT from a reader, auto-detecting XML vs ClrMamePro.
pub fn parse_dat<R: BufRead>(mut reader: R) -> Result<DatFile, DatError> {
    // Peek past leading whitespace to find the first content byte.
    let mut peeked = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = reader.read(&mut byte)?;
        if n == 0 {
            return Err(DatError::invalid_dat("empty DAT file"));
        }
        peeked.push(byte[0]);
        if !byte[0].is_ascii_whitespace() {
            break;
        }
    }

    let chained = std::io::BufReader::new(std::io::Cursor::new(peeked).chain(reader));
    if byte[0] == b'<' {
        parse_xml(chained)
    } else {
        parse_clrmamepro(chained)
    }
}

/// Parse a DAT file from disk.
pub fn parse_dat_file(path: &std::path::Path) -> Result<DatFile, DatError> {
    let file = std::fs::File::open(path)?;
    parse_dat(std::io::BufReader::new(file))
}

// ── Logiqx XML ──────────────────────────────────────────────────────────────

fn parse_xml<R: BufRead>(reader: R) -> Result<DatFile, DatError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut dat = DatFile::default();
    let mut in_header = false;
    let mut header_tag = String::new();
    let mut game: Option<DatGame> = None;

    loop {
        match xml.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"header" => in_header = true,
                b"game" | b"machine" => {
                    let mut g = DatGame::default();
                    for attr in e.attributes() {
                        let attr = attr?;
                        if attr.key.as_ref() == b"name" {
                            g.name = String::from_utf8_lossy(&attr.value).into_owned();
                        }
                    }
                    game = Some(g);
                }
                b"rom" => {
                    if let Some(ref mut g) = game {
                        g.roms.push(rom_from_attributes(e)?);
                    }
                }
                other => {
                    header_tag = String::from_utf8_lossy(other).into_owned();
                }
            },
            Event::Empty(ref e) => {
                if e.name().as_ref() == b"rom" {
                    if let Some(ref mut g) = game {
                        g.roms.push(rom_from_attributes(e)?);
                    }
                }
            }
            Event::Text(ref e) => {
                if in_header {
                    let text = e.unescape()?.into_owned();
                    match header_tag.as_str() {
                        "name" => dat.name = text,
                        "description" => dat.description = text,
                        "version" => dat.version = text,
                        _ => {}
                    }
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"header" => in_header = false,
                b"game" | b"machine" => {
                    if let Some(g) = game.take() {
                        dat.games.push(g);
                    }
                }
                _ => header_tag.clear(),
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if dat.games.is_empty() && dat.name.is_empty() {
        return Err(DatError::invalid_dat("no header or games in XML DAT"));
    }
    Ok(dat)
}

fn rom_from_attributes(e: &quick_xml::events::BytesStart<'_>) -> Result<DatRom, DatError> {
    let mut rom = DatRom::default();
    for attr in e.attributes() {
        let attr = attr?;
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.as_ref() {
            b"name" => rom.name = value,
            b"size" => {
                rom.size = value
                    .parse()
                    .map_err(|_| DatError::invalid_dat(format!("invalid rom size: {value}")))?;
            }
            b"crc" => rom.crc = Some(value.to_lowercase()),
            b"md5" => rom.md5 = Some(value.to_lowercase()),
            b"sha1" => rom.sha1 = Some(value.to_lowercase()),
            b"serial" => rom.serial = Some(value),
            _ => {}
        }
    }
    Ok(rom)
}

// ── ClrMamePro ──────────────────────────────────────────────────────────────

fn parse_clrmamepro<R: BufRead>(reader: R) -> Result<DatFile, DatError> {
    let mut dat = DatFile::default();
    let mut block: Option<String> = None;
    let mut game: Option<DatGame> = None;
    let mut game_serial: Option<String> = None;

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if block.is_none() {
            if let Some(kind) = block_start(trimmed) {
                if kind == "game" {
                    game = Some(DatGame::default());
                    game_serial = None;
                }
                block = Some(kind);
            }
            continue;
        }

        if trimmed == ")" {
            if block.as_deref() == Some("game") {
                if let Some(mut g) = game.take() {
                    // Game-level serial fills in for ROMs without their own,
                    // regardless of where it appeared inside the block.
                    if let Some(serial) = game_serial.take() {
                        for rom in g.roms.iter_mut().filter(|r| r.serial.is_none()) {
                            rom.serial = Some(serial.clone());
                        }
                    }
                    dat.games.push(g);
                }
            }
            block = None;
            continue;
        }

        let Some((key, value)) = key_value(trimmed) else {
            continue;
        };
        match block.as_deref() {
            Some("clrmamepro") => match key.as_str() {
                "name" => dat.name = value,
                "description" => dat.description = value,
                "version" => dat.version = value,
                _ => {}
            },
            Some("game") => {
                if let Some(ref mut g) = game {
                    match key.as_str() {
                        "name" => g.name = value,
                        "serial" => game_serial = Some(value),
                        "rom" => {
                            if let Some(rom) = inline_rom(&value) {
                                g.roms.push(rom);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    if dat.games.is_empty() && dat.name.is_empty() {
        return Err(DatError::invalid_dat("no header or games in ClrMamePro DAT"));
    }
    Ok(dat)
}

/// Detect `blocktype (` at the start of a block.
fn block_start(line: &str) -> Option<String> {
    let stripped = line.trim_end();
    let head = stripped.strip_suffix('(')?.trim();
    if !head.is_empty() && head.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(head.to_lowercase())
    } else {
        None
    }
}

/// Parse `key "quoted value"` / `key value`; `rom ( ... )` yields the
/// parenthesized content as the value.
fn key_value(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();

    if let Some(rest) = trimmed.strip_prefix("rom") {
        let rest = rest.trim();
        if let Some(inner) = rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
            return Some(("rom".into(), inner.trim().to_string()));
        }
    }

    let mut parts = trimmed.splitn(2, |c: char| c.is_ascii_whitespace());
    let key = parts.next()?.to_string();
    let raw = parts.next()?.trim();
    let value = raw
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(raw)
        .to_string();
    Some((key, value))
}

/// Parse an inline ROM record:
/// `name "Game.ext" size 12345 crc AABBCCDD md5 ... sha1 ...`
fn inline_rom(inner: &str) -> Option<DatRom> {
    let tokens = tokenize(inner);
    let mut rom = DatRom::default();
    let mut i = 0;
    while i + 1 < tokens.len() {
        let value = &tokens[i + 1];
        match tokens[i].as_str() {
            "name" => rom.name = value.clone(),
            "size" => rom.size = value.parse().unwrap_or(0),
            "crc" => rom.crc = Some(value.to_lowercase()),
            "md5" => rom.md5 = Some(value.to_lowercase()),
            "sha1" => rom.sha1 = Some(value.to_lowercase()),
            "serial" => rom.serial = Some(value.clone()),
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }
    if rom.name.is_empty() && rom.crc.is_none() {
        None
    } else {
        Some(rom)
    }
}

/// Split on whitespace, honoring double-quoted strings.
fn tokenize(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in s.chars() {
        match c {
            '"' => {
                if in_quotes {
                    tokens.push(std::mem::take(&mut current));
                }
                in_quotes = !in_quotes;
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML_DAT: &str = r#"<?xml version="1.0"?>
<datafile>
  <header>
    <name>Test System</name>
    <description>Test DAT</description>
    <version>20250101</version>
  </header>
  <game name="Super Example (USA)">
    <rom name="Super Example (USA).sfc" size="524288" crc="B19ED489" sha1="6b47bb75d16514b6a476aa0c73a683a2a4c18765"/>
  </game>
  <game name="Example 64 (Japan)">
    <rom name="Example 64 (Japan).z64" size="8388608" crc="4EAB3152" serial="NSMJ"/>
  </game>
</datafile>"#;

    const CLR_DAT: &str = r#"clrmamepro (
    name "Test System"
    version 20250101
)

game (
    name "Super Example (USA)"
    rom ( name "Super Example (USA).sfc" size 524288 crc B19ED489 sha1 6b47bb75d16514b6a476aa0c73a683a2a4c18765 )
)
"#;

    #[test]
    fn parses_xml_format() {
        let dat = parse_dat(std::io::Cursor::new(XML_DAT)).unwrap();
        assert_eq!(dat.name, "Test System");
        assert_eq!(dat.games.len(), 2);
        let rom = &dat.games[0].roms[0];
        assert_eq!(rom.size, 524288);
        assert_eq!(rom.crc.as_deref(), Some("b19ed489"));
        assert_eq!(
            rom.sha1.as_deref(),
            Some("6b47bb75d16514b6a476aa0c73a683a2a4c18765")
        );
        assert_eq!(dat.games[1].roms[0].serial.as_deref(), Some("NSMJ"));
    }

    #[test]
    fn parses_clrmamepro_format() {
        let dat = parse_dat(std::io::Cursor::new(CLR_DAT)).unwrap();
        assert_eq!(dat.name, "Test System");
        assert_eq!(dat.games.len(), 1);
        assert_eq!(dat.games[0].roms[0].crc.as_deref(), Some("b19ed489"));
        assert_eq!(dat.games[0].roms[0].name, "Super Example (USA).sfc");
    }

    #[test]
    fn auto_detects_with_leading_whitespace() {
        let padded = format!("\n\n   {XML_DAT}");
        let dat = parse_dat(std::io::Cursor::new(padded)).unwrap();
        assert_eq!(dat.games.len(), 2);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(parse_dat(std::io::Cursor::new("")).is_err());
    }

    #[test]
    fn invalid_size_is_an_error() {
        let bad = r#"<datafile><game name="g"><rom name="r" size="notanumber" crc="00"/></game></datafile>"#;
        assert!(parse_dat(std::io::Cursor::new(bad)).is_err());
    }
}
