//! Game file classification by magic bytes.
//!
//! Classification is pure: it looks only at the bytes it is given and never
//! fails. Unknown or truncated input yields `None`.

use std::fmt;

use serde::{Deserialize, Serialize};

const GLULX_MAGIC: &[u8; 4] = b"Glul";
const FORM_MAGIC: &[u8; 4] = b"FORM";
const IFRS_SUBTYPE: &[u8; 4] = b"IFRS";
const RIDX_CHUNK: &[u8; 4] = b"RIdx";
const EXEC_USAGE: &[u8; 4] = b"Exec";
const GLUL_CHUNK: &[u8; 4] = b"GLUL";
const ZCOD_CHUNK: &[u8; 4] = b"ZCOD";

/// Z-machine story file header length.
const ZCODE_HEADER_LEN: usize = 64;
/// Offset of the six-character serial number in the Z-machine header.
const ZCODE_SERIAL: std::ops::Range<usize> = 18..24;

/// Offset of the resource index chunk (first chunk after the FORM header).
const RIDX_OFFSET: usize = 12;
const RIDX_ENTRY_LEN: usize = 12;

/// Concrete game file variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameFormat {
    GlulxBinary,
    GlulxBlorb,
    Z3,
    Z4,
    Z5,
    Z6,
    Z7,
    Z8,
    ZcodeBlorb,
}

/// Interpreter family a format is run by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineFamily {
    Glulx,
    Zcode,
}

impl GameFormat {
    pub fn family(self) -> EngineFamily {
        match self {
            GameFormat::GlulxBinary | GameFormat::GlulxBlorb => EngineFamily::Glulx,
            _ => EngineFamily::Zcode,
        }
    }

    /// Canonical file extension used when storing a game as `game.<ext>`.
    pub fn extension(self) -> &'static str {
        match self {
            GameFormat::GlulxBinary => "ulx",
            GameFormat::GlulxBlorb => "gblorb",
            GameFormat::Z3 => "z3",
            GameFormat::Z4 => "z4",
            GameFormat::Z5 => "z5",
            GameFormat::Z6 => "z6",
            GameFormat::Z7 => "z7",
            GameFormat::Z8 => "z8",
            GameFormat::ZcodeBlorb => "zblorb",
        }
    }

    /// Format implied by a file extension alone (case-insensitive).
    ///
    /// The generic Blorb extensions (`blorb`, `blb`) are ambiguous and return
    /// `None`; only the bytes can tell which family they hold.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let format = match ext.to_ascii_lowercase().as_str() {
            "ulx" => GameFormat::GlulxBinary,
            "gblorb" | "glb" => GameFormat::GlulxBlorb,
            "z3" => GameFormat::Z3,
            "z4" => GameFormat::Z4,
            "z5" => GameFormat::Z5,
            "z6" => GameFormat::Z6,
            "z7" => GameFormat::Z7,
            "z8" => GameFormat::Z8,
            "zblorb" | "zlb" => GameFormat::ZcodeBlorb,
            _ => return None,
        };
        Some(format)
    }

    fn from_zcode_version(version: u8) -> Option<Self> {
        match version {
            3 => Some(GameFormat::Z3),
            4 => Some(GameFormat::Z4),
            5 => Some(GameFormat::Z5),
            6 => Some(GameFormat::Z6),
            7 => Some(GameFormat::Z7),
            8 => Some(GameFormat::Z8),
            _ => None,
        }
    }
}

impl GameFormat {
    /// Name used in user-facing output; matches the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            GameFormat::GlulxBinary => "glulx-binary",
            GameFormat::GlulxBlorb => "glulx-blorb",
            GameFormat::Z3 => "z3",
            GameFormat::Z4 => "z4",
            GameFormat::Z5 => "z5",
            GameFormat::Z6 => "z6",
            GameFormat::Z7 => "z7",
            GameFormat::Z8 => "z8",
            GameFormat::ZcodeBlorb => "zcode-blorb",
        }
    }
}

impl fmt::Display for GameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for EngineFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineFamily::Glulx => f.write_str("glulx"),
            EngineFamily::Zcode => f.write_str("zcode"),
        }
    }
}

/// Classify raw game file bytes.
///
/// Rules, in order: Glulx magic; Blorb (`FORM`/`IFRS`) resolved through its
/// resource index; Z-machine header (version byte, printable serial, full
/// header length).
pub fn classify(data: &[u8]) -> Option<GameFormat> {
    if data.len() >= 4 && &data[..4] == GLULX_MAGIC {
        return Some(GameFormat::GlulxBinary);
    }

    if data.len() >= 12 && &data[..4] == FORM_MAGIC && &data[8..12] == IFRS_SUBTYPE {
        return classify_blorb(data);
    }

    classify_zcode(data)
}

fn classify_blorb(data: &[u8]) -> Option<GameFormat> {
    if data.len() < RIDX_OFFSET + 12 || &data[RIDX_OFFSET..RIDX_OFFSET + 4] != RIDX_CHUNK {
        return None;
    }
    let count = read_u32(data, RIDX_OFFSET + 8)? as usize;
    let entries_start = RIDX_OFFSET + 12;

    for index in 0..count {
        let entry = entries_start.checked_add(index.checked_mul(RIDX_ENTRY_LEN)?)?;
        if entry + RIDX_ENTRY_LEN > data.len() {
            return None;
        }
        if &data[entry..entry + 4] != EXEC_USAGE {
            continue;
        }
        let start = read_u32(data, entry + 8)? as usize;
        let chunk_type = data.get(start..start.checked_add(4)?)?;
        if chunk_type == GLUL_CHUNK {
            return Some(GameFormat::GlulxBlorb);
        }
        if chunk_type == ZCOD_CHUNK {
            return Some(GameFormat::ZcodeBlorb);
        }
    }
    None
}

fn classify_zcode(data: &[u8]) -> Option<GameFormat> {
    if data.len() < ZCODE_HEADER_LEN {
        return None;
    }
    let format = GameFormat::from_zcode_version(data[0])?;
    let serial_ok = data[ZCODE_SERIAL]
        .iter()
        .all(|b| (0x20..=0x7e).contains(b));
    serial_ok.then_some(format)
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zcode(version: u8, serial: &[u8; 6]) -> Vec<u8> {
        let mut data = vec![0u8; 64];
        data[0] = version;
        data[18..24].copy_from_slice(serial);
        data
    }

    /// Minimal Blorb: FORM header, a one-entry RIdx pointing at offset 36,
    /// then the executable chunk.
    fn blorb(exec_chunk: &[u8; 4]) -> Vec<u8> {
        let mut ridx_data = Vec::new();
        ridx_data.extend_from_slice(&1u32.to_be_bytes());
        ridx_data.extend_from_slice(b"Exec");
        ridx_data.extend_from_slice(&0u32.to_be_bytes());
        ridx_data.extend_from_slice(&36u32.to_be_bytes());

        let mut form_data = b"IFRS".to_vec();
        form_data.extend_from_slice(b"RIdx");
        form_data.extend_from_slice(&(ridx_data.len() as u32).to_be_bytes());
        form_data.extend_from_slice(&ridx_data);
        form_data.extend_from_slice(exec_chunk);
        form_data.extend_from_slice(&0u32.to_be_bytes());

        let mut out = b"FORM".to_vec();
        out.extend_from_slice(&(form_data.len() as u32).to_be_bytes());
        out.extend_from_slice(&form_data);
        out
    }

    #[test]
    fn glulx_magic_is_glulx_binary() {
        let mut data = b"Glul".to_vec();
        data.extend_from_slice(&[0; 100]);
        assert_eq!(classify(&data), Some(GameFormat::GlulxBinary));
    }

    #[test]
    fn blorb_with_glul_exec_is_glulx_blorb() {
        assert_eq!(classify(&blorb(b"GLUL")), Some(GameFormat::GlulxBlorb));
    }

    #[test]
    fn blorb_with_zcod_exec_is_zcode_blorb() {
        assert_eq!(classify(&blorb(b"ZCOD")), Some(GameFormat::ZcodeBlorb));
    }

    #[test]
    fn blorb_without_exec_chunk_is_none() {
        let mut data = b"FORM\0\0\0\0IFRS".to_vec();
        data.extend_from_slice(&[0; 100]);
        assert_eq!(classify(&data), None);
        assert_eq!(classify(&blorb(b"ADRI")), None);
    }

    #[test]
    fn blorb_exec_offset_past_end_is_none() {
        let mut data = blorb(b"GLUL");
        data.truncate(37);
        assert_eq!(classify(&data), None);
    }

    #[test]
    fn form_with_other_subtype_is_none() {
        let mut data = b"FORM\0\0\0\0AIFF".to_vec();
        data.extend_from_slice(&[0; 100]);
        assert_eq!(classify(&data), None);
    }

    #[test]
    fn zcode_versions_map_to_variants() {
        assert_eq!(classify(&zcode(3, b"840726")), Some(GameFormat::Z3));
        assert_eq!(classify(&zcode(5, b"250101")), Some(GameFormat::Z5));
        assert_eq!(classify(&zcode(8, b"200101")), Some(GameFormat::Z8));
        assert_eq!(classify(&zcode(2, b"200101")), None);
        assert_eq!(classify(&zcode(9, b"200101")), None);
    }

    #[test]
    fn zcode_with_unprintable_serial_is_none() {
        assert_eq!(classify(&zcode(5, &[0; 6])), None);
    }

    #[test]
    fn zcode_shorter_than_header_is_none() {
        let data = zcode(5, b"250101");
        assert_eq!(classify(&data[..63]), None);
    }

    #[test]
    fn short_buffers_never_classify() {
        let glulx = b"Glul";
        let mut blorb_bytes = blorb(b"GLUL");
        blorb_bytes.truncate(36);
        let zcode_bytes = zcode(5, b"250101");
        for len in 0..4 {
            assert_eq!(classify(&glulx[..len]), None, "glulx prefix {len}");
        }
        for len in 0..blorb_bytes.len() {
            assert_eq!(classify(&blorb_bytes[..len]), None, "blorb prefix {len}");
        }
        for len in 0..ZCODE_HEADER_LEN {
            assert_eq!(classify(&zcode_bytes[..len]), None, "zcode prefix {len}");
        }
    }

    #[test]
    fn unknown_bytes_are_none() {
        let mut data = b"PK\x03\x04".to_vec();
        data.extend_from_slice(&[0; 100]);
        assert_eq!(classify(&data), None);
        assert_eq!(classify(b""), None);
    }

    #[test]
    fn families_group_formats() {
        assert_eq!(GameFormat::GlulxBinary.family(), EngineFamily::Glulx);
        assert_eq!(GameFormat::GlulxBlorb.family(), EngineFamily::Glulx);
        assert_eq!(GameFormat::Z5.family(), EngineFamily::Zcode);
        assert_eq!(GameFormat::ZcodeBlorb.family(), EngineFamily::Zcode);
    }

    #[test]
    fn extensions_resolve_case_insensitively() {
        assert_eq!(GameFormat::from_extension("ULX"), Some(GameFormat::GlulxBinary));
        assert_eq!(GameFormat::from_extension("glb"), Some(GameFormat::GlulxBlorb));
        assert_eq!(GameFormat::from_extension("zlb"), Some(GameFormat::ZcodeBlorb));
        assert_eq!(GameFormat::from_extension("blorb"), None);
        assert_eq!(GameFormat::from_extension("txt"), None);
    }

    #[test]
    fn display_matches_serialized_name() {
        for format in [
            GameFormat::GlulxBinary,
            GameFormat::GlulxBlorb,
            GameFormat::Z3,
            GameFormat::Z4,
            GameFormat::Z5,
            GameFormat::Z6,
            GameFormat::Z7,
            GameFormat::Z8,
            GameFormat::ZcodeBlorb,
        ] {
            let serialized = serde_json::to_value(format).expect("serialize");
            assert_eq!(serialized, format.to_string());
        }
    }
}
