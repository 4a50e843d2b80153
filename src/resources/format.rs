//! Guessing the format of a payload that failed the structured parse.
//!
//! The plain-text check is a heuristic: any line that starts with an OBJ
//! declaration keyword counts. A binary payload that happens to contain such a
//! line after a newline is misclassified as OBJ; the OBJ parser then rejects
//! it as a decode failure.

use std::fmt;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const OBJ_KEYWORDS: [&str; 6] = ["v", "vt", "vn", "f", "o", "g"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormatTag {
    /// glTF JSON or its binary GLB container.
    Gltf,
    /// Wavefront OBJ.
    Obj,
    Unknown,
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Gltf => f.write_str("glTF"),
            FormatTag::Obj => f.write_str("OBJ"),
            FormatTag::Unknown => f.write_str("unknown"),
        }
    }
}

pub fn detect(raw: &[u8]) -> FormatTag {
    if raw.starts_with(GLB_MAGIC) {
        return FormatTag::Gltf;
    }
    let text = String::from_utf8_lossy(raw);
    if looks_like_gltf_json(&text) {
        FormatTag::Gltf
    } else if text.lines().any(is_obj_declaration) {
        FormatTag::Obj
    } else {
        FormatTag::Unknown
    }
}

fn looks_like_gltf_json(text: &str) -> bool {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with('{') && text.contains("\"asset\"")
}

fn is_obj_declaration(line: &str) -> bool {
    match line.trim_start().split_once(char::is_whitespace) {
        Some((keyword, _)) => OBJ_KEYWORDS.contains(&keyword),
        None => false,
    }
}
