//! Translated strings, stored as a `TEXT` block.
//!
//! Payload, per string name in sorted order:
//!
//! ```text
//! u16 node length, u8 name length + 1, name, NUL
//! per language (sorted):
//!     u16 entry length, u8 language length + 1, language, NUL,
//!     u8 plural form count, each form NUL terminated
//! ```

use std::collections::BTreeMap;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Result, ValueError};
use crate::schema::Magic;
use crate::types::{DataType, Value};

use super::Block;

pub const TEXT_MAGIC: Magic = Magic::new(*b"TEXT");
pub const TEXT_VERSION: u32 = 3;

/// Language every string must be available in.
pub const DEFAULT_LANGUAGE: &str = "en_GB";

/// Names and languages must stay below this many bytes.
const MAX_NAME: usize = 255;

/// Named strings, each with per-language plural forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBundle {
    strings: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl TextBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the plural forms of one string in one language.
    pub fn add(
        &mut self,
        name: &str,
        language: &str,
        forms: Vec<String>,
    ) -> std::result::Result<&mut Self, ValueError> {
        check_name("string name", name)?;
        check_name("language", language)?;
        if forms.is_empty() || forms.len() > usize::from(u8::MAX) {
            return Err(ValueError::Text(format!(
                "'{}' in {} needs 1..=255 plural forms, got {}",
                name,
                language,
                forms.len()
            )));
        }
        if let Some(form) = forms.iter().find(|f| f.contains('\0')) {
            return Err(ValueError::Text(format!("{:?} contains a NUL byte", form)));
        }
        self.strings
            .entry(name.to_string())
            .or_default()
            .insert(language.to_string(), forms);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over string names with their texts by language.
    pub fn strings(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Vec<String>>)> {
        self.strings.iter().map(|(name, langs)| (name.as_str(), langs))
    }

    /// Fail when a string lacks a text in [`DEFAULT_LANGUAGE`].
    pub fn check(&self) -> std::result::Result<(), ValueError> {
        if self.strings.is_empty() {
            return Err(ValueError::Text("no strings defined".to_string()));
        }
        match self
            .strings
            .iter()
            .find(|(_, langs)| !langs.contains_key(DEFAULT_LANGUAGE))
        {
            Some((name, _)) => Err(ValueError::Text(format!(
                "string '{}' has no {} text",
                name, DEFAULT_LANGUAGE
            ))),
            None => Ok(()),
        }
    }

    /// Encode the `TEXT` payload.
    pub fn payload(&self) -> Result<Vec<u8>> {
        self.check()?;
        let mut out = Vec::new();
        for (name, languages) in &self.strings {
            let entries: Vec<usize> = languages
                .iter()
                .map(|(lang, forms)| {
                    2 + (1 + lang.len() + 1) + 1 + forms.iter().map(|f| f.len() + 1).sum::<usize>()
                })
                .collect();
            let node = 2 + 1 + name.len() + 1 + entries.iter().sum::<usize>();

            out.write_u16::<LittleEndian>(length(name, node)?)?;
            write_name(&mut out, name)?;
            for ((lang, forms), entry) in languages.iter().zip(entries) {
                out.write_u16::<LittleEndian>(length(name, entry)?)?;
                write_name(&mut out, lang)?;
                out.write_u8(forms.len() as u8)?;
                for form in forms {
                    out.extend_from_slice(form.as_bytes());
                    out.push(0);
                }
            }
        }
        Ok(out)
    }

    /// Build the `TEXT` block.
    pub fn to_block(&self) -> Result<Block> {
        let mut block = Block::new(
            TEXT_MAGIC,
            TEXT_VERSION,
            vec![("strings".to_string(), DataType::Raw)],
        );
        block.set("strings", Value::Raw(self.payload()?))?;
        Ok(block)
    }
}

fn check_name(what: &str, name: &str) -> std::result::Result<(), ValueError> {
    if name.is_empty() || name.len() >= MAX_NAME || name.contains('\0') {
        return Err(ValueError::Text(format!(
            "{} {:?} must be 1..{} bytes without NUL",
            what, name, MAX_NAME
        )));
    }
    Ok(())
}

fn length(name: &str, size: usize) -> std::result::Result<u16, ValueError> {
    u16::try_from(size)
        .map_err(|_| ValueError::Text(format!("string '{}' is too long ({} bytes)", name, size)))
}

fn write_name(out: &mut Vec<u8>, name: &str) -> std::io::Result<()> {
    out.write_u8((name.len() + 1) as u8)?;
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RcdError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_string_payload() {
        let mut bundle = TextBundle::new();
        bundle.add("hi", "en_GB", vec!["Yo".to_string()]).unwrap();

        let mut expected = vec![
            19, 0, // node: 2 + 1 + 2 + 1 + 13
            3, b'h', b'i', 0,
            13, 0, // entry: 2 + 7 + 1 + 3
            6,
        ];
        expected.extend_from_slice(b"en_GB\0");
        expected.push(1);
        expected.extend_from_slice(b"Yo\0");

        assert_eq!(bundle.payload().unwrap(), expected);
    }

    #[test]
    fn test_names_and_languages_sorted() {
        let mut bundle = TextBundle::new();
        bundle
            .add("b", "nl_NL", vec!["B".to_string()])
            .unwrap()
            .add("b", "en_GB", vec!["B".to_string()])
            .unwrap()
            .add("a", "en_GB", vec!["A".to_string(), "As".to_string()])
            .unwrap();

        let payload = bundle.payload().unwrap();
        // First node is "a".
        assert_eq!(&payload[2..5], &[2, b'a', 0]);
        let first = u16::from_le_bytes([payload[0], payload[1]]) as usize;
        // Second node is "b", with en_GB before nl_NL.
        assert_eq!(&payload[first + 2..first + 5], &[2, b'b', 0]);
        assert_eq!(&payload[first + 8..first + 13], b"en_GB");
        assert_eq!(payload.len(), first + 2 + 1 + 1 + 1 + 2 * (2 + 7 + 1 + 2));
    }

    #[test]
    fn test_default_language_required() {
        let mut bundle = TextBundle::new();
        bundle.add("x", "nl_NL", vec!["X".to_string()]).unwrap();
        assert!(matches!(
            bundle.payload(),
            Err(RcdError::Value(ValueError::Text(_)))
        ));
    }

    #[test]
    fn test_bad_names_rejected() {
        let mut bundle = TextBundle::new();
        let long = "x".repeat(255);
        assert!(bundle.add(&long, "en_GB", vec!["X".to_string()]).is_err());
        assert!(bundle.add("x", "", vec!["X".to_string()]).is_err());
        assert!(bundle.add("x", "en_GB", vec![]).is_err());
    }

    #[test]
    fn test_text_block() {
        let mut bundle = TextBundle::new();
        bundle.add("hi", "en_GB", vec!["Yo".to_string()]).unwrap();
        let block = bundle.to_block().unwrap();
        assert_eq!(block.magic(), TEXT_MAGIC);
        assert_eq!(block.version(), 3);
        assert_eq!(block.payload_size().unwrap(), 19);
    }
}
