//! Decoded ICY metadata blocks
//!
//! A metadata block is UTF-8 text of semicolon-separated `key='value'`
//! pairs, NUL-padded to the length declared by the prefix byte:
//!
//! ```text
//! StreamTitle='Artist - Song';StreamUrl='https://example.com';\0\0\0
//! ```
//!
//! Decoding is best-effort: malformed segments are skipped, never an error.

use std::collections::HashMap;

use super::constants::STREAM_TITLE_FIELD;

/// A decoded in-band metadata block.
///
/// Holds both the parsed field mapping and the raw decoded text (with NUL
/// padding stripped), since subscribers receive both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBlock {
    fields: HashMap<String, String>,
    raw: String,
}

impl MetadataBlock {
    /// Decode a raw metadata payload (NUL padding already removed by the
    /// frame parser is fine; trailing NULs are stripped here regardless).
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim_end_matches('\0');
        let mut fields = HashMap::new();

        for segment in raw.split(';') {
            let Some((key, value)) = segment.split_once('=') else {
                // Stray text without '=', skip it
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            let value = strip_quotes(value.trim()).trim();
            if value.is_empty() {
                continue;
            }
            fields.insert(key.to_string(), value.to_string());
        }

        Self {
            fields,
            raw: raw.to_string(),
        }
    }

    /// Decode a metadata payload from its on-wire bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(bytes))
    }

    /// The conventional "now playing" field, if present.
    pub fn stream_title(&self) -> Option<&str> {
        self.fields.get(STREAM_TITLE_FIELD).map(String::as_str)
    }

    /// Look up an arbitrary field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The raw decoded text, NUL padding stripped.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// All decoded fields.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// True if no field survived decoding.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Strip one matching pair of outer single quotes.
fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_title() {
        let block = MetadataBlock::parse("StreamTitle='Artist - Song';");

        assert_eq!(block.stream_title(), Some("Artist - Song"));
        assert_eq!(block.fields().len(), 1);
    }

    #[test]
    fn test_empty_values_dropped() {
        let block = MetadataBlock::parse("Foo=bar;Baz=;Qux='  '");

        assert_eq!(block.get("Foo"), Some("bar"));
        assert_eq!(block.get("Baz"), None);
        assert_eq!(block.get("Qux"), None);
        assert_eq!(block.fields().len(), 1);
    }

    #[test]
    fn test_unquoted_value() {
        let block = MetadataBlock::parse("StreamTitle=Plain Title;");

        assert_eq!(block.stream_title(), Some("Plain Title"));
    }

    #[test]
    fn test_value_with_embedded_equals() {
        // Only the first '=' splits key from value
        let block = MetadataBlock::parse("StreamUrl='https://example.com/?a=1&b=2';");

        assert_eq!(block.get("StreamUrl"), Some("https://example.com/?a=1&b=2"));
    }

    #[test]
    fn test_nul_padding_stripped() {
        let block = MetadataBlock::from_bytes(b"StreamTitle='Hi';\0\0\0\0\0\0\0\0");

        assert_eq!(block.stream_title(), Some("Hi"));
        assert_eq!(block.raw(), "StreamTitle='Hi';");
    }

    #[test]
    fn test_malformed_segments_skipped() {
        let block = MetadataBlock::parse("garbage;StreamTitle='Ok';=nokey;;");

        assert_eq!(block.stream_title(), Some("Ok"));
        assert_eq!(block.fields().len(), 1);
    }

    #[test]
    fn test_lone_quote_not_stripped_twice() {
        // A single quote character is not a quote pair
        let block = MetadataBlock::parse("Foo=';");

        assert_eq!(block.get("Foo"), Some("'"));
    }

    #[test]
    fn test_empty_payload() {
        let block = MetadataBlock::parse("");

        assert!(block.is_empty());
        assert_eq!(block.stream_title(), None);
    }
}
