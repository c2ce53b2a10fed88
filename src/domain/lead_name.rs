use unicode_segmentation::UnicodeSegmentation;

const MAX_CHAR_LENGTH: usize = 256;
const FORBIDDEN_CHARS: [char; 9] = ['/', '{', '}', '"', '>', '<', '\\', '(', ')'];

#[derive(Debug, Clone)]
pub struct LeadName(String);

impl LeadName {
    pub fn parse(name: String) -> Result<LeadName, String> {
        let is_empty_or_whitespace = name.trim().is_empty();
        let is_too_long = name.graphemes(true).count() > MAX_CHAR_LENGTH;
        let contains_forbidden_chars = name.chars().any(|char| FORBIDDEN_CHARS.contains(&char));

        if is_empty_or_whitespace || is_too_long || contains_forbidden_chars {
            return Err(format!("{} is not a valid name", name));
        }

        Ok(Self(name))
    }
}

impl AsRef<str> for LeadName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
