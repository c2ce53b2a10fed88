use validator::validate_email;

/// An email address that went through normalization and syntax validation.
/// Normalization rule: surrounding whitespace is trimmed and the address is
/// lowercased before validation, so the uniqueness constraint in the store
/// compares canonical forms.
#[derive(Debug, Clone)]
pub struct LeadEmail(String);

impl LeadEmail {
    pub fn parse(email: String) -> Result<LeadEmail, String> {
        let normalized = email.trim().to_lowercase();

        if !validate_email(&normalized) {
            return Err(format!("{} is not a valid email address", normalized));
        }

        Ok(Self(normalized))
    }
}

impl AsRef<str> for LeadEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
