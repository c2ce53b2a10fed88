use serde::Deserialize;

use crate::domain::lead_email::LeadEmail;
use crate::domain::lead_name::LeadName;

#[derive(Debug)]
pub struct NewLead {
    pub email: LeadEmail,
    pub name: Option<LeadName>,
}

/// Raw `/api/subscribe` request body. Both fields are optional at the HTTP layer
/// so a missing email produces our own error message instead of a deserialization
/// failure.
#[derive(Deserialize)]
pub struct SubscribeBody {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum NewLeadError {
    #[error("Email is required")]
    MissingEmail,
    #[error("{0}")]
    Invalid(String),
}

impl TryFrom<SubscribeBody> for NewLead {
    type Error = NewLeadError;

    fn try_from(body: SubscribeBody) -> Result<Self, Self::Error> {
        let email = body
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or(NewLeadError::MissingEmail)?;
        let email = LeadEmail::parse(email.to_owned()).map_err(NewLeadError::Invalid)?;

        // An absent or empty name is fine, anything else has to parse.
        let name = body
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| LeadName::parse(name.to_owned()))
            .transpose()
            .map_err(NewLeadError::Invalid)?;

        Ok(NewLead { email, name })
    }
}
