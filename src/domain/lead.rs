use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::lead_email::LeadEmail;
use crate::domain::lead_name::LeadName;
use crate::domain::new_lead::NewLead;

/// A persisted lead. Created once on a successful subscription, never updated
/// or deleted by this service.
#[derive(Debug)]
pub struct Lead {
    pub id: Uuid,
    pub email: LeadEmail,
    pub name: Option<LeadName>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(new_lead: NewLead) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: new_lead.email,
            name: new_lead.name,
            created_at: Utc::now(),
        }
    }
}
