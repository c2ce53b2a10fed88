pub mod lead;
pub mod lead_email;
pub mod lead_name;
pub mod new_lead;
