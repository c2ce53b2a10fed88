use actix_web::{web, HttpResponse, ResponseError};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use crate::domain::lead_email::LeadEmail;
use crate::email_client::EmailClient;

const SEND_GUIDE_SUBJECT: &str = "Your Free Guide";
const SEND_GUIDE_BODY: &str = "Here is your guide.";

#[derive(Deserialize, Debug)]
pub struct SendGuideBody {
    pub email: String,
}

#[derive(thiserror::Error)]
pub enum SendGuideError {
    #[error("{0}")]
    InvalidEmail(String),
    #[error("Failed to send the guide email.")]
    SendEmailError(#[from] reqwest::Error),
}

impl std::fmt::Debug for SendGuideError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for SendGuideError {
    fn status_code(&self) -> StatusCode {
        match self {
            SendGuideError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
            SendGuideError::SendEmailError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            SendGuideError::InvalidEmail(message) => json!({ "message": message }),
            SendGuideError::SendEmailError(_) => {
                json!({ "success": false, "message": "Server error. Please try again later." })
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Unconditional send: no persistence, no duplicate policy. Whether the address
/// has been seen before is deliberately not tracked here.
#[tracing::instrument(
    name = "Sending the plain guide email",
    skip(body, email_client),
    fields(recipient_email = %body.email)
)]
pub async fn handle_send_guide(
    body: web::Json<SendGuideBody>,
    email_client: web::Data<EmailClient>,
) -> Result<HttpResponse, SendGuideError> {
    let recipient =
        LeadEmail::parse(body.into_inner().email).map_err(SendGuideError::InvalidEmail)?;

    email_client
        .send_email(recipient, SEND_GUIDE_SUBJECT, SEND_GUIDE_BODY, None)
        .await
        .map_err(|err| {
            tracing::error!("Failed to send the guide email: {:?}", err);
            err
        })?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Email sent!" })))
}
