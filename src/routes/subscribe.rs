use actix_web::{web, HttpResponse, ResponseError};
use reqwest::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    domain::{
        lead::Lead,
        lead_email::LeadEmail,
        new_lead::{NewLead, NewLeadError, SubscribeBody},
    },
    email_client::{EmailAttachment, EmailClient},
    startup::GuideAsset,
};

const GUIDE_EMAIL_SUBJECT: &str = "Your Free Productivity Guide";

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error(transparent)]
    Validation(#[from] NewLeadError),
    #[error("Email already subscribed")]
    Duplicate,
    #[error("Failed to query or insert the lead.")]
    StoreError(#[source] sqlx::Error),
    #[error("Failed to read the guide attachment from disk.")]
    AttachmentError(#[from] std::io::Error),
    #[error("Failed to send the guide email.")]
    SendEmailError(#[from] reqwest::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Caused by:\n\t({})", self)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::Validation(_) | SubscribeError::Duplicate => StatusCode::BAD_REQUEST,
            SubscribeError::StoreError(_)
            | SubscribeError::AttachmentError(_)
            | SubscribeError::SendEmailError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Infrastructure failures get a safe message, the detail stays in the logs.
        let body = match self {
            SubscribeError::Validation(err) => json!({ "message": err.to_string() }),
            SubscribeError::Duplicate => json!({ "success": false, "message": self.to_string() }),
            _ => json!({ "success": false, "message": "Server error. Please try again later." }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[tracing::instrument(
    name = "Subscribing a new lead",
    skip(body, db_pool, email_client, guide),
    fields(lead_email = tracing::field::Empty)
)]
pub async fn handle_subscribe(
    body: web::Json<SubscribeBody>,
    db_pool: web::Data<PgPool>,
    email_client: web::Data<EmailClient>,
    guide: web::Data<GuideAsset>,
) -> Result<HttpResponse, SubscribeError> {
    let new_lead: NewLead = body.into_inner().try_into()?;

    tracing::Span::current().record("lead_email", new_lead.email.as_ref());

    // The pre-check is an optimization only: the UNIQUE constraint on the email
    // column is the authority when two requests race past it.
    if lead_exists(&new_lead.email, &db_pool).await? {
        return Err(SubscribeError::Duplicate);
    }

    let lead = Lead::new(new_lead);
    insert_lead(&lead, &db_pool).await?;

    let greeting = format!(
        "Hi {},\n\nThanks for subscribing! Here's your free PDF guide.",
        lead.name.as_ref().map(AsRef::as_ref).unwrap_or("")
    );
    let attachment = load_guide_attachment(guide).await?;

    // The lead stays persisted if the send fails, there is no compensating delete.
    send_guide_email(&email_client, lead.email.clone(), &greeting, attachment).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Thanks! Check your inbox for the PDF."
    })))
}

#[tracing::instrument(name = "Checking for an existing lead", skip(db_pool))]
async fn lead_exists(email: &LeadEmail, db_pool: &PgPool) -> Result<bool, SubscribeError> {
    let existing = sqlx::query("SELECT id FROM leads WHERE email = $1")
        .bind(email.as_ref())
        .fetch_optional(db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            SubscribeError::StoreError(err)
        })?;

    Ok(existing.is_some())
}

#[tracing::instrument(name = "Inserting a new lead into the database", skip(lead, db_pool))]
async fn insert_lead(lead: &Lead, db_pool: &PgPool) -> Result<(), SubscribeError> {
    sqlx::query(
        r#"
        INSERT INTO leads (id, email, name, created_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(lead.id)
    .bind(lead.email.as_ref())
    .bind(lead.name.as_ref().map(AsRef::as_ref))
    .bind(lead.created_at)
    .execute(db_pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            return SubscribeError::Duplicate;
        }

        tracing::error!("Failed to execute query: {:?}", err);
        SubscribeError::StoreError(err)
    })?;

    Ok(())
}

// The read is blocking, so it runs on actix's blocking thread pool instead of
// stalling a worker.
#[tracing::instrument(name = "Loading the guide attachment", skip_all)]
async fn load_guide_attachment(
    guide: web::Data<GuideAsset>,
) -> Result<EmailAttachment, SubscribeError> {
    let attachment = web::block(move || guide.load())
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?
        .map_err(|err| {
            tracing::error!("Failed to read the guide attachment: {:?}", err);
            err
        })?;

    Ok(attachment)
}

#[tracing::instrument(name = "Sending the guide email to a new lead", skip_all)]
async fn send_guide_email(
    email_client: &EmailClient,
    recipient: LeadEmail,
    text_body: &str,
    attachment: EmailAttachment,
) -> Result<(), reqwest::Error> {
    email_client
        .send_email(recipient, GUIDE_EMAIL_SUBJECT, text_body, Some(attachment))
        .await
        .map_err(|err| {
            tracing::error!("Failed to send the guide email: {:?}", err);
            err
        })
}

/// Postgres reports a violated unique constraint with SQLSTATE 23505.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
