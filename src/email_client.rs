use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time;

use crate::domain::lead_email::LeadEmail;

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: LeadEmail,
    api_key: Secret<String>,
}

/// A file shipped with an outgoing message.
#[derive(Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(serde::Serialize)]
pub struct SendEmailBody {
    personalizations: Vec<SendGridPersonalization>,
    from: SendGridEmail,
    subject: String,
    content: Vec<SendGridContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachments: Option<Vec<SendGridAttachment>>,
}

#[derive(serde::Serialize)]
struct SendGridEmail {
    email: String,
}

#[derive(serde::Serialize)]
struct SendGridPersonalization {
    to: Vec<SendGridEmail>,
}

#[derive(serde::Serialize)]
struct SendGridContent {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[derive(serde::Serialize)]
struct SendGridAttachment {
    content: String,
    filename: String,
    #[serde(rename = "type")]
    content_type: String,
    disposition: String,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: LeadEmail,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> EmailClient {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()
            .unwrap();

        EmailClient {
            http_client,
            base_url,
            sender,
            api_key,
        }
    }

    pub async fn send_email(
        &self,
        recipient: LeadEmail,
        subject: &str,
        text_content: &str,
        attachment: Option<EmailAttachment>,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/mail/send", self.base_url);
        let body = SendEmailBody {
            from: SendGridEmail {
                email: String::from(self.sender.as_ref()),
            },
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridEmail {
                    email: String::from(recipient.as_ref()),
                }],
            }],
            subject: String::from(subject),
            content: vec![SendGridContent {
                content_type: String::from("text/plain"),
                value: String::from(text_content),
            }],
            attachments: attachment.map(|attachment| {
                vec![SendGridAttachment {
                    content: BASE64.encode(&attachment.content),
                    filename: attachment.filename,
                    content_type: attachment.content_type,
                    disposition: String::from("attachment"),
                }]
            }),
        };

        self.http_client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await?
            .error_for_status()?; // return an error when server response status code is 4xx or 5xx

        Ok(())
    }
}
