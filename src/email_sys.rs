use log::{info, warn};
use serde::Serialize;
use serde_json::json;

use crate::config::EmailJsConfig;
use crate::error::{Error, Result};


const EMAILJS_SEND_URL: &'static str = "https://api.emailjs.com/api/v1.0/email/send";
const SUCCESS_TEXT: &'static str = "OK";


#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmailParams {
    pub from_name: String,
    pub from_email: String,
    pub subject: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_email: Option<String>,
}


#[rocket::async_trait]
pub trait EmailRelay: Send + Sync {
    /// Sends one templated email and returns the relay's response text.
    async fn send(&self, params: &EmailParams) -> Result<String>;
}

/// Sends and treats anything but the relay's success text as a failure.
pub async fn send_checked(relay: &dyn EmailRelay, params: &EmailParams) -> Result<()> {
    let text = relay.send(params).await?;

    if text == SUCCESS_TEXT {
        info!("Email sent: {}", params.subject);
        Ok(())
    }
    else {
        warn!("Email relay answered {:?}", text);
        Err(Error::Upstream("Failed to send email".into()))
    }
}


pub struct EmailJs {
    client: reqwest::Client,
    config: EmailJsConfig,
}

impl EmailJs {
    pub fn new(client: reqwest::Client, config: EmailJsConfig) -> Self {
        EmailJs { client, config }
    }
}

#[rocket::async_trait]
impl EmailRelay for EmailJs {
    async fn send(&self, params: &EmailParams) -> Result<String> {
        let mut params = params.clone();
        if params.to_email.is_none() {
            params.to_email = self.config.alert_email.clone();
        }

        let res = self.client.post(EMAILJS_SEND_URL)
            .json(&json!({
                "service_id": self.config.service_id,
                "template_id": self.config.template_id,
                "user_id": self.config.public_key,
                "template_params": params,
            }))
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if status.is_success() {
            Ok(text)
        }
        else {
            Err(Error::Upstream(format!("Email relay error {}: {}", status, text)))
        }
    }
}


pub struct NoEmail;

#[rocket::async_trait]
impl EmailRelay for NoEmail {
    async fn send(&self, _: &EmailParams) -> Result<String> {
        Err(Error::NotConfigured("Email relay"))
    }
}
