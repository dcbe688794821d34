use log::{info, warn};
use reqwest::{header::CONTENT_TYPE, Url};
use serde::Deserialize;

use crate::config::TwilioConfig;
use crate::error::{Error, Result};


const TWO_FACTOR_BASE: &'static str = "https://2factor.in/API/V1/";
const TWILIO_API_BASE: &'static str = "https://api.twilio.com/2010-04-01/Accounts/";
const TWILIO_LOOKUP_BASE: &'static str = "https://lookups.twilio.com/v2/PhoneNumbers/";


#[rocket::async_trait]
pub trait SmsRelay: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<()>;
}

#[rocket::async_trait]
pub trait PhoneValidator: Send + Sync {
    async fn is_valid(&self, phone_number: &str) -> Result<bool>;
}


/// Sends `body` to every number in order. The first failure stops the run.
pub async fn fan_out(relay: &dyn SmsRelay, numbers: &[String], body: &str) -> Result<usize> {
    for (sent, to) in numbers.iter().enumerate() {
        if let Err(err) = relay.send(to, body).await {
            warn!("Fan-out stopped after {} of {} messages: {}", sent, numbers.len(), err);
            return Err(err);
        }
    }

    info!("Fan-out sent {} messages", numbers.len());
    Ok(numbers.len())
}


fn url_with_segments(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base).map_err(Error::upstream)?;
    url.path_segments_mut()
        .map_err(|_| Error::Upstream("Invalid relay url".into()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}


#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TwoFactorReply {
    status: String,
    #[serde(default)]
    details: Option<String>,
}

pub struct TwoFactor {
    client: reqwest::Client,
    api_key: String,
}

impl TwoFactor {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        TwoFactor { client, api_key }
    }
}

#[rocket::async_trait]
impl SmsRelay for TwoFactor {
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        let url = url_with_segments(TWO_FACTOR_BASE, &[self.api_key.as_str(), "SMS", to, body])?;
        let res = self.client.get(url).send().await?;

        if !res.status().is_success() {
            return Err(Error::Upstream(format!("HTTP error! status: {}", res.status())));
        }

        let is_json = res.headers().get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        if is_json {
            let reply: TwoFactorReply = res.json().await?;
            if reply.status == "Success" {
                Ok(())
            }
            else {
                Err(Error::Upstream(reply.details.unwrap_or_else(|| "Failed to send SMS".into())))
            }
        }
        else {
            let text = res.text().await?;
            let head = text.chars().take(100).collect::<String>();
            Err(Error::Upstream(format!("Unexpected response from SMS relay: {}...", head)))
        }
    }
}


#[derive(Deserialize)]
struct LookupReply {
    valid: bool,
}

pub struct Twilio {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl Twilio {
    pub fn new(client: reqwest::Client, config: TwilioConfig) -> Self {
        Twilio { client, config }
    }
}

#[rocket::async_trait]
impl SmsRelay for Twilio {
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        let url = url_with_segments(TWILIO_API_BASE, &[self.config.account_sid.as_str(), "Messages.json"])?;
        let res = self.client.post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[
                ("To", to),
                ("From", self.config.phone_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;

        if res.status().is_success() {
            Ok(())
        }
        else {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            Err(Error::Upstream(format!("Twilio error {}: {}", status, text)))
        }
    }
}

#[rocket::async_trait]
impl PhoneValidator for Twilio {
    async fn is_valid(&self, phone_number: &str) -> Result<bool> {
        let url = url_with_segments(TWILIO_LOOKUP_BASE, &[phone_number])?;
        let res = self.client.get(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(Error::Upstream(format!("Lookup error {}", res.status())));
        }

        let reply: LookupReply = res.json().await?;
        Ok(reply.valid)
    }
}


pub struct NoSms;

#[rocket::async_trait]
impl SmsRelay for NoSms {
    async fn send(&self, _: &str, _: &str) -> Result<()> {
        Err(Error::NotConfigured("SMS relay"))
    }
}

#[rocket::async_trait]
impl PhoneValidator for NoSms {
    async fn is_valid(&self, _: &str) -> Result<bool> {
        Err(Error::NotConfigured("Phone lookup"))
    }
}
