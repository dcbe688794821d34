//! Fake relays and an app over `MemoryStore` for tests.

use std::sync::{Arc, Mutex};

use cgmath::Point2;
use rocket::local::blocking::Client;

use crate::auth_sys::OtpStore;
use crate::chat_sys::Assistant;
use crate::config::AppConfig;
use crate::crowd_sys::CrowdStatsCache;
use crate::email_sys::{EmailParams, EmailRelay};
use crate::error::{Error, Result};
use crate::geo_sys::{Geocoder, LatLon};
use crate::sms_sys::{PhoneValidator, SmsRelay};
use crate::sos_sys::SosRegistry;
use crate::state::AppState;
use crate::store::MemoryStore;


pub struct RecordingEmail {
    reply: Option<&'static str>,
    sent: Mutex<Vec<EmailParams>>,
}

impl RecordingEmail {
    pub fn ok() -> Self {
        RecordingEmail { reply: Some("OK"), sent: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        RecordingEmail { reply: None, sent: Mutex::new(Vec::new()) }
    }

    pub fn sent(&self) -> Vec<EmailParams> {
        self.sent.lock().unwrap().clone()
    }
}

#[rocket::async_trait]
impl EmailRelay for RecordingEmail {
    async fn send(&self, params: &EmailParams) -> Result<String> {
        match self.reply {
            Some(reply) => {
                self.sent.lock().unwrap().push(params.clone());
                Ok(reply.to_owned())
            },
            None => Err(Error::Upstream("relay down".into())),
        }
    }
}


pub struct RecordingSms {
    fail: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSms {
    pub fn ok() -> Self {
        RecordingSms { fail: false, sent: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        RecordingSms { fail: true, sent: Mutex::new(Vec::new()) }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[rocket::async_trait]
impl SmsRelay for RecordingSms {
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Upstream("relay down".into()));
        }
        self.sent.lock().unwrap().push((to.to_owned(), body.to_owned()));
        Ok(())
    }
}


/// Numbers starting with `+91` are valid, `+00` makes the lookup itself fail.
pub struct FakeLookup;

#[rocket::async_trait]
impl PhoneValidator for FakeLookup {
    async fn is_valid(&self, phone_number: &str) -> Result<bool> {
        if phone_number.starts_with("+00") {
            Err(Error::Upstream("lookup down".into()))
        }
        else {
            Ok(phone_number.starts_with("+91"))
        }
    }
}


pub struct EchoAssistant;

#[rocket::async_trait]
impl Assistant for EchoAssistant {
    async fn reply(&self, message: &str) -> Result<String> {
        Ok(format!("echo: {}", message))
    }
}


/// Knows two places; anything else is not found.
pub struct FixedGeocoder;

#[rocket::async_trait]
impl Geocoder for FixedGeocoder {
    async fn locate(&self, query: &str) -> Result<LatLon> {
        match query {
            "Bangalore" => Ok(Point2::new(12.97, 77.59)),
            "MG Road" => Ok(Point2::new(12.975, 77.606)),
            _ => Err(Error::Upstream("No geocoding result".into())),
        }
    }
}


pub struct Fakes {
    pub email: Arc<RecordingEmail>,
    pub sms: Arc<RecordingSms>,
    pub sos_sms: Arc<RecordingSms>,
    pub store: Arc<MemoryStore>,
}

pub fn test_state(config: AppConfig, email: RecordingEmail, sms: RecordingSms) -> (AppState, Fakes) {
    let fakes = Fakes {
        email: Arc::new(email),
        sms: Arc::new(sms),
        sos_sms: Arc::new(RecordingSms::ok()),
        store: Arc::new(MemoryStore::new()),
    };

    let state = AppState {
        config,
        store: fakes.store.clone(),
        email: fakes.email.clone(),
        sms: fakes.sms.clone(),
        sos_sms: fakes.sos_sms.clone(),
        phone_lookup: Arc::new(FakeLookup),
        assistant: Arc::new(EchoAssistant),
        geocoder: Arc::new(FixedGeocoder),
        otp: OtpStore::new(),
        sos: Arc::new(SosRegistry::new()),
        crowd: Arc::new(CrowdStatsCache::new()),
    };

    (state, fakes)
}

pub fn client_with(config: AppConfig, email: RecordingEmail, sms: RecordingSms) -> (Client, Fakes) {
    let (state, fakes) = test_state(config, email, sms);
    let client = Client::tracked(crate::build(state)).unwrap();
    (client, fakes)
}

pub fn client() -> (Client, Fakes) {
    client_with(AppConfig::default(), RecordingEmail::ok(), RecordingSms::ok())
}
