use std::sync::Arc;

use log::{info, warn};

use crate::auth_sys::OtpStore;
use crate::chat_sys::{Assistant, NoAssistant, OpenAi};
use crate::config::AppConfig;
use crate::crowd_sys::CrowdStatsCache;
use crate::db::SqliteStore;
use crate::email_sys::{EmailJs, EmailRelay, NoEmail};
use crate::error::Result;
use crate::geo_sys::{Geocoder, Nominatim};
use crate::sms_sys::{NoSms, PhoneValidator, SmsRelay, Twilio, TwoFactor};
use crate::sos_sys::SosRegistry;
use crate::store::BucketStore;


/// Everything the routes share. Each collaborator sits behind a trait so
/// the store and the third-party relays can be swapped out.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn BucketStore>,
    pub email: Arc<dyn EmailRelay>,
    /// General-purpose SMS (OTP codes, `/send-sms`).
    pub sms: Arc<dyn SmsRelay>,
    /// SMS used for SOS fan-out.
    pub sos_sms: Arc<dyn SmsRelay>,
    pub phone_lookup: Arc<dyn PhoneValidator>,
    pub assistant: Arc<dyn Assistant>,
    pub geocoder: Arc<dyn Geocoder>,
    pub otp: OtpStore,
    pub sos: Arc<SosRegistry>,
    pub crowd: Arc<CrowdStatsCache>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let store = SqliteStore::open(&config.db_path)?;
        match store.bucket_keys() {
            Ok(keys) => info!("{} buckets on file: {:?}", keys.len(), keys),
            Err(err) => warn!("Fail to list buckets: {}", err),
        }

        let client = reqwest::Client::new();

        let email: Arc<dyn EmailRelay> = match &config.emailjs {
            Some(c) => Arc::new(EmailJs::new(client.clone(), c.clone())),
            None => {
                warn!("Email relay is not configured");
                Arc::new(NoEmail)
            },
        };

        let sms: Arc<dyn SmsRelay> = match &config.two_factor_key {
            Some(key) => Arc::new(TwoFactor::new(client.clone(), key.clone())),
            None => {
                warn!("SMS relay is not configured");
                Arc::new(NoSms)
            },
        };

        let (sos_sms, phone_lookup): (Arc<dyn SmsRelay>, Arc<dyn PhoneValidator>) = match &config.twilio {
            Some(c) => {
                let twilio = Arc::new(Twilio::new(client.clone(), c.clone()));
                (twilio.clone() as Arc<dyn SmsRelay>, twilio as Arc<dyn PhoneValidator>)
            },
            None => {
                warn!("Twilio is not configured");
                (Arc::new(NoSms) as Arc<dyn SmsRelay>, Arc::new(NoSms) as Arc<dyn PhoneValidator>)
            },
        };

        let assistant: Arc<dyn Assistant> = match &config.openai_key {
            Some(key) => Arc::new(OpenAi::new(client.clone(), key.clone(), config.openai_model.clone())),
            None => {
                warn!("Assistant is not configured");
                Arc::new(NoAssistant)
            },
        };

        Ok(AppState {
            store: Arc::new(store),
            email,
            sms,
            sos_sms,
            phone_lookup,
            assistant,
            geocoder: Arc::new(Nominatim::new(client)),
            otp: OtpStore::new(),
            sos: Arc::new(SosRegistry::new()),
            crowd: Arc::new(CrowdStatsCache::new()),
            config,
        })
    }

    pub fn store(&self) -> &dyn BucketStore {
        &*self.store
    }
}
