use std::env;
use std::str::FromStr;

use log::LevelFilter;

use crate::util;


pub const PASSWORD_HASH_SORT: &'static str = "^^ SafeWalk 42 5749";


#[derive(Clone, Debug, Default)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub alert_email: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub phone_number: String,
}

#[derive(Clone, Debug)]
pub struct SosConfig {
    pub countdown: u32,
    pub require_contacts: bool,
    pub allow_cancel: bool,
}

impl Default for SosConfig {
    fn default() -> Self {
        SosConfig {
            countdown: 5,
            require_contacts: true,
            allow_cancel: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub id: String,
    pub pwd_hash: u64,
}

impl AdminConfig {
    pub fn new(id: &str, pwd: &str) -> Self {
        AdminConfig {
            id: id.to_owned(),
            pwd_hash: hash_password(pwd),
        }
    }

    pub fn check(&self, id: &str, pwd: &str) -> bool {
        self.id == id && self.pwd_hash == hash_password(pwd)
    }
}

pub fn hash_password(pwd: &str) -> u64 {
    let sorted_pwd = pwd.to_owned() + PASSWORD_HASH_SORT;
    util::calculate_hash(&sorted_pwd)
}


#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: String,
    pub admin: Option<AdminConfig>,
    pub emailjs: Option<EmailJsConfig>,
    pub two_factor_key: Option<String>,
    pub twilio: Option<TwilioConfig>,
    pub openai_key: Option<String>,
    pub openai_model: String,
    pub sos: SosConfig,
    pub notify_on_report: bool,
    pub log_level: LevelFilter,
    pub sentry_dsn: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            db_path: "safewalk.db".into(),
            admin: None,
            emailjs: None,
            two_factor_key: None,
            twilio: None,
            openai_key: None,
            openai_model: "gpt-3.5-turbo".into(),
            sos: SosConfig::default(),
            notify_on_report: false,
            log_level: LevelFilter::Info,
            sentry_dsn: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self where
        F: Fn(&str) -> Option<String> {

        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = AppConfig::default();

        let admin = match (var("ADMIN_ID"), var("ADMIN_PWD")) {
            (Some(id), Some(pwd)) => Some(AdminConfig::new(&id, &pwd)),
            _ => None,
        };

        let emailjs = match (var("EMAILJS_SERVICE_ID"), var("EMAILJS_TEMPLATE_ID"), var("EMAILJS_PUBLIC_KEY")) {
            (Some(service_id), Some(template_id), Some(public_key)) => Some(EmailJsConfig {
                service_id,
                template_id,
                public_key,
                alert_email: var("ALERT_EMAIL"),
            }),
            _ => None,
        };

        let twilio = match (var("TWILIO_ACCOUNT_SID"), var("TWILIO_AUTH_TOKEN"), var("TWILIO_PHONE_NUMBER")) {
            (Some(account_sid), Some(auth_token), Some(phone_number)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                phone_number,
            }),
            _ => None,
        };

        AppConfig {
            db_path: var("SAFEWALK_DB").unwrap_or(defaults.db_path),
            admin,
            emailjs,
            two_factor_key: var("TWOFACTOR_API_KEY"),
            twilio,
            openai_key: var("OPENAI_API_KEY"),
            openai_model: var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            sos: SosConfig {
                countdown: parse_or(var("SOS_COUNTDOWN"), defaults.sos.countdown),
                require_contacts: parse_or(var("SOS_REQUIRE_CONTACTS"), defaults.sos.require_contacts),
                allow_cancel: parse_or(var("SOS_ALLOW_CANCEL"), defaults.sos.allow_cancel),
            },
            notify_on_report: parse_or(var("NOTIFY_ON_REPORT"), defaults.notify_on_report),
            log_level: parse_or(var("LOG_LEVEL"), defaults.log_level),
            sentry_dsn: var("SENTRY_DSN"),
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
