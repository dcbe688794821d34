use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};
use log::{info, warn};
use rand::Rng;
use rocket::{
    get, post,
    http::{Cookie, CookieJar, SameSite, Status},
    request::{self, FromRequest, Request},
    response::status::Custom,
    serde::json::{self, Json},
    State,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::error::{Error, Result};
use crate::notice::Notice;
use crate::records::{Report, SosAlert};
use crate::sms_sys::SmsRelay;
use crate::state::AppState;
use crate::store::{Bucket, BucketKey};
use crate::util;


const SESSION_COOKIE: &'static str = "session";
const ADMIN_COOKIE: &'static str = "admin";
const MAX_OTP_ATTEMPTS: u32 = 3;
const OTP_TTL: Duration = Duration::from_secs(10 * 60);


struct OtpEntry {
    otp: String,
    attempts: u32,
    sent_at: Instant,
}

#[derive(Debug, PartialEq, Eq)]
pub enum OtpOutcome {
    NoOtp,
    TooManyAttempts,
    Invalid,
    Verified,
}

impl OtpOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            OtpOutcome::NoOtp => "No OTP was sent to this number",
            OtpOutcome::TooManyAttempts => "Too many attempts. Please request a new OTP.",
            OtpOutcome::Invalid => "Invalid OTP",
            OtpOutcome::Verified => "OTP verified successfully",
        }
    }
}

/// Pending one-time codes by mobile number. Lives in memory only, so a
/// restart forgets every pending code. A code lapses ten minutes after it
/// was sent and lapsed codes are dropped whenever a new one is stored.
pub struct OtpStore {
    map: Mutex<HashMap<String, OtpEntry>>,
}

impl OtpStore {
    pub fn new() -> Self {
        OtpStore {
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn generate_otp() -> String {
        rand::thread_rng().gen_range(100_000..1_000_000).to_string()
    }

    pub fn insert(&self, mobile_number: &str, otp: String) -> Result<()> {
        let now = Instant::now();
        self.prune_expired(now)?;

        let mut map = self.map.lock()
            .map_err(|_| Error::Storage("otp store poisoned".into()))?;
        map.insert(mobile_number.to_owned(), OtpEntry {
            otp,
            attempts: 0,
            sent_at: now,
        });
        Ok(())
    }

    fn prune_expired(&self, now: Instant) -> Result<usize> {
        let mut map = self.map.lock()
            .map_err(|_| Error::Storage("otp store poisoned".into()))?;

        let before = map.len();
        map.retain(|_, entry| now.saturating_duration_since(entry.sent_at) < OTP_TTL);
        Ok(before - map.len())
    }

    /// Sends a fresh code and remembers it only once the SMS went out.
    pub async fn send(&self, mobile_number: &str, sms: &dyn SmsRelay) -> Result<()> {
        let otp = Self::generate_otp();
        sms.send(mobile_number, &format!("Your SafeWalk OTP is: {}", otp)).await?;
        self.insert(mobile_number, otp)
    }

    pub fn verify(&self, mobile_number: &str, otp: &str) -> Result<OtpOutcome> {
        let mut map = self.map.lock()
            .map_err(|_| Error::Storage("otp store poisoned".into()))?;

        let entry = match map.get_mut(mobile_number) {
            Some(entry) => entry,
            None => return Ok(OtpOutcome::NoOtp),
        };

        if entry.sent_at.elapsed() >= OTP_TTL {
            map.remove(mobile_number);
            return Ok(OtpOutcome::NoOtp);
        }

        entry.attempts += 1;

        if entry.attempts > MAX_OTP_ATTEMPTS {
            map.remove(mobile_number);
            Ok(OtpOutcome::TooManyAttempts)
        }
        else if entry.otp == otp {
            map.remove(mobile_number);
            Ok(OtpOutcome::Verified)
        }
        else {
            Ok(OtpOutcome::Invalid)
        }
    }
}


#[derive(Serialize)]
pub struct AuthReply {
    success: bool,
    message: String,
}

fn reply(status: Status, success: bool, message: &str) -> Custom<Json<AuthReply>> {
    Custom(status, Json(AuthReply { success, message: message.to_owned() }))
}


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequestForm {
    mobile_number: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerifyForm {
    mobile_number: String,
    otp: String,
}

#[post("/auth/otp", format = "json", data = "<form>")]
pub async fn post_otp(form: std::result::Result<Json<OtpRequestForm>, json::Error<'_>>, state: &State<AppState>)
    -> Custom<Json<AuthReply>> {

    let form = match form {
        Ok(form) if !form.mobile_number.trim().is_empty() => form.into_inner(),
        _ => return reply(Status::BadRequest, false, "Missing required parameters"),
    };

    match state.otp.send(&form.mobile_number, &*state.sms).await {
        Ok(()) => reply(Status::Ok, true, "OTP sent successfully"),
        Err(err) => {
            warn!("Fail to send OTP: {}", err);
            reply(Status::BadGateway, false, "Failed to send OTP. Please try again.")
        },
    }
}

#[post("/auth/otp/verify", format = "json", data = "<form>")]
pub fn post_otp_verify(form: std::result::Result<Json<OtpVerifyForm>, json::Error<'_>>, cookies: &CookieJar<'_>, state: &State<AppState>)
    -> Result<Custom<Json<AuthReply>>> {

    let form = form.map_err(|_| Error::InvalidForm)?;
    let outcome = state.otp.verify(&form.mobile_number, &form.otp)?;

    if outcome == OtpOutcome::Verified {
        let token = format!("session_{}", util::generate_rand_id(9).to_lowercase());
        cookies.add_private(Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .same_site(SameSite::Strict)
            .max_age(rocket::time::Duration::weeks(1)));

        info!("OTP verified for a mobile number");
        Ok(reply(Status::Ok, true, outcome.message()))
    }
    else {
        Ok(reply(Status::Unauthorized, false, outcome.message()))
    }
}

#[post("/auth/logout")]
pub fn post_logout(cookies: &CookieJar<'_>) -> Json<AuthReply> {
    cookies.remove_private(SESSION_COOKIE);
    Json(AuthReply { success: true, message: "Logged out successfully".into() })
}

#[get("/auth/session")]
pub fn get_session(cookies: &CookieJar<'_>) -> Json<JsonValue> {
    let authenticated = cookies.get_private(SESSION_COOKIE).is_some();
    Json(json!({ "authenticated": authenticated }))
}


pub struct Admin(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Admin {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        match req.cookies().get_private(ADMIN_COOKIE) {
            Some(cookie) => request::Outcome::Success(Admin(cookie.value().to_owned())),
            None => request::Outcome::Error((Status::Unauthorized,
                Error::Unauthorized("Admin login required".into()))),
        }
    }
}

#[derive(Deserialize)]
pub struct AdminLoginForm {
    id: String,
    password: String,
}

#[post("/admin/login", format = "json", data = "<form>")]
pub fn post_admin_login(form: std::result::Result<Json<AdminLoginForm>, json::Error<'_>>, cookies: &CookieJar<'_>, state: &State<AppState>)
    -> Result<Json<Notice>> {

    let form = form.map_err(|_| Error::InvalidForm)?;

    let admin = state.config.admin.as_ref()
        .ok_or_else(|| Error::Unauthorized("Admin login is not configured".into()))?;

    if admin.check(&form.id, &form.password) {
        cookies.add_private(Cookie::build((ADMIN_COOKIE, form.id.clone()))
            .http_only(true)
            .same_site(SameSite::Strict));

        info!("Admin {} logged in", form.id);
        Ok(Json(Notice::info("Login Successful", "Welcome to the admin dashboard.")))
    }
    else {
        warn!("Rejected admin login for {}", form.id);
        Err(Error::Unauthorized("Invalid admin credentials".into()))
    }
}

#[post("/admin/logout")]
pub fn post_admin_logout(cookies: &CookieJar<'_>) -> Json<Notice> {
    cookies.remove_private(ADMIN_COOKIE);
    Json(Notice::info("Logout Successful", "You have been logged out successfully."))
}

#[derive(Serialize)]
pub struct Dashboard {
    reports: Vec<Report>,
    sos_alerts: Vec<SosAlert>,
}

#[get("/admin/dashboard")]
pub fn get_dashboard(admin: std::result::Result<Admin, Error>, state: &State<AppState>) -> Result<Json<Dashboard>> {
    let admin = admin?;
    info!("Admin {} opened the dashboard", admin.0);

    Ok(Json(Dashboard {
        reports: Bucket::new(state.store(), BucketKey::NavbarReports).read_all(),
        sos_alerts: Bucket::new(state.store(), BucketKey::SosAlerts).read_all(),
    }))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_otp_has_six_digits() {
        for _ in 0..100 {
            let otp = OtpStore::generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(otp.chars().next(), Some('0'));
        }
    }

    #[test]
    fn unknown_number_has_no_otp() {
        let store = OtpStore::new();
        assert_eq!(store.verify("+91", "123456").unwrap(), OtpOutcome::NoOtp);
    }

    #[test]
    fn correct_code_verifies_once() {
        let store = OtpStore::new();
        store.insert("+91", "123456".into()).unwrap();

        assert_eq!(store.verify("+91", "123456").unwrap(), OtpOutcome::Verified);
        assert_eq!(store.verify("+91", "123456").unwrap(), OtpOutcome::NoOtp);
    }

    #[test]
    fn lapsed_codes_are_dropped() {
        let store = OtpStore::new();
        store.insert("+91", "123456".into()).unwrap();
        store.insert("+92", "654321".into()).unwrap();

        assert_eq!(store.prune_expired(Instant::now()).unwrap(), 0);

        let later = Instant::now() + OTP_TTL + Duration::from_secs(1);
        assert_eq!(store.prune_expired(later).unwrap(), 2);
        assert_eq!(store.verify("+91", "123456").unwrap(), OtpOutcome::NoOtp);
    }

    #[test]
    fn fourth_attempt_is_refused_even_if_correct() {
        let store = OtpStore::new();
        store.insert("+91", "123456".into()).unwrap();

        for _ in 0..3 {
            assert_eq!(store.verify("+91", "000000").unwrap(), OtpOutcome::Invalid);
        }
        assert_eq!(store.verify("+91", "123456").unwrap(), OtpOutcome::TooManyAttempts);
        assert_eq!(store.verify("+91", "123456").unwrap(), OtpOutcome::NoOtp);
    }

    #[test]
    fn third_attempt_can_still_succeed() {
        let store = OtpStore::new();
        store.insert("+91", "123456".into()).unwrap();

        store.verify("+91", "1").unwrap();
        store.verify("+91", "2").unwrap();
        assert_eq!(store.verify("+91", "123456").unwrap(), OtpOutcome::Verified);
    }

    mod routes {
        use crate::config::{AdminConfig, AppConfig};
        use crate::testing::{self, RecordingEmail, RecordingSms};
        use rocket::http::{ContentType, Status};
        use rocket::local::blocking::Client;
        use serde_json::{json, Value};

        fn request_otp(client: &Client) -> Status {
            client.post("/auth/otp")
                .header(ContentType::JSON)
                .body(json!({ "mobileNumber": "+919900000001" }).to_string())
                .dispatch()
                .status()
        }

        fn verify(client: &Client, otp: &str) -> (Status, Value) {
            let res = client.post("/auth/otp/verify")
                .header(ContentType::JSON)
                .body(json!({ "mobileNumber": "+919900000001", "otp": otp }).to_string())
                .dispatch();
            (res.status(), res.into_json().unwrap())
        }

        fn authenticated(client: &Client) -> bool {
            let body: Value = client.get("/auth/session").dispatch().into_json().unwrap();
            body["authenticated"].as_bool().unwrap()
        }

        #[test]
        fn otp_login_sets_a_session() {
            let (client, fakes) = testing::client();

            assert_eq!(request_otp(&client), Status::Ok);
            let sent = fakes.sms.sent();
            assert_eq!(sent.len(), 1);
            let otp = sent[0].1.trim_start_matches("Your SafeWalk OTP is: ").to_owned();
            assert_eq!(otp.len(), 6);

            let wrong = if otp == "111111" { "222222" } else { "111111" };
            let (status, body) = verify(&client, wrong);
            assert_eq!(status, Status::Unauthorized);
            assert_eq!(body["message"], "Invalid OTP");
            assert!(!authenticated(&client));

            let (status, body) = verify(&client, &otp);
            assert_eq!(status, Status::Ok);
            assert_eq!(body["success"], true);
            assert!(authenticated(&client));

            client.post("/auth/logout").dispatch();
            assert!(!authenticated(&client));
        }

        #[test]
        fn failed_sms_stores_no_otp() {
            let (client, _) = testing::client_with(AppConfig::default(), RecordingEmail::ok(), RecordingSms::failing());

            assert_eq!(request_otp(&client), Status::BadGateway);

            let (status, body) = verify(&client, "123456");
            assert_eq!(status, Status::Unauthorized);
            assert_eq!(body["message"], "No OTP was sent to this number");
        }

        fn admin_client() -> Client {
            let config = AppConfig {
                admin: Some(AdminConfig::new("warden", "s3cret")),
                ..AppConfig::default()
            };
            testing::client_with(config, RecordingEmail::ok(), RecordingSms::ok()).0
        }

        fn login(client: &Client, password: &str) -> Status {
            client.post("/admin/login")
                .header(ContentType::JSON)
                .body(json!({ "id": "warden", "password": password }).to_string())
                .dispatch()
                .status()
        }

        #[test]
        fn dashboard_needs_admin_login() {
            let client = admin_client();

            assert_eq!(client.get("/admin/dashboard").dispatch().status(), Status::Unauthorized);
            assert_eq!(login(&client, "guess"), Status::Unauthorized);
            assert_eq!(client.get("/admin/dashboard").dispatch().status(), Status::Unauthorized);

            assert_eq!(login(&client, "s3cret"), Status::Ok);
            let res = client.get("/admin/dashboard").dispatch();
            assert_eq!(res.status(), Status::Ok);
            let body: Value = res.into_json().unwrap();
            assert_eq!(body, json!({ "reports": [], "sos_alerts": [] }));

            client.post("/admin/logout").dispatch();
            assert_eq!(client.get("/admin/dashboard").dispatch().status(), Status::Unauthorized);
        }

        #[test]
        fn unconfigured_admin_cannot_log_in() {
            let (client, _) = testing::client();
            assert_eq!(login(&client, "s3cret"), Status::Unauthorized);
        }
    }
}
