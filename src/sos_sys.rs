//! SOS trigger.
//!
//! One machine covers every variant of the flow: gating on stored contacts
//! and cancellation are both configuration. A session is Armed for a fixed
//! number of one-second ticks and is then dispatched. Dispatch writes the
//! alert to `sosAlerts` before any relay is called, so a failed email or
//! SMS never loses the alert.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::Utc;
use log::{error, info, warn};
use rocket::{
    delete, get, post,
    http::Status,
    response::status::Custom,
    serde::json::{self, Json},
    State,
};
use serde::{Deserialize, Serialize};

use crate::config::SosConfig;
use crate::email_sys::{self, EmailParams, EmailRelay};
use crate::error::{Error, Result};
use crate::notice::Notice;
use crate::records::{AlertUser, EmergencyContact, GeoLocation, SosAlert};
use crate::sms_sys::{self, SmsRelay};
use crate::state::AppState;
use crate::store::{Bucket, BucketKey, BucketStore};
use crate::util;


pub const SOS_EMAIL_SUBJECT: &'static str = "URGENT: SOS Alert from SafeWalk User";
pub const SOS_SMS_BODY: &'static str = "I'm in danger. Please help!";
const SOS_EMAIL_FROM_NAME: &'static str = "SafeWalk SOS Alert";
const SOS_EMAIL_FROM: &'static str = "sos@safewalk.com";
const CONTACTS_PATH: &'static str = "/emergency-contacts";
const TICK: Duration = Duration::from_secs(1);
const ENDED_SESSION_TTL: Duration = Duration::from_secs(10 * 60);


#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SosState {
    Idle,
    Confirming,
    Armed { remaining: u32 },
    Dispatched,
    Cancelled,
}


#[derive(Clone, Debug)]
pub struct SosMachine {
    state: SosState,
    countdown: u32,
    require_contacts: bool,
    allow_cancel: bool,
}

impl SosMachine {
    pub fn new(config: &SosConfig) -> Self {
        SosMachine {
            state: SosState::Idle,
            countdown: config.countdown,
            require_contacts: config.require_contacts,
            allow_cancel: config.allow_cancel,
        }
    }

    pub fn state(&self) -> SosState {
        self.state
    }

    pub fn trigger(&mut self, n_contacts: usize) -> Result<SosState> {
        match self.state {
            SosState::Idle | SosState::Confirming => {
                self.state = if self.require_contacts && n_contacts == 0 {
                    SosState::Confirming
                }
                else {
                    SosState::Armed { remaining: self.countdown }
                };
                Ok(self.state)
            },
            _ => Err(Error::Conflict("SOS is already triggered".into())),
        }
    }

    pub fn tick(&mut self) -> SosState {
        if let SosState::Armed { remaining } = self.state {
            self.state = SosState::Armed { remaining: remaining.saturating_sub(1) };
        }
        self.state
    }

    pub fn is_due(&self) -> bool {
        self.state == SosState::Armed { remaining: 0 }
    }

    pub fn dispatch(&mut self) -> Result<()> {
        if self.is_due() {
            self.state = SosState::Dispatched;
            Ok(())
        }
        else {
            Err(Error::Conflict("SOS is not ready to dispatch".into()))
        }
    }

    pub fn cancel(&mut self) -> Result<()> {
        if !self.allow_cancel {
            return Err(Error::Conflict("Cancelling an SOS is disabled".into()));
        }

        match self.state {
            SosState::Armed { .. } => {
                self.state = SosState::Cancelled;
                Ok(())
            },
            _ => Err(Error::Conflict("Only an armed SOS can be cancelled".into())),
        }
    }
}


#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SosView {
    pub id: String,
    #[serde(flatten)]
    pub state: SosState,
    pub location: GeoLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<i64>,
    pub errors: Vec<String>,
}

struct SosSession {
    machine: SosMachine,
    location: GeoLocation,
    alert_id: Option<i64>,
    errors: Vec<String>,
    ended_at: Option<Instant>,
}

impl SosSession {
    fn view(&self, id: &str) -> SosView {
        SosView {
            id: id.to_owned(),
            state: self.machine.state(),
            location: self.location.clone(),
            alert_id: self.alert_id,
            errors: self.errors.clone(),
        }
    }
}


/// Live SOS sessions by id. A session is kept for ten minutes after it is
/// dispatched or cancelled so a client can still read how it went, and is
/// dropped the next time a session is raised.
pub struct SosRegistry {
    sessions: Mutex<HashMap<String, SosSession>>,
}

impl SosRegistry {
    pub fn new() -> Self {
        SosRegistry {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn with_session<F, R>(&self, id: &str, job: F) -> Result<R> where
        F: FnOnce(&mut SosSession) -> Result<R> {

        let mut sessions = self.sessions.lock()
            .map_err(|_| Error::Storage("sos registry poisoned".into()))?;
        let session = sessions.get_mut(id).ok_or(Error::NotFound)?;
        job(session)
    }

    fn insert(&self, machine: SosMachine, location: GeoLocation) -> Result<SosView> {
        let id = util::generate_rand_id(12);
        let session = SosSession {
            machine,
            location,
            alert_id: None,
            errors: Vec::new(),
            ended_at: None,
        };
        let view = session.view(&id);

        self.prune_ended(Instant::now())?;

        let mut sessions = self.sessions.lock()
            .map_err(|_| Error::Storage("sos registry poisoned".into()))?;
        sessions.insert(id, session);

        Ok(view)
    }

    /// Drops sessions that ended more than `ENDED_SESSION_TTL` before `now`.
    fn prune_ended(&self, now: Instant) -> Result<usize> {
        let mut sessions = self.sessions.lock()
            .map_err(|_| Error::Storage("sos registry poisoned".into()))?;

        let before = sessions.len();
        sessions.retain(|_, session| match session.ended_at {
            Some(ended_at) => now.saturating_duration_since(ended_at) < ENDED_SESSION_TTL,
            None => true,
        });

        Ok(before - sessions.len())
    }

    pub fn get(&self, id: &str) -> Result<SosView> {
        self.with_session(id, |session| Ok(session.view(id)))
    }

    pub fn tick(&self, id: &str) -> Result<SosState> {
        self.with_session(id, |session| Ok(session.machine.tick()))
    }

    pub fn cancel(&self, id: &str) -> Result<SosView> {
        self.with_session(id, |session| {
            session.machine.cancel()?;
            session.ended_at = Some(Instant::now());
            Ok(session.view(id))
        })
    }

    /// Moves a due session to Dispatched and hands back where it was raised.
    fn begin_dispatch(&self, id: &str) -> Result<GeoLocation> {
        self.with_session(id, |session| {
            session.machine.dispatch()?;
            Ok(session.location.clone())
        })
    }

    fn finish_dispatch(&self, id: &str, alert_id: Option<i64>, errors: Vec<String>) -> Result<SosView> {
        self.with_session(id, |session| {
            session.alert_id = alert_id;
            session.errors = errors;
            session.ended_at = Some(Instant::now());
            Ok(session.view(id))
        })
    }
}


/// Owned handles to everything a dispatch touches, so a countdown can run
/// on its own task after the request that armed it has returned.
#[derive(Clone)]
pub struct SosDispatcher {
    store: Arc<dyn BucketStore>,
    email: Arc<dyn EmailRelay>,
    sms: Arc<dyn SmsRelay>,
    registry: Arc<SosRegistry>,
}

impl SosDispatcher {
    pub fn from_state(state: &AppState) -> Self {
        SosDispatcher {
            store: state.store.clone(),
            email: state.email.clone(),
            sms: state.sos_sms.clone(),
            registry: state.sos.clone(),
        }
    }

    pub async fn dispatch(&self, id: &str) -> Result<SosView> {
        let location = self.registry.begin_dispatch(id)?;
        let user = AlertUser::default();
        let mut errors = Vec::new();

        let alert = SosAlert::new(user, location.clone(), Utc::now());
        let alert_id = match Bucket::new(&*self.store, BucketKey::SosAlerts).append(alert.clone()) {
            Ok(_) => Some(alert.id),
            Err(err) => {
                error!("Fail to save SOS alert {}: {}", alert.id, err);
                errors.push(err.to_string());
                None
            },
        };

        let params = EmailParams {
            from_name: SOS_EMAIL_FROM_NAME.into(),
            from_email: SOS_EMAIL_FROM.into(),
            subject: SOS_EMAIL_SUBJECT.into(),
            message: sos_email_message(&location),
            to_email: None,
        };
        if let Err(err) = email_sys::send_checked(&*self.email, &params).await {
            warn!("SOS email failed: {}", err);
            errors.push(format!("Email: {}", err));
        }

        let numbers = Bucket::<EmergencyContact>::new(&*self.store, BucketKey::EmergencyContacts)
            .read_all()
            .into_iter()
            .map(|contact| contact.phone_number)
            .collect::<Vec<_>>();
        if !numbers.is_empty() {
            let body = format!("{} {}", SOS_SMS_BODY, location.maps_url());
            if let Err(err) = sms_sys::fan_out(&*self.sms, &numbers, &body).await {
                errors.push(format!("SMS: {}", err));
            }
        }

        info!("SOS {} dispatched with {} relay errors", id, errors.len());

        self.registry.finish_dispatch(id, alert_id, errors)
    }

    async fn run_countdown(self, id: String) {
        loop {
            rocket::tokio::time::sleep(TICK).await;

            match self.registry.tick(&id) {
                Ok(SosState::Armed { remaining: 0 }) => {
                    if let Err(err) = self.dispatch(&id).await {
                        error!("Fail to dispatch SOS {}: {}", id, err);
                    }
                    break;
                },
                Ok(SosState::Armed { .. }) => continue,
                Ok(state) => {
                    info!("SOS {} countdown stopped in {:?}", id, state);
                    break;
                },
                Err(err) => {
                    warn!("SOS {} countdown lost its session: {}", id, err);
                    break;
                },
            }
        }
    }
}


fn sos_email_message(location: &GeoLocation) -> String {
    format!("A SafeWalk user has triggered an SOS alert. Immediate assistance may be required.\n\nLocation: {}\nMap Link: {}",
        location.name, location.maps_url())
}


#[derive(Deserialize, Default)]
pub struct SosForm {
    #[serde(default)]
    location: Option<GeoLocation>,
}

#[derive(Serialize)]
pub struct SosReply {
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<SosView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'static str>,
    notice: Notice,
}

fn dispatch_notice(view: &SosView) -> Notice {
    if view.errors.is_empty() {
        Notice::info("SOS Alert Activated",
            "Emergency alert and location have been sent. Help is on the way.")
    }
    else {
        Notice::destructive("SOS Alert Failed",
            format!("The alert was recorded but some notifications failed ({}). Please contact emergency services directly.",
                view.errors.join("; ")))
    }
}

#[post("/sos", data = "<form>")]
pub async fn post_sos(form: std::result::Result<Json<SosForm>, json::Error<'_>>, state: &State<AppState>)
    -> Result<Custom<Json<SosReply>>> {

    // An empty body raises the SOS at the default location.
    let form = match form {
        Ok(form) => form.into_inner(),
        Err(json::Error::Parse(body, _)) if body.trim().is_empty() => SosForm::default(),
        Err(err) => {
            warn!("Rejected SOS form: {}", err);
            return Err(Error::InvalidForm);
        },
    };
    let n_contacts = Bucket::<EmergencyContact>::new(state.store(), BucketKey::EmergencyContacts)
        .read_all()
        .len();

    let mut machine = SosMachine::new(&state.config.sos);
    if machine.trigger(n_contacts)? == SosState::Confirming {
        return Ok(Custom(Status::Conflict, Json(SosReply {
            session: None,
            redirect: Some(CONTACTS_PATH),
            notice: Notice::destructive("No Emergency Contacts",
                "Please add at least one emergency contact before using SOS."),
        })));
    }

    let due = machine.is_due();
    let view = state.sos.insert(machine, form.location.unwrap_or_default())?;
    let dispatcher = SosDispatcher::from_state(state);

    info!("SOS {} armed", view.id);

    if due {
        let view = dispatcher.dispatch(&view.id).await?;
        Ok(Custom(Status::Ok, Json(SosReply {
            notice: dispatch_notice(&view),
            session: Some(view),
            redirect: None,
        })))
    }
    else {
        rocket::tokio::spawn(dispatcher.run_countdown(view.id.clone()));

        Ok(Custom(Status::Accepted, Json(SosReply {
            notice: Notice::info("SOS Armed",
                format!("Alert will be sent in {} seconds.", state.config.sos.countdown)),
            session: Some(view),
            redirect: None,
        })))
    }
}

#[get("/sos/<id>")]
pub fn get_sos(id: &str, state: &State<AppState>) -> Result<Json<SosView>> {
    state.sos.get(id).map(Json)
}

#[delete("/sos/<id>")]
pub fn delete_sos(id: &str, state: &State<AppState>) -> Result<Json<SosReply>> {
    let view = state.sos.cancel(id)?;
    info!("SOS {} cancelled", id);

    Ok(Json(SosReply {
        session: Some(view),
        redirect: None,
        notice: Notice::info("SOS Cancelled", "No alert was sent."),
    }))
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use crate::store::MemoryStore;
    use crate::testing::{RecordingEmail, RecordingSms};

    fn config(countdown: u32, require_contacts: bool, allow_cancel: bool) -> SosConfig {
        SosConfig { countdown, require_contacts, allow_cancel }
    }

    #[rstest]
    #[case(true, 0, SosState::Confirming)]
    #[case(true, 2, SosState::Armed { remaining: 5 })]
    #[case(false, 0, SosState::Armed { remaining: 5 })]
    fn trigger_respects_contact_gate(#[case] gated: bool, #[case] n_contacts: usize, #[case] expected: SosState) {
        let mut machine = SosMachine::new(&config(5, gated, false));
        assert_eq!(machine.trigger(n_contacts).unwrap(), expected);
    }

    #[test]
    fn confirming_can_be_retried_once_contacts_exist() {
        let mut machine = SosMachine::new(&config(3, true, false));
        machine.trigger(0).unwrap();
        assert_eq!(machine.trigger(1).unwrap(), SosState::Armed { remaining: 3 });
        assert!(machine.trigger(1).is_err());
    }

    #[test]
    fn countdown_reaches_due_then_dispatches() {
        let mut machine = SosMachine::new(&config(2, false, false));
        machine.trigger(0).unwrap();

        assert!(machine.dispatch().is_err());
        assert_eq!(machine.tick(), SosState::Armed { remaining: 1 });
        assert_eq!(machine.tick(), SosState::Armed { remaining: 0 });
        assert!(machine.is_due());

        machine.dispatch().unwrap();
        assert_eq!(machine.state(), SosState::Dispatched);
        assert_eq!(machine.tick(), SosState::Dispatched);
    }

    #[test]
    fn cancel_needs_the_flag() {
        let mut locked = SosMachine::new(&config(5, false, false));
        locked.trigger(0).unwrap();
        assert!(locked.cancel().is_err());
        assert_eq!(locked.state(), SosState::Armed { remaining: 5 });

        let mut open = SosMachine::new(&config(5, false, true));
        open.trigger(0).unwrap();
        open.cancel().unwrap();
        assert_eq!(open.state(), SosState::Cancelled);
        assert_eq!(open.tick(), SosState::Cancelled);
    }

    #[test]
    fn dispatched_sos_cannot_be_cancelled() {
        let mut machine = SosMachine::new(&config(0, false, true));
        machine.trigger(0).unwrap();
        machine.dispatch().unwrap();
        assert!(machine.cancel().is_err());
    }

    fn dispatcher(email: Arc<RecordingEmail>, sms: Arc<RecordingSms>) -> (SosDispatcher, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = SosDispatcher {
            store: store.clone(),
            email,
            sms,
            registry: Arc::new(SosRegistry::new()),
        };
        (dispatcher, store)
    }

    fn armed_now(dispatcher: &SosDispatcher) -> String {
        let mut machine = SosMachine::new(&config(0, false, false));
        machine.trigger(0).unwrap();
        dispatcher.registry.insert(machine, GeoLocation::default()).unwrap().id
    }

    #[rocket::async_test]
    async fn alert_is_kept_when_every_relay_fails() {
        let (dispatcher, store) = dispatcher(Arc::new(RecordingEmail::failing()), Arc::new(RecordingSms::failing()));
        Bucket::new(&*store, BucketKey::EmergencyContacts)
            .push_back(EmergencyContact { name: "Asha".into(), phone_number: "+911".into() })
            .unwrap();

        let id = armed_now(&dispatcher);
        let view = dispatcher.dispatch(&id).await.unwrap();

        assert_eq!(view.state, SosState::Dispatched);
        assert_eq!(view.errors.len(), 2);

        let alerts = Bucket::<SosAlert>::new(&*store, BucketKey::SosAlerts).read_all();
        assert_eq!(alerts.len(), 1);
        assert_eq!(Some(alerts[0].id), view.alert_id);
    }

    #[rocket::async_test]
    async fn dispatch_emails_and_texts_every_contact() {
        let email = Arc::new(RecordingEmail::ok());
        let sms = Arc::new(RecordingSms::ok());
        let (dispatcher, store) = dispatcher(email.clone(), sms.clone());

        let contacts = Bucket::new(&*store, BucketKey::EmergencyContacts);
        contacts.push_back(EmergencyContact { name: "Asha".into(), phone_number: "+911".into() }).unwrap();
        contacts.push_back(EmergencyContact { name: "Ravi".into(), phone_number: "+912".into() }).unwrap();

        let id = armed_now(&dispatcher);
        let view = dispatcher.dispatch(&id).await.unwrap();
        assert!(view.errors.is_empty());

        let mails = email.sent();
        assert_eq!(mails.len(), 1);
        assert_eq!(mails[0].subject, SOS_EMAIL_SUBJECT);
        assert_eq!(mails[0].from_email, "sos@safewalk.com");
        assert!(mails[0].message.starts_with("A SafeWalk user has triggered an SOS alert."));
        assert!(mails[0].message.contains("Location: Vivekananda College, Puttur\nMap Link: https://www.google.com/maps?q=12.7606,75.2006"));

        let texts = sms.sent();
        assert_eq!(texts.iter().map(|(to, _)| to.as_str()).collect::<Vec<_>>(), vec!["+911", "+912"]);
        assert!(texts[0].1.starts_with(SOS_SMS_BODY));
    }

    #[rocket::async_test]
    async fn ended_sessions_expire_but_armed_ones_stay() {
        let (dispatcher, _) = dispatcher(Arc::new(RecordingEmail::ok()), Arc::new(RecordingSms::ok()));
        let registry = &dispatcher.registry;

        let dispatched = armed_now(&dispatcher);
        dispatcher.dispatch(&dispatched).await.unwrap();

        let mut machine = SosMachine::new(&config(30, false, false));
        machine.trigger(0).unwrap();
        let armed = registry.insert(machine, GeoLocation::default()).unwrap().id;

        assert_eq!(registry.prune_ended(Instant::now()).unwrap(), 0);
        assert!(registry.get(&dispatched).is_ok());

        let later = Instant::now() + ENDED_SESSION_TTL + Duration::from_secs(1);
        assert_eq!(registry.prune_ended(later).unwrap(), 1);
        assert!(matches!(registry.get(&dispatched), Err(Error::NotFound)));
        assert!(registry.get(&armed).is_ok());
    }

    #[rocket::async_test]
    async fn second_dispatch_is_refused() {
        let (dispatcher, _) = dispatcher(Arc::new(RecordingEmail::ok()), Arc::new(RecordingSms::ok()));
        let id = armed_now(&dispatcher);

        dispatcher.dispatch(&id).await.unwrap();
        assert!(dispatcher.dispatch(&id).await.is_err());
    }

    mod routes {
        use crate::config::{AppConfig, SosConfig};
        use crate::testing::{self, RecordingEmail, RecordingSms};
        use crate::store::BucketStore;
        use rocket::http::{ContentType, Status};
        use rocket::local::blocking::Client;
        use serde_json::{json, Value};

        fn sos_client(countdown: u32, require_contacts: bool, allow_cancel: bool) -> (Client, testing::Fakes) {
            let config = AppConfig {
                sos: SosConfig { countdown, require_contacts, allow_cancel },
                ..AppConfig::default()
            };
            testing::client_with(config, RecordingEmail::ok(), RecordingSms::ok())
        }

        fn add_contact(client: &Client) {
            let res = client.post("/emergency-contacts")
                .header(ContentType::JSON)
                .body(json!({ "name": "Asha", "phoneNumber": "+919900000001" }).to_string())
                .dispatch();
            assert_eq!(res.status(), Status::Ok);
        }

        fn trigger(client: &Client, body: Value) -> (Status, Value) {
            let res = client.post("/sos")
                .header(ContentType::JSON)
                .body(body.to_string())
                .dispatch();
            (res.status(), res.into_json().unwrap())
        }

        #[test]
        fn no_contacts_routes_to_contact_page() {
            let (client, fakes) = sos_client(0, true, false);

            let (status, body) = trigger(&client, json!({}));
            assert_eq!(status, Status::Conflict);
            assert_eq!(body["redirect"], "/emergency-contacts");
            assert!(fakes.email.sent().is_empty());
        }

        #[test]
        fn immediate_dispatch_saves_and_notifies() {
            let (client, fakes) = sos_client(0, true, false);
            add_contact(&client);

            let (status, body) = trigger(&client, json!({
                "location": { "name": "Town Hall", "latitude": 12.9, "longitude": 77.5 },
            }));
            assert_eq!(status, Status::Ok);
            assert_eq!(body["session"]["state"], "dispatched");
            assert_eq!(body["notice"]["title"], "SOS Alert Activated");

            let id = body["session"]["id"].as_str().unwrap();
            let view: Value = client.get(format!("/sos/{}", id)).dispatch().into_json().unwrap();
            assert_eq!(view["state"], "dispatched");
            assert!(view["alert_id"].is_i64());

            assert_eq!(fakes.email.sent().len(), 1);
            assert_eq!(fakes.sos_sms.sent()[0].0, "+919900000001");
        }

        #[test]
        fn ungated_sos_works_without_contacts() {
            let (client, fakes) = sos_client(0, false, false);

            let (status, body) = trigger(&client, json!({}));
            assert_eq!(status, Status::Ok);
            assert_eq!(body["session"]["location"]["name"], "Vivekananda College, Puttur");
            assert!(fakes.sos_sms.sent().is_empty());
        }

        #[test]
        fn armed_sos_cancels_only_when_allowed() {
            let (client, _) = sos_client(30, false, true);
            let (status, body) = trigger(&client, json!({}));
            assert_eq!(status, Status::Accepted);
            assert_eq!(body["session"]["state"], "armed");
            assert_eq!(body["session"]["remaining"], 30);

            let id = body["session"]["id"].as_str().unwrap();
            let res = client.delete(format!("/sos/{}", id)).dispatch();
            assert_eq!(res.status(), Status::Ok);
            let view: Value = client.get(format!("/sos/{}", id)).dispatch().into_json().unwrap();
            assert_eq!(view["state"], "cancelled");

            let (locked, _) = sos_client(30, false, false);
            let (_, body) = trigger(&locked, json!({}));
            let id = body["session"]["id"].as_str().unwrap();
            assert_eq!(locked.delete(format!("/sos/{}", id)).dispatch().status(), Status::Conflict);
        }

        #[test]
        fn unnamed_location_keeps_its_coordinates() {
            let (client, fakes) = sos_client(0, false, false);

            let (status, body) = trigger(&client, json!({
                "location": { "latitude": 13.0, "longitude": 77.6 },
            }));
            assert_eq!(status, Status::Ok);
            assert_eq!(body["session"]["location"]["latitude"], 13.0);
            assert_eq!(body["session"]["location"]["longitude"], 77.6);
            assert_eq!(body["session"]["location"]["name"], "Current Location");

            let mails = fakes.email.sent();
            assert_eq!(mails[0].from_name, "SafeWalk SOS Alert");
            assert!(mails[0].message.contains("Map Link: https://www.google.com/maps?q=13,77.6"));
        }

        #[test]
        fn empty_body_uses_default_location() {
            let (client, _) = sos_client(0, false, false);

            let res = client.post("/sos").dispatch();
            assert_eq!(res.status(), Status::Ok);
            let body: Value = res.into_json().unwrap();
            assert_eq!(body["session"]["location"]["name"], "Vivekananda College, Puttur");
        }

        #[test]
        fn garbage_body_is_rejected_without_alerting() {
            let (client, fakes) = sos_client(0, false, false);

            for garbage in ["not json", r#"{"location":{"name":"x"}}"#] {
                let res = client.post("/sos")
                    .header(ContentType::JSON)
                    .body(garbage)
                    .dispatch();
                assert_eq!(res.status(), Status::BadRequest);
            }

            assert!(fakes.email.sent().is_empty());
            assert!(fakes.store.get("sosAlerts").unwrap().is_none());
        }

        #[test]
        fn unknown_session_is_not_found() {
            let (client, _) = sos_client(0, false, false);
            assert_eq!(client.get("/sos/nope").dispatch().status(), Status::NotFound);
        }
    }
}

