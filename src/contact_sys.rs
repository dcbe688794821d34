use log::{info, warn};
use rocket::{
    get, post,
    http::Status,
    response::status::Custom,
    serde::json::{self, Json},
    State,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::email_sys::{self, EmailParams};
use crate::error::{Error, Result};
use crate::notice::Notice;
use crate::records::EmergencyContact;
use crate::sms_sys;
use crate::sos_sys::SOS_SMS_BODY;
use crate::state::AppState;
use crate::store::{Bucket, BucketKey};
use crate::util;


const INVALID_CONTACT: &'static str = "Failed to add contact. Please ensure the phone number is valid.";
const DEFAULT_SHARED_PLACE: &'static str = "Puttur, Karnataka";


#[derive(Serialize)]
pub struct ContactReply {
    contact: EmergencyContact,
    notice: Notice,
}

#[post("/emergency-contacts", format = "json", data = "<form>")]
pub async fn post_emergency_contact(form: std::result::Result<Json<EmergencyContact>, json::Error<'_>>, state: &State<AppState>)
    -> Result<Json<ContactReply>> {

    let contact = form.map_err(|_| Error::InvalidForm)?.into_inner();
    if contact.name.trim().is_empty() || contact.phone_number.trim().is_empty() {
        return Err(Error::validation("Missing Details",
            "Please enter a name and a phone number for the contact."));
    }

    match state.phone_lookup.is_valid(&contact.phone_number).await {
        Ok(true) => (),
        Ok(false) => return Err(Error::validation("Error", INVALID_CONTACT)),
        Err(err) => {
            warn!("Phone lookup failed: {}", err);
            return Err(Error::validation("Error", INVALID_CONTACT));
        },
    }

    Bucket::new(state.store(), BucketKey::EmergencyContacts).push_back(contact.clone())?;

    info!("Emergency contact {} added", contact.name);

    Ok(Json(ContactReply {
        contact,
        notice: Notice::info("Contact Added", "Emergency contact has been saved successfully."),
    }))
}

#[get("/emergency-contacts")]
pub fn get_emergency_contacts(state: &State<AppState>) -> Json<Vec<EmergencyContact>> {
    Json(Bucket::new(state.store(), BucketKey::EmergencyContacts).read_all())
}


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneForm {
    phone_number: String,
}

#[post("/validate-phone-number", format = "json", data = "<form>")]
pub async fn post_validate_phone(form: std::result::Result<Json<PhoneForm>, json::Error<'_>>, state: &State<AppState>)
    -> Custom<Json<JsonValue>> {

    let form = match form {
        Ok(form) => form,
        Err(_) => return Custom(Status::BadRequest, Json(json!({ "error": "Invalid form" }))),
    };

    match state.phone_lookup.is_valid(&form.phone_number).await {
        Ok(true) => Custom(Status::Ok, Json(json!({ "valid": true }))),
        Ok(false) => Custom(Status::BadRequest, Json(json!({ "valid": false }))),
        Err(err) => {
            warn!("Phone lookup failed: {}", err);
            Custom(Status::BadGateway, Json(json!({ "error": "Failed to validate phone number" })))
        },
    }
}


#[derive(Deserialize)]
pub struct SmsForm {
    #[serde(default)]
    to: String,
    #[serde(default)]
    body: String,
}

#[derive(Serialize)]
pub struct SmsReply {
    success: bool,
    message: String,
}

#[post("/send-sms", format = "json", data = "<form>")]
pub async fn post_send_sms(form: std::result::Result<Json<SmsForm>, json::Error<'_>>, state: &State<AppState>)
    -> Custom<Json<SmsReply>> {

    let form = match form {
        Ok(form) if !form.to.is_empty() && !form.body.is_empty() => form.into_inner(),
        _ => return Custom(Status::BadRequest, Json(SmsReply {
            success: false,
            message: "Missing required parameters".into(),
        })),
    };

    match state.sms.send(&form.to, &form.body).await {
        Ok(()) => {
            info!("SMS sent successfully");
            Custom(Status::Ok, Json(SmsReply { success: true, message: "SMS sent successfully".into() }))
        },
        Err(err) => {
            warn!("Error sending SMS: {}", err);
            Custom(err.status(), Json(SmsReply { success: false, message: err.to_string() }))
        },
    }
}


#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosContact {
    phone_number: String,
}

#[derive(Deserialize)]
pub struct SendSosForm {
    #[serde(default)]
    contacts: Vec<SosContact>,
}

#[post("/send-sos", format = "json", data = "<form>")]
pub async fn post_send_sos(form: std::result::Result<Json<SendSosForm>, json::Error<'_>>, state: &State<AppState>)
    -> Custom<Json<JsonValue>> {

    let numbers = form.ok()
        .map(|f| f.into_inner().contacts)
        .unwrap_or_default()
        .into_iter()
        .map(|c| c.phone_number)
        .collect::<Vec<_>>();

    if numbers.is_empty() {
        return Custom(Status::BadRequest, Json(json!({ "error": "No emergency contacts found" })));
    }

    match sms_sys::fan_out(&*state.sos_sms, &numbers, SOS_SMS_BODY).await {
        Ok(_) => Custom(Status::Ok, Json(json!({ "success": true }))),
        Err(err) => {
            warn!("Error sending SOS messages: {}", err);
            Custom(Status::BadGateway, Json(json!({ "error": "Failed to send SOS messages" })))
        },
    }
}


#[derive(Deserialize)]
pub struct ContactForm {
    name: String,
    email: String,
    subject: String,
    message: String,
}

impl ContactForm {
    fn verify_error(&self) -> Option<Error> {
        let fields = [&self.name, &self.email, &self.subject, &self.message];
        if fields.iter().any(|f| f.trim().is_empty()) {
            Some(Error::validation("Error", "Please fill in all fields."))
        }
        else {
            None
        }
    }
}

#[post("/contact", format = "json", data = "<form>")]
pub async fn post_contact(form: std::result::Result<Json<ContactForm>, json::Error<'_>>, state: &State<AppState>)
    -> Result<Json<Notice>> {

    let form = form.map_err(|_| Error::InvalidForm)?.into_inner();
    if let Some(err) = form.verify_error() {
        return Err(err);
    }

    let params = EmailParams {
        from_name: form.name,
        from_email: form.email,
        subject: form.subject,
        message: form.message,
        to_email: None,
    };

    email_sys::send_checked(&*state.email, &params).await
        .map_err(|err| {
            warn!("Error sending contact message: {}", err);
            Error::Upstream("There was a problem sending your message. Please try again.".into())
        })?;

    Ok(Json(Notice::info("Message Sent", "We've received your message and will get back to you soon.")))
}


#[derive(Deserialize)]
pub struct ShareLocationForm {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: Option<String>,
}

#[post("/share-location", format = "json", data = "<form>")]
pub async fn post_share_location(form: std::result::Result<Json<ShareLocationForm>, json::Error<'_>>, state: &State<AppState>)
    -> Result<Json<Notice>> {

    let form = form.map_err(|_| Error::InvalidForm)?.into_inner();
    let place = form.name.as_deref().unwrap_or(DEFAULT_SHARED_PLACE);
    let maps_url = util::google_maps_url(form.latitude, form.longitude);

    let params = EmailParams {
        from_name: "SafeWalk Location Sharing".into(),
        from_email: "location@safewalk.com".into(),
        subject: "Live Location Shared via SafeWalk".into(),
        message: format!("A user has shared their location with you.\n\nLocation: {}\nView on Google Maps: {}\n\n\
            This is an automated message from SafeWalk's Location Sharing feature.", place, maps_url),
        to_email: None,
    };

    email_sys::send_checked(&*state.email, &params).await
        .map_err(|err| {
            warn!("Error sharing location: {}", err);
            Error::Upstream("Failed to share location. Please try again.".into())
        })?;

    Ok(Json(Notice::info("Location Shared Successfully", "Your live location has been shared via email.")))
}
