use chrono::Utc;
use log::{info, warn};
use rocket::{
    get, post,
    serde::json::{self, Json},
    State,
};
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, TypeCounts};
use crate::email_sys::{self, EmailParams};
use crate::error::{Error, Result};
use crate::notice::Notice;
use crate::records::{Report, ReportType};
use crate::state::AppState;
use crate::store::{Bucket, BucketKey};
use crate::wizard::{ReportWizard, RequestKind};


const COMMUNITY_KEEP: usize = 10;


#[derive(Serialize)]
pub struct ReportReply {
    report: Report,
    notice: Notice,
}


#[derive(Deserialize)]
pub struct NavbarReportForm {
    name: String,
    email: String,
    contact: String,
    kind: RequestKind,
    content: String,
}

impl NavbarReportForm {
    /// Walks the form through every step, stopping at the first one whose
    /// field does not pass.
    fn into_wizard(self) -> Result<ReportWizard> {
        let mut wizard = ReportWizard::new();

        wizard.set_name(&self.name);
        wizard.set_email(&self.email);
        wizard.set_contact(&self.contact);
        wizard.set_request(self.kind, &self.content);

        while !wizard.step().is_terminal() {
            if let Err(err) = wizard.next() {
                info!("Navbar report stopped at step {:?}", wizard.step());
                return Err(err);
            }
        }

        Ok(wizard)
    }
}

fn report_email(report: &Report) -> EmailParams {
    EmailParams {
        from_name: report.name.clone().unwrap_or_default(),
        from_email: report.email.clone().unwrap_or_default(),
        subject: format!("New {} report", report.kind),
        message: format!("{}\n\nContact: {}", report.content, report.contact.as_deref().unwrap_or("-")),
        to_email: None,
    }
}

#[post("/navbar-report", format = "json", data = "<form>")]
pub async fn post_navbar_report(form: std::result::Result<Json<NavbarReportForm>, json::Error<'_>>, state: &State<AppState>)
    -> Result<Json<ReportReply>> {

    let form = form.map_err(|_| Error::InvalidForm)?.into_inner();
    let mut wizard = form.into_wizard()?;

    let report = {
        let bucket = Bucket::new(state.store(), BucketKey::NavbarReports);
        wizard.submit(&bucket, Utc::now())?
    };

    info!("Navbar report {} saved ({})", report.id, report.kind);

    // Saved either way; a relay failure only changes the notice.
    let notice = if state.config.notify_on_report {
        match email_sys::send_checked(&*state.email, &report_email(&report)).await {
            Ok(()) => Notice::info("Report Submitted", "Your message has been saved successfully."),
            Err(err) => {
                warn!("Fail to send report {} by email: {}", report.id, err);
                Notice::destructive("Error",
                    "Your report was saved, but the notification email could not be sent.")
            },
        }
    }
    else {
        Notice::info("Report Submitted", "Your message has been saved successfully.")
    };

    Ok(Json(ReportReply { report, notice }))
}

#[get("/navbar-reports")]
pub fn get_navbar_reports(state: &State<AppState>) -> Json<Vec<Report>> {
    Json(Bucket::new(state.store(), BucketKey::NavbarReports).read_all())
}


#[derive(Deserialize)]
pub struct CommunityReportForm {
    #[serde(rename = "type")]
    kind: ReportType,
    content: String,
}

impl CommunityReportForm {
    fn verify_error(&self) -> Option<Error> {
        if self.content.trim().is_empty() {
            Some(Error::validation("Empty Submission", "Please enter some content before submitting."))
        }
        else if !matches!(self.kind, ReportType::Story | ReportType::Incident) {
            Some(Error::validation("Invalid Type", "Community posts are either a story or an incident."))
        }
        else {
            None
        }
    }
}

#[post("/community-report", format = "json", data = "<form>")]
pub fn post_community_report(form: std::result::Result<Json<CommunityReportForm>, json::Error<'_>>, state: &State<AppState>)
    -> Result<Json<ReportReply>> {

    let form = form.map_err(|_| Error::InvalidForm)?.into_inner();
    if let Some(err) = form.verify_error() {
        return Err(err);
    }

    let report = Report::new(form.kind, form.content, Utc::now());

    Bucket::new(state.store(), BucketKey::CommunityReports)
        .update(|reports| {
            reports.insert(0, report.clone());
            reports.truncate(COMMUNITY_KEEP);
        })?;

    info!("Community {} {} saved", report.kind, report.id);

    let notice = match report.kind {
        ReportType::Story => Notice::info("Story Submitted",
            "Thank you for sharing your story. We are here to support you."),
        _ => Notice::info("Incident Reported", "Thank you for contributing to community safety!"),
    };

    Ok(Json(ReportReply { report, notice }))
}

#[get("/community-reports")]
pub fn get_community_reports(state: &State<AppState>) -> Json<Vec<Report>> {
    Json(Bucket::new(state.store(), BucketKey::CommunityReports).read_all())
}

#[get("/community-stats")]
pub fn get_community_stats(state: &State<AppState>) -> Json<TypeCounts> {
    let community = Bucket::<Report>::new(state.store(), BucketKey::CommunityReports).read_all();
    let navbar = Bucket::<Report>::new(state.store(), BucketKey::NavbarReports).read_all();

    Json(aggregate::count_by_type(community.iter().chain(navbar.iter())))
}
