use chrono::Utc;
use log::info;
use rocket::{
    get, post,
    serde::json::{self, Json},
    State,
};
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, LocationAverage};
use crate::error::{Error, Result};
use crate::notice::Notice;
use crate::records::{self, Rating, SafetyReport, SafetyStatus};
use crate::state::AppState;
use crate::store::{Bucket, BucketKey};
use crate::util;


const RECENT_RATINGS: usize = 5;


#[derive(Deserialize)]
pub struct SafetyReportForm {
    location: String,
    status: SafetyStatus,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    comment: String,
}

impl SafetyReportForm {
    fn verify_error(&self) -> Option<Error> {
        if self.location.trim().is_empty() {
            Some(Error::validation("Error", "Please enter a location."))
        }
        else if let Some(tag) = self.tags.iter().find(|t| !records::is_known_tag(t)) {
            Some(Error::validation("Error", format!("Unknown tag: {}", tag)))
        }
        else {
            None
        }
    }
}

#[derive(Serialize)]
pub struct SafetyReportReply {
    report: SafetyReport,
    notice: Notice,
}

#[post("/safety-report", format = "json", data = "<form>")]
pub fn post_safety_report(form: std::result::Result<Json<SafetyReportForm>, json::Error<'_>>, state: &State<AppState>)
    -> Result<Json<SafetyReportReply>> {

    let form = form.map_err(|_| Error::InvalidForm)?.into_inner();
    if let Some(err) = form.verify_error() {
        return Err(err);
    }

    let now = Utc::now();
    let report = SafetyReport {
        id: util::timestamp_id(&now),
        location: form.location,
        status: form.status,
        tags: form.tags,
        comment: form.comment,
        votes: 0,
        timestamp: util::to_iso(&now),
    };

    Bucket::new(state.store(), BucketKey::SafetyReports).append(report.clone())?;

    info!("Safety report {} for {} saved", report.id, report.location);

    Ok(Json(SafetyReportReply {
        report,
        notice: Notice::info("Report Submitted", "Thank you for contributing to community safety!"),
    }))
}

#[derive(Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

#[derive(Deserialize)]
pub struct VoteForm {
    direction: VoteDirection,
}

/// Every report carrying `id` gets the vote, since ids can collide.
fn apply_vote(reports: &mut [SafetyReport], id: i64, direction: VoteDirection) -> Option<SafetyReport> {
    let delta = match direction {
        VoteDirection::Up => 1,
        VoteDirection::Down => -1,
    };

    let mut first = None;
    for report in reports.iter_mut().filter(|r| r.id == id) {
        report.votes += delta;
        if first.is_none() {
            first = Some(report.clone());
        }
    }
    first
}

#[post("/safety-report/<id>/vote", format = "json", data = "<form>")]
pub fn post_vote(id: i64, form: std::result::Result<Json<VoteForm>, json::Error<'_>>, state: &State<AppState>)
    -> Result<Json<SafetyReport>> {

    let form = form.map_err(|_| Error::InvalidForm)?;
    let bucket = Bucket::new(state.store(), BucketKey::SafetyReports);

    let mut reports = bucket.read_all();
    let voted = apply_vote(&mut reports, id, form.direction).ok_or(Error::NotFound)?;
    bucket.write_all(&reports)?;

    Ok(Json(voted))
}

#[get("/safety-reports")]
pub fn get_safety_reports(state: &State<AppState>) -> Json<Vec<SafetyReport>> {
    Json(Bucket::new(state.store(), BucketKey::SafetyReports).read_all())
}

#[derive(Serialize)]
pub struct ScoreView {
    location: String,
    ratio: Option<f64>,
    score: Option<f64>,
}

#[get("/safety-score?<location>")]
pub fn get_safety_score(location: &str, state: &State<AppState>) -> Json<ScoreView> {
    let reports = Bucket::<SafetyReport>::new(state.store(), BucketKey::SafetyReports).read_all();

    Json(ScoreView {
        location: location.to_owned(),
        ratio: aggregate::safety_ratio(&reports, location),
        score: aggregate::safety_score(&reports, location),
    })
}


#[derive(Deserialize)]
pub struct RatingForm {
    location: String,
    rating: u8,
    #[serde(default)]
    comment: String,
}

impl RatingForm {
    fn verify_error(&self) -> Option<Error> {
        if self.location.trim().is_empty() {
            Some(Error::validation("Error", "Please enter a location."))
        }
        else if self.rating < 1 || self.rating > 5 {
            Some(Error::validation("Error", "Rating must be between 1 and 5."))
        }
        else {
            None
        }
    }
}

#[derive(Serialize)]
pub struct RatingReply {
    rating: Rating,
    notice: Notice,
}

#[post("/rating", format = "json", data = "<form>")]
pub fn post_rating(form: std::result::Result<Json<RatingForm>, json::Error<'_>>, state: &State<AppState>)
    -> Result<Json<RatingReply>> {

    let form = form.map_err(|_| Error::InvalidForm)?.into_inner();
    if let Some(err) = form.verify_error() {
        return Err(err);
    }

    let rating = Rating {
        id: util::timestamp_id(&Utc::now()),
        location: form.location,
        rating: form.rating,
        comment: form.comment,
    };

    Bucket::new(state.store(), BucketKey::SafetyRatings).push_back(rating.clone())?;

    Ok(Json(RatingReply {
        rating,
        notice: Notice::info("Rating Submitted", "Thank you for contributing to community safety!"),
    }))
}

#[derive(Serialize)]
pub struct RatingsView {
    recent: Vec<Rating>,
    locations: Vec<LocationAverage>,
}

#[get("/ratings")]
pub fn get_ratings(state: &State<AppState>) -> Json<RatingsView> {
    let ratings = Bucket::<Rating>::new(state.store(), BucketKey::SafetyRatings).read_all();

    let recent = ratings.iter()
        .rev()
        .take(RECENT_RATINGS)
        .cloned()
        .collect();

    Json(RatingsView {
        recent,
        locations: aggregate::location_averages(&ratings),
    })
}
