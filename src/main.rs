mod aggregate;
mod auth_sys;
mod chat_sys;
mod config;
mod contact_sys;
mod crowd_sys;
mod db;
mod email_sys;
mod error;
mod geo_sys;
mod helpline_sys;
mod logger;
mod notice;
mod records;
mod report_route;
mod safety_sys;
mod sms_sys;
mod sos_sys;
mod state;
mod store;
mod task_scheduler;
mod util;
mod wizard;
mod zone_sys;

#[cfg(test)]
mod testing;


use std::time::Duration;

use log::info;
use rocket::{get, routes, Build, Rocket};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::task_scheduler::TaskSchedulerBuilder;


#[get("/")]
fn index() -> &'static str {
    "SafeWalk Server"
}


pub fn build(state: AppState) -> Rocket<Build> {
    rocket::build()
        .manage(state)
        .mount("/", routes![index])
        .mount("/", routes![
            report_route::post_navbar_report,
            report_route::get_navbar_reports,
            report_route::post_community_report,
            report_route::get_community_reports,
            report_route::get_community_stats,
        ])
        .mount("/", routes![
            safety_sys::post_safety_report,
            safety_sys::post_vote,
            safety_sys::get_safety_reports,
            safety_sys::get_safety_score,
            safety_sys::post_rating,
            safety_sys::get_ratings,
        ])
        .mount("/", routes![
            contact_sys::post_emergency_contact,
            contact_sys::get_emergency_contacts,
            contact_sys::post_validate_phone,
            contact_sys::post_send_sms,
            contact_sys::post_send_sos,
            contact_sys::post_contact,
            contact_sys::post_share_location,
        ])
        .mount("/", routes![
            sos_sys::post_sos,
            sos_sys::get_sos,
            sos_sys::delete_sos,
        ])
        .mount("/", routes![
            auth_sys::post_otp,
            auth_sys::post_otp_verify,
            auth_sys::post_logout,
            auth_sys::get_session,
            auth_sys::post_admin_login,
            auth_sys::post_admin_logout,
            auth_sys::get_dashboard,
        ])
        .mount("/", routes![
            crowd_sys::get_crowd_stats,
            zone_sys::get_cities,
            zone_sys::get_routes,
            chat_sys::post_chat,
            helpline_sys::get_helplines,
        ])
}


#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();

    let sentry_guard = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((dsn.as_str(), sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        }))
    });

    logger::init_logger(config.log_level, sentry_guard.is_some())?;

    let state = AppState::from_config(config)?;

    let mut scheduler = TaskSchedulerBuilder::new()
        .n_workers(1)
        .period_resolution(Duration::from_millis(500));
    crowd_sys::init_crowd_sys(state.crowd.clone(), &mut scheduler);
    let mut scheduler = scheduler.build();

    info!("SafeWalk server starting");

    let _ = build(state).launch().await?;

    scheduler.stop();
    Ok(())
}
