use std::{
    sync::{Arc, RwLock},
    time::Duration,
};
use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::Rng;
use rocket::{get, serde::json::Json, State};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::state::AppState;
use crate::task_scheduler::{Task, TaskSchedulerBuilder};


pub const TIME_FILTERS: [&'static str; 4] = ["Last Week", "Last Month", "Last 3 Months", "Last Year"];
const REFRESH_PERIOD: u64 = 30; // seconds


#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendPoint {
    pub name: String,
    pub reports: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IncidentCount {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub count: u32,
}

/// Simulated community figures. None of these numbers come from real data.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CrowdStats {
    pub active_users: u32,
    pub active_users_change: i32,
    pub safety_reports: u32,
    pub safety_reports_change: i32,
    pub incidents_reported: u32,
    pub incidents_reported_change: i32,
    pub daily_trend: Vec<TrendPoint>,
    pub incident_breakdown: Vec<IncidentCount>,
    pub generated_at: DateTime<Utc>,
}

impl CrowdStats {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        CrowdStats {
            active_users: rng.gen_range(5000..15000),
            active_users_change: rng.gen_range(-10..10),
            safety_reports: rng.gen_range(500..1500),
            safety_reports_change: rng.gen_range(-15..15),
            incidents_reported: rng.gen_range(100..300),
            incidents_reported_change: rng.gen_range(-12..=12),
            daily_trend: (1..=7)
                .map(|day| TrendPoint {
                    name: format!("Day {}", day),
                    reports: rng.gen_range(10..60),
                })
                .collect(),
            incident_breakdown: vec![
                IncidentCount { kind: "Theft", count: rng.gen_range(20..70) },
                IncidentCount { kind: "Harassment", count: rng.gen_range(15..55) },
                IncidentCount { kind: "Assault", count: rng.gen_range(10..40) },
                IncidentCount { kind: "Other", count: rng.gen_range(5..25) },
            ],
            generated_at: Utc::now(),
        }
    }
}


pub struct CrowdStatsCache {
    stats: RwLock<CrowdStats>,
}

impl CrowdStatsCache {
    pub fn new() -> Self {
        CrowdStatsCache {
            stats: RwLock::new(CrowdStats::generate(&mut rand::thread_rng())),
        }
    }

    pub fn get(&self) -> Result<CrowdStats> {
        self.stats.read()
            .map(|stats| stats.clone())
            .map_err(|_| Error::Storage("crowd stats cache poisoned".into()))
    }

    pub fn refresh(&self) -> Result<()> {
        let fresh = CrowdStats::generate(&mut rand::thread_rng());
        let mut stats = self.stats.write()
            .map_err(|_| Error::Storage("crowd stats cache poisoned".into()))?;
        *stats = fresh;
        Ok(())
    }
}


pub fn init_crowd_sys(cache: Arc<CrowdStatsCache>, scheduler: &mut TaskSchedulerBuilder) {
    scheduler.add_task(Task::new("crowd-stats", move || crowd_stats_job(&cache),
        Duration::from_secs(REFRESH_PERIOD)));
}

fn crowd_stats_job(cache: &CrowdStatsCache) -> Duration {
    match cache.refresh() {
        Ok(()) => info!("Crowd stats refreshed"),
        Err(err) => warn!("Fail to refresh crowd stats: {}", err),
    }

    Duration::from_secs(REFRESH_PERIOD)
}


#[derive(Serialize)]
pub struct CrowdStatsView {
    period: &'static str,
    #[serde(flatten)]
    stats: CrowdStats,
}

#[get("/crowd-stats?<period>")]
pub fn get_crowd_stats(period: Option<&str>, state: &State<AppState>) -> Result<Json<CrowdStatsView>> {
    let period = match period {
        None => TIME_FILTERS[0],
        Some(p) => *TIME_FILTERS.iter()
            .find(|&&f| f == p)
            .ok_or_else(|| Error::validation("Unknown Period",
                format!("Period must be one of: {}", TIME_FILTERS.join(", "))))?,
    };

    Ok(Json(CrowdStatsView {
        period,
        stats: state.crowd.get()?,
    }))
}
