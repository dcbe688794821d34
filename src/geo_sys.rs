use cgmath::Point2;
use reqwest::header::USER_AGENT;
use serde::Deserialize;

use crate::error::{Error, Result};


const NOMINATIM_SEARCH_URL: &'static str = "https://nominatim.openstreetmap.org/search";
const REGION_SUFFIX: &'static str = "Karnataka,India";


/// Geographic point as (latitude, longitude).
pub type LatLon = Point2<f64>;


#[rocket::async_trait]
pub trait Geocoder: Send + Sync {
    async fn locate(&self, query: &str) -> Result<LatLon>;
}


#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

fn parse_first_place(places: &[Place]) -> Result<LatLon> {
    let place = places.first()
        .ok_or_else(|| Error::Upstream("No geocoding result".into()))?;

    match (place.lat.parse::<f64>(), place.lon.parse::<f64>()) {
        (Ok(lat), Ok(lon)) => Ok(Point2::new(lat, lon)),
        _ => Err(Error::Upstream("Invalid geocoding result".into())),
    }
}


pub struct Nominatim {
    client: reqwest::Client,
}

impl Nominatim {
    pub fn new(client: reqwest::Client) -> Self {
        Nominatim { client }
    }
}

#[rocket::async_trait]
impl Geocoder for Nominatim {
    async fn locate(&self, query: &str) -> Result<LatLon> {
        let q = format!("{},{}", query, REGION_SUFFIX);
        let places = self.client.get(NOMINATIM_SEARCH_URL)
            .header(USER_AGENT, concat!("safewalk-server/", env!("CARGO_PKG_VERSION")))
            .query(&[("format", "json"), ("q", q.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Place>>()
            .await?;

        parse_first_place(&places)
    }
}
