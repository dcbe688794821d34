use std::collections::{HashMap, HashSet};

use cgmath::Vector2;
use lazy_static::lazy_static;
use log::info;
use rand::{seq::SliceRandom, Rng};
use rocket::{get, serde::json::Json, State};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::geo_sys::LatLon;
use crate::notice::Notice;
use crate::state::AppState;


pub const KARNATAKA_CITIES: [&'static str; 10] = [
    "Bangalore",
    "Mysore",
    "Hubli-Dharwad",
    "Mangalore",
    "Belgaum",
    "Gulbarga",
    "Davanagere",
    "Bellary",
    "Bijapur",
    "Shimoga",
];

const FALLBACK_CITY: &'static str = "Bangalore";
const ROUTE_COUNT: usize = 5;

lazy_static! {
    static ref LOCATION_NAMES: HashMap<&'static str, Vec<&'static str>> = {
        let mut map = HashMap::new();
        map.insert("Bangalore", vec![
            "Indiranagar", "Koramangala", "MG Road", "Brigade Road", "Jayanagar",
            "JP Nagar", "Whitefield", "HSR Layout", "BTM Layout", "Marathahalli",
            "Electronic City", "Banashankari", "Malleswaram", "Rajajinagar", "Hebbal",
            "Bannerghatta Road", "Yelahanka", "RT Nagar", "Basavanagudi", "Vijayanagar",
        ]);
        map.insert("Mysore", vec![
            "Gokulam", "Saraswathipuram", "VV Mohalla", "Lakshmipuram", "Jayalakshmipuram",
            "Kuvempunagar", "Vijayanagar", "Hebbal", "RK Nagar", "Bogadi",
            "Bannimantap", "Nazarbad", "Chamundipuram", "Agrahara", "Mandi Mohalla",
        ]);
        map.insert("Hubli-Dharwad", vec![
            "Vidyanagar", "Navanagar", "Gopankoppa", "Keshwapur", "Deshpande Nagar",
            "Malmaddi", "Saptapur", "Renuka Nagar", "Gandhi Nagar", "Sattur",
        ]);
        map
    };
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneType {
    Hospital,
    Police,
    Public,
}

impl ZoneType {
    const ALL: [ZoneType; 3] = [ZoneType::Hospital, ZoneType::Police, ZoneType::Public];

    fn landmark(&self, location_name: &str) -> String {
        match self {
            ZoneType::Hospital => format!("{} Medical Center", location_name),
            ZoneType::Police => format!("{} Police Station", location_name),
            ZoneType::Public => format!("{} Community Center", location_name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    Safe,
    Moderate,
    Unsafe,
}

impl SafetyLevel {
    const ALL: [SafetyLevel; 3] = [SafetyLevel::Safe, SafetyLevel::Moderate, SafetyLevel::Unsafe];
}


#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyZone {
    pub id: usize,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ZoneType,
    pub latitude: f64,
    pub longitude: f64,
    pub safety_level: SafetyLevel,
    pub landmark: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedRoute {
    pub path: Vec<[f64; 2]>,
    pub safety_zones: Vec<SafetyZone>,
    pub route_description: String,
}


/// Picks a location name from the city's list that this search has not
/// used yet. Once the list runs out, names get a numeric suffix.
fn random_location_name<R: Rng>(rng: &mut R, city: &str, used: &mut HashSet<String>) -> String {
    let names = LOCATION_NAMES.get(city)
        .or_else(|| LOCATION_NAMES.get(FALLBACK_CITY))
        .map(|names| names.as_slice())
        .unwrap_or(&[]);

    let available = names.iter()
        .filter(|name| !used.contains(**name))
        .collect::<Vec<_>>();

    let name = match available.choose(rng) {
        Some(name) => name.to_string(),
        None => {
            let base = names.choose(rng).copied().unwrap_or(city);
            let mut counter = 1;
            while used.contains(&format!("{} {}", base, counter)) {
                counter += 1;
            }
            format!("{} {}", base, counter)
        },
    };

    used.insert(name.clone());
    name
}

/// Straight line from `start` to `end` with a few jittered points in between.
/// This is a picture of a route, not a computed one.
pub fn simulate_path<R: Rng>(rng: &mut R, start: LatLon, end: LatLon) -> Vec<LatLon> {
    let n_points: u32 = rng.gen_range(3..6);
    let span = end - start;

    let mut path = vec![start];
    for i in 1..n_points {
        let fraction = f64::from(i) / f64::from(n_points);
        let variation = 0.015 * (rng.gen::<f64>() - 0.5) * (5.0 - f64::from(i));
        path.push(start + span * fraction + Vector2::new(variation, variation));
    }
    path.push(end);

    path
}

pub fn place_markers<R: Rng>(rng: &mut R, path: &[LatLon], city: &str, used: &mut HashSet<String>)
    -> Vec<SafetyZone> {

    path.iter()
        .enumerate()
        .map(|(id, point)| {
            let kind = ZoneType::ALL[rng.gen_range(0..ZoneType::ALL.len())];
            let name = random_location_name(rng, city, used);

            SafetyZone {
                id,
                landmark: kind.landmark(&name),
                name,
                kind,
                latitude: point.x,
                longitude: point.y,
                safety_level: SafetyLevel::ALL[rng.gen_range(0..SafetyLevel::ALL.len())],
            }
        })
        .collect()
}

pub fn simulate_routes<R: Rng>(rng: &mut R, city: &str, start: LatLon, end: LatLon) -> Vec<SimulatedRoute> {
    let mut used = HashSet::new();

    (0..ROUTE_COUNT)
        .map(|_| {
            let path = simulate_path(rng, start, end);
            let safety_zones = place_markers(rng, &path, city, &mut used);
            let route_description = format!("Via {}", safety_zones[safety_zones.len() / 2].name);

            SimulatedRoute {
                path: path.iter().map(|p| [p.x, p.y]).collect(),
                safety_zones,
                route_description,
            }
        })
        .collect()
}


#[derive(Serialize)]
pub struct RoutesView {
    routes: Vec<SimulatedRoute>,
    notice: Notice,
}

#[get("/cities")]
pub fn get_cities() -> Json<Vec<&'static str>> {
    Json(KARNATAKA_CITIES.to_vec())
}

#[get("/safety-zones/routes?<city>&<destination>")]
pub async fn get_routes(city: Option<String>, destination: Option<String>, state: &State<AppState>)
    -> Result<Json<RoutesView>> {

    let (city, destination) = match (city, destination) {
        (Some(c), Some(d)) if !c.trim().is_empty() && !d.trim().is_empty() => (c, d),
        _ => return Err(Error::validation("Error", "Please select a city and enter a destination.")),
    };

    let start = state.geocoder.locate(&city).await
        .map_err(|err| Error::Upstream(format!("Failed to calculate routes. Please try again. ({})", err)))?;
    let end = state.geocoder.locate(&destination).await
        .map_err(|err| Error::Upstream(format!("Failed to calculate routes. Please try again. ({})", err)))?;

    let routes = simulate_routes(&mut rand::thread_rng(), &city, start, end);

    info!("Simulated {} routes from {} to {}", routes.len(), city, destination);

    Ok(Json(RoutesView {
        routes,
        notice: Notice::info("Routes Calculated",
            format!("Five safe routes from {} to {} have been calculated.", city, destination)),
    }))
}
