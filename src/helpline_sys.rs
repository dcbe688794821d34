use lazy_static::lazy_static;
use log::error;
use rocket::{get, serde::json::Json};
use serde::{Deserialize, Serialize};


const HELPLINES_JSON: &'static str = include_str!("../data/helplines.json");

lazy_static! {
    static ref HELPLINES: Vec<Helpline> = {
        serde_json::from_str(HELPLINES_JSON).unwrap_or_else(|err| {
            error!("Bundled helpline list is malformed: {}", err);
            Vec::new()
        })
    };
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Helpline {
    pub name: String,
    pub number: String,
    pub description: String,
}

#[get("/helplines")]
pub fn get_helplines() -> Json<Vec<Helpline>> {
    Json(HELPLINES.clone())
}
