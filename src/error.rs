use log::error;
use rocket::{
    http::Status,
    request::Request,
    response::{self, Responder, status::Custom},
    serde::json::Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::notice::Notice;


pub type Result<T> = std::result::Result<T, Error>;


#[derive(Debug, Error)]
pub enum Error {
    #[error("{description}")]
    Validation {
        title: String,
        description: String,
    },
    #[error("Invalid form")]
    InvalidForm,
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl Error {
    pub fn validation<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Error::Validation {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn upstream<E: ToString>(err: E) -> Self {
        Error::Upstream(err.to_string())
    }

    pub fn status(&self) -> Status {
        match self {
            Error::Validation { .. } | Error::InvalidForm => Status::BadRequest,
            Error::NotFound => Status::NotFound,
            Error::Unauthorized(_) => Status::Unauthorized,
            Error::Conflict(_) => Status::Conflict,
            Error::Upstream(_) | Error::NotConfigured(_) => Status::BadGateway,
            Error::Storage(_) => Status::InternalServerError,
        }
    }

    pub fn notice(&self) -> Notice {
        let title = match self {
            Error::Validation { title, .. } => title.as_str(),
            Error::Unauthorized(_) => "Unauthorized",
            _ => "Error",
        };
        Notice::destructive(title, self.to_string())
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<diesel::ConnectionError> for Error {
    fn from(err: diesel::ConnectionError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}


#[derive(Serialize)]
struct ErrorBody {
    error: String,
    notice: Notice,
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        if self.status().code >= 500 {
            error!("{}", self);
        }

        let body = ErrorBody {
            error: self.to_string(),
            notice: self.notice(),
        };

        Custom(self.status(), Json(body)).respond_to(req)
    }
}
