use log::{info, warn};
use rocket::{
    http::Status,
    post,
    response::status::Custom,
    serde::json::{self, Json},
    State,
};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};

use crate::error::{Error, Result};
use crate::state::AppState;


const OPENAI_CHAT_URL: &'static str = "https://api.openai.com/v1/chat/completions";
const SYSTEM_PROMPT: &'static str = "You are a helpful assistant for a women's safety app called SafeWalk. Provide concise, supportive responses.";


#[rocket::async_trait]
pub trait Assistant: Send + Sync {
    async fn reply(&self, message: &str) -> Result<String>;
}


pub struct OpenAi {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAi {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        OpenAi { client, api_key, model }
    }
}

#[rocket::async_trait]
impl Assistant for OpenAi {
    async fn reply(&self, message: &str) -> Result<String> {
        let completion = self.client.post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": message },
                ],
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<JsonValue>()
            .await?;

        completion["choices"][0]["message"]["content"].as_str()
            .filter(|content| !content.is_empty())
            .map(|content| content.to_owned())
            .ok_or_else(|| Error::Upstream("No response from the assistant".into()))
    }
}


pub struct NoAssistant;

#[rocket::async_trait]
impl Assistant for NoAssistant {
    async fn reply(&self, _: &str) -> Result<String> {
        Err(Error::NotConfigured("Assistant"))
    }
}


#[derive(Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    message: Option<String>,
}


#[post("/chat", format = "json", data = "<form>")]
pub async fn post_chat(form: std::result::Result<Json<ChatForm>, json::Error<'_>>, state: &State<AppState>)
    -> Custom<Json<JsonValue>> {

    let message = form.ok()
        .and_then(|f| f.into_inner().message)
        .filter(|m| !m.is_empty());

    let message = match message {
        Some(message) => message,
        None => return Custom(Status::BadRequest, Json(json!({ "error": "Message is required" }))),
    };

    info!("Chat message received ({} chars)", message.chars().count());

    match state.assistant.reply(&message).await {
        Ok(response) => Custom(Status::Ok, Json(json!({ "response": response }))),
        Err(err) => {
            warn!("Assistant failed: {}", err);
            Custom(Status::InternalServerError, Json(json!({ "error": err.to_string() })))
        },
    }
}
