//! Hosted opponent: one text-completion request per ply, reply parsed for a
//! coordinate move token. Every failure mode degrades to the empty reply.

use std::str::FromStr;
use std::time::Duration;
use std::{env, fs};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use shakmaty::uci::UciMove;

use super::{Difficulty, OpponentReply, OpponentSource, openings};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct CloudOpponent {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

impl CloudOpponent {
    /// Credential from the environment, falling back to a local file in the
    /// working directory. None means "not configured", never an error.
    pub fn from_env() -> Option<CloudOpponent> {
        let api_key = env::var("CHESS_QUEST_API_KEY").ok().or_else(|| {
            let path = env::current_dir().ok()?.join("CHESS_QUEST_API_KEY");
            fs::read_to_string(path).ok().map(|s| s.trim().to_string())
        })?;
        if api_key.is_empty() {
            return None;
        }

        let endpoint =
            env::var("CHESS_QUEST_API_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .ok()?;

        Some(CloudOpponent {
            client,
            endpoint,
            api_key,
        })
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let body = CompletionRequest {
            model: "gpt-3.5-turbo-instruct",
            prompt,
            max_tokens: 48,
            temperature: 0.7,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: CompletionResponse = response
            .json()
            .await
            .context("completion reply did not match the expected schema")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| anyhow!("completion reply had no choices"))
    }
}

#[async_trait]
impl OpponentSource for CloudOpponent {
    async fn request_move(
        &mut self,
        fen: &str,
        played: &[String],
        _difficulty: Difficulty,
    ) -> OpponentReply {
        let opening = openings::lookup(fen);

        let prompt = format!(
            "You are playing Black in a chess game.\n\
             Position (FEN): {fen}\n\
             Moves so far: {}\n\
             Reply with your move in coordinate notation (for example e7e5), \
             followed by one short sentence of commentary.\n",
            if played.is_empty() {
                "none".to_string()
            } else {
                played.join(" ")
            }
        );

        let text = match self.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("hosted opponent unavailable: {e:#}");
                return OpponentReply::none();
            }
        };

        let Some(token) = extract_move_token(&text) else {
            warn!("hosted opponent reply had no usable move: {:?}", text.trim());
            return OpponentReply::none();
        };

        let commentary = {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        OpponentReply {
            move_token: token,
            commentary,
            opening_name: opening.map(|entry| entry.name.to_string()),
        }
    }
}

/// First whitespace-separated word that reads as a coordinate move.
fn extract_move_token(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .find(|word| word.len() >= 4 && UciMove::from_str(word).is_ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_move_from_chatty_replies() {
        assert_eq!(
            extract_move_token("I'll play e7e5, contesting the center.").as_deref(),
            Some("e7e5")
        );
        assert_eq!(
            extract_move_token("Move: g8f6.\nDeveloping the knight.").as_deref(),
            Some("g8f6")
        );
        assert_eq!(
            extract_move_token("b7b8q is crushing here").as_deref(),
            Some("b7b8q")
        );
    }

    #[test]
    fn prose_without_a_move_yields_nothing() {
        assert!(extract_move_token("What a fascinating position!").is_none());
        assert!(extract_move_token("").is_none());
    }

    #[test]
    fn schema_round_trip() {
        let raw = r#"{"choices":[{"text":" e7e5 taking the center"}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].text, " e7e5 taking the center");
    }
}
