//! REST-backed key-value store.
//!
//! Each command is a `POST` of a JSON array (`["SET","k","v","EX","3600"]`)
//! with a bearer token; replies are `{"result": ..}` or `{"error": ".."}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::cache::{KvError, KvStore};

#[derive(Debug, Deserialize)]
struct KvReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct RestKvStore {
    url: Url,
    token: String,
    http: Client,
}

impl std::fmt::Debug for RestKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestKvStore")
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

impl RestKvStore {
    pub fn new(url: Url, token: String, timeout: Duration) -> Result<Self, KvError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(KvError::transport)?;
        Ok(Self { url, token, http })
    }

    async fn command(&self, command: &'static str, args: &[&str]) -> Result<Value, KvError> {
        let mut body: Vec<&str> = Vec::with_capacity(args.len() + 1);
        body.push(command);
        body.extend_from_slice(args);

        let response = self
            .http
            .post(self.url.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;

        match serde_json::from_str::<KvReply>(&text) {
            Ok(reply) => reply_result(command, reply),
            Err(_) if !status.is_success() => Err(KvError::Backend {
                command,
                message: format!("http status {status}"),
            }),
            Err(err) => Err(KvError::protocol(command, err.to_string())),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> KvError {
    if err.is_timeout() {
        KvError::Timeout
    } else {
        KvError::transport(err)
    }
}

fn reply_result(command: &'static str, reply: KvReply) -> Result<Value, KvError> {
    if let Some(message) = reply.error {
        return Err(KvError::Backend { command, message });
    }
    Ok(reply.result.unwrap_or(Value::Null))
}

fn parse_get(value: Value) -> Result<Option<String>, KvError> {
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => Ok(Some(raw)),
        other => Err(KvError::protocol("GET", format!("expected string, got {other}"))),
    }
}

fn parse_del(value: Value) -> Result<bool, KvError> {
    value
        .as_u64()
        .map(|removed| removed > 0)
        .ok_or_else(|| KvError::protocol("DEL", format!("expected integer, got {value}")))
}

fn parse_keys(value: Value) -> Result<Vec<String>, KvError> {
    let Value::Array(items) = value else {
        return Err(KvError::protocol("KEYS", format!("expected array, got {value}")));
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::String(key) => Ok(key),
            other => Err(KvError::protocol("KEYS", format!("expected string, got {other}"))),
        })
        .collect()
}

fn expect_status(command: &'static str, value: Value, expected: &str) -> Result<(), KvError> {
    match value.as_str() {
        Some(status) if status.eq_ignore_ascii_case(expected) => Ok(()),
        _ => Err(KvError::protocol(
            command,
            format!("expected `{expected}`, got {value}"),
        )),
    }
}

#[async_trait]
impl KvStore for RestKvStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        parse_get(self.command("GET", &[key]).await?)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        let seconds = ttl.as_secs().max(1).to_string();
        let reply = self
            .command("SET", &[key, value, "EX", seconds.as_str()])
            .await?;
        expect_status("SET", reply, "OK")
    }

    async fn del(&self, key: &str) -> Result<bool, KvError> {
        parse_del(self.command("DEL", &[key]).await?)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        parse_keys(self.command("KEYS", &[pattern]).await?)
    }

    async fn ping(&self) -> Result<(), KvError> {
        let reply = self.command("PING", &[]).await?;
        expect_status("PING", reply, "PONG")
    }
}
