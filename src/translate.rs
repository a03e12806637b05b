//! Chat-completion translation client
//!
//! Sends one English phrase to an OpenRouter-compatible endpoint and parses the
//! model's three-line reply into an [`Entry`]. The call is blocking, bounded by
//! a deadline, and retried once after a short pause on transient failures.

use crate::config::{TranslatorConfig, API_KEY_VAR};
use crate::error::{RequestFailure, TranslationError};
use crate::reply::parse_reply;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::{Duration, Instant};
use worksheet_pdf::Entry;

/// Longest error body kept in a `Status` failure.
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Instructions sent with every phrase.
pub fn build_prompt(phrase: &str) -> String {
    format!(
        "Translate the following English text to Chinese (Simplified) and Pinyin.\n\
         Format the response exactly like this example:\n\
         English: hello\n\
         Pinyin: nǐ hǎo\n\
         Chinese: 你好\n\
         \n\
         English: {phrase}"
    )
}

pub struct TranslationClient {
    http: Client,
    api_key: String,
    endpoint: String,
    model: String,
    timeout: Duration,
    retry_backoff: Duration,
}

impl TranslationClient {
    /// Build a client; fails with `Configuration` when no API key is set.
    pub fn from_config(config: &TranslatorConfig) -> Result<Self, TranslationError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                TranslationError::Configuration(format!("{API_KEY_VAR} environment variable not set"))
            })?
            .to_string();

        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(concat!("hanzi-worksheet/", env!("CARGO_PKG_VERSION")));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build().map_err(RequestFailure::from)?;

        Ok(Self {
            http,
            api_key,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
            retry_backoff: config.retry_backoff,
        })
    }

    /// Translate with the configured timeout as the deadline.
    pub fn translate(&self, phrase: &str) -> Result<Entry, TranslationError> {
        self.translate_before(phrase, Instant::now() + self.timeout)
    }

    /// Translate, giving up once `deadline` has passed.
    pub fn translate_before(&self, phrase: &str, deadline: Instant) -> Result<Entry, TranslationError> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Err(TranslationError::EmptyPhrase);
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(phrase),
            }],
        };
        info!("Requesting translation of {phrase:?} from {}", self.model);

        let content = match self.attempt(&request, deadline) {
            Ok(content) => content,
            Err(TranslationError::TranslationRequest(failure)) if failure.is_transient() => {
                if Instant::now() + self.retry_backoff >= deadline {
                    return Err(TranslationError::TranslationRequest(failure));
                }
                warn!(
                    "Translation attempt failed ({failure}), retrying in {:?}",
                    self.retry_backoff
                );
                thread::sleep(self.retry_backoff);
                self.attempt(&request, deadline)?
            }
            Err(e) => return Err(e),
        };

        debug!("Model reply: {content:?}");
        let entry = parse_reply(&content)?;
        info!(
            "Translated {:?} as {} ({})",
            entry.english,
            entry.chinese.concat(),
            entry.pinyin.join(" ")
        );
        Ok(entry)
    }

    /// One POST, bounded by the time left before `deadline`.
    fn attempt(&self, request: &ChatRequest<'_>, deadline: Instant) -> Result<String, TranslationError> {
        let remaining = deadline
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
            .ok_or(TranslationError::DeadlineExceeded)?;

        debug!("POST {} (timeout {:?})", self.endpoint, remaining);
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(remaining)
            .json(request)
            .send()
            .map_err(RequestFailure::from)?;

        let status = response.status();
        let body = response.text().map_err(RequestFailure::from)?;
        debug!("Translation endpoint answered {status}: {body}");

        if !status.is_success() {
            let mut body = body;
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|&i| body.is_char_boundary(i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(RequestFailure::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let envelope: ChatResponse = serde_json::from_str(&body).map_err(RequestFailure::from)?;
        let choice = envelope
            .choices
            .into_iter()
            .next()
            .ok_or(TranslationError::EmptyResponse)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::JoinHandle;

    /// Answer one connection per canned response, returning the raw requests.
    fn serve(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let url = format!("http://{}/api/v1/chat/completions", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                seen.push(read_request(&mut stream));
                let reply = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(reply.as_bytes()).unwrap();
            }
            seen
        });

        (url, handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn completion(content: &str) -> String {
        serde_json::json!({ "choices": [{ "message": { "content": content } }] }).to_string()
    }

    fn client(endpoint: &str) -> TranslationClient {
        let config = TranslatorConfig {
            api_key: Some("sk-test".to_string()),
            endpoint: endpoint.to_string(),
            timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(10),
            use_system_proxy: false,
            ..TranslatorConfig::default()
        };
        TranslationClient::from_config(&config).unwrap()
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = TranslationClient::from_config(&TranslatorConfig::default()).err().unwrap();
        assert!(matches!(err, TranslationError::Configuration(_)));
        assert!(err.to_string().contains(API_KEY_VAR));
    }

    #[test]
    fn prompt_carries_template_and_phrase() {
        let prompt = build_prompt("good morning");
        assert!(prompt.contains("Pinyin: nǐ hǎo"));
        assert!(prompt.ends_with("English: good morning"));
    }

    #[test]
    fn successful_translation() {
        let (url, server) = serve(vec![(200, completion("English: hi\nPinyin: nǐ hǎo\nChinese: 你好"))]);
        let entry = client(&url).translate("hi").unwrap();
        assert_eq!(entry, Entry::new("hi", &["nǐ", "hǎo"], &["你", "好"]));

        let requests = server.join().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.starts_with("POST /api/v1/chat/completions"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));

        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["model"], "allenai/molmo-7b-d:free");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json["messages"][0]["content"]
            .as_str()
            .unwrap()
            .ends_with("English: hi"));
    }

    #[test]
    fn server_error_is_retried_once() {
        let (url, server) = serve(vec![
            (503, r#"{"error":"busy"}"#.to_string()),
            (200, completion("English: cat\nPinyin: māo\nChinese: 猫")),
        ]);
        let entry = client(&url).translate("cat").unwrap();
        assert_eq!(entry.chinese, vec!["猫"]);
        assert_eq!(server.join().unwrap().len(), 2);
    }

    #[test]
    fn client_error_is_not_retried() {
        let (url, server) = serve(vec![(401, r#"{"error":"bad key"}"#.to_string())]);
        let err = client(&url).translate("cat").unwrap_err();
        match err {
            TranslationError::TranslationRequest(RequestFailure::Status { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(server.join().unwrap().len(), 1);
    }

    #[test]
    fn empty_choices() {
        let (url, server) = serve(vec![(200, r#"{"choices":[]}"#.to_string())]);
        let err = client(&url).translate("cat").unwrap_err();
        assert!(matches!(err, TranslationError::EmptyResponse));
        server.join().unwrap();
    }

    #[test]
    fn malformed_envelope() {
        let (url, server) = serve(vec![(200, "<html>oops</html>".to_string())]);
        let err = client(&url).translate("cat").unwrap_err();
        assert!(matches!(
            err,
            TranslationError::TranslationRequest(RequestFailure::Envelope(_))
        ));
        server.join().unwrap();
    }

    #[test]
    fn partial_reply_is_rejected() {
        let (url, server) = serve(vec![(200, completion("English: cat\nPinyin: māo"))]);
        let err = client(&url).translate("cat").unwrap_err();
        assert!(matches!(err, TranslationError::MalformedReply(_)));
        server.join().unwrap();
    }

    #[test]
    fn expired_deadline_sends_nothing() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let err = client(&url)
            .translate_before("cat", Instant::now() - Duration::from_millis(1))
            .unwrap_err();
        assert!(matches!(err, TranslationError::DeadlineExceeded));

        listener.set_nonblocking(true).unwrap();
        assert!(listener.accept().is_err());
    }

    #[test]
    fn silent_server_times_out_without_retrying() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();

        // Accept and read one request, never answer, then count later connects.
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            done_rx.recv().unwrap();
            listener.set_nonblocking(true).unwrap();
            let mut connections = 1;
            while listener.accept().is_ok() {
                connections += 1;
            }
            drop(stream);
            connections
        });

        let config = TranslatorConfig {
            api_key: Some("sk-test".to_string()),
            endpoint: url,
            timeout: Duration::from_millis(1500),
            retry_backoff: Duration::from_millis(10),
            use_system_proxy: false,
            ..TranslatorConfig::default()
        };
        let client = TranslationClient::from_config(&config).unwrap();

        let started = Instant::now();
        let err = client.translate("cat").unwrap_err();
        let elapsed = started.elapsed();
        done_tx.send(()).unwrap();

        match err {
            TranslationError::TranslationRequest(RequestFailure::Transport(e)) => {
                assert!(e.is_timeout(), "expected a timeout, got {e}")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(elapsed >= Duration::from_millis(1400), "gave up after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
        assert_eq!(server.join().unwrap(), 1);
    }

    #[test]
    fn blank_phrase_is_rejected() {
        let err = client("http://127.0.0.1:9/").translate("   ").unwrap_err();
        assert!(matches!(err, TranslationError::EmptyPhrase));
    }
}
