use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

const RECOMMEND_PROMPT: &str = "Analyze the following user activities and recommend the most liked \
categories based on their interactions. Focus on categories with the highest engagement (saves, \
high ratings, or positive reviews). Format the response as category names under each other only.";

const CHAT_SYSTEM_PROMPT: &str = "You are a travel assistant chatbot that helps users find specific \
destinations (by name, category, or district) or get personalized recommendations based on their \
preferences. Only respond to destination-related requests; politely guide users back to travel \
topics if they ask unrelated questions.";

const EXTRACT_SYSTEM_PROMPT: &str = "You are a travel assistant that extracts and normalizes the \
following from user queries:\n1. Destination names (businesses, landmarks)\n2. Categories \
(normalized to singular form, e.g., 'hotels' -> 'hotel')\n3. Districts/locations\n\nRules:\n\
- Always return only the most relevant term\n- Normalize categories to singular form\n\
- For ambiguous terms, choose the most likely travel-related option\n\
- If nothing is found, respond exactly with 'None'\n- Never add explanations or notes";

const CLASSIFY_SYSTEM_PROMPT: &str = "You map a travel search term onto exactly one of the given \
candidates. Respond with the candidate text exactly as written, or 'None' if no candidate fits.";

const FALLBACK_REPLY: &str = "I'm sorry, I couldn't process your request.";

#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

/// A provider that turns a prompt into text. `Ok(None)` means the provider answered with no content.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<Option<String>>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl TextCompletion for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<Option<String>> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens,
        });
        if let Some(temperature) = request.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(top_p) = request.top_p {
            body["top_p"] = json!(top_p);
        }

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("text completion request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("text completion returned {status}: {text}");
        }

        let completion: ChatCompletion = resp
            .json()
            .await
            .context("text completion returned an unreadable body")?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

/// Used when no provider key is configured; every call fails.
pub struct DisabledCompletion;

#[async_trait]
impl TextCompletion for DisabledCompletion {
    async fn complete(&self, _request: CompletionRequest) -> anyhow::Result<Option<String>> {
        Err(anyhow!("text completion is not configured"))
    }
}

/// One recorded interaction, as handed to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct ActivitySignal {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub value: Option<String>,
    pub category: Option<String>,
}

/// The narrow set of language-model capabilities the services depend on.
#[derive(Clone)]
pub struct Assistant {
    backend: Arc<dyn TextCompletion>,
}

impl Assistant {
    pub fn new(backend: Arc<dyn TextCompletion>) -> Self {
        Self { backend }
    }

    /// Asks for the user's most engaged categories. Fails on an empty answer.
    pub async fn recommend_categories(
        &self,
        activities: &[ActivitySignal],
    ) -> anyhow::Result<Vec<String>> {
        let payload = serde_json::to_string(activities)?;
        let answer = self
            .backend
            .complete(CompletionRequest {
                prompt: format!("{RECOMMEND_PROMPT}{payload}"),
                max_tokens: 100,
                ..Default::default()
            })
            .await?
            .unwrap_or_default();

        let categories = parse_category_lines(&answer);
        if categories.is_empty() {
            bail!("recommendation service returned no categories");
        }
        Ok(categories)
    }

    /// Picks the candidate that best fits `text`, if any.
    pub async fn classify(
        &self,
        text: &str,
        candidates: &[String],
    ) -> anyhow::Result<Option<String>> {
        if candidates.is_empty() {
            return Ok(None);
        }
        let answer = self
            .backend
            .complete(CompletionRequest {
                system: Some(CLASSIFY_SYSTEM_PROMPT.to_string()),
                prompt: format!("Term: {text}\nCandidates:\n{}", candidates.join("\n")),
                max_tokens: 30,
                temperature: Some(0.0),
                ..Default::default()
            })
            .await?;

        Ok(answer.and_then(|a| match_candidate(&a, candidates)))
    }

    /// Pulls the single most relevant destination, category or district term out of `text`.
    pub async fn extract(&self, text: &str) -> anyhow::Result<Option<String>> {
        let answer = self
            .backend
            .complete(CompletionRequest {
                system: Some(EXTRACT_SYSTEM_PROMPT.to_string()),
                prompt: text.to_string(),
                max_tokens: 30,
                temperature: Some(0.3),
                top_p: Some(0.9),
            })
            .await?;

        Ok(answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case("none")))
    }

    /// Free-text travel-assistant reply.
    pub async fn respond(&self, prompt: &str) -> anyhow::Result<String> {
        let answer = self
            .backend
            .complete(CompletionRequest {
                system: Some(CHAT_SYSTEM_PROMPT.to_string()),
                prompt: prompt.to_string(),
                max_tokens: 150,
                ..Default::default()
            })
            .await?;

        Ok(answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }
}

/// Splits a one-per-line answer into names, dropping list markers, blanks and repeats.
pub fn parse_category_lines(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        let name = strip_list_marker(line.trim());
        if name.is_empty() || out.iter().any(|n| n == name) {
            continue;
        }
        out.push(name.to_string());
    }
    out
}

fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix(['-', '*', '•']) {
        return rest.trim();
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(['.', ')']) {
            return rest.trim();
        }
    }
    line
}

fn match_candidate(answer: &str, candidates: &[String]) -> Option<String> {
    let answer = answer.trim().trim_matches(|c| c == '"' || c == '\'' || c == '.');
    candidates
        .iter()
        .find(|c| c.eq_ignore_ascii_case(answer))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Canned {
        answer: Option<String>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl TextCompletion for Canned {
        async fn complete(&self, request: CompletionRequest) -> anyhow::Result<Option<String>> {
            self.seen.lock().unwrap().push(request);
            Ok(self.answer.clone())
        }
    }

    fn canned_assistant(answer: Option<&str>) -> (Assistant, Arc<Canned>) {
        let canned = Arc::new(Canned {
            answer: answer.map(str::to_string),
            seen: Mutex::new(Vec::new()),
        });
        (Assistant::new(canned.clone()), canned)
    }

    #[test]
    fn category_lines_are_trimmed_and_deduplicated() {
        let parsed = parse_category_lines("1. Hotel\n- Restaurant\n\n  Hotel \n* Shopping Mall\n3D Cinema");
        assert_eq!(parsed, vec!["Hotel", "Restaurant", "Shopping Mall", "3D Cinema"]);
    }

    #[tokio::test]
    async fn recommend_fails_on_blank_answer() {
        let (assistant, _) = canned_assistant(Some("  \n "));
        let err = assistant.recommend_categories(&[]).await.unwrap_err();
        assert!(err.to_string().contains("no categories"));
    }

    #[tokio::test]
    async fn recommend_embeds_activities_in_prompt() {
        let (assistant, canned) = canned_assistant(Some("Hotel\nRestaurant"));
        let signals = vec![ActivitySignal {
            activity_type: "rate".into(),
            value: Some("4.5".into()),
            category: Some("Hotel".into()),
        }];
        let categories = assistant.recommend_categories(&signals).await.unwrap();
        assert_eq!(categories, vec!["Hotel", "Restaurant"]);
        let seen = canned.seen.lock().unwrap();
        assert!(seen[0].prompt.contains(r#""type":"rate""#));
    }

    #[tokio::test]
    async fn extract_treats_none_as_no_match() {
        let (assistant, _) = canned_assistant(Some("None"));
        assert_eq!(assistant.extract("what's the weather").await.unwrap(), None);
    }

    #[tokio::test]
    async fn classify_only_returns_known_candidates() {
        let candidates = vec!["Hotel".to_string(), "Restaurant".to_string()];
        let (assistant, _) = canned_assistant(Some("hotel."));
        assert_eq!(
            assistant.classify("hostel", &candidates).await.unwrap(),
            Some("Hotel".to_string())
        );

        let (assistant, _) = canned_assistant(Some("Museum"));
        assert_eq!(assistant.classify("museum", &candidates).await.unwrap(), None);
    }

    #[tokio::test]
    async fn respond_falls_back_when_empty() {
        let (assistant, _) = canned_assistant(None);
        assert_eq!(assistant.respond("hi").await.unwrap(), FALLBACK_REPLY);
    }
}
