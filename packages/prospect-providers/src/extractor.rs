use serde_json::Value;

use crate::{Error, Result};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const PARSE_ATTEMPTS: usize = 3;

/// Sends the rendered prompt to the LLM and parses the reply as a JSON object.
/// The model occasionally wraps its answer in prose or code fences, so a reply
/// that does not parse is retried rather than failed outright.
pub async fn extract(cfg: &prospect_config::LlmProviderConfig, prompt: &str) -> Result<Value> {
	crate::require_key(&cfg.api_key, "extract", "providers.llm.api_key")?;

	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"max_tokens": cfg.max_tokens,
		"temperature": cfg.temperature,
		"messages": [{ "role": "user", "content": prompt }],
	});

	for _ in 0..PARSE_ATTEMPTS {
		let res = client
			.post(&url)
			.header("x-api-key", &cfg.api_key)
			.header("anthropic-version", ANTHROPIC_VERSION)
			.json(&body)
			.send()
			.await?
			.error_for_status()
			.map_err(|err| Error::Api { operation: "extract", url: url.clone(), source: err })?;
		let json: Value = res.json().await?;

		if let Ok(parsed) = parse_extraction(json) {
			return Ok(parsed);
		}
	}

	Err(Error::InvalidResponse { message: "Extractor reply is not valid JSON.".to_string() })
}

fn parse_extraction(json: Value) -> Result<Value> {
	let text = json
		.get("content")
		.and_then(|value| value.as_array())
		.and_then(|blocks| {
			blocks.iter().find_map(|block| block.get("text").and_then(|value| value.as_str()))
		})
		.ok_or_else(|| Error::InvalidResponse {
			message: "Extractor reply is missing text content.".to_string(),
		})?;
	let parsed: Value =
		serde_json::from_str(strip_code_fences(text)).map_err(|_| Error::InvalidResponse {
			message: "Extractor text content is not valid JSON.".to_string(),
		})?;

	if !parsed.is_object() {
		return Err(Error::InvalidResponse {
			message: "Extractor reply is not a JSON object.".to_string(),
		});
	}

	Ok(parsed)
}

fn strip_code_fences(text: &str) -> &str {
	let trimmed = text.trim();
	let Some(rest) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	// Drop the optional language tag on the opening fence.
	let rest = rest.strip_prefix("json").unwrap_or(rest);

	rest.trim_start_matches(['\r', '\n']).trim_end_matches('`').trim()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_plain_json_reply() {
		let json = serde_json::json!({
			"content": [{ "type": "text", "text": "{\"industry\": \"logistics\"}" }]
		});
		let parsed = parse_extraction(json).expect("Parse failed.");

		assert_eq!(parsed["industry"], "logistics");
	}

	#[test]
	fn parses_fenced_json_reply() {
		let json = serde_json::json!({
			"content": [{ "type": "text", "text": "```json\n{\"industry\": \"retail\"}\n```" }]
		});
		let parsed = parse_extraction(json).expect("Parse failed.");

		assert_eq!(parsed["industry"], "retail");
	}

	#[test]
	fn rejects_non_object_reply() {
		let json = serde_json::json!({
			"content": [{ "type": "text", "text": "[1, 2, 3]" }]
		});

		assert!(parse_extraction(json).is_err());
	}
}
