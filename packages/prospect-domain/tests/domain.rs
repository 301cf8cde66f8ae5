use std::collections::HashMap;

use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};

use prospect_domain::{DedupCache, Error, ExtractionSchema, PromptTemplate, validate_extraction};

fn company_schema() -> ExtractionSchema {
	serde_json::from_value(json!({
		"name": "company_info",
		"description": "Basic company facts.",
		"fields": [
			{ "name": "industry", "type": "string", "required": true },
			{ "name": "headquarters", "type": "string", "required": false, "default": "unknown" },
			{ "name": "founded_year", "type": "number", "required": false }
		]
	}))
	.expect("Failed to build schema.")
}

#[test]
fn missing_required_field_is_named() {
	let candidate = json!({ "headquarters": "Berlin" });
	let err = validate_extraction(&company_schema(), candidate)
		.expect_err("Missing industry must fail validation.");

	match err {
		Error::MissingFields { fields } => assert_eq!(fields, vec!["industry".to_string()]),
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[test]
fn optional_default_is_filled_and_never_null() {
	let candidate = json!({ "industry": "logistics", "headquarters": null });
	let validated = validate_extraction(&company_schema(), candidate)
		.expect("Validation must succeed with industry present.");

	assert_eq!(validated.get("industry"), Some(&Value::String("logistics".to_string())));
	assert_eq!(validated.get("headquarters"), Some(&Value::String("unknown".to_string())));
	// An optional field without a default stays absent rather than becoming null.
	assert!(!validated.contains_key("founded_year"));
}

#[test]
fn unknown_fields_pass_through() {
	let candidate = json!({ "industry": "retail", "ceo": "Dana Ortiz" });
	let validated = validate_extraction(&company_schema(), candidate).expect("Validation failed.");

	assert_eq!(validated.get("ceo"), Some(&Value::String("Dana Ortiz".to_string())));
}

#[test]
fn non_object_extraction_is_rejected() {
	let err = validate_extraction(&company_schema(), json!(["industry"]))
		.expect_err("Array extraction must fail.");

	assert!(matches!(err, Error::NotAnObject));
}

#[test]
fn template_renders_supplied_variables() {
	let template = PromptTemplate::parse(
		"company_info".to_string(),
		"Summarize {company_name} using:\n{website_content}".to_string(),
	);
	let mut vars = HashMap::new();

	vars.insert("company_name".to_string(), "Acme Corp".to_string());
	vars.insert("website_content".to_string(), "Acme builds anvils.".to_string());

	let rendered = template.render(&vars).expect("Render failed.");

	assert_eq!(rendered, "Summarize Acme Corp using:\nAcme builds anvils.");
}

#[test]
fn template_rejects_unbound_variable() {
	let template =
		PromptTemplate::parse("company_info".to_string(), "About {company_name}.".to_string());
	let err = template.render(&HashMap::new()).expect_err("Render must fail.");

	match err {
		Error::UnboundVariable { name } => assert_eq!(name, "company_name"),
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[test]
fn dedup_misses_exactly_once_before_expiry() {
	let mut cache = DedupCache::new(24);
	let now = OffsetDateTime::from_unix_timestamp(1_735_732_800).expect("Valid timestamp.");

	assert!(!cache.seen("email_1:1735732800", now));
	assert!(cache.seen("email_1:1735732800", now + Duration::minutes(1)));
	assert!(cache.seen("email_1:1735732800", now + Duration::hours(23)));
}

#[test]
fn dedup_forgets_after_retention_window() {
	let mut cache = DedupCache::new(24);
	let now = OffsetDateTime::from_unix_timestamp(1_735_732_800).expect("Valid timestamp.");

	assert!(!cache.seen("email_1:1735732800", now));
	// The retention window has fully elapsed, so the key reads as new again.
	assert!(!cache.seen("email_1:1735732800", now + Duration::hours(25)));
}

#[test]
fn purge_drops_only_expired_entries() {
	let mut cache = DedupCache::new(1);
	let now = OffsetDateTime::from_unix_timestamp(1_735_732_800).expect("Valid timestamp.");

	cache.seen("old", now);
	cache.seen("fresh", now + Duration::minutes(59));
	cache.purge_expired(now + Duration::minutes(61));

	let stats = cache.stats();

	assert_eq!(stats.tracked, 1);
	assert_eq!(stats.oldest_inserted_at, Some(now + Duration::minutes(59)));
}
