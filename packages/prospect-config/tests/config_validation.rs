use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use prospect_config::Error;

const SAMPLE_CONFIG_TOML: &str = r#"
[service]
http_bind = "127.0.0.1:8000"
log_level = "info"

[storage.sqlite]
path = "data/email_opens.db"
pool_max_conns = 4

[providers.firecrawl]
api_key = "fc-test"

[providers.llm]
api_key = "sk-test"
model = "claude-sonnet-4-20250514"

[providers.closeio]
api_key = "api_test"

[providers.discord]
webhook_url = "https://discord.com/api/webhooks/1/abc"

[notifier]
polling_enabled = true
polling_interval_seconds = 300
cache_retention_hours = 24
"#;

fn sample_with<F>(mutate: F) -> String
where
	F: FnOnce(&mut toml::Table),
{
	let mut value: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let root = value.as_table_mut().expect("Sample config must be a table.");

	mutate(root);

	toml::to_string(&value).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("prospect_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

#[test]
fn loads_sample_config() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let cfg = prospect_config::load(&path).expect("Failed to load sample config.");

	assert_eq!(cfg.service.http_bind, "127.0.0.1:8000");
	assert_eq!(cfg.providers.llm.model, "claude-sonnet-4-20250514");
	assert_eq!(cfg.notifier.cache_retention_hours, 24);
	assert!(cfg.providers.discord.webhook_url.is_some());

	let _ = fs::remove_file(path);
}

#[test]
fn defaults_fill_missing_sections() {
	let path = write_temp_config(String::new());
	let cfg = prospect_config::load(&path).expect("Failed to load empty config.");

	assert_eq!(cfg.providers.closeio.api_base, "https://api.close.com/api/v1");
	assert_eq!(cfg.notifier.polling_interval_seconds, 300);
	assert!(cfg.providers.discord.webhook_url.is_none());

	let _ = fs::remove_file(path);
}

#[test]
fn rejects_zero_pool_conns() {
	let payload = sample_with(|root| {
		let storage = root
			.get_mut("storage")
			.and_then(Value::as_table_mut)
			.expect("Sample config must include [storage].");
		let sqlite = storage
			.get_mut("sqlite")
			.and_then(Value::as_table_mut)
			.expect("Sample config must include [storage.sqlite].");

		sqlite.insert("pool_max_conns".to_string(), Value::Integer(0));
	});
	let path = write_temp_config(payload);
	let err = prospect_config::load(&path).expect_err("Zero pool_max_conns must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));

	let _ = fs::remove_file(path);
}

#[test]
fn rejects_zero_polling_interval() {
	let payload = sample_with(|root| {
		let notifier = root
			.get_mut("notifier")
			.and_then(Value::as_table_mut)
			.expect("Sample config must include [notifier].");

		notifier.insert("polling_interval_seconds".to_string(), Value::Integer(0));
	});
	let path = write_temp_config(payload);
	let err = prospect_config::load(&path).expect_err("Zero polling interval must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));

	let _ = fs::remove_file(path);
}

#[test]
fn rejects_empty_model() {
	let payload = sample_with(|root| {
		let providers = root
			.get_mut("providers")
			.and_then(Value::as_table_mut)
			.expect("Sample config must include [providers].");
		let llm = providers
			.get_mut("llm")
			.and_then(Value::as_table_mut)
			.expect("Sample config must include [providers.llm].");

		llm.insert("model".to_string(), Value::String("  ".to_string()));
	});
	let path = write_temp_config(payload);
	let err = prospect_config::load(&path).expect_err("Empty model must be rejected.");

	assert!(matches!(err, Error::Validation { .. }));

	let _ = fs::remove_file(path);
}

#[test]
fn read_failure_is_reported_with_path() {
	let mut path = env::temp_dir();

	path.push("prospect_config_test_missing.toml");

	let _ = fs::remove_file(&path);
	let err = prospect_config::load(&path).expect_err("Missing file must be rejected.");

	assert!(matches!(err, Error::ReadConfig { .. }));
}
