use std::fs;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::{Error, Result, schema};

pub struct Db {
	pub pool: SqlitePool,
}
impl Db {
	pub async fn connect(cfg: &prospect_config::Sqlite) -> Result<Self> {
		if let Some(parent) = cfg.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent)
				.map_err(|err| Error::CreateDir { path: parent.to_path_buf(), source: err })?;
		}

		let options = SqliteConnectOptions::new()
			.filename(&cfg.path)
			.create_if_missing(true)
			.journal_mode(SqliteJournalMode::Wal);
		let pool = SqlitePoolOptions::new()
			.max_connections(cfg.pool_max_conns)
			.connect_with(options)
			.await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		for statement in schema::render_schema().split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&self.pool).await?;
		}

		Ok(())
	}
}
