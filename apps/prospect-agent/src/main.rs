use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = prospect_agent::Args::parse();
	prospect_agent::run(args).await
}
