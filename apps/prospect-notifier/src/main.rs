use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = prospect_notifier::Args::parse();
	prospect_notifier::run(args).await
}
