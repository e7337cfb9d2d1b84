use book_catalog_client::client::CatalogClient;
use book_catalog_client::config::Config;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    info!(api_url = config.api_url(), "listing catalog");

    let client = CatalogClient::new(config.client_config())?;
    let books = client.list_all().await?;

    for book in &books {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            book.isbn(),
            book.title(),
            book.authors().join(", "),
            book.genre(),
            book.publish_date()
        );
    }
    info!(count = books.len(), "done");
    Ok(())
}
