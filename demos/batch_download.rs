//! Batch download example
//!
//! Demonstrates the core workflow of videomilker:
//! - Loading configuration (defaults when the file is missing)
//! - Reading a batch file of URLs
//! - Subscribing to events
//! - Running the batch with bounded concurrency
//! - Summarizing and retrying failures
//!
//! ```bash
//! cargo run --example batch_download -- urls.txt
//! ```

use videomilker::batch::{create_batch_template, load_urls_from_file};
use videomilker::{BatchProcessor, Config, DownloadOptions, Event};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let config = Config::load("videomilker.json")?;

    let batch_file = std::env::args().nth(1).unwrap_or_else(|| "urls.txt".to_string());
    if !std::path::Path::new(&batch_file).exists() {
        create_batch_template(&batch_file).await?;
        println!("Created {batch_file}; add some URLs and run again");
        return Ok(());
    }

    let processor = BatchProcessor::new(config).await?;

    let report = processor.validate_batch_file(&batch_file).await?;
    for url in &report.invalid_url_list {
        println!("Skipping invalid URL: {url}");
    }

    let estimate = processor.estimate_batch_size(&report.valid_url_list).await;
    println!(
        "{} URLs, about {:.1} MB",
        estimate.url_count,
        estimate.total_size_mb()
    );

    let mut events = processor.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::ItemStarted { url, .. } => println!("Downloading {url}"),
                Event::ItemCompleted { url, filename, .. } => {
                    println!("Done {url} -> {}", filename.unwrap_or_default())
                }
                Event::ItemFailed { url, error, .. } => println!("Failed {url}: {error}"),
                Event::RunLogSaved { path } => println!("Run log: {}", path.display()),
                _ => {}
            }
        }
    });

    let urls = load_urls_from_file(&batch_file).await?;
    let results = processor
        .process_batch_with_validation(&urls, DownloadOptions::default())
        .await;

    let stats = BatchProcessor::get_batch_statistics(&results);
    println!(
        "{}/{} succeeded ({:.1}%), {:.1} MB",
        stats.successful, stats.total, stats.success_rate, stats.total_size_mb
    );

    if stats.failed > 0 {
        let retried = processor
            .retry_failed_downloads(&results, DownloadOptions::default())
            .await;
        let retry_stats = BatchProcessor::get_batch_statistics(&retried);
        println!("Retry: {}/{} recovered", retry_stats.successful, retry_stats.total);
    }

    processor.close().await;
    Ok(())
}
