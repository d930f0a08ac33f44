use std::{io, sync::Arc};

use anyhow::Result;

use crate::{
    config::SETTINGS,
    crawler::HttpFetcher,
    event::previous_close::{Orchestrator, Reporter},
    logging::LogGuard,
};

pub mod config;
pub mod crawler;
pub mod declare;
pub mod error;
pub mod event;
pub mod logging;
pub mod util;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let mut reporter = Reporter::new(io::stdout());

    let orchestrator = Orchestrator::new(
        SETTINGS.scraper.clone(),
        Arc::new(HttpFetcher::new()?),
        Arc::new(LogGuard::stderr()),
    )?;
    let stream = match orchestrator.run_configured() {
        Ok(stream) => stream,
        Err(why) => {
            logging::error_file_async(format!("Failed to dispatch stock tasks because {:?}", why));
            return Err(why.into());
        }
    };

    let printed = reporter.drain(stream).await?;
    logging::info_file_async(format!("{} previous close prices printed", printed));
    reporter.finish()?;

    Ok(())
}
