//! Profile fetch loop.
//!
//! One GET per username, strictly in input order, followed by a fixed pause.
//! A username whose request or response fails is reported and skipped; the
//! rest of the list is still processed.

use crate::clock::Clock;
use crate::console::Console;
use crate::flatten::{flatten_json, FlattenError};
use crate::throttle;
use reqwest::{Client, StatusCode};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const BASE_ADDRESS: &str = "https://api.bitbucket.org/2.0";
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("could not read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error(transparent)]
    Format(#[from] FlattenError),
}

#[derive(Debug, Clone)]
pub struct ProfileResponse {
    pub status: StatusCode,
    pub body: String,
}

pub trait ProfileSource {
    async fn fetch(&self, url: &str) -> Result<ProfileResponse, FetchError>;
}

/// Issues each request from a freshly built client with default settings.
#[derive(Debug, Default)]
pub struct HttpProfileSource;

impl ProfileSource for HttpProfileSource {
    async fn fetch(&self, url: &str) -> Result<ProfileResponse, FetchError> {
        let client = Client::new();
        let response = client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(FetchError::Request)?;

        let status = response.status();
        let body = response.text().await.map_err(FetchError::Body)?;
        Ok(ProfileResponse { status, body })
    }
}

/// Spacing between consecutive requests.
pub trait Pacer {
    async fn pause(&self, duration: Duration);
}

#[derive(Debug, Default)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: String,
    pub delay: Duration,
    pub throttle_path: PathBuf,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub fetched: usize,
    pub failed: usize,
}

/// The username is appended verbatim, without any escaping.
pub fn profile_url(base_url: &str, username: &str) -> String {
    format!("{}/users/{}", base_url, username)
}

pub async fn fetch_profiles<W: Write>(
    usernames: &[String],
    settings: &FetchSettings,
    source: &impl ProfileSource,
    clock: &impl Clock,
    pacer: &impl Pacer,
    console: &mut Console<W>,
) -> FetchSummary {
    let mut summary = FetchSummary::default();

    console.line(&format!("Getting users from {}", settings.base_url));

    for username in usernames {
        let url = profile_url(&settings.base_url, username);
        console.write(&format!("{} - {}", username, url));
        debug!(%username, %url, "requesting profile");

        match fetch_one(source, &url, console).await {
            Ok(lines) => {
                for line in &lines {
                    console.line(line);
                }
                console.line("");
                summary.fetched += 1;

                if let Err(err) = throttle::record(&settings.throttle_path, clock).await {
                    warn!(%err, "last run time not persisted");
                    console.line(&format!("Failed to update last run time: {}", err));
                }
            }
            Err(err) => {
                warn!(%username, %err, "profile fetch failed");
                console.line(&format!("{} - failed: {}", username, err));
                summary.failed += 1;
            }
        }

        pacer.pause(settings.delay).await;
    }

    summary
}

/// Finishes the request line with the status (or a newline on transport
/// failure) and returns the flattened profile.
async fn fetch_one<W: Write>(
    source: &impl ProfileSource,
    url: &str,
    console: &mut Console<W>,
) -> Result<Vec<String>, FetchError> {
    let response = match source.fetch(url).await {
        Ok(response) => response,
        Err(err) => {
            console.line("");
            return Err(err);
        }
    };

    console.line(&format!(" - Status: {}", response.status));
    Ok(flatten_json(&response.body)?)
}
