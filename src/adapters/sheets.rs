use crate::config::toml_config::AllowListConfig;
use crate::core::allow_list::normalize_email;
use crate::domain::ports::AuthorizedEmailSource;
use crate::utils::error::{PatrolError, Result};
use async_trait::async_trait;
use csv::ReaderBuilder;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;

const SERVICE: &str = "Google Sheets";

/// Collects normalised emails from the given zero-based columns. The first
/// row is a header; short rows and blank cells are skipped.
pub fn parse_emails(csv_text: &str, columns: &[usize]) -> Result<HashSet<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let mut emails = HashSet::new();
    for record in reader.records() {
        let record = record?;
        for &column in columns {
            if let Some(email) = record.get(column).and_then(normalize_email) {
                emails.insert(email);
            }
        }
    }
    Ok(emails)
}

/// Allow-list read from the sheet's published CSV export.
pub struct SheetCsvSource {
    client: Client,
    url: String,
    columns: Vec<usize>,
    timeout: Duration,
}

impl SheetCsvSource {
    pub fn new(config: &AllowListConfig) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            url: config.csv_url.clone(),
            columns: config.column_indices()?,
            timeout: Duration::from_secs(config.timeout_seconds()),
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> PatrolError {
        if e.is_timeout() {
            PatrolError::Timeout {
                service: SERVICE.to_string(),
                seconds: self.timeout.as_secs(),
            }
        } else {
            PatrolError::ApiError(e)
        }
    }
}

#[async_trait]
impl AuthorizedEmailSource for SheetCsvSource {
    async fn fetch_emails(&self) -> Result<HashSet<String>> {
        tracing::debug!("Fetching allow-list export");
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "text/csv")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PatrolError::UpstreamStatus {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(|e| self.map_send_error(e))?;
        parse_emails(&text, &self.columns)
    }
}
