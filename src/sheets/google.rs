// src/sheets/google.rs

//! Google Sheets v4 backend.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::{SheetStore, SheetTable, StoreError, Table};

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before they actually expire.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Where a table lives: spreadsheet id plus worksheet title.
#[derive(Debug, Clone)]
pub struct SheetLocation {
    pub spreadsheet_id: String,
    pub worksheet: String,
}

impl SheetLocation {
    pub fn new(spreadsheet_id: impl Into<String>, worksheet: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            worksheet: worksheet.into(),
        }
    }
}

/// Fields of a service-account JSON key the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Auth(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| StoreError::Auth(format!("invalid service account key: {e}")))
    }
}

/// How the client authenticates against the API.
pub enum TokenSource {
    /// A pre-issued OAuth access token.
    Static(String),
    /// Signed JWT assertions exchanged for short-lived access tokens.
    ServiceAccount(ServiceAccountKey),
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    TOKEN_LIFETIME_SECS
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Spreadsheet client talking to the Sheets REST API.
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    base_url: Url,
    locations: HashMap<Table, SheetLocation>,
    auth: TokenSource,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsClient {
    pub fn new(
        base_url: &str,
        auth: TokenSource,
        locations: HashMap<Table, SheetLocation>,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let base_url =
            Url::parse(base_url).map_err(|e| StoreError::Malformed(format!("base url: {e}")))?;

        Ok(Self {
            client,
            base_url,
            locations,
            auth,
            token: Mutex::new(None),
        })
    }

    fn location(&self, table: Table) -> Result<&SheetLocation, StoreError> {
        self.locations.get(&table).ok_or(StoreError::UnknownTable(table))
    }

    /// `.../v4/spreadsheets/{id}/values/{range}{suffix}`
    fn values_url(&self, location: &SheetLocation, range: &str, suffix: &str) -> Result<Url, StoreError> {
        let target = format!("{range}{suffix}");
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Malformed("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                location.spreadsheet_id.as_str(),
                "values",
                target.as_str(),
            ]);
        Ok(url)
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        let key = match &self.auth {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::ServiceAccount(key) => key,
        };

        let mut cached = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - chrono::Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > now {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.exchange_assertion(key).await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    async fn exchange_assertion(&self, key: &ServiceAccountKey) -> Result<CachedToken, StoreError> {
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: SHEETS_SCOPE,
            aud: &key.token_uri,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = key.private_key_id.clone();
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| StoreError::Auth(format!("invalid private key: {e}")))?;
        let assertion =
            encode(&header, &claims, &signing_key).map_err(|e| StoreError::Auth(e.to_string()))?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(format!("token response: {e}")))?;
        tracing::debug!(expires_in = token.expires_in, "obtained sheets access token");

        Ok(CachedToken {
            value: token.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(token.expires_in),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status,
                message: body,
            });
        }
        Ok(response)
    }
}

/// Column number to A1 letters: 1 → A, 26 → Z, 27 → AA.
pub fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        letters.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Worksheet title quoted for use in an A1 range.
fn quoted_sheet(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SheetStore for GoogleSheetsClient {
    #[instrument(skip(self))]
    async fn read_table(&self, table: Table) -> Result<SheetTable, StoreError> {
        let location = self.location(table)?;
        let url = self.values_url(location, &quoted_sheet(&location.worksheet), "")?;
        let token = self.access_token().await?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        let range: ValueRange = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        let values = range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        Ok(SheetTable::from_values(values))
    }

    #[instrument(skip(self, value))]
    async fn write_cell(
        &self,
        table: Table,
        row: usize,
        col: usize,
        value: &str,
    ) -> Result<(), StoreError> {
        let location = self.location(table)?;
        let range = format!(
            "{}!{}{}",
            quoted_sheet(&location.worksheet),
            column_letters(col),
            row
        );
        let url = self.values_url(location, &range, "")?;
        let token = self.access_token().await?;

        let response = self
            .client
            .put(url)
            .bearer_auth(token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [[value]],
            }))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }

    #[instrument(skip(self, values))]
    async fn append_row(&self, table: Table, values: &[String]) -> Result<(), StoreError> {
        let location = self.location(table)?;
        let range = format!("{}!A1", quoted_sheet(&location.worksheet));
        let url = self.values_url(location, &range, ":append")?;
        let token = self.access_token().await?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({
                "majorDimension": "ROWS",
                "values": [values],
            }))
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Self::check(response).await?;
        Ok(())
    }
}
