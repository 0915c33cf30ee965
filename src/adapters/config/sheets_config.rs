use std::path::PathBuf;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct SpreadsheetConfig {
    pub spreadsheet_id: Box<str>,
    /// Target sheet and rectangle, e.g. `Sheet1!A1:Z1000`.
    pub range: Box<str>,
    /// OAuth client secret used to bootstrap the installed-app flow.
    #[serde(default = "default_client_secret")]
    pub client_secret: PathBuf,
    /// Where the authorized user token is persisted and refreshed.
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    /// When set, authenticate as a service account instead of the installed-app flow.
    #[serde(default)]
    pub service_account_key: Option<PathBuf>,
}

fn default_client_secret() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_file() -> PathBuf {
    PathBuf::from("token.json")
}
