use error_stack::ResultExt;
use google_sheets4::oauth2::{self, authenticator::Authenticator};
use thiserror::Error;
use tracing::instrument;

use crate::adapters::config::sheets_config::SpreadsheetConfig;

use super::http_client::{HttpClient, HttpsConnector};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Could not read credentials file")]
    FailedToReadSecret,
    #[error("Could not create an authenticator")]
    FailedToBuildAuthenticator,
    #[error("Could not obtain an access token")]
    FailedToObtainToken,
}

/// Builds the authenticator and fetches a token once so that a missing or revoked credential
/// fails at startup instead of on the first sync.
///
/// With a service account key configured the service-account flow is used. Otherwise the
/// installed-app flow runs from the client secret, persisting to and refreshing from the
/// token file; the browser step only happens when no valid token is stored.
#[instrument(skip(client))]
pub async fn auth(
    config: &SpreadsheetConfig,
    client: HttpClient,
) -> error_stack::Result<Authenticator<HttpsConnector>, AuthError> {
    let authenticator = match &config.service_account_key {
        Some(key_path) => {
            let secret = oauth2::read_service_account_key(key_path)
                .await
                .change_context(AuthError::FailedToReadSecret)
                .attach_printable_lazy(|| {
                    format!(
                        "Could not read service account key at '{}'",
                        key_path.display()
                    )
                })?;

            oauth2::ServiceAccountAuthenticator::with_client(secret, client)
                .build()
                .await
                .change_context(AuthError::FailedToBuildAuthenticator)?
        }
        None => {
            let secret = oauth2::read_application_secret(&config.client_secret)
                .await
                .change_context(AuthError::FailedToReadSecret)
                .attach_printable_lazy(|| {
                    format!(
                        "Could not read client secret at '{}'",
                        config.client_secret.display()
                    )
                })?;

            oauth2::InstalledFlowAuthenticator::with_client(
                secret,
                oauth2::InstalledFlowReturnMethod::HTTPRedirect,
                client,
            )
            .persist_tokens_to_disk(&config.token_file)
            .build()
            .await
            .change_context(AuthError::FailedToBuildAuthenticator)?
        }
    };

    authenticator
        .token(&[SPREADSHEETS_SCOPE])
        .await
        .change_context(AuthError::FailedToObtainToken)?;

    tracing::info!("Google Sheets credentials ready");
    Ok(authenticator)
}
