//! Identity provider over the backend's auth endpoints.

use owl_store::{IdentityError, IdentityProvider, UserInfo};
use reqwest::{Client, StatusCode};

/// `GET /api/auth/me` and `POST /api/auth/logout`.
///
/// The client keeps cookies, so a session established by the sign-in flow is
/// sent with every request.
#[derive(Clone, Debug)]
pub struct HttpIdentity {
    client: Client,
    base_url: String,
}

impl HttpIdentity {
    pub fn new(base_url: impl Into<String>) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl IdentityProvider for HttpIdentity {
    async fn current_user(&self) -> Result<Option<UserInfo>, IdentityError> {
        let resp = self
            .client
            .get(format!("{}/api/auth/me", self.base_url))
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        match resp.status() {
            StatusCode::UNAUTHORIZED => Ok(None),
            status if status.is_success() => resp
                .json()
                .await
                .map_err(|e| IdentityError::Request(e.to_string())),
            status => Err(IdentityError::Status(status.as_u16())),
        }
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let resp = self
            .client
            .post(format!("{}/api/auth/logout", self.base_url))
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(IdentityError::Status(resp.status().as_u16()))
        }
    }
}
