use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Facebook,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Google => write!(f, "google"),
            Provider::Facebook => write!(f, "facebook"),
        }
    }
}

impl FromStr for Provider {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "facebook" => Ok(Provider::Facebook),
            other => Err(AuthError::UpstreamLoginFailure(format!(
                "unsupported identity provider '{}'",
                other
            ))),
        }
    }
}

/// Verified identity asserted by an external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub provider: Provider,
    pub subject: String,
    pub display_name: Option<String>,
    pub email: String,
    pub picture_url: Option<String>,
}

impl ExternalIdentity {
    /// Name written to the session record; never empty.
    pub fn session_name(&self) -> &str {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

#[derive(Debug, Deserialize)]
struct FacebookProfile {
    id: String,
    name: Option<String>,
    email: Option<String>,
    picture: Option<FacebookPicture>,
}

#[derive(Debug, Deserialize)]
struct FacebookPicture {
    data: FacebookPictureData,
}

#[derive(Debug, Deserialize)]
struct FacebookPictureData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct GoogleProfile {
    sub: String,
    name: Option<String>,
    email: Option<String>,
    email_verified: Option<bool>,
    picture: Option<String>,
}

impl TryFrom<FacebookProfile> for ExternalIdentity {
    type Error = AuthError;

    fn try_from(profile: FacebookProfile) -> Result<Self, Self::Error> {
        let email = required_email(profile.email, Provider::Facebook)?;
        Ok(ExternalIdentity {
            provider: Provider::Facebook,
            subject: profile.id,
            display_name: profile.name,
            email,
            picture_url: profile.picture.map(|p| p.data.url),
        })
    }
}

impl TryFrom<GoogleProfile> for ExternalIdentity {
    type Error = AuthError;

    fn try_from(profile: GoogleProfile) -> Result<Self, Self::Error> {
        if profile.email_verified == Some(false) {
            return Err(AuthError::UpstreamLoginFailure(
                "google account email is not verified".into(),
            ));
        }
        let email = required_email(profile.email, Provider::Google)?;
        Ok(ExternalIdentity {
            provider: Provider::Google,
            subject: profile.sub,
            display_name: profile.name,
            email,
            picture_url: profile.picture,
        })
    }
}

fn required_email(email: Option<String>, provider: Provider) -> Result<String, AuthError> {
    email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AuthError::UpstreamLoginFailure(format!("{} profile has no email", provider)))
}

/// Resolves provider access tokens into verified identities.
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    facebook_graph_url: String,
    google_userinfo_url: String,
}

impl IdentityClient {
    pub fn new(
        facebook_graph_url: &str,
        google_userinfo_url: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            facebook_graph_url: facebook_graph_url.trim_end_matches('/').to_string(),
            google_userinfo_url: google_userinfo_url.to_string(),
        })
    }

    pub async fn resolve(
        &self,
        provider: Provider,
        access_token: &str,
    ) -> Result<ExternalIdentity, AuthError> {
        let token = access_token.trim();
        if token.is_empty() {
            return Err(AuthError::UpstreamLoginFailure("missing access token".into()));
        }

        match provider {
            Provider::Facebook => {
                let request = self
                    .http
                    .get(format!("{}/me", self.facebook_graph_url))
                    .query(&[
                        ("fields", "id,name,email,picture.width(100).height(100)"),
                        ("access_token", token),
                    ]);
                let profile: FacebookProfile = fetch_profile(request, provider).await?;
                profile.try_into()
            }
            Provider::Google => {
                let request = self.http.get(&self.google_userinfo_url).bearer_auth(token);
                let profile: GoogleProfile = fetch_profile(request, provider).await?;
                profile.try_into()
            }
        }
    }
}

async fn fetch_profile<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: Provider,
) -> Result<T, AuthError> {
    let response = request.send().await.map_err(|e| {
        tracing::warn!("{} profile request failed: {}", provider, e);
        AuthError::UpstreamLoginFailure(format!("{} unreachable", provider))
    })?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("{} rejected the access token with {}", provider, status);
        return Err(AuthError::UpstreamLoginFailure(format!(
            "{} returned {}",
            provider, status
        )));
    }

    response.json::<T>().await.map_err(|e| {
        tracing::warn!("{} returned a malformed profile: {}", provider, e);
        AuthError::UpstreamLoginFailure(format!("malformed {} profile", provider))
    })
}
