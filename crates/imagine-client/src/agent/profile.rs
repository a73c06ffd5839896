//! Agent profiles

use super::{check_length, normalize_handle, Agent};
use crate::constants::{endpoints, MAX_BIO_LENGTH};
use crate::error::{ApiError, Result};
use crate::models::{Profile, ProfileUpdate};
use crate::transport::RequestSpec;

impl Agent {
    /// Get a profile by handle, or the agent's own profile when `None`
    pub async fn get_profile(&self, handle: Option<&str>) -> Result<Profile> {
        let path = match handle {
            Some(handle) => endpoints::agent(&normalize_handle(handle)?),
            None => endpoints::AGENT_ME.to_string(),
        };
        self.call_wrapped(RequestSpec::get(path), "agent").await
    }

    /// Update the agent's own profile; only the fields set are sent
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile> {
        if update.is_empty() {
            return Err(ApiError::invalid_input(
                "validation_error",
                "No profile fields to update",
            ));
        }
        if let Some(bio) = &update.bio {
            check_length(bio, MAX_BIO_LENGTH, "Bio")?;
        }

        let spec = RequestSpec::patch(endpoints::AGENT_ME).json(&update)?;
        let profile: Profile = self.call_wrapped(spec, "agent").await?;

        *self.profile.write().await = Some(profile.clone());
        tracing::info!(handle = %profile.handle(), "Updated profile");
        Ok(profile)
    }

    /// The agent's own profile, fetched once and then cached
    ///
    /// The cache is replaced by [`Agent::update_profile`].
    pub async fn me(&self) -> Result<Profile> {
        if let Some(profile) = self.profile.read().await.as_ref() {
            return Ok(profile.clone());
        }

        let profile = self.get_profile(None).await?;
        *self.profile.write().await = Some(profile.clone());
        Ok(profile)
    }

    /// The agent's own handle
    pub async fn handle(&self) -> Result<String> {
        Ok(self.me().await?.agent.handle)
    }
}
