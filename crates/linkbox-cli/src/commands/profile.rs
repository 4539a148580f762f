//! Profile command handlers

use std::sync::Arc;

use anyhow::Result;

use linkbox_core::{Profile, ProfileService};

use super::App;
use crate::output::Output;
use crate::prompt::edit_text;

/// Fields to change on the profile
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub website: Option<String>,
    pub bio: Option<String>,
    pub edit_bio: bool,
}

fn service(app: &App) -> ProfileService {
    ProfileService::new(Arc::new(app.store.clone()))
}

/// Show the signed-in user's profile
pub async fn show(app: &App, output: &Output) -> Result<()> {
    let state = app.sync.state();
    let profile = service(app).load(state.identity()).await?;
    output.print_profile(&profile);
    Ok(())
}

/// Update the signed-in user's profile
pub async fn set(app: &App, changes: ProfileChanges, output: &Output) -> Result<()> {
    let state = app.sync.state();
    let profiles = service(app);

    let mut profile = profiles.load(state.identity()).await?;
    let edit_bio = changes.edit_bio;
    apply(&mut profile, changes);
    if edit_bio {
        profile.bio = edit_text(&profile.bio)?;
    }

    let saved = profiles.save(state.identity(), profile).await?;
    output.success("Profile saved");
    output.print_profile(&saved);
    Ok(())
}

fn apply(profile: &mut Profile, changes: ProfileChanges) {
    if let Some(username) = changes.username {
        profile.username = username.trim().to_string();
    }
    if let Some(website) = changes.website {
        profile.website = website.trim().to_string();
    }
    if let Some(bio) = changes.bio {
        profile.bio = bio;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_only_given_fields() {
        let mut profile = Profile {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            website: "https://alice.dev".to_string(),
            bio: "hello".to_string(),
        };

        apply(
            &mut profile,
            ProfileChanges {
                website: Some("  https://alice.blog ".to_string()),
                ..ProfileChanges::default()
            },
        );

        assert_eq!(profile.username, "alice");
        assert_eq!(profile.website, "https://alice.blog");
        assert_eq!(profile.bio, "hello");
    }
}
