//! Sign-in session handlers
//!
//! These only touch the session file; no link sync is needed.

use anyhow::{bail, Context, Result};

use linkbox_core::{Config, Identity, LocalAuth};

use crate::output::Output;

fn open_auth(config: &Config) -> Result<LocalAuth> {
    LocalAuth::with_session_file(config.session_path()).context("Failed to load session")
}

/// Sign in with a user id, or anonymously
pub fn login(
    config: &Config,
    uid: Option<String>,
    email: Option<String>,
    anonymous: bool,
    output: &Output,
) -> Result<()> {
    let auth = open_auth(config)?;

    let identity = match (uid, anonymous) {
        (_, true) => auth
            .sign_in_anonymously()
            .context("Failed to save session")?,
        (Some(uid), false) => {
            let uid = uid.trim();
            if uid.is_empty() {
                bail!("User id must not be empty");
            }
            let mut identity = Identity::new(uid);
            if let Some(email) = email {
                identity = identity.with_email(email);
            }
            auth.sign_in(identity.clone())
                .context("Failed to save session")?;
            identity
        }
        (None, false) => bail!("Provide a user id, or use --anonymous"),
    };

    if output.is_json() {
        output.print_identity(Some(&identity));
    } else {
        output.success(&format!("Signed in as {}", identity));
    }
    Ok(())
}

/// Sign out
pub fn logout(config: &Config, output: &Output) -> Result<()> {
    let auth = open_auth(config)?;

    match auth.current() {
        Some(identity) => {
            auth.sign_out().context("Failed to clear session")?;
            output.success(&format!("Signed out {}", identity.uid));
        }
        None => output.message("Not signed in."),
    }
    Ok(())
}

/// Show the signed-in identity
pub fn whoami(config: &Config, output: &Output) -> Result<()> {
    let auth = open_auth(config)?;
    output.print_identity(auth.current().as_ref());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_login_persists_session() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        login(
            &config,
            Some("alice".to_string()),
            Some("alice@example.com".to_string()),
            false,
            &quiet(),
        )
        .unwrap();

        let current = open_auth(&config).unwrap().current().unwrap();
        assert_eq!(current.uid, "alice");
        assert_eq!(current.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_anonymous_login() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        login(&config, None, None, true, &quiet()).unwrap();

        let current = open_auth(&config).unwrap().current().unwrap();
        assert!(current.anonymous);
    }

    #[test]
    fn test_login_requires_uid() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        assert!(login(&config, None, None, false, &quiet()).is_err());
        assert!(login(&config, Some("  ".to_string()), None, false, &quiet()).is_err());
    }

    #[test]
    fn test_logout_clears_session() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        login(&config, Some("alice".to_string()), None, false, &quiet()).unwrap();
        logout(&config, &quiet()).unwrap();

        assert!(open_auth(&config).unwrap().current().is_none());
        // Signing out twice is fine
        logout(&config, &quiet()).unwrap();
    }
}
