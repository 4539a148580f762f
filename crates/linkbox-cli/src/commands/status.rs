//! Status command handler

use anyhow::Result;
use serde::Serialize;

use linkbox_core::LinkState;

use super::App;
use crate::output::{Output, OutputFormat};

/// Collection statistics shown by `status`
#[derive(Debug, PartialEq, Eq, Serialize)]
struct Counts {
    links: usize,
    favorites: usize,
    categories: usize,
}

impl Counts {
    fn of(state: &LinkState) -> Self {
        Self {
            links: state.links().len(),
            favorites: state.favorites().len(),
            categories: state.category_count(),
        }
    }
}

/// Show status information
pub fn show(app: &App, output: &Output) -> Result<()> {
    let state = app.sync.state();
    let counts = Counts::of(&state);
    let config = &app.config;
    let store_path = config.store_path();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "identity": state.identity(),
                    "data_dir": config.data_dir,
                    "store": store_path,
                    "last_error": state.last_error(),
                    "counts": counts
                })
            );
        }
        OutputFormat::Quiet => {
            if let Some(identity) = state.identity() {
                println!("{}", identity.uid);
            }
        }
        OutputFormat::Human => {
            println!("LinkBox Status");
            println!("==============");
            println!();
            println!("Session:");
            match state.identity() {
                Some(identity) => println!("  Signed in as {}", identity),
                None => println!("  Not signed in"),
            }
            if let Some(error) = state.last_error() {
                println!("  Sync error: {}", error);
            }
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Store:    {}", store_path.display());
            println!();
            println!("Contents:");
            println!("  Links:      {}", counts.links);
            println!("  Favorites:  {}", counts.favorites);
            println!("  Categories: {}", counts.categories);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkbox_core::{Identity, LinkSync, LocalAuth, MemoryStore, NewLink};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_counts_follow_the_mirror() {
        let sync = LinkSync::spawn(
            Arc::new(LocalAuth::signed_in(Identity::new("u1"))),
            Arc::new(MemoryStore::new()),
        );
        let state = sync.wait_until_loaded().await;
        assert_eq!(
            Counts::of(&state),
            Counts {
                links: 0,
                favorites: 0,
                categories: 0
            }
        );

        sync.add(NewLink::new("https://a.example.com").unwrap(), true)
            .await
            .unwrap();
        sync.add(NewLink::new("https://b.example.com").unwrap(), false)
            .await
            .unwrap();

        let mut rx = sync.subscribe();
        let state = rx
            .wait_for(|s| s.links().len() == 2)
            .await
            .map(|s| s.clone())
            .unwrap();
        assert_eq!(
            Counts::of(&state),
            Counts {
                links: 2,
                favorites: 1,
                categories: 1
            }
        );
        let json = serde_json::to_value(Counts::of(&state)).unwrap();
        assert_eq!(json["categories"], 1);

        sync.shutdown().await;
    }
}
