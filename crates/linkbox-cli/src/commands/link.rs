//! Link command handlers

use anyhow::{bail, Context, Result};

use linkbox_core::{Link, NewLink};

use super::App;
use crate::output::{short_id, Output};
use crate::prompt::confirm;

/// Add a new link
pub async fn add(
    app: &App,
    url: String,
    title: Option<String>,
    tags: Option<String>,
    favorite: bool,
    output: &Output,
) -> Result<()> {
    let mut link = NewLink::new(&url)?;
    if let Some(title) = title {
        link = link.with_title(title);
    }
    if let Some(tags) = tags {
        link = link.with_tags_input(&tags);
    }

    let before = app.sync.state().links().len();
    app.sync.add(link, favorite).await?;

    // The link only shows up once the store pushes it back
    let state = app.wait_for(|s| s.links().len() > before).await;
    match state.links().first() {
        Some(created) if state.links().len() > before => {
            output.success(&format!("Added link: {}", created.id));
            output.print_link(created);
        }
        _ => output.success(&format!("Added link: {}", url)),
    }

    Ok(())
}

/// List all links, newest first
pub fn list(app: &App, output: &Output) -> Result<()> {
    output.print_links(app.sync.state().links());
    Ok(())
}

/// List the most recent links
pub fn recent(app: &App, count: Option<usize>, output: &Output) -> Result<()> {
    let count = count.unwrap_or(app.config.recent_limit);
    output.print_links(app.sync.state().recent(count));
    Ok(())
}

/// List favorite links
pub fn favorites(app: &App, output: &Output) -> Result<()> {
    output.print_links(app.sync.state().favorites());
    Ok(())
}

/// Search link titles
pub fn search(app: &App, term: String, output: &Output) -> Result<()> {
    let state = app.sync.state();
    output.print_links(state.search(&term));
    Ok(())
}

/// Show a single link
pub fn show(app: &App, id: String, output: &Output) -> Result<()> {
    let state = app.sync.state();
    let link = resolve_link(state.links(), &id)?;
    output.print_link(link);
    Ok(())
}

/// Mark or unmark a link as favorite
pub async fn set_favorite(app: &App, id: String, is_favorite: bool, output: &Output) -> Result<()> {
    let link_id = resolve_link(app.sync.state().links(), &id)?.id.clone();

    app.sync.toggle_favorite(&link_id, is_favorite).await?;

    app.wait_for(|s| s.find(&link_id).map(|l| l.is_favorite) == Some(is_favorite))
        .await;
    if is_favorite {
        output.success(&format!("Added to favorites: {}", short_id(&link_id)));
    } else {
        output.success(&format!("Removed from favorites: {}", short_id(&link_id)));
    }

    Ok(())
}

/// Delete a link
pub async fn delete(app: &App, id: String, output: &Output) -> Result<()> {
    let state = app.sync.state();
    let link = resolve_link(state.links(), &id)?;

    if output.should_prompt() {
        println!("Delete link: {} - {}", short_id(&link.id), link.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    app.sync.delete(&link.id).await?;
    output.success(&format!("Deleted link: {}", link.id));

    Ok(())
}

/// Open a link in the default browser
pub fn open(app: &App, id: String, output: &Output) -> Result<()> {
    let state = app.sync.state();
    let link = resolve_link(state.links(), &id)?;

    open::that(&link.url).with_context(|| format!("Failed to open {}", link.url))?;
    output.message(&format!("Opened {}", link.url));

    Ok(())
}

/// Find a link by full id or unique prefix
fn resolve_link<'a>(links: &'a [Link], id: &str) -> Result<&'a Link> {
    let id = id.trim();
    if id.is_empty() {
        bail!("Link ID must not be empty");
    }

    if let Some(link) = links.iter().find(|l| l.id == id) {
        return Ok(link);
    }

    let matches: Vec<&Link> = links.iter().filter(|l| l.id.starts_with(id)).collect();

    match matches.as_slice() {
        [] => bail!("No link found matching: {}", id),
        [link] => Ok(link),
        _ => {
            eprintln!("Multiple links match '{}':", id);
            for link in &matches {
                eprintln!("  {} - {}", link.id, link.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn link(id: &str) -> Link {
        Link {
            id: id.to_string(),
            url: format!("https://{}.example.com", id),
            title: id.to_uppercase(),
            tags: Vec::new(),
            category: "default".to_string(),
            is_favorite: false,
            user_id: "u1".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_full_id() {
        let links = vec![link("abc123"), link("abc")];
        // An exact match wins over a longer id sharing the prefix
        assert_eq!(resolve_link(&links, "abc").unwrap().id, "abc");
    }

    #[test]
    fn test_resolve_unique_prefix() {
        let links = vec![link("abc123"), link("def456")];
        assert_eq!(resolve_link(&links, "de").unwrap().id, "def456");
    }

    #[test]
    fn test_resolve_ambiguous_prefix() {
        let links = vec![link("abc123"), link("abc456")];
        let err = resolve_link(&links, "abc").unwrap_err();
        assert!(err.to_string().contains("Ambiguous"));
    }

    #[test]
    fn test_resolve_blank_id() {
        // A blank prefix would otherwise match the only link
        let links = vec![link("abc123")];
        assert!(resolve_link(&links, "").is_err());
        assert!(resolve_link(&links, "   ").is_err());
    }

    #[test]
    fn test_resolve_missing() {
        let links = vec![link("abc123")];
        assert!(resolve_link(&links, "zzz").is_err());
        assert!(resolve_link(&[], "abc").is_err());
    }
}
