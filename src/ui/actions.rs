/// Header actions: clipboard, export, import and clear, per popup tab

use log::info;

use crate::bridge::{self, ActiveTab};
use crate::error::{NavigatorError, Result};
use crate::events::{self, EventCatalog, ImportMode};
use crate::hash;
use crate::messages::{EventDatabase, Request};
use crate::properties::{self, PropertyCatalog};
use crate::storage;
use crate::timeline::{self, TimelineSelection};

fn plural(count: usize, singular: &str, plural: &str) -> String {
    format!("{} {}", count, if count == 1 { singular } else { plural })
}

pub async fn copy_analytics_id(tab: &ActiveTab) -> Result<String> {
    let id = hash::distinct_id(&tab.url).ok_or(NavigatorError::NotFound("No analytics ID found in URL"))?;
    bridge::copy_to_clipboard(&id).await?;
    Ok("Analytics ID copied!".to_string())
}

pub async fn share_page(tab: &ActiveTab) -> Result<String> {
    bridge::copy_to_clipboard(&tab.url).await?;
    Ok("Page URL copied!".to_string())
}

pub async fn export_events() -> Result<String> {
    let catalog: EventCatalog = storage::load().await?;
    let (text, count) = catalog.export_text()?;
    bridge::download_text(&text, events::EXPORT_FILENAME);
    Ok(format!("{} exported", plural(count, "event", "events")))
}

pub async fn export_properties() -> Result<String> {
    let catalog: PropertyCatalog = storage::load().await?;
    let (text, count) = catalog.export_text()?;
    bridge::download_text(&text, properties::EXPORT_FILENAME);
    Ok(format!("{} exported", plural(count, "property", "properties")))
}

pub async fn export_timeline(tab: &ActiveTab) -> Result<String> {
    let user_id = hash::distinct_id(&tab.url).ok_or(NavigatorError::NotFound("No user ID found in URL"))?;
    let selection: TimelineSelection = storage::load().await?;
    let database: EventDatabase = bridge::send_tab_message(tab.id, &Request::GetEventDatabase).await?;

    let (text, count) = selection.export_text(&user_id, &database.events)?;
    bridge::download_text(&text, &timeline::export_filename(&user_id));
    Ok(format!("Timeline exported ({} events)", count))
}

/// The user chooses between replacing and merging in a confirm dialog.
pub async fn import_events(content: &str) -> Result<String> {
    let names = events::parse_import(content)?;
    let mode = if bridge::confirm(&format!(
        "Found {} in file.\n\nClick OK to REPLACE existing events.\nClick Cancel to MERGE with existing events.",
        plural(names.len(), "event", "events")
    )) {
        ImportMode::Replace
    } else {
        ImportMode::Merge
    };

    let mut catalog: EventCatalog = storage::load().await?;
    catalog.import(&names, mode);
    storage::save(&catalog).await?;
    info!("imported {} events ({:?})", names.len(), mode);

    let suffix = match mode {
        ImportMode::Replace => "(replaced)",
        ImportMode::Merge => "(merged)",
    };
    Ok(format!("{} imported {}", plural(names.len(), "event", "events"), suffix))
}

pub async fn import_properties(content: &str) -> Result<String> {
    let names = events::parse_import(content)?;
    let mut catalog: PropertyCatalog = storage::load().await?;
    catalog.import(&names);
    storage::save(&catalog).await?;
    Ok(format!("{} imported and selected", plural(names.len(), "property", "properties")))
}

/// Returns `Ok(None)` when the user cancels.
pub async fn clear_events() -> Result<Option<String>> {
    let mut catalog: EventCatalog = storage::load().await?;
    let total = catalog.total();
    if total == 0 {
        return Err(NavigatorError::NothingToDo("No events to clear"));
    }
    if !bridge::confirm(&format!(
        "Are you sure you want to delete ALL {}?\n\nThis will permanently remove all auto-discovered and manual events from storage.",
        plural(total, "event", "events")
    )) {
        return Ok(None);
    }
    catalog.clear();
    storage::save(&catalog).await?;
    Ok(Some("All events cleared".to_string()))
}

pub async fn clear_properties() -> Result<Option<String>> {
    let mut catalog: PropertyCatalog = storage::load().await?;
    let total = catalog.discovered_properties.len();
    if total == 0 {
        return Err(NavigatorError::NothingToDo("No properties to clear"));
    }
    if !bridge::confirm(&format!(
        "Are you sure you want to delete ALL {}?\n\nThis will permanently remove all discovered properties from storage.",
        plural(total, "property", "properties")
    )) {
        return Ok(None);
    }
    catalog.clear();
    storage::save(&catalog).await?;
    Ok(Some("All properties cleared".to_string()))
}

pub async fn clear_timeline() -> Result<Option<String>> {
    let mut selection: TimelineSelection = storage::load().await?;
    if selection.is_empty() {
        return Ok(None);
    }
    selection.clear();
    storage::save(&selection).await?;
    Ok(Some("Timeline selections cleared".to_string()))
}
