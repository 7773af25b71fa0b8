//! Content script injected into the host's profile pages.
//!
//! Answers popup requests, rewrites the fragment to hide events, and keeps
//! the stored catalogs in step with what the page shows.
pub mod dom;

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, error, info, warn};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Location, MutationObserver, MutationObserverInit, MutationRecord, Node, Window};

use crate::bridge;
use crate::config::{HASH_POLL_INTERVAL_MS, PROPERTY_RESCAN_DELAY_MS, RELOAD_DELAY_MS};
use crate::error::{NavigatorError, Result};
use crate::events::EventCatalog;
use crate::hash;
use crate::messages::{Ack, AllProperties, CurrentEvents, EarliestEvent, EventDatabase, Request, Response};
use crate::properties::PropertyCatalog;
use crate::storage::{self, DISCOVERED_PROPERTIES, Entry, HIDDEN_EVENTS};

fn window() -> Result<Window> {
    web_sys::window().ok_or(NavigatorError::NotFound("No window"))
}

fn document() -> Result<Document> {
    window()?.document().ok_or(NavigatorError::NotFound("No document"))
}

fn current_hash() -> String {
    window()
        .ok()
        .and_then(|w| w.location().hash().ok())
        .unwrap_or_default()
}

fn on_activity_feed() -> bool {
    hash::is_activity_feed_hash(&current_hash())
}

pub fn start() {
    bridge::on_runtime_message(|message| to_js(&handle_message(&current_hash(), message)));

    if on_activity_feed() {
        info!("activity feed detected");
        refresh_catalogs();
        schedule(PROPERTY_RESCAN_DELAY_MS, || {
            if on_activity_feed() {
                spawn_local(sync_properties());
            }
        });
        if let Err(e) = observe_property_additions() {
            warn!("could not observe page changes: {}", e);
        }
    }

    if let Err(e) = watch_hash() {
        warn!("could not watch hash changes: {}", e);
    }
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).unwrap_or(JsValue::UNDEFINED)
}

/// Answer one popup request. `hash` is the page's current fragment; every
/// request made off an activity feed is refused.
pub fn handle_message(hash: &str, message: JsValue) -> Response {
    if !hash::is_activity_feed_hash(hash) {
        return Response::Ack(Ack::from(Err(NavigatorError::NotOnActivityFeed)));
    }

    let request: Request = match serde_wasm_bindgen::from_value(message) {
        Ok(request) => request,
        Err(e) => {
            warn!("unrecognised message: {}", e);
            return Response::Ack(Ack::failed("Unknown action"));
        }
    };
    debug!("handling {:?}", request);

    match handle_request(hash, request) {
        Ok(response) => response,
        Err(e) => {
            error!("request failed: {}", e);
            Response::Ack(Ack::failed(e.to_string()))
        }
    }
}

fn handle_request(hash: &str, request: Request) -> Result<Response> {
    let response = match request {
        Request::ApplyHiddenEvents { events } => {
            apply_hidden_events_to_url(&window()?.location(), &events)?;
            Response::Ack(Ack::ok())
        }
        Request::GetCurrentEvents => Response::CurrentEvents(CurrentEvents {
            events: hash::extract_hidden_events(hash),
        }),
        Request::GetAllProperties => Response::AllProperties(AllProperties {
            properties: dom::scrape_properties(&document()?),
        }),
        Request::GetEventDatabase => Response::EventDatabase(EventDatabase {
            events: dom::scrape_feed_events(&document()?),
        }),
        Request::GetEarliestEvent => Response::EarliestEvent(EarliestEvent {
            earliest_event: dom::earliest_event(&document()?),
        }),
        Request::ClickShowMore => Response::Ack(dom::click_show_more(&document()?).into()),
        Request::OpenEvent { event_name, event_time } => {
            Response::Ack(dom::open_event(&document()?, &event_name, &event_time).into())
        }
    };
    Ok(response)
}

/// Rewrite the fragment, then reload so the host re-reads its filters.
/// A page without a fragment is left alone.
pub fn apply_hidden_events_to_url(location: &Location, events: &[String]) -> Result<()> {
    let current = location.hash().map_err(NavigatorError::from_js)?;
    if current.is_empty() {
        error!("no hash in URL");
        return Ok(());
    }

    let updated = hash::apply_hidden_events(current.trim_start_matches('#'), events);
    location.set_hash(&updated).map_err(NavigatorError::from_js)?;
    info!("hidden events applied: {}", events.len());

    let location = location.clone();
    schedule(RELOAD_DELAY_MS, move || {
        if let Err(e) = location.reload() {
            error!("reload failed: {:?}", e);
        }
    });
    Ok(())
}

fn schedule(delay_ms: i32, f: impl FnOnce() + 'static) {
    let callback = Closure::once_into_js(f);
    if let Some(window) = web_sys::window() {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay_ms);
    }
}

fn refresh_catalogs() {
    spawn_local(async {
        sync_hidden_events().await;
        sync_properties().await;
    });
}

/// The `hiddenEvents` write for names found in the fragment, if any are new.
fn discovered_events_update<'a>(catalog: &'a mut EventCatalog, found: &[String]) -> Option<Entry<'a, Vec<String>>> {
    if !catalog.merge_discovered(found) {
        return None;
    }
    Some(storage::entry(HIDDEN_EVENTS, &catalog.hidden_events))
}

/// The `discoveredProperties` write for names scraped from the page, if any are new.
fn discovered_properties_update<'a, 'n, I>(catalog: &'a mut PropertyCatalog, found: I) -> Option<Entry<'a, Vec<String>>>
where
    I: IntoIterator<Item = &'n String>,
{
    if !catalog.merge_discovered(found) {
        return None;
    }
    Some(storage::entry(DISCOVERED_PROPERTIES, &catalog.discovered_properties))
}

/// Store names the page currently hides. Nothing is written if they are all known.
async fn sync_hidden_events() {
    let found = hash::extract_hidden_events(&current_hash());
    if found.is_empty() {
        return;
    }
    let result: Result<bool> = async {
        let mut catalog: EventCatalog = storage::load().await?;
        let Some(update) = discovered_events_update(&mut catalog, &found) else {
            return Ok(false);
        };
        bridge::storage_set(&update).await?;
        Ok(true)
    }
    .await;

    match result {
        Ok(true) => info!("discovered hidden events: {:?}", found),
        Ok(false) => {}
        Err(e) => warn!("failed to save discovered events: {}", e),
    }
}

async fn sync_properties() {
    let Ok(document) = document() else {
        return;
    };
    let properties = dom::scrape_properties(&document);
    if properties.is_empty() {
        return;
    }
    let result: Result<bool> = async {
        let mut catalog: PropertyCatalog = storage::load().await?;
        let Some(update) = discovered_properties_update(&mut catalog, properties.keys()) else {
            return Ok(false);
        };
        bridge::storage_set(&update).await?;
        Ok(true)
    }
    .await;

    match result {
        Ok(true) => debug!("discovered properties, {} on page", properties.len()),
        Ok(false) => {}
        Err(e) => warn!("failed to save discovered properties: {}", e),
    }
}

/// React to in-app navigation: `hashchange` plus a poll for changes the
/// event misses.
fn watch_hash() -> Result<()> {
    let window = window()?;

    let on_hash_change = Closure::wrap(Box::new(|| {
        if on_activity_feed() {
            refresh_catalogs();
        }
    }) as Box<dyn FnMut()>);
    window
        .add_event_listener_with_callback("hashchange", on_hash_change.as_ref().unchecked_ref())
        .map_err(NavigatorError::from_js)?;
    on_hash_change.forget();

    let last_hash = Rc::new(RefCell::new(current_hash()));
    let poll = Closure::wrap(Box::new(move || {
        let hash = current_hash();
        if hash::is_activity_feed_hash(&hash) && *last_hash.borrow() != hash {
            *last_hash.borrow_mut() = hash;
            refresh_catalogs();
        }
    }) as Box<dyn FnMut()>);
    window
        .set_interval_with_callback_and_timeout_and_arguments_0(poll.as_ref().unchecked_ref(), HASH_POLL_INTERVAL_MS)
        .map_err(NavigatorError::from_js)?;
    poll.forget();

    Ok(())
}

/// True when the record adds a property element, directly or nested.
pub fn adds_properties(record: &MutationRecord) -> bool {
    if record.type_() != "childList" {
        return false;
    }
    let added = record.added_nodes();
    (0..added.length())
        .filter_map(|i| added.get(i))
        .filter(|node| node.node_type() == Node::ELEMENT_NODE)
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .any(|element| {
            element.tag_name().eq_ignore_ascii_case(dom::PROPERTY_TAG)
                || element.query_selector(dom::PROPERTY_TAG).ok().flatten().is_some()
        })
}

/// Properties render lazily as the user scrolls the profile.
fn observe_property_additions() -> Result<()> {
    let document = document()?;
    let body = document.body().ok_or(NavigatorError::NotFound("No document body"))?;

    let callback = Closure::wrap(Box::new(move |mutations: js_sys::Array, _observer: MutationObserver| {
        let added = mutations
            .iter()
            .filter_map(|m| m.dyn_into::<MutationRecord>().ok())
            .any(|record| adds_properties(&record));
        if added && on_activity_feed() {
            spawn_local(sync_properties());
        }
    }) as Box<dyn FnMut(js_sys::Array, MutationObserver)>);

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref()).map_err(NavigatorError::from_js)?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    observer
        .observe_with_options(&body, &options)
        .map_err(NavigatorError::from_js)?;
    callback.forget();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_discovered_properties_update_skips_selection() {
        let mut catalog = PropertyCatalog {
            discovered_properties: names(&["a"]),
            selected_properties: names(&["P"]),
        };
        let found = names(&["a", "b"]);

        let update = discovered_properties_update(&mut catalog, &found).unwrap();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "discoveredProperties": ["a", "b"] })
        );
        assert!(discovered_properties_update(&mut catalog, &found).is_none());
    }

    #[test]
    fn test_discovered_events_update_skips_manual() {
        let mut catalog = EventCatalog {
            hidden_events: names(&["Login"]),
            manual_events: names(&["Typed"]),
        };

        let update = discovered_events_update(&mut catalog, &names(&["Page View"])).unwrap();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "hiddenEvents": ["Login", "Page View"] })
        );
        assert!(discovered_events_update(&mut catalog, &names(&["Login"])).is_none());
    }
}
