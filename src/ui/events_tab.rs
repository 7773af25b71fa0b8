/// Hide Events tab: checklist of known event names, applied to the page's fragment
use std::collections::HashMap;

use log::{debug, warn};
use patternfly_yew::prelude::*;
use serde_json::{json, Map};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::analytics;
use crate::bridge::{self, ActiveTab};
use crate::config::APPLY_RESYNC_DELAY_MS;
use crate::error::Result;
use crate::events::{self, EventCatalog, EventEntry};
use crate::messages::{Ack, CurrentEvents, Request};
use crate::storage::{self, HIDDEN_EVENTS, MANUAL_EVENTS};
use crate::ui::components::{CheckRow, EmptyState, RowButton, SearchBox};
use crate::ui::{page_error_message, report, sleep, Status, StatusCallback};

const EMPTY_MESSAGE: &str = "Select events to hide from future activity feed. Either press the \"Hide Events\" button or write event name manually";

#[derive(Properties, PartialEq)]
pub struct EventsTabProps {
    pub tab: ActiveTab,
    /// Bumped whenever the stored catalog changes.
    pub revision: u32,
    pub on_status: StatusCallback,
}

async fn load_catalog() -> Result<EventCatalog> {
    let mut catalog: EventCatalog = storage::load().await?;
    if catalog.dedupe_manual() {
        storage::save_entry(MANUAL_EVENTS, &catalog.manual_events).await?;
    }
    Ok(catalog)
}

async fn page_hidden_events(tab: &ActiveTab) -> Option<Vec<String>> {
    match bridge::send_tab_message::<_, CurrentEvents>(tab.id, &Request::GetCurrentEvents).await {
        Ok(current) => Some(current.events),
        Err(e) => {
            debug!("could not read hidden events from page: {}", e);
            None
        }
    }
}

async fn apply(tab: &ActiveTab, events: Vec<String>) -> Result<()> {
    let ack: Ack = bridge::send_tab_message(tab.id, &Request::ApplyHiddenEvents { events }).await?;
    ack.into_result()?;

    // Manual names reappear as discovered ones once the page hides them.
    storage::save_entry(MANUAL_EVENTS, &Vec::<String>::new()).await
}

#[function_component(EventsTab)]
pub fn events_tab(props: &EventsTabProps) -> Html {
    let catalog = use_state(EventCatalog::default);
    let checked = use_state(HashMap::<String, bool>::new);
    let search = use_state(String::new);

    // Reload on mount and on every storage change
    {
        let catalog = catalog.clone();
        let checked = checked.clone();
        let tab = props.tab.clone();
        let on_status = props.on_status.clone();
        use_effect_with(props.revision, move |_| {
            spawn_local(async move {
                match load_catalog().await {
                    Ok(loaded) => {
                        let previous = (*checked).clone();
                        let page_hidden = if previous.is_empty() {
                            page_hidden_events(&tab).await
                        } else {
                            None
                        };
                        checked.set(events::initial_selection(&loaded.entries(), &previous, page_hidden.as_deref()));
                        catalog.set(loaded);
                    }
                    Err(e) => {
                        warn!("failed to load events: {}", e);
                        on_status.emit(Status::Error(e.to_string()));
                    }
                }
            });
            || ()
        });
    }

    let entries = catalog.entries();
    let term = (*search).clone();
    let visible: Vec<&EventEntry> = entries
        .iter()
        .filter(|entry| events::matches_search(&entry.display_label(), &term))
        .collect();
    let is_checked = |name: &str| checked.get(name).copied().unwrap_or(true);
    let selected: Vec<String> = entries
        .iter()
        .filter(|entry| is_checked(&entry.name))
        .map(|entry| entry.name.clone())
        .collect();

    let on_search = {
        let search = search.clone();
        Callback::from(move |value: String| search.set(value))
    };

    let on_toggle = |name: String| {
        let checked = checked.clone();
        Callback::from(move |value: bool| {
            let mut next = (*checked).clone();
            next.insert(name.clone(), value);
            checked.set(next);
        })
    };

    let on_delete = |entry: EventEntry| {
        let on_status = props.on_status.clone();
        Callback::from(move |()| {
            let detail = if entry.manual {
                "This manual event will be removed."
            } else {
                "It will be removed until you hide it again in Mixpanel."
            };
            if !bridge::confirm(&format!("Delete \"{}\"?\n\n{}", entry.name, detail)) {
                return;
            }
            let entry = entry.clone();
            let on_status = on_status.clone();
            spawn_local(async move {
                let result: Result<()> = async {
                    let mut catalog: EventCatalog = storage::load().await?;
                    catalog.delete(&entry.name, entry.manual);
                    if entry.manual {
                        storage::save_entry(MANUAL_EVENTS, &catalog.manual_events).await
                    } else {
                        storage::save_entry(HIDDEN_EVENTS, &catalog.hidden_events).await
                    }
                }
                .await;
                report(&on_status, result, |_| format!("\"{}\" deleted", entry.name));
            });
        })
    };

    let on_add_manual = {
        let search = search.clone();
        let on_status = props.on_status.clone();
        Callback::from(move |_: MouseEvent| {
            let name = (*search).clone();
            let search = search.clone();
            let on_status = on_status.clone();
            spawn_local(async move {
                let result: Result<String> = async {
                    let mut catalog: EventCatalog = storage::load().await?;
                    let added = catalog.add_manual(&name)?;
                    storage::save_entry(MANUAL_EVENTS, &catalog.manual_events).await?;
                    Ok(added)
                }
                .await;
                if result.is_ok() {
                    search.set(String::new());
                }
                report(&on_status, result, |added| format!("\"{}\" added [m]", added));
            });
        })
    };

    let set_visible = |value: bool| {
        let checked = checked.clone();
        let on_status = props.on_status.clone();
        let names: Vec<String> = visible.iter().map(|entry| entry.name.clone()).collect();
        Callback::from(move |_: MouseEvent| {
            let mut next = (*checked).clone();
            for name in &names {
                next.insert(name.clone(), value);
            }
            checked.set(next);
            let message = if value {
                "All visible checkboxes checked"
            } else {
                "All visible checkboxes unchecked"
            };
            on_status.emit(Status::Success(message.to_string()));
        })
    };

    let on_apply = {
        let tab = props.tab.clone();
        let search = search.clone();
        let checked = checked.clone();
        let on_status = props.on_status.clone();
        let selected = selected.clone();
        Callback::from(move |_: MouseEvent| {
            let tab = tab.clone();
            let search = search.clone();
            let checked = checked.clone();
            let on_status = on_status.clone();
            let events = selected.clone();
            spawn_local(async move {
                let count = events.len();
                if let Err(e) = apply(&tab, events).await {
                    warn!("failed to apply hidden events: {}", e);
                    on_status.emit(Status::Error(page_error_message(&e)));
                    return;
                }

                search.set(String::new());
                on_status.emit(Status::Success("Events applied successfully!".to_string()));
                let mut params = Map::new();
                params.insert("event_count".to_string(), json!(count));
                analytics::track_event("events_applied", params).await;

                // Mirror what the page actually hides once the fragment is rewritten
                sleep(APPLY_RESYNC_DELAY_MS).await;
                if let Some(page_hidden) = page_hidden_events(&tab).await.filter(|events| !events.is_empty()) {
                    let synced = checked
                        .keys()
                        .map(|name| (name.clone(), page_hidden.contains(name)))
                        .collect();
                    checked.set(synced);
                }
            });
        })
    };

    let show_add_manual = !term.trim().is_empty() && visible.is_empty() && !entries.is_empty();

    html! {
        <div class="flex-column-gap">
            <SearchBox
                value={term.clone()}
                placeholder="Search events..."
                on_change={on_search}
                counts={Some((visible.len(), entries.len()))}
            />

            <div class="events-list">
                if entries.is_empty() {
                    <EmptyState message={EMPTY_MESSAGE} />
                } else {
                    {for visible.iter().map(|entry| html! {
                        <CheckRow
                            key={entry.name.clone()}
                            label={entry.display_label()}
                            checked={is_checked(&entry.name)}
                            on_toggle={on_toggle(entry.name.clone())}
                            class={classes!(entry.manual.then_some("manual-event-text"))}
                        >
                            <RowButton title="Delete event" on_click={on_delete((*entry).clone())}>
                                {"×"}
                            </RowButton>
                        </CheckRow>
                    })}
                    if show_add_manual {
                        <div class="no-results-container">
                            <p class="no-results">{format!("No events matching \"{}\"", term)}</p>
                            <Button onclick={on_add_manual} variant={ButtonVariant::Secondary}>
                                {format!("+ Add \"{}\" manually", term)}
                            </Button>
                        </div>
                    }
                }
            </div>

            <div class="button-row">
                <Button onclick={set_visible(true)} variant={ButtonVariant::Secondary}>{"Check all"}</Button>
                <Button onclick={set_visible(false)} variant={ButtonVariant::Secondary}>{"Uncheck all"}</Button>
            </div>

            <Button onclick={on_apply} variant={ButtonVariant::Primary} block={true}>
                {"Hide Events"}
            </Button>
            <p class="selection-count">{events::count_label(selected.len(), "event", "events")}</p>
        </div>
    }
}
