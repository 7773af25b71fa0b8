/// Timeline tab: selected event types from the open feed, grouped by day
use std::collections::HashSet;

use log::{debug, warn};
use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::bridge::{self, ActiveTab};
use crate::config::SHOW_MORE_REFRESH_DELAY_MS;
use crate::error::Result;
use crate::messages::{Ack, EarliestEvent, EventDatabase, Request};
use crate::storage;
use crate::timeline::{self, FeedEvent, TimelineSelection};
use crate::ui::components::{CheckRow, EmptyState, SearchBox};
use crate::ui::{sleep, Status, StatusCallback};

#[derive(Properties, PartialEq)]
pub struct TimelineTabProps {
    pub tab: ActiveTab,
    /// Bumped whenever the stored selection changes.
    pub revision: u32,
    pub on_status: StatusCallback,
}

#[derive(Clone, PartialEq)]
enum Feed {
    Loading,
    Failed,
    Loaded { events: Vec<FeedEvent>, earliest: Option<String> },
}

#[derive(Clone, Copy, PartialEq)]
enum LoadMore {
    Ready,
    Loading,
    Exhausted,
}

async fn fetch_feed(tab: &ActiveTab) -> Result<(Vec<FeedEvent>, Option<String>)> {
    let database: EventDatabase = bridge::send_tab_message(tab.id, &Request::GetEventDatabase).await?;
    let earliest: EarliestEvent = bridge::send_tab_message(tab.id, &Request::GetEarliestEvent).await?;
    Ok((database.events, earliest.earliest_event))
}

async fn update_selection(change: impl FnOnce(&mut TimelineSelection)) -> Result<()> {
    let mut selection: TimelineSelection = storage::load().await?;
    change(&mut selection);
    storage::save(&selection).await
}

/// Click the page's "Show more". `Ok(false)` once the feed is fully loaded.
async fn show_more(tab: &ActiveTab) -> Result<bool> {
    let ack: Ack = bridge::send_tab_message(tab.id, &Request::ClickShowMore).await?;
    Ok(ack.success)
}

#[function_component(TimelineTab)]
pub fn timeline_tab(props: &TimelineTabProps) -> Html {
    let selection = use_state(TimelineSelection::default);
    let feed = use_state(|| Feed::Loading);
    let search = use_state(String::new);
    let load_more = use_state(|| LoadMore::Ready);
    let refresh = use_state(|| 0u32);
    let clicked = use_state(|| None::<String>);
    let visited = use_state(HashSet::<String>::new);

    {
        let selection = selection.clone();
        let on_status = props.on_status.clone();
        use_effect_with(props.revision, move |_| {
            spawn_local(async move {
                match storage::load::<TimelineSelection>().await {
                    Ok(loaded) => selection.set(loaded),
                    Err(e) => {
                        warn!("failed to load timeline selection: {}", e);
                        on_status.emit(Status::Error(e.to_string()));
                    }
                }
            });
            || ()
        });
    }

    {
        let feed = feed.clone();
        let tab = props.tab.clone();
        use_effect_with(*refresh, move |_| {
            spawn_local(async move {
                match fetch_feed(&tab).await {
                    Ok((events, earliest)) => {
                        debug!("timeline loaded {} events", events.len());
                        feed.set(Feed::Loaded { events, earliest });
                    }
                    Err(e) => {
                        warn!("error loading timeline data: {}", e);
                        feed.set(Feed::Failed);
                    }
                }
            });
            || ()
        });
    }

    let (events, earliest) = match &*feed {
        Feed::Loaded { events, earliest } => (events.as_slice(), earliest.as_deref()),
        Feed::Loading | Feed::Failed => (&[][..], None),
    };

    let on_search = {
        let search = search.clone();
        Callback::from(move |value: String| search.set(value))
    };

    let on_toggle = |name: String| {
        let on_status = props.on_status.clone();
        Callback::from(move |selected: bool| {
            let name = name.clone();
            let on_status = on_status.clone();
            spawn_local(async move {
                if let Err(e) = update_selection(|selection| selection.set_selected(&name, selected)).await {
                    warn!("failed to save timeline selection: {}", e);
                    on_status.emit(Status::Error(e.to_string()));
                }
            });
        })
    };

    let on_hide = |event: FeedEvent| {
        let on_status = props.on_status.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            e.stop_propagation();
            let event = event.clone();
            let on_status = on_status.clone();
            spawn_local(async move {
                if let Err(e) = update_selection(|selection| {
                    selection.hide(&event);
                })
                .await
                {
                    warn!("failed to hide timeline event: {}", e);
                    on_status.emit(Status::Error(e.to_string()));
                }
            });
        })
    };

    let on_open = |event: FeedEvent| {
        let tab = props.tab.clone();
        let clicked = clicked.clone();
        let visited = visited.clone();
        Callback::from(move |_: MouseEvent| {
            let key = event.instance_key();
            let mut seen = (*visited).clone();
            seen.insert(key.clone());
            visited.set(seen);
            clicked.set(Some(key));

            let tab = tab.clone();
            let request = Request::OpenEvent {
                event_name: event.name.clone(),
                event_time: event.display_time.clone(),
            };
            spawn_local(async move {
                let result = bridge::send_tab_message::<_, Ack>(tab.id, &request)
                    .await
                    .and_then(Ack::into_result);
                if let Err(e) = result {
                    warn!("error opening event: {}", e);
                }
            });
        })
    };

    let on_load_more = {
        let tab = props.tab.clone();
        let load_more = load_more.clone();
        let refresh = refresh.clone();
        Callback::from(move |_: MouseEvent| {
            let tab = tab.clone();
            let load_more = load_more.clone();
            let refresh = refresh.clone();
            load_more.set(LoadMore::Loading);
            spawn_local(async move {
                match show_more(&tab).await {
                    Ok(true) => {
                        sleep(SHOW_MORE_REFRESH_DELAY_MS).await;
                        refresh.set(*refresh + 1);
                        load_more.set(LoadMore::Ready);
                    }
                    Ok(false) => {
                        // Picks up the "Since" marker the page shows at the end
                        load_more.set(LoadMore::Exhausted);
                        refresh.set(*refresh + 1);
                    }
                    Err(e) => {
                        warn!("error clicking show more: {}", e);
                        load_more.set(LoadMore::Ready);
                    }
                }
            });
        })
    };

    let names = timeline::unique_names(events);
    let term = (*search).clone();
    let visible_names: Vec<&String> = names
        .iter()
        .filter(|name| crate::events::matches_search(name, &term))
        .collect();

    let tracked = selection.visible(events);
    let groups = timeline::group_by_date(&tracked);

    let timeline_view = if selection.selected_timeline_events.is_empty() {
        html! { <EmptyState message="Select events below to see their timeline." /> }
    } else if tracked.is_empty() {
        html! { <EmptyState message="No matching events in timeline." /> }
    } else {
        html! {
            {for groups.iter().map(|group| html! {
                <>
                    <div class="timeline-day-separator">{group.date}</div>
                    {for group.events.iter().map(|event| {
                        let key = event.instance_key();
                        let class = classes!(
                            "timeline-event-item",
                            (clicked.as_deref() == Some(key.as_str())).then_some("clicked"),
                            visited.contains(&key).then_some("visited"),
                        );
                        html! {
                            <div {class} key={key.clone()} onclick={on_open((*event).clone())}>
                                <span class="timeline-event-name">{&event.name}</span>
                                <span class="timeline-event-time">{&event.display_time}</span>
                                <button class="timeline-delete-btn" title="Remove from timeline" onclick={on_hide((*event).clone())}>
                                    {"×"}
                                </button>
                            </div>
                        }
                    })}
                </>
            })}
        }
    };

    let names_view = match &*feed {
        Feed::Loading => html! { <Spinner /> },
        Feed::Failed => html! { <EmptyState message="Error loading events." /> },
        Feed::Loaded { events, .. } if events.is_empty() => html! {
            <EmptyState message="No events in database." />
        },
        Feed::Loaded { .. } => html! {
            {for visible_names.iter().map(|name| html! {
                <CheckRow
                    key={(*name).clone()}
                    label={(*name).clone()}
                    checked={selection.is_selected(name)}
                    on_toggle={on_toggle((*name).clone())}
                />
            })}
        },
    };

    let load_more_label = match *load_more {
        LoadMore::Ready => "Load more",
        LoadMore::Loading => "Loading...",
        LoadMore::Exhausted => "All events loaded",
    };
    let since = earliest.map(|text| format!("since {}", timeline::strip_since(text)));

    html! {
        <div class="flex-column-gap">
            <div class="timeline-header">
                if !tracked.is_empty() {
                    <span class="timeline-event-count">{timeline::count_label(tracked.len())}</span>
                }
            </div>
            <div class="timeline-display">{timeline_view}</div>

            <div class="load-more-container">
                <Button
                    onclick={on_load_more}
                    disabled={*load_more != LoadMore::Ready}
                    variant={ButtonVariant::Secondary}
                    block={true}
                >
                    {load_more_label}
                </Button>
                if let Some(since) = since {
                    <div class="load-more-date-info">{since}</div>
                }
            </div>

            <SearchBox
                value={term.clone()}
                placeholder="Search events..."
                on_change={on_search}
                counts={Some((visible_names.len(), names.len()))}
            />
            <div class="events-list">{names_view}</div>
        </div>
    }
}
