/// Popup UI for Activity Navigator

use std::rc::Rc;

use log::{info, warn};
use patternfly_yew::prelude::*;
use serde_json::{json, Map};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::analytics;
use crate::bridge::{self, ActiveTab};
use crate::config::EXTENSION_NAME;
use crate::error::{NavigatorError, Result};
use crate::events::EventCatalog;
use crate::page::{self, AppPage, Guidance, PageKind};
use crate::properties::PropertyCatalog;
use crate::storage::{self, PopupTab, Preferences, StoredGroup};
use crate::timeline::TimelineSelection;
use crate::ui::actions;
use crate::ui::events_tab::EventsTab;
use crate::ui::properties_tab::PropertiesTab;
use crate::ui::timeline_tab::TimelineTab;
use crate::ui::{content_script_loaded, report, report_error, Status};

#[derive(Clone, PartialEq)]
enum AppState {
    Checking,
    Inactive { kind: PageKind, url: Option<String>, tab: Option<ActiveTab> },
    NeedsRefresh,
    Active(ActiveTab),
}

/// Per-group change counters, bumped from the storage listener.
#[derive(Default, PartialEq)]
struct Revisions {
    events: u32,
    properties: u32,
    timeline: u32,
}

impl Reducible for Revisions {
    type Action = Vec<String>;

    fn reduce(self: Rc<Self>, changed: Vec<String>) -> Rc<Self> {
        let bump = |touched: bool| u32::from(touched);
        Rc::new(Revisions {
            events: self.events + bump(EventCatalog::touches(&changed)),
            properties: self.properties + bump(PropertyCatalog::touches(&changed)),
            timeline: self.timeline + bump(TimelineSelection::touches(&changed)),
        })
    }
}

async fn check_current_tab() -> Result<AppState> {
    let Some(tab) = bridge::active_tab().await? else {
        return Ok(AppState::Inactive { kind: PageKind::Outside, url: None, tab: None });
    };

    let kind = PageKind::classify(&tab.url);
    if !kind.is_activity_feed() {
        return Ok(AppState::Inactive { kind, url: Some(tab.url.clone()), tab: Some(tab) });
    }
    if content_script_loaded(&tab).await {
        Ok(AppState::Active(tab))
    } else {
        Ok(AppState::NeedsRefresh)
    }
}

async fn read_import_file(input: &HtmlInputElement) -> Result<Option<String>> {
    let Some(file) = input.files().and_then(|files| files.get(0)) else {
        return Ok(None);
    };
    if !file.name().ends_with(".txt") {
        return Err(NavigatorError::NothingToDo("Please select a .txt file"));
    }
    let text = JsFuture::from(file.text()).await.map_err(NavigatorError::from_js)?;
    Ok(text.as_string())
}

fn tab_class(active: PopupTab, tab: PopupTab) -> &'static str {
    if active == tab {
        "pf-v5-c-tabs__item pf-m-current"
    } else {
        "pf-v5-c-tabs__item"
    }
}

#[derive(Properties, PartialEq)]
struct InactiveViewProps {
    kind: PageKind,
    url: Option<String>,
    tab: Option<ActiveTab>,
}

#[function_component(InactiveView)]
fn inactive_view(props: &InactiveViewProps) -> Html {
    let guidance = Guidance::for_page(&props.kind);

    let navigate = |target: String| {
        let tab = props.tab.clone();
        Callback::from(move |_: MouseEvent| {
            let tab = tab.clone();
            let target = target.clone();
            spawn_local(async move {
                if let Err(e) = bridge::navigate_tab(tab.as_ref(), &target).await {
                    warn!("failed to open {}: {}", target, e);
                }
            });
        })
    };
    let url = props.url.as_deref();

    html! {
        <div class="inactive-view">
            <div class="inactive-content">
                <h3>{guidance.title}</h3>
                <p>{guidance.message}</p>
                if guidance.show_open_host {
                    <Button onclick={navigate(page::app_url(url, AppPage::Users))} variant={ButtonVariant::Primary} block={true}>
                        {"Open Mixpanel"}
                    </Button>
                }
                if guidance.show_app_links {
                    <div class="flex-column-gap">
                        <Button onclick={navigate(page::app_url(url, AppPage::Users))} variant={ButtonVariant::Secondary} block={true}>
                            {"Go to Users"}
                        </Button>
                        <Button onclick={navigate(page::app_url(url, AppPage::Events))} variant={ButtonVariant::Secondary} block={true}>
                            {"Go to Events"}
                        </Button>
                    </div>
                }
            </div>
        </div>
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_state(|| AppState::Checking);
    let active_tab = use_state(PopupTab::default);
    let status = use_state(|| None::<Status>);
    let revisions = use_reducer(Revisions::default);
    let file_input = use_node_ref();

    // Classify the tab, restore the last popup tab and listen for storage changes
    {
        let state = state.clone();
        let active_tab = active_tab.clone();
        let dispatcher = revisions.dispatcher();
        use_effect_with((), move |_| {
            bridge::on_storage_changed(move |changed| dispatcher.dispatch(changed));
            spawn_local(async move {
                match check_current_tab().await {
                    Ok(checked) => state.set(checked),
                    Err(e) => {
                        warn!("failed to read the active tab: {}", e);
                        state.set(AppState::Inactive { kind: PageKind::Outside, url: None, tab: None });
                    }
                }
                match storage::load::<Preferences>().await {
                    Ok(prefs) => active_tab.set(prefs.last_active_tab),
                    Err(e) => warn!("error restoring last active tab: {}", e),
                }
                analytics::track_event("popup_opened", Map::new()).await;
            });
            || ()
        });
    }

    let on_status = {
        let status = status.clone();
        Callback::from(move |next: Status| status.set(Some(next)))
    };

    let on_tab_click = {
        let active_tab = active_tab.clone();
        let status = status.clone();
        move |tab: PopupTab| {
            let active_tab = active_tab.clone();
            let status = status.clone();
            Callback::from(move |_: MouseEvent| {
                active_tab.set(tab);
                status.set(None);
                spawn_local(async move {
                    if let Err(e) = storage::save(&Preferences { last_active_tab: tab }).await {
                        warn!("failed to save last active tab: {}", e);
                    }
                    let mut params = Map::new();
                    params.insert("tab".to_string(), json!(tab));
                    analytics::track_event("tab_switched", params).await;
                });
            })
        }
    };

    let tab = match &*state {
        AppState::Active(tab) => Some(tab.clone()),
        _ => None,
    };
    let current = *active_tab;

    let on_copy_id = {
        let tab = tab.clone();
        let on_status = on_status.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(tab) = tab.clone() else { return };
            let on_status = on_status.clone();
            spawn_local(async move {
                report(&on_status, actions::copy_analytics_id(&tab).await, |message| message);
            });
        })
    };

    let on_share = {
        let tab = tab.clone();
        let on_status = on_status.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(tab) = tab.clone() else { return };
            let on_status = on_status.clone();
            spawn_local(async move {
                report(&on_status, actions::share_page(&tab).await, |message| message);
            });
        })
    };

    let on_export = {
        let tab = tab.clone();
        let on_status = on_status.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(tab) = tab.clone() else { return };
            let on_status = on_status.clone();
            spawn_local(async move {
                let result = match current {
                    PopupTab::FilterEvents => actions::export_events().await,
                    PopupTab::FilterProperties => actions::export_properties().await,
                    PopupTab::EventTimeline => actions::export_timeline(&tab).await,
                };
                report(&on_status, result, |message| message);
            });
        })
    };

    let on_import_click = {
        let file_input = file_input.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(input) = file_input.cast::<HtmlInputElement>() {
                input.click();
            }
        })
    };

    let on_file_chosen = {
        let on_status = on_status.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let on_status = on_status.clone();
            spawn_local(async move {
                let result: Result<Option<String>> = async {
                    let Some(content) = read_import_file(&input).await? else {
                        return Ok(None);
                    };
                    let message = match current {
                        PopupTab::FilterProperties => actions::import_properties(&content).await?,
                        PopupTab::FilterEvents | PopupTab::EventTimeline => actions::import_events(&content).await?,
                    };
                    Ok(Some(message))
                }
                .await;
                // Lets the same file be picked again
                input.set_value("");
                match result {
                    Ok(Some(message)) => {
                        info!("{}", message);
                        on_status.emit(Status::Success(message));
                    }
                    Ok(None) => {}
                    Err(e) => report_error(&on_status, e),
                }
            });
        })
    };

    let on_trash = {
        let on_status = on_status.clone();
        Callback::from(move |_: MouseEvent| {
            let on_status = on_status.clone();
            spawn_local(async move {
                let result = match current {
                    PopupTab::FilterEvents => actions::clear_events().await,
                    PopupTab::FilterProperties => actions::clear_properties().await,
                    PopupTab::EventTimeline => actions::clear_timeline().await,
                };
                match result {
                    Ok(Some(message)) => on_status.emit(Status::Success(message)),
                    Ok(None) => {}
                    Err(e) => report_error(&on_status, e),
                }
            });
        })
    };

    let active = tab.is_some();
    let import_disabled = !active || current == PopupTab::EventTimeline;

    html! {
        <div class="padding-20">
            <div class="popup-header">
                <h1 class="popup-title">{EXTENSION_NAME}</h1>
                <div class="header-actions">
                    <button class="icon-btn" title="Copy analytics ID" disabled={!active} onclick={on_copy_id}>{"ID"}</button>
                    <button class="icon-btn" title="Copy page URL" disabled={!active} onclick={on_share}>{"🔗"}</button>
                    <button class="icon-btn" title="Export" disabled={!active} onclick={on_export}>{"⬇"}</button>
                    <button class="icon-btn" title="Import" disabled={import_disabled} onclick={on_import_click}>{"⬆"}</button>
                    <button class="icon-btn" title="Clear all" disabled={!active} onclick={on_trash}>{"🗑"}</button>
                    <input
                        type="file"
                        accept=".txt"
                        class="hidden-file-input"
                        ref={file_input}
                        onchange={on_file_chosen}
                    />
                </div>
            </div>

            if let Some(status) = (*status).clone() {
                {match status {
                    Status::Success(message) => html! {
                        <Alert r#type={AlertType::Success} title={message} inline={true}></Alert>
                    },
                    Status::Error(message) => html! {
                        <Alert r#type={AlertType::Danger} title={message} inline={true}></Alert>
                    },
                }}
            }

            {match &*state {
                AppState::Checking => html! {
                    <div class="loading-text-center">
                        <Spinner />
                    </div>
                },
                AppState::Inactive { kind, url, tab } => html! {
                    <InactiveView kind={kind.clone()} url={url.clone()} tab={tab.clone()} />
                },
                AppState::NeedsRefresh => html! {
                    <div class="inactive-view">
                        <div class="inactive-content">
                            <h3>{"Page Refresh Required"}</h3>
                            <p>{"The extension was updated. Please refresh the Mixpanel page to activate."}</p>
                        </div>
                    </div>
                },
                AppState::Active(tab) => html! {
                    <>
                        <div class="pf-v5-c-tabs tabs-nav">
                            <ul class="pf-v5-c-tabs__list">
                                <li class={tab_class(current, PopupTab::FilterEvents)}>
                                    <button class="pf-v5-c-tabs__link" onclick={on_tab_click(PopupTab::FilterEvents)}>
                                        <span class="pf-v5-c-tabs__item-text">{"Hide Events"}</span>
                                    </button>
                                </li>
                                <li class={tab_class(current, PopupTab::FilterProperties)}>
                                    <button class="pf-v5-c-tabs__link" onclick={on_tab_click(PopupTab::FilterProperties)}>
                                        <span class="pf-v5-c-tabs__item-text">{"Properties"}</span>
                                    </button>
                                </li>
                                <li class={tab_class(current, PopupTab::EventTimeline)}>
                                    <button class="pf-v5-c-tabs__link" onclick={on_tab_click(PopupTab::EventTimeline)}>
                                        <span class="pf-v5-c-tabs__item-text">{"Timeline"}</span>
                                    </button>
                                </li>
                            </ul>
                        </div>

                        <div class="tab-pane-content">
                            {match current {
                                PopupTab::FilterEvents => html! {
                                    <EventsTab tab={tab.clone()} revision={revisions.events} on_status={on_status.clone()} />
                                },
                                PopupTab::FilterProperties => html! {
                                    <PropertiesTab tab={tab.clone()} revision={revisions.properties} on_status={on_status.clone()} />
                                },
                                PopupTab::EventTimeline => html! {
                                    <TimelineTab tab={tab.clone()} revision={revisions.timeline} on_status={on_status.clone()} />
                                },
                            }}
                        </div>
                    </>
                },
            }}

            <p class="footer-popup">
                {format!("{} v{}", EXTENSION_NAME, bridge::manifest_version())}
            </p>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_revisions_bump_only_touched_groups() {
        let revisions = Rc::new(Revisions::default());
        let revisions = revisions.reduce(changed(&[storage::MANUAL_EVENTS]));
        assert_eq!((revisions.events, revisions.properties, revisions.timeline), (1, 0, 0));

        let revisions = revisions.reduce(changed(&[storage::SELECTED_PROPERTIES, storage::HIDDEN_TIMELINE_EVENTS]));
        assert_eq!((revisions.events, revisions.properties, revisions.timeline), (1, 1, 1));

        let revisions = revisions.reduce(changed(&[storage::LAST_ACTIVE_TAB]));
        assert_eq!((revisions.events, revisions.properties, revisions.timeline), (1, 1, 1));
    }

    #[test]
    fn test_tab_class() {
        assert_eq!(tab_class(PopupTab::EventTimeline, PopupTab::EventTimeline), "pf-v5-c-tabs__item pf-m-current");
        assert_eq!(tab_class(PopupTab::EventTimeline, PopupTab::FilterEvents), "pf-v5-c-tabs__item");
    }
}
