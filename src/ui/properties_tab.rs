/// Properties tab: watched profile properties and their values on the open profile
use std::collections::HashMap;

use log::warn;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::bridge::{self, ActiveTab};
use crate::error::Result;
use crate::messages::{AllProperties, Request};
use crate::properties::{self, format_property_name, PropertyCatalog, PropertyValueRow};
use crate::storage::{self, SELECTED_PROPERTIES};
use crate::ui::components::{CheckRow, EmptyState, RowButton, SearchBox};
use crate::ui::{report, Status, StatusCallback};

const NO_SELECTION: &str = "Check properties below to see their values here.";
const NO_PROPERTIES: &str = "No properties stored yet. Visit a Mixpanel profile page to start.";
const LOAD_FAILED: &str = "Error loading properties. Try refreshing the page.";

#[derive(Properties, PartialEq)]
pub struct PropertiesTabProps {
    pub tab: ActiveTab,
    /// Bumped whenever the stored catalog changes.
    pub revision: u32,
    pub on_status: StatusCallback,
}

#[derive(Clone, PartialEq)]
enum PageValues {
    Loading,
    Failed,
    Loaded(HashMap<String, String>),
}

/// Read-modify-write of the stored catalog.
async fn update_catalog(change: impl FnOnce(&mut PropertyCatalog)) -> Result<()> {
    let mut catalog: PropertyCatalog = storage::load().await?;
    change(&mut catalog);
    storage::save(&catalog).await
}

/// Only `selectedProperties` is written, so names the page discovers meanwhile survive.
async fn set_selected(name: &str, selected: bool) -> Result<()> {
    let mut catalog: PropertyCatalog = storage::load().await?;
    catalog.set_selected(name, selected);
    storage::save_entry(SELECTED_PROPERTIES, &catalog.selected_properties).await
}

async fn copy(text: String, label: String, on_status: StatusCallback) {
    match bridge::copy_to_clipboard(&text).await {
        Ok(()) => on_status.emit(Status::Success(format!("\"{}\" copied!", label))),
        Err(e) => {
            warn!("failed to copy: {}", e);
            on_status.emit(Status::Error("Failed to copy".to_string()));
        }
    }
}

#[derive(Properties, PartialEq)]
struct ValueRowProps {
    row: PropertyValueRow,
    on_copy: Callback<()>,
    on_remove: Callback<()>,
}

#[function_component(ValueRow)]
fn value_row(props: &ValueRowProps) -> Html {
    let row = &props.row;
    html! {
        <div class={classes!("property-value-item", row.missing.then_some("missing"))}>
            <span class="property-value-name" title={row.label.clone()}>{&row.label}</span>
            <span class="property-value-separator">{":"}</span>
            <span class="property-value-text" title={row.value.clone()}>{&row.value}</span>
            <div class="property-action-buttons">
                <RowButton title="Copy value" class="property-action-btn copy-btn" on_click={props.on_copy.clone()}>
                    {"⧉"}
                </RowButton>
                <RowButton title="Remove from selection" class="property-action-btn remove-btn" on_click={props.on_remove.clone()}>
                    {"×"}
                </RowButton>
            </div>
        </div>
    }
}

#[function_component(PropertiesTab)]
pub fn properties_tab(props: &PropertiesTabProps) -> Html {
    let catalog = use_state(PropertyCatalog::default);
    let page_values = use_state(|| PageValues::Loading);
    let search = use_state(String::new);

    {
        let catalog = catalog.clone();
        let page_values = page_values.clone();
        let tab = props.tab.clone();
        let on_status = props.on_status.clone();
        use_effect_with(props.revision, move |_| {
            spawn_local(async move {
                match storage::load::<PropertyCatalog>().await {
                    Ok(loaded) => catalog.set(loaded),
                    Err(e) => {
                        warn!("failed to load properties: {}", e);
                        on_status.emit(Status::Error(e.to_string()));
                        return;
                    }
                }

                let values = match bridge::send_tab_message::<_, AllProperties>(tab.id, &Request::GetAllProperties).await {
                    Ok(response) => PageValues::Loaded(response.properties),
                    Err(e) => {
                        warn!("error loading property values: {}", e);
                        PageValues::Failed
                    }
                };
                page_values.set(values);
            });
            || ()
        });
    }

    let term = (*search).clone();
    let names = catalog.sorted_names();
    let visible: Vec<&String> = names
        .iter()
        .filter(|name| properties::matches_search(name, &term))
        .collect();
    let selected_count = catalog.selected_properties.len();

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
                if let Err(e) = set_selected(&name, selected).await {
                    warn!("failed to save property selection: {}", e);
                    on_status.emit(Status::Error(e.to_string()));
                }
            });
        })
    };

    let on_copy_name = |name: &str| {
        let on_status = props.on_status.clone();
        let formatted = format_property_name(name);
        Callback::from(move |()| {
            spawn_local(copy(formatted.clone(), formatted.clone(), on_status.clone()));
        })
    };

    let on_delete = |name: String| {
        let on_status = props.on_status.clone();
        Callback::from(move |()| {
            let formatted = format_property_name(&name);
            if !bridge::confirm(&format!("Delete \"{}\"?\n\nIt will be removed until discovered again.", formatted)) {
                return;
            }
            let name = name.clone();
            let on_status = on_status.clone();
            spawn_local(async move {
                let result = update_catalog(|catalog| catalog.delete(&name)).await;
                report(&on_status, result, |_| format!("\"{}\" deleted", formatted));
            });
        })
    };

    let on_copy_value = |row: &PropertyValueRow| {
        let on_status = props.on_status.clone();
        let value = row.value.clone();
        let label = row.label.clone();
        Callback::from(move |()| {
            spawn_local(copy(value.clone(), label.clone(), on_status.clone()));
        })
    };

    let on_remove = |name: String| {
        let on_status = props.on_status.clone();
        Callback::from(move |()| {
            let name = name.clone();
            let on_status = on_status.clone();
            spawn_local(async move {
                let result = set_selected(&name, false).await;
                report(&on_status, result, |_| format!("\"{}\" removed", name));
            });
        })
    };

    let values_panel = if catalog.selected_properties.is_empty() {
        html! { <EmptyState message={NO_SELECTION} /> }
    } else {
        match &*page_values {
            PageValues::Loading => html! {},
            PageValues::Failed => html! { <EmptyState message={LOAD_FAILED} /> },
            PageValues::Loaded(values) => html! {
                {for catalog.value_rows(values).into_iter().map(|row| html! {
                    <ValueRow
                        key={row.name.clone()}
                        on_copy={on_copy_value(&row)}
                        on_remove={on_remove(row.name.clone())}
                        row={row.clone()}
                    />
                })}
            },
        }
    };

    html! {
        <div class="flex-column-gap">
            <div class="property-values-list">{values_panel}</div>

            <SearchBox
                value={term.clone()}
                placeholder="Search properties..."
                on_change={on_search}
                counts={Some((visible.len(), names.len()))}
            />

            <div class="events-list">
                if names.is_empty() {
                    <EmptyState message={NO_PROPERTIES} />
                } else {
                    {for visible.iter().map(|name| html! {
                        <CheckRow
                            key={(*name).clone()}
                            label={format_property_name(name)}
                            title={Some(AttrValue::from((*name).clone()))}
                            checked={catalog.is_selected(name)}
                            on_toggle={on_toggle((*name).clone())}
                        >
                            <div class="property-item-buttons">
                                <RowButton title="Copy property name" on_click={on_copy_name(name.as_str())}>
                                    {"⧉"}
                                </RowButton>
                                <RowButton title="Delete property" on_click={on_delete((*name).clone())}>
                                    {"×"}
                                </RowButton>
                            </div>
                        </CheckRow>
                    })}
                }
            </div>

            <p class="selection-count">{crate::events::count_label(selected_count, "property", "properties")}</p>
        </div>
    }
}
