#![allow(non_snake_case)]

mod api;
#[cfg(feature = "server")]
mod config;
mod controls;
#[cfg(feature = "server")]
mod error;
mod log;
mod model;
mod placeholder;
#[cfg(feature = "server")]
mod query;
mod series;
mod state;

use dioxus::core::Task;
use dioxus::prelude::*;
use log::{app_logs_snapshot, LogLine};

use api::{fetch_dashboard_info, fetch_log_page};
use controls::{
    level_option_value, normalize_page_input, parse_level_choice, parse_page, parse_worker_choice, query_summary,
    worker_option_value, UNSET,
};
use model::{LogEntry, SampleField, Worker};
use placeholder::placeholder_entries;
use series::{chart_series, point_markers, polyline_segments, svg_points, value_range, Series, DEFAULT_CHART_WORKERS};
use state::{FetchOutcome, ViewState};

const CHART_W: f64 = 1000.0;
const CHART_H: f64 = 150.0;

const SERIES_COLORS: [&str; 4] = ["#7c5cff", "#3ddc97", "#ffb347", "#ff5c8a"];

// ============================================================================
// Entry & root component
// ============================================================================

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let mut view = use_signal(|| ViewState::new(placeholder_entries()));
    let mut in_flight = use_signal(|| None::<Task>);
    let mut page_input = use_signal(|| "1".to_string());
    let mut chart_field = use_signal(|| SampleField::HeapUsed);
    let mut endpoint = use_signal(String::new);
    let mut logs_open = use_signal(|| false);
    let mut log_snapshot = use_signal(Vec::<LogLine>::new);

    use_effect(move || {
        spawn(async move {
            match fetch_dashboard_info().await {
                Ok(info) => {
                    log::app_log("INFO", format!("Log API {} (schema {:?})", info.endpoint, info.schema));
                    endpoint.set(info.endpoint);
                    view.write().set_schema(info.schema);
                }
                Err(e) => log::app_log("ERROR", format!("Dashboard info: {}", e)),
            }
        });
    });

    // A new fetch supersedes the one in flight: its task is cancelled and, should
    // its response still land, the stale ticket keeps it out of the view.
    let mut refresh = move || {
        let shown = normalize_page_input(&page_input.peek(), view.peek().page);
        page_input.set(shown);
        if let Some(task) = *in_flight.peek() {
            task.cancel();
        }
        let (ticket, query) = {
            let mut st = view.write();
            (st.begin_fetch(), st.query())
        };
        log::app_log(
            "INFO",
            format!("Fetching page {} (level={:?}, worker={:?})...", query.page, query.level, query.worker),
        );
        let task = spawn(async move {
            let result = fetch_log_page(query).await.map_err(|e| e.to_string());
            let outcome = view.write().finish_fetch(ticket, result);
            match outcome {
                FetchOutcome::Applied(n) => log::app_log("INFO", format!("Done. {} entries.", n)),
                FetchOutcome::Failed => {
                    let err = view.peek().error.clone().unwrap_or_default();
                    log::app_log("ERROR", format!("Fetch failed, keeping previous entries: {}", err));
                }
                FetchOutcome::Stale => log::app_log("INFO", "Dropped response of a superseded fetch"),
            }
            if view.peek().is_current(ticket) {
                in_flight.set(None);
            }
        });
        in_flight.set(Some(task));
    };

    let series = use_memo(move || chart_series(&view.read().entries, &DEFAULT_CHART_WORKERS, *chart_field.read()));

    let stats = use_memo(move || {
        let st = view.read();
        let total = st.entries.len();
        let unmapped = st.entries.iter().filter(|e| e.worker().is_none()).count();
        (total, unmapped, st.live)
    });

    let schema = view.read().schema;
    let summary = {
        let st = view.read();
        query_summary(st.page, st.level, st.worker)
    };
    let level_value = level_option_value(view.read().level);
    let worker_value = worker_option_value(view.read().worker);
    let loading = view.read().loading;
    let entries = view.read().entries.clone();
    let page_class = if parse_page(&page_input.read()).is_some() {
        "input page-input"
    } else {
        "input page-input input-invalid"
    };

    rsx! {
        document::Stylesheet { href: asset!("/assets/styles.css") }

        div { class: "App bg-galaxy min-h-screen",
            nav { class: "nav-galaxy px-6 py-4",
                div { class: "container flex items-center justify-between flex-wrap gap-3",
                    div { class: "flex items-center gap-4",
                        h1 { class: "text-2xl font-bold text-star-white", "📜 Log Dashboard" }
                        div { class: "live-indicator",
                            span { class: if stats.read().2 { "live-dot" } else { "live-dot idle" } }
                            span { class: "text-sm text-stardust",
                                if stats.read().2 { "Live" } else { "Placeholder data" }
                            }
                        }
                        div { class: "nav-stats text-stardust text-sm flex items-center gap-4 flex-wrap",
                            span { "📄 {stats.read().0} entries" }
                            span { "❔ {stats.read().1} unmapped" }
                            span { "🔗 {endpoint}" }
                        }
                    }
                    button {
                        class: "btn-cosmic",
                        onclick: move |_| {
                            logs_open.set(true);
                            log_snapshot.set(app_logs_snapshot());
                        },
                        "📋 Logs"
                    }
                }
            }

            {if *logs_open.read() {
                rsx! {
                    div {
                        class: "fixed inset-0 z-50 flex items-center justify-center bg-black/60",
                        onclick: move |_| logs_open.set(false),
                        div {
                            class: "card-cosmic p-6 max-w-3xl w-full mx-4 max-h-[85vh] flex flex-col",
                            onclick: move |evt| { evt.stop_propagation(); },
                            h2 { class: "text-xl font-bold text-star-white mb-2", "📋 Logs" }
                            p { class: "text-stardust text-sm", "Dashboard and API activity." }
                            div { class: "flex-1 overflow-y-auto font-mono text-xs bg-nebula-dark rounded-lg p-3 min-h-[200px]",
                                for line in log_snapshot.read().iter() {
                                    div { class: "log-line py-0.5",
                                        span { class: "text-stardust mr-2", "{line.time}" }
                                        span { class: if line.is_error() { "text-warning-red font-semibold" } else { "text-aurora-purple" }, "{line.level}" }
                                        span { class: "text-moonlight ml-2", "{line.message}" }
                                    }
                                }
                            }
                            div { class: "flex gap-2 mt-4",
                                button {
                                    class: "btn-cosmic",
                                    onclick: move |_| log_snapshot.set(app_logs_snapshot()),
                                    "Refresh logs"
                                }
                                button {
                                    class: "btn-cosmic",
                                    onclick: move |_| logs_open.set(false),
                                    "Close"
                                }
                            }
                        }
                    }
                }
            } else {
                rsx! { }
            }}

            div { class: "container px-6 py-6",
                section { class: "card-cosmic p-6 mb-6",
                    div { class: "flex flex-wrap items-center gap-4",
                        button {
                            class: "btn-nebula",
                            disabled: loading,
                            onclick: move |_| refresh(),
                            if loading { "⏳ {summary}" } else { "🔄 {summary}" }
                        }
                        button {
                            class: "btn-cosmic",
                            onclick: move |_| {
                                view.write().prev_page();
                                page_input.set(view.peek().page.to_string());
                                refresh();
                            },
                            "◀"
                        }
                        input {
                            r#type: "number",
                            class: "{page_class}",
                            min: "1",
                            value: "{page_input}",
                            oninput: move |evt| {
                                let raw = evt.value();
                                if let Some(page) = parse_page(&raw) {
                                    view.write().set_page(page);
                                }
                                page_input.set(raw);
                            },
                            onblur: move |_| {
                                let shown = normalize_page_input(&page_input.peek(), view.peek().page);
                                page_input.set(shown);
                            }
                        }
                        button {
                            class: "btn-cosmic",
                            onclick: move |_| {
                                view.write().next_page();
                                page_input.set(view.peek().page.to_string());
                                refresh();
                            },
                            "▶"
                        }
                        select {
                            class: "bg-nebula-dark border border-nebula-purple rounded-lg px-3 py-2",
                            value: "{level_value}",
                            onchange: move |evt| {
                                let level = parse_level_choice(&evt.value(), schema);
                                view.write().level = level;
                            },
                            option { value: UNSET, "-----" }
                            for level in schema.levels() {
                                option { key: "{level.name()}", value: level.name(), "{level.display_name()}" }
                            }
                        }
                        select {
                            class: "bg-nebula-dark border border-nebula-purple rounded-lg px-3 py-2",
                            value: "{worker_value}",
                            onchange: move |evt| {
                                let worker = parse_worker_choice(&evt.value());
                                view.write().worker = worker;
                            },
                            option { value: UNSET, "-----" }
                            for worker in Worker::ALL {
                                option { key: "{worker.code()}", value: "{worker.code()}", "{worker.display_name()}" }
                            }
                        }
                        div { class: "flex items-center gap-2",
                            span { class: "text-stardust text-sm", "Chart:" }
                            select {
                                class: "bg-nebula-dark border border-nebula-purple rounded-lg px-3 py-2",
                                value: "{chart_field.read().key()}",
                                onchange: move |evt| {
                                    if let Some(field) = SampleField::from_key(&evt.value()) {
                                        chart_field.set(field);
                                    }
                                },
                                for field in SampleField::ALL {
                                    option { key: "{field.key()}", value: field.key(), "{field.display_name()}" }
                                }
                            }
                        }
                    }
                }

                {if let Some(err) = view.read().error.as_ref() {
                    rsx! {
                        div { class: "card-cosmic p-4 mb-4 border-warning-red",
                            div { class: "flex items-center gap-3",
                                span { class: "text-2xl", "⚠️" }
                                p { class: "text-warning-red", "{err}" }
                            }
                        }
                    }
                } else {
                    rsx! { }
                }}

                section { class: "card-cosmic p-4 mb-6 chart",
                    MemoryChart { series: series.read().clone() }
                }

                section { class: "card-cosmic overflow-hidden",
                    EntryList { entries }
                }
            }
        }
    }
}

// ============================================================================
// Chart
// ============================================================================

#[component]
fn MemoryChart(series: Vec<Series>) -> Element {
    let Some(range) = value_range(&series) else {
        return rsx! {
            div { class: "p-8 text-center text-stardust", "No samples to chart" }
        };
    };
    let lines: Vec<(String, String)> = series
        .iter()
        .enumerate()
        .flat_map(|(idx, s)| {
            let color = SERIES_COLORS[idx % SERIES_COLORS.len()].to_string();
            polyline_segments(&s.points, range, CHART_W, CHART_H)
                .into_iter()
                .map(move |seg| (color.clone(), svg_points(&seg)))
        })
        .collect();
    let markers: Vec<(String, String, String)> = series
        .iter()
        .enumerate()
        .flat_map(|(idx, s)| {
            let color = SERIES_COLORS[idx % SERIES_COLORS.len()].to_string();
            point_markers(&s.points, range, CHART_W, CHART_H)
                .into_iter()
                .map(move |(x, y)| (color.clone(), format!("{:.2}", x), format!("{:.2}", y)))
        })
        .collect();
    let legend: Vec<(String, String, &'static str)> = series
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let class = if s.has_points() { "text-moonlight" } else { "text-stardust line-through" };
            (SERIES_COLORS[idx % SERIES_COLORS.len()].to_string(), s.label.clone(), class)
        })
        .collect();
    let range_label = format!("{:.1} – {:.1}", range.0, range.1);

    rsx! {
        div { class: "chart-legend flex gap-4 text-sm mb-2",
            for (color, label, class) in legend {
                span { key: "{label}", class: "flex items-center gap-1",
                    span { class: "legend-swatch", style: "background: {color}" }
                    span { class: "{class}", "{label}" }
                }
            }
            span { class: "text-stardust ml-auto font-mono", "{range_label}" }
        }
        svg {
            class: "canvas",
            view_box: "0 0 {CHART_W} {CHART_H}",
            preserve_aspect_ratio: "none",
            for (i, (color, points)) in lines.into_iter().enumerate() {
                polyline {
                    key: "{i}",
                    points: "{points}",
                    fill: "none",
                    stroke: "{color}",
                    stroke_width: "1.5",
                }
            }
            for (i, (color, x, y)) in markers.into_iter().enumerate() {
                circle {
                    key: "m{i}",
                    cx: "{x}",
                    cy: "{y}",
                    r: "3",
                    fill: "{color}",
                }
            }
        }
    }
}

// ============================================================================
// Entry list
// ============================================================================

#[component]
fn EntryList(entries: Vec<LogEntry>) -> Element {
    if entries.is_empty() {
        return rsx! {
            div { class: "p-8 text-center",
                span { class: "text-4xl", "📭" }
                p { class: "text-stardust mt-4", "No entries" }
            }
        };
    }
    rsx! {
        div { class: "container entries",
            for (idx, entry) in entries.iter().enumerate() {
                LogEntryRow { key: "{idx}-{entry.id}", entry: entry.clone() }
            }
        }
    }
}

#[component]
fn LogEntryRow(entry: LogEntry) -> Element {
    let level_class = entry.level_class();
    let worker_class = entry.worker_class();
    let badge = entry.worker_badge();
    let level_text = if entry.level_raw.is_empty() { "—".to_string() } else { entry.level_raw.clone() };
    // Main-process rows span the full width; worker rows are indented.
    let row_class = match entry.worker() {
        Some(Worker::Main) => "entry-row entry-row-main",
        Some(_) => "entry-row entry-row-worker",
        None => "entry-row entry-row-unknown",
    };

    rsx! {
        div { class: "columns is-vcentered {row_class}",
            div { class: "column is-1 is-size-7 {level_class}", "{level_text}" }
            div { class: "column is-1 is-size-7 has-text-weight-bold {worker_class}", "{badge}" }
            div { class: "column is-9 has-text-left is-size-6 is-family-monospace has-text-grey",
                span { "{entry.message}" }
                {entry.context.as_ref().map(|c| rsx! { span { class: "entry-tag ml-2", "{c}" } })}
                {entry.provenance.as_ref().map(|p| rsx! { span { class: "entry-tag ml-2", "@{p}" } })}
            }
            div { class: "column is-1 is-size-7 text-stardust", "{entry.timestamp}" }
        }
    }
}
