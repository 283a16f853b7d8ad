//! Todos demo binary
//!
//! Builds a list, edits rows through their own scoped stores, and lets the
//! debounced re-sort run on the tokio clock.

use anyhow::Context;
use composable_store_core::scheduler::TokioScheduler;
use composable_store_runtime::metrics::MetricsExporter;
use composable_store_runtime::{Store, StoreConfig, ViewStore};
use std::time::Duration;
use todos::{Filter, SORT_DELAY, TodoAction, TodosAction, TodosEnvironment, TodosState, todos_reducer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todos=info,composable_store::debug=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut exporter = MetricsExporter::new();
    exporter.install().context("installing metrics recorder")?;

    println!("=== Todos: Composable Store ===\n");

    let env = TodosEnvironment::new(TokioScheduler::shared());
    let store = Store::with_config(
        TodosState::default(),
        todos_reducer(),
        env,
        StoreConfig::default().with_label("todos"),
    );

    let view = ViewStore::new(store.clone());
    let visible = view
        .subscribe_eq(|state: &TodosState| {
            state
                .filtered_todos()
                .iter()
                .map(|todo| format!("[{}] {}", if todo.complete { "x" } else { " " }, todo.description))
                .collect::<Vec<_>>()
        })
        .subscribe(
            |rows| {
                println!("visible rows:");
                for row in rows {
                    println!("  {row}");
                }
            },
            || {},
        );

    for description in ["Write the reducer", "Scope the rows", "Ship it"] {
        store.send(TodosAction::AddTodoButtonTapped);
        let id = store.state(|s| s.todos[0].id);
        let row = store
            .scope_element(|s: &TodosState| &s.todos, id, TodosAction::Todo)
            .context("freshly added todo is missing")?;
        row.send(TodoAction::TextFieldChanged(description.to_string()));
        tracing::info!(%id, description, "todo added");
    }

    // Toggle two rows quickly; the re-sort runs once, after the last toggle settles.
    let ids: Vec<_> = store.state(|s| s.todos.ids().collect());
    for id in ids.iter().take(2) {
        store.send(TodosAction::Todo(*id, TodoAction::CheckBoxToggled));
    }
    println!("\nwaiting {SORT_DELAY:?} for completed todos to sink...\n");
    tokio::time::sleep(SORT_DELAY + Duration::from_millis(50)).await;

    store.send(TodosAction::FilterPicked(Filter::Active));
    println!("\nactive todos left: {}", view.state().active_count());

    store.send(TodosAction::FilterPicked(Filter::All));
    store.send(TodosAction::ClearCompletedButtonTapped);

    let snapshot = serde_json::to_string_pretty(&store.current_state()).context("serializing state")?;
    println!("\nfinal state:\n{snapshot}");

    visible.dispose();

    if let Some(metrics) = exporter.render() {
        println!("\nmetrics:\n{metrics}");
    }

    Ok(())
}
