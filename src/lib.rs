// src/lib.rs

pub mod api;
pub mod cli;
pub mod config;
pub mod conn;
pub mod dag;
pub mod errors;
pub mod logging;
pub mod logs;
pub mod types;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::api::{HttpApi, LocalEvaluator, SelectorEvaluator};
use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, load_or_default, ConsoleConfig};
use crate::conn::{ConnectionHandle, ConnectionManager, FixedDelay, Inbound, WsTransport};
use crate::dag::{DagView, ModelPreview, NodeTier, ProjectedGraph};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the DAG view (graph fetch + optional selector highlight)
/// - the connection manager over a WebSocket transport
/// - job subscriptions, re-sent after every reconnect
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = match &args.config {
        Some(path) => load_and_validate(path)?,
        None => load_or_default(default_config_path())?,
    };

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let api = HttpApi::new(&cfg.server.api_url)?;

    if let Some(model) = &args.preview {
        return show_preview(&api, model, args.preview_limit).await;
    }

    if args.graph_only || args.select.is_some() {
        show_graph(&api, &args).await?;
    }
    if args.graph_only {
        return Ok(());
    }

    let transport = WsTransport::new(cfg.connection.event_capacity);
    let policy = Box::new(FixedDelay(cfg.connection.reconnect_delay()));
    let (handle, manager) = ConnectionManager::spawn(&cfg, transport, policy);

    info!(client_id = %handle.client_id(), endpoint = %handle.endpoint(), "starting console");
    handle.connect().await;

    follow(&handle, &args.subscribe).await;

    handle.shutdown().await;
    manager.await?;
    Ok(())
}

/// Print inbound messages until Ctrl-C, re-subscribing `jobs` each time the
/// connection comes (back) up.
async fn follow(handle: &ConnectionHandle, jobs: &[String]) {
    let mut inbound = handle.inbound();
    let mut connected = handle.reader().connected_changes();

    loop {
        tokio::select! {
            message = inbound.recv() => match message {
                Ok(message) => print_inbound(&message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "console output fell behind; messages skipped");
                }
                Err(RecvError::Closed) => break,
            },
            changed = connected.changed() => {
                if changed.is_err() {
                    break;
                }
                let is_up = *connected.borrow_and_update();
                if is_up {
                    for job in jobs {
                        handle.subscribe(job.clone()).await;
                    }
                } else {
                    warn!("disconnected from backend; retrying");
                }
            },
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                info!("shutdown requested");
                break;
            },
        }
    }
}

fn print_inbound(message: &Inbound) {
    match message {
        Inbound::Log(event) => println!("{event}"),
        Inbound::Progress(p)
        | Inbound::Status(p)
        | Inbound::Complete(p)
        | Inbound::Error(p)
        | Inbound::Pong(p) => {
            println!(
                "{} <{:?}> {}",
                p.timestamp.format("%H:%M:%S"),
                message.kind(),
                p.payload
            );
        }
    }
}

async fn show_graph(api: &HttpApi, args: &CliArgs) -> Result<()> {
    let mut view = DagView::new();
    view.load(api).await?;

    if let Some(selector) = &args.select {
        let highlight = if args.local_select {
            let model = view.graph().cloned().unwrap_or_default();
            let local = LocalEvaluator::new(model);
            apply(&mut view, &local, selector).await
        } else {
            apply(&mut view, api, selector).await
        };
        info!(%selector, highlighted = highlight, "selector applied");
    }

    print_projection(&view.project());
    Ok(())
}

async fn apply<E: SelectorEvaluator + ?Sized>(
    view: &mut DagView,
    evaluator: &E,
    selector: &str,
) -> usize {
    view.apply_selector(evaluator, selector).await.len()
}

/// Text rendering of a projected graph: one block per layer column.
fn print_projection(graph: &ProjectedGraph) {
    let mut current_layer = None;
    for node in &graph.nodes {
        if current_layer != Some(node.layer) {
            current_layer = Some(node.layer);
            println!("[{}]", node.layer);
        }
        let marker = match node.tier {
            NodeTier::Selected => '*',
            NodeTier::Unfiltered => ' ',
            NodeTier::Dimmed => '.',
        };
        match &node.materialization {
            Some(m) => println!("  {marker} {} ({m})", node.label),
            None => println!("  {marker} {}", node.label),
        }
    }

    let active = graph.edges.iter().filter(|e| e.active).count();
    println!();
    println!("edges: {} ({} active)", graph.edges.len(), active);
}

async fn show_preview(api: &HttpApi, model: &str, limit: u32) -> Result<()> {
    let preview = api.model_preview(model, limit).await?;
    print_preview(&preview);
    Ok(())
}

fn print_preview(preview: &ModelPreview) {
    let node = &preview.node;
    println!("{} [{}]", node.display_name, node.layer);
    println!("  id: {}", node.unique_id);
    if let Some(m) = &node.materialization {
        println!("  materialization: {m}");
    }
    if let Some(d) = &node.description {
        println!("  description: {d}");
    }
    if !node.depends_on.is_empty() {
        println!("  depends on: {}", node.depends_on.join(", "));
    }
    println!("  rows: {}", preview.row_count);
    for row in &preview.sample_data {
        println!("  {}", serde_json::Value::Object(row.clone()));
    }
    if let Some(sql) = &preview.sql {
        println!();
        println!("{sql}");
    }
}

/// Simple dry-run output: print the effective configuration.
fn print_dry_run(cfg: &ConsoleConfig) {
    println!("pipeline-console dry-run");
    println!("  server.api_url = {}", cfg.server.api_url);
    println!("  server.ws_url = {}", cfg.server.ws_url);
    println!(
        "  connection.reconnect_delay_ms = {}",
        cfg.connection.reconnect_delay_ms
    );
    println!(
        "  connection.connect_timeout_ms = {}",
        cfg.connection.connect_timeout_ms
    );
    println!("  connection.event_capacity = {}", cfg.connection.event_capacity);
    println!("  logs.capacity = {}", cfg.logs.capacity);
}
