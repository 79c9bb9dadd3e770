//! `order-desk` command line.
//!
//! ```bash
//! order-desk list --status pending --query flour
//! order-desk fix ord_42 $'3 kg flour\n1 bread' --reason "missed bread"
//! order-desk status ord_42 shipped
//! order-desk watch
//! ```

use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use order_desk::correction::StatusChange;
use order_desk::lifecycle::{setup_tracing, OrderDesk, Settings, DEFAULT_CONFIG_FILE};
use order_desk::model::{time_ago, Order, OrderId, OrderStatus, StatusFilter};
use order_desk::search::status_counts;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "order-desk", about = "Review, correct and track captured orders")]
struct Cli {
    /// Config file, read if present.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current orders.
    List {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Replace an order's items with one item per line of TEXT.
    Fix {
        order_id: String,
        text: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Set an order's status (pending, shipped, paid).
    Status {
        order_id: String,
        status: OrderStatus,
    },
    /// Print every new snapshot until Ctrl-C.
    Watch {
        #[arg(long, default_value = "all")]
        status: StatusFilter,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();
    let cli = Cli::parse();
    let settings = Settings::load(&cli.config).context("loading settings")?;

    let filter = match &cli.command {
        Command::List { status, .. } | Command::Watch { status } => *status,
        _ => StatusFilter::All,
    };
    let desk = OrderDesk::connect(&settings, filter)
        .await
        .context("connecting to the order service")?;
    if let Ok(org) = desk.org().await {
        info!(org = %org.id, name = ?org.name, plan = ?org.plan, "Connected");
    }

    // the controller starts with a hard load; wait for it before acting
    let result = match desk.initial_load().await {
        Ok(state) if state.snapshot.fetched_at.is_some() => run(&desk, cli.command).await,
        Ok(state) => Err(anyhow!(
            "loading orders: {}",
            state.last_error.as_deref().unwrap_or("no response")
        )),
        Err(e) => Err(e).context("loading orders"),
    };

    desk.shutdown().await?;
    result
}

async fn run(desk: &OrderDesk, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List { query, .. } => {
            let state = desk.sync.current();
            let counts = status_counts(&state.snapshot);
            println!(
                "{} orders ({} pending, {} shipped, {} paid, {} delivered)",
                counts.all, counts.pending, counts.shipped, counts.paid, counts.delivered
            );
            for order in desk.visible_orders(&query) {
                print_order(&order);
            }
        }
        Command::Fix {
            order_id,
            text,
            reason,
        } => {
            let order = desk
                .coordinator
                .submit(&OrderId::from(order_id), &text, reason.as_deref())
                .await?;
            print_order(&order);
        }
        Command::Status { order_id, status } => {
            match desk
                .coordinator
                .set_status(&OrderId::from(order_id), status)
                .await?
            {
                StatusChange::Unchanged => println!("status already {status}"),
                StatusChange::Applied(order) => print_order(&order),
            }
        }
        Command::Watch { .. } => watch(desk).await?,
    }
    Ok(())
}

async fn watch(desk: &OrderDesk) -> anyhow::Result<()> {
    let mut states = desk.sync.subscribe();
    let mut seen = 0;
    let mut last_error = None;
    loop {
        {
            let state = states.borrow_and_update().clone();
            if let Some(error) = error_changed(&mut last_error, &state.last_error) {
                warn!(%error, "Last refresh failed");
            }
            if state.snapshot.version != seen {
                seen = state.snapshot.version;
                println!(
                    "-- version {} ({} orders, tick {})",
                    seen,
                    state.snapshot.len(),
                    state.ticks
                );
                for order in state.snapshot.orders() {
                    print_order(order);
                }
            }
        }
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    bail!("sync controller stopped");
                }
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

/// Returns the current error only when it differs from the one last reported.
fn error_changed<'a>(reported: &mut Option<String>, current: &'a Option<String>) -> Option<&'a str> {
    if reported == current {
        return None;
    }
    reported.clone_from(current);
    current.as_deref()
}

fn print_order(order: &Order) {
    println!(
        "{:<12} {:<9} {:<20} {:>8}  {}",
        order.id.to_string(),
        order.status.as_str(),
        order.customer_label(),
        time_ago(order.created_at, Utc::now()),
        order.items_display()
    );
}
