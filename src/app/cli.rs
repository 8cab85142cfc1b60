//! Command surface of the packout console.
//!
//! Each invocation is its own process; all workflow state lives in the kv
//! store, which is what lets an operator run `toggle`, `photo`, and `next`
//! as separate commands against the same session. Commands that enter a
//! workflow (`scan`, `watch`, `whoami`) run the full bootstrap; purely local
//! mutations only require a stored credential and touch no network.

use std::io::{self, BufRead, Write as _};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::api::{ApiClient, ApiError, PackoutBackend};
use crate::app::bootstrap::{Bootstrap, BootstrapOutcome};
use crate::auth::SessionStore;
use crate::capture::{Camera, PathCamera, Scanner, StdinScanner};
use crate::config::Config;
use crate::data::{Database, KvStore};
use crate::orders::{LookupError, Order, OrderLookup, Resolution};
use crate::packout::{PackoutEngine, PackoutStep, PhotoCategory, PhotoRef, SubmitOutcome};
use crate::sync::{DrainReport, EnvelopeKind, OfflineOutbox, SyncManager};
use crate::util;

const ACTIVE_ORDER_KEY: &str = "active_order";

#[derive(Parser)]
#[command(name = "packline")]
#[command(about = "Barcode-driven packout workflow console")]
#[command(version)]
pub struct Cli {
    /// Data directory (default ~/.packline)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Backend API base URL (overrides config)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in to the warehouse backend
    Login {
        username: String,
        /// Password; prompted on stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and discard the stored credential
    Logout,

    /// Show the signed-in worker
    Whoami,

    /// Look up an order by barcode and enter its packout workflow
    Scan { code: String },

    /// Show the active workflow
    Status,

    /// Tick or untick a checklist item
    Toggle {
        item_id: u32,
        /// Step number (defaults to the current step)
        #[arg(long, value_name = "N")]
        step: Option<u32>,
    },

    /// Attach a photo to the active workflow
    Photo {
        /// package, label, damage, compliance, or general
        category: String,
        /// Path to the captured image
        #[arg(long, value_name = "PATH")]
        file: PathBuf,
        #[arg(long)]
        notes: Option<String>,
    },

    /// Advance to the next step
    Next,

    /// Go back one step
    Back,

    /// Submit the completed workflow
    Submit,

    /// Probe the backend and replay queued offline writes
    Sync,

    /// List queued offline writes
    Queue,

    /// Read barcodes from stdin and enter each order's workflow
    Watch,
}

/// The order the workflow commands operate on, set by `scan`/`watch`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActiveOrder {
    order_id: i64,
    order_number: String,
}

struct AppContext {
    config: Config,
    kv: KvStore,
    session: SessionStore,
    client: ApiClient,
    outbox: OfflineOutbox,
}

impl AppContext {
    fn build(data_dir: Option<PathBuf>, api_url: Option<String>) -> Result<Self> {
        util::init_data_dir(data_dir);

        let mut config = Config::load();
        if let Some(url) = api_url {
            config = config.with_api_base_url(url);
        }

        let db = Database::open_default().context("failed to open local database")?;
        let kv = KvStore::new(db.connection());
        let session = SessionStore::new(kv.clone());
        let client = ApiClient::new(&config, session.clone());
        let outbox = OfflineOutbox::new(kv.clone());

        Ok(Self {
            config,
            kv,
            session,
            client,
            outbox,
        })
    }

    fn backend(&self) -> Arc<dyn PackoutBackend> {
        Arc::new(self.client.clone())
    }

    fn sync_manager(&self) -> SyncManager {
        SyncManager::new(self.outbox.clone(), self.backend())
    }

    fn lookup(&self) -> OrderLookup {
        OrderLookup::new(self.client.clone(), self.config.allow_degraded_lookup)
    }

    async fn bootstrap(&self) -> BootstrapOutcome {
        Bootstrap::new(self.session.clone(), self.client.clone(), self.sync_manager())
            .run()
            .await
    }

    /// Local gate for workflow mutations: a stored credential must exist
    fn require_session(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            bail!("not signed in; run `packline login <username>` first");
        }
        Ok(())
    }

    fn active_order(&self) -> Option<ActiveOrder> {
        self.kv.get_json(ACTIVE_ORDER_KEY).ok().flatten()
    }

    fn set_active_order(&self, order: &Order) {
        let record = ActiveOrder {
            order_id: order.id,
            order_number: order.order_number.clone(),
        };
        if let Err(e) = self.kv.set_json(ACTIVE_ORDER_KEY, &record) {
            tracing::warn!(error = %e, "failed to record active order");
        }
    }

    fn clear_active_order(&self) {
        if let Err(e) = self.kv.remove(ACTIVE_ORDER_KEY) {
            tracing::warn!(error = %e, "failed to clear active order");
        }
    }

    /// Reopen the engine for the active order's persisted session
    fn active_engine(&self) -> Result<PackoutEngine> {
        let active = self
            .active_order()
            .ok_or_else(|| anyhow!("no active order; run `packline scan <code>` first"))?;
        PackoutEngine::resume(self.kv.clone(), active.order_id).ok_or_else(|| {
            anyhow!(
                "no packout in progress for order {}; scan it again to start one",
                active.order_number
            )
        })
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::build(cli.data_dir, cli.api_url)?;

    match cli.command {
        Command::Login { username, password } => login(&ctx, &username, password).await,
        Command::Logout => logout(&ctx),
        Command::Whoami => whoami(&ctx).await,
        Command::Scan { code } => scan(&ctx, &code).await,
        Command::Status => status(&ctx),
        Command::Toggle { item_id, step } => toggle(&ctx, item_id, step),
        Command::Photo {
            category,
            file,
            notes,
        } => photo(&ctx, &category, file, notes).await,
        Command::Next => next(&ctx),
        Command::Back => back(&ctx),
        Command::Submit => submit(&ctx).await,
        Command::Sync => sync(&ctx).await,
        Command::Queue => queue(&ctx),
        Command::Watch => watch(&ctx).await,
    }
}

async fn login(ctx: &AppContext, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => prompt_password()?,
    };

    match ctx.client.login(username, &password).await {
        Ok(_) => {
            // best effort; whoami re-fetches when this is unavailable
            if let Ok(profile) = ctx.client.me().await {
                ctx.session.set_profile(&profile);
                println!("signed in as {} ({})", profile.username, profile.role);
            } else {
                println!("signed in as {username}");
            }
            Ok(())
        }
        Err(ApiError::AuthRejected) => bail!("invalid username or password"),
        Err(ApiError::Unavailable(reason)) => {
            bail!("backend unreachable, cannot sign in: {reason}")
        }
        Err(e) => Err(e).context("login failed"),
    }
}

fn prompt_password() -> Result<String> {
    print!("password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("empty password");
    }
    Ok(password)
}

fn logout(ctx: &AppContext) -> Result<()> {
    ctx.session.clear();
    println!("signed out");
    Ok(())
}

async fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.bootstrap().await {
        BootstrapOutcome::NotAuthenticated => bail!("not signed in"),
        BootstrapOutcome::Authenticated { profile, validated } => {
            match profile {
                Some(p) => println!("{} ({}, {})", p.username, p.role, p.email),
                None => {
                    let name = ctx
                        .session
                        .current()
                        .and_then(|s| s.username)
                        .unwrap_or_else(|| "unknown worker".to_string());
                    println!("{name}");
                }
            }
            if !validated {
                println!("offline: backend unreachable, token not re-validated");
            }
            Ok(())
        }
    }
}

async fn scan(ctx: &AppContext, code: &str) -> Result<()> {
    if !ctx.bootstrap().await.is_authenticated() {
        bail!("not signed in; run `packline login <username>` first");
    }
    enter_workflow(ctx, code).await
}

/// Shared by `scan` and `watch`: resolve one code and open its workflow
async fn enter_workflow(ctx: &AppContext, code: &str) -> Result<()> {
    let resolution = match ctx.lookup().resolve(code).await {
        Ok(resolution) => resolution,
        Err(LookupError::InvalidBarcode(code)) => {
            bail!("'{code}' is not a valid order barcode")
        }
        Err(LookupError::NotFound(code)) => bail!("no order matches barcode '{code}'"),
        Err(LookupError::Api(ApiError::AuthRejected)) => {
            bail!("session rejected by backend; run `packline login <username>` again")
        }
        Err(LookupError::Api(e)) => Err(e).context("order lookup failed")?,
    };

    if let Resolution::Degraded { reason, .. } = &resolution {
        println!("WARNING: backend could not confirm this order ({reason}).");
        println!("WARNING: working from a local placeholder; verify contents manually.");
    }

    let order = resolution.order().clone();
    println!(
        "order {} for {} [{} / {}], {} items",
        order.order_number,
        order.customer.name,
        order.status,
        order.priority,
        order.unit_count()
    );
    if !order.status.is_packable() {
        println!("note: order status is '{}', not awaiting packing", order.status);
    }

    ctx.set_active_order(&order);
    let engine = PackoutEngine::start(ctx.kv.clone(), &order);
    print_position(engine.session());
    Ok(())
}

fn status(ctx: &AppContext) -> Result<()> {
    ctx.require_session()?;
    let engine = ctx.active_engine()?;
    let session = engine.session();

    println!("order {}", session.order_number);
    let (done, total) = session.progress();
    println!("progress: {done}/{total} steps, {} photos", session.compliance_photos.len());

    for (index, step) in session.steps.iter().enumerate() {
        let cursor = if index == session.current_step_index && !session.is_all_complete() {
            ">"
        } else {
            " "
        };
        let mark = if step.completed { "x" } else { " " };
        println!("{cursor} [{mark}] step {}: {}", step.id, step.title);
    }

    if session.is_all_complete() {
        println!("workflow complete; run `packline submit`");
        return Ok(());
    }

    let step = session.current_step();
    println!();
    println!("current step {}: {}", step.id, step.title);
    println!("  {}", step.description);
    for line in &step.instructions {
        println!("  - {line}");
    }
    for item in &step.checklist {
        let mark = if item.completed { "x" } else { " " };
        println!("  [{mark}] {} {}", item.id, item.text);
    }
    if step.photo_required {
        let mark = if step.photo_taken { "x" } else { " " };
        println!("  [{mark}] photo evidence");
    }
    Ok(())
}

fn toggle(ctx: &AppContext, item_id: u32, step: Option<u32>) -> Result<()> {
    ctx.require_session()?;
    let mut engine = ctx.active_engine()?;

    let index = match step {
        // operator-facing step numbers are 1-based
        Some(0) => bail!("step numbers start at 1"),
        Some(n) => (n - 1) as usize,
        None => engine.session().current_step_index,
    };

    engine
        .toggle_checklist_item(index, item_id)
        .map_err(|e| anyhow!("{e}"))?;

    let step = &engine.session().steps[index];
    if let Some(item) = step.checklist.iter().find(|i| i.id == item_id) {
        println!(
            "[{}] {} (step {} {})",
            if item.completed { "x" } else { " " },
            item.text,
            step.id,
            if step.completed { "complete" } else { "incomplete" }
        );
    }
    Ok(())
}

async fn photo(
    ctx: &AppContext,
    category: &str,
    file: PathBuf,
    notes: Option<String>,
) -> Result<()> {
    ctx.require_session()?;
    let category = PhotoCategory::parse(category).ok_or_else(|| {
        anyhow!("unknown photo category '{category}' (package, label, damage, compliance, general)")
    })?;

    let mut engine = ctx.active_engine()?;
    let photo_ref: PhotoRef = PathCamera::new(file)
        .capture(category)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    engine.record_photo(category, photo_ref, notes);
    let session = engine.session();
    println!(
        "photo recorded ({} on file){}",
        session.compliance_photos.len(),
        if session.current_step().photo_required && session.current_step().photo_taken {
            "; step photo satisfied"
        } else {
            ""
        }
    );
    Ok(())
}

fn next(ctx: &AppContext) -> Result<()> {
    ctx.require_session()?;
    let mut engine = ctx.active_engine()?;

    if let Err(e) = engine.advance() {
        let step = engine.session().current_step();
        println!("cannot advance: {e}");
        for reason in incomplete_reasons(step) {
            println!("  - {reason}");
        }
        bail!("step {} is not complete", step.id);
    }

    print_position(engine.session());
    Ok(())
}

fn back(ctx: &AppContext) -> Result<()> {
    ctx.require_session()?;
    let mut engine = ctx.active_engine()?;
    engine.retreat().map_err(|e| anyhow!("{e}"))?;
    print_position(engine.session());
    Ok(())
}

async fn submit(ctx: &AppContext) -> Result<()> {
    ctx.require_session()?;
    let mut engine = ctx.active_engine()?;

    let backend = ctx.backend();
    match engine.submit(backend.as_ref(), &ctx.outbox).await {
        Ok(SubmitOutcome::Delivered) => {
            ctx.clear_active_order();
            println!("completion delivered; order {} is done", engine.session().order_number);
            Ok(())
        }
        Ok(SubmitOutcome::SavedOffline { key }) => {
            println!("backend unavailable; completion saved locally and will retry (queued as {key})");
            println!("run `packline sync` when connectivity returns");
            Ok(())
        }
        Err(e) => Err(anyhow!("{e}")).context("submission failed"),
    }
}

async fn sync(ctx: &AppContext) -> Result<()> {
    ctx.require_session()?;
    let report = ctx
        .sync_manager()
        .sync_now()
        .await
        .context("offline sync failed")?;
    print_drain_report(&report);
    Ok(())
}

fn queue(ctx: &AppContext) -> Result<()> {
    ctx.require_session()?;
    let pending = ctx.outbox.pending().map_err(|e| anyhow!("{e}"))?;
    if pending.is_empty() {
        println!("offline queue is empty");
        return Ok(());
    }
    println!("{} queued write(s):", pending.len());
    for envelope in pending {
        let what = match EnvelopeKind::parse(&envelope.key) {
            EnvelopeKind::CompleteTask { order_id } => format!("completion of order {order_id}"),
            EnvelopeKind::Unknown => "unrecognized".to_string(),
        };
        println!(
            "  {}  {}  ({})",
            envelope.enqueued_at.format("%Y-%m-%d %H:%M:%S"),
            envelope.key,
            what
        );
    }
    Ok(())
}

async fn watch(ctx: &AppContext) -> Result<()> {
    if !ctx.bootstrap().await.is_authenticated() {
        bail!("not signed in; run `packline login <username>` first");
    }

    println!("scanning; one barcode per line (ctrl-d to stop)");
    let scanner = StdinScanner;
    let mut feed = scanner.subscribe();
    while let Some(code) = feed.recv().await {
        if let Err(e) = enter_workflow(ctx, &code).await {
            println!("scan '{code}' failed: {e:#}");
        }
        println!();
    }
    Ok(())
}

fn print_position(session: &crate::packout::PackoutSession) {
    if session.is_all_complete() {
        println!("all steps complete; run `packline submit`");
        return;
    }
    let step = session.current_step();
    let (done, total) = step.checklist_progress();
    println!(
        "step {}/{}: {} ({done}/{total} checked{})",
        step.id,
        session.steps.len(),
        step.title,
        if step.photo_required {
            if step.photo_taken {
                ", photo taken"
            } else {
                ", photo needed"
            }
        } else {
            ""
        }
    );
}

fn incomplete_reasons(step: &PackoutStep) -> Vec<String> {
    let mut reasons: Vec<String> = step
        .checklist
        .iter()
        .filter(|item| !item.completed)
        .map(|item| format!("checklist item {} unticked: {}", item.id, item.text))
        .collect();
    if step.photo_required && !step.photo_taken {
        reasons.push("photo evidence missing".to_string());
    }
    reasons
}

fn print_drain_report(report: &DrainReport) {
    if report.delivered == 0 && report.remaining == 0 && report.skipped == 0 {
        println!("offline queue is empty");
        return;
    }
    println!(
        "replayed {} write(s); {} still queued{}",
        report.delivered,
        report.remaining,
        if report.skipped > 0 {
            format!(" ({} skipped)", report.skipped)
        } else {
            String::new()
        }
    );
    if let Some(key) = &report.failed {
        println!("stopped at {key}: backend did not accept it");
    }
}
