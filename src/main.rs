use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use signdesk::config::ClientConfig;
use signdesk::documents::{StatusFilter, filter_documents, resolve_source, upload_pdf};
use signdesk::error::ClientError;
use signdesk::locator::{ElementId, SurfaceReporter, ViewportLocator};
use signdesk::net::api::ApiClient;
use signdesk::public::PublicSigning;
use signdesk::session::{Session, SessionStore};
use signdesk::view::{ViewEvent, ViewMode, ViewSession};
use tracing_subscriber::EnvFilter;
use viewport::draft::{DraftMediator, FontFamily};
use viewport::geometry::{GeometryError, Point, ViewportGeometry};
use viewport::overlay::{DisplayMode, OverlayMarker, StatusBadge, render_overlay};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid zoom: {0}")]
    Zoom(#[from] GeometryError),
    #[error("{code}: {message}")]
    Notice { code: &'static str, message: String },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "signdesk", about = "Document signing client")]
struct Cli {
    #[arg(long, env = "SIGNDESK_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "SIGNDESK_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Docs(DocsCommand),
    /// Show a document's marks as they land on the page at `--zoom`.
    Marks {
        document_id: String,
        #[arg(long, default_value_t = false)]
        tracking: bool,
        #[arg(long, default_value_t = 1.0)]
        zoom: f64,
    },
    /// Place and save a signature at a screen position on the page.
    Sign {
        document_id: String,
        #[command(flatten)]
        placement: PlacementArgs,
        #[arg(long, help = "Email a signing link for the new signature")]
        invite: Option<String>,
    },
    Finalize {
        document_id: String,
        #[arg(long, help = "Output path; defaults to signed-<millis>.pdf")]
        out: Option<PathBuf>,
    },
    Invite {
        signature_id: String,
        #[arg(long)]
        email: String,
    },
    Public(PublicCommand),
}

#[derive(Args, Debug)]
struct DocsCommand {
    #[command(subcommand)]
    command: DocsSubcommand,
}

#[derive(Subcommand, Debug)]
enum DocsSubcommand {
    List {
        #[arg(long, default_value = "all", help = "all, pending, signed or rejected")]
        status: String,
    },
    Upload {
        path: PathBuf,
    },
    Delete {
        document_id: String,
    },
    Show {
        document_id: String,
    },
}

#[derive(Args, Debug)]
struct PublicCommand {
    #[command(subcommand)]
    command: PublicSubcommand,
}

#[derive(Subcommand, Debug)]
enum PublicSubcommand {
    Show {
        token: String,
    },
    Sign {
        token: String,
        #[command(flatten)]
        placement: PlacementArgs,
    },
    Reject {
        token: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
}

/// Screen-space position and style, as dragged on a page rendered at `zoom`.
#[derive(Args, Debug)]
struct PlacementArgs {
    #[arg(long)]
    x: f64,
    #[arg(long)]
    y: f64,
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,
    #[arg(long)]
    text: Option<String>,
    #[arg(long)]
    font_size: Option<u32>,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    font: Option<FontFamily>,
}

impl Command {
    /// Auth commands must work even when the persisted session is unreadable.
    fn needs_session(&self) -> bool {
        !matches!(self, Self::Login { .. } | Self::Register { .. } | Self::Logout)
    }
}

struct CliContext {
    api: ApiClient,
    store: SessionStore,
    session: Session,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env_with_api_url(cli.api_url.as_deref())?;
    if let Some(session_file) = cli.session_file {
        config.session_file = session_file;
    }
    let store = SessionStore::new(&config.session_file);
    let session = if cli.command.needs_session() { store.load().await? } else { Session::anonymous() };
    let ctx = CliContext { api: ApiClient::new(&config)?, session, store };

    match cli.command {
        Command::Login { email, password } => {
            let token = ctx.api.login(&email, &password).await?;
            ctx.store.login(&token).await?;
            print_json(&json!({ "loggedIn": true, "sessionFile": ctx.store.path() }))
        }
        Command::Register { name, email, password } => {
            ctx.api.register(&name, &email, &password).await?;
            print_json(&json!({ "registered": email }))
        }
        Command::Logout => {
            ctx.store.logout().await?;
            print_json(&json!({ "loggedIn": false }))
        }
        Command::Docs(docs) => run_docs(&ctx, docs).await,
        Command::Marks { document_id, tracking, zoom } => run_marks(ctx, &document_id, tracking, zoom).await,
        Command::Sign { document_id, placement, invite } => run_sign(ctx, &document_id, &placement, invite).await,
        Command::Finalize { document_id, out } => run_finalize(ctx, &document_id, out).await,
        Command::Invite { signature_id, email } => {
            ctx.api.send_public_link(&ctx.session, &signature_id, &email).await?;
            print_json(&json!({ "sent": email, "signatureId": signature_id }))
        }
        Command::Public(public) => run_public(&ctx, public).await,
    }
}

async fn run_docs(ctx: &CliContext, docs: DocsCommand) -> Result<(), CliError> {
    match docs.command {
        DocsSubcommand::List { status } => {
            let filter: StatusFilter = status.parse()?;
            let documents = ctx.api.list_documents(&ctx.session).await?;
            print_json(&serde_json::to_value(filter_documents(&documents, filter))?)
        }
        DocsSubcommand::Upload { path } => {
            let id = upload_pdf(&ctx.api, &ctx.session, &path).await?;
            print_json(&json!({ "_id": id }))
        }
        DocsSubcommand::Delete { document_id } => {
            ctx.api.delete_document(&ctx.session, &document_id).await?;
            print_json(&json!({ "deleted": document_id }))
        }
        DocsSubcommand::Show { document_id } => {
            let document = ctx.api.fetch_document(&ctx.session, &document_id).await?;
            let source = resolve_source(&ctx.api, &document).await;
            print_json(&json!({
                "document": document,
                "finalized": source.is_finalized(),
                "url": ctx.api.url(source.path()),
            }))
        }
    }
}

/// Stand in for a rendered page: one canvas filling one scroll container.
fn show_virtual_page(reporter: &SurfaceReporter, zoom: f64) -> Result<ViewportGeometry, CliError> {
    let geometry = ViewportGeometry::at_zoom(zoom)?;
    let (width, height) = (geometry.canvas_width_px(), geometry.canvas_height_px());
    reporter.container(ElementId(1), width, height);
    reporter.canvas(ElementId(2), width, height, Point::new(0.0, 0.0));
    Ok(geometry)
}

async fn open_view(ctx: CliContext, document_id: &str, zoom: f64) -> Result<ViewSession, CliError> {
    let (reporter, locator) = ViewportLocator::spawn();
    show_virtual_page(&reporter, zoom)?;
    let mut view = ViewSession::open(ctx.api, ctx.session, document_id, ViewMode::Owner, locator)?;
    while view.document().is_none() || view.geometry().is_none() {
        match view.next_event().await {
            Some(ViewEvent::Notice(notice)) => {
                return Err(CliError::Notice { code: notice.code, message: notice.message });
            }
            Some(_) => {}
            None => return Err(ClientError::ViewClosed.into()),
        }
    }
    Ok(view)
}

async fn run_marks(ctx: CliContext, document_id: &str, tracking: bool, zoom: f64) -> Result<(), CliError> {
    let mut view = open_view(ctx, document_id, zoom).await?;
    view.set_tracking(tracking);
    let origin = view.layer().map(|layer| layer.canvas_origin()).unwrap_or(Point::new(0.0, 0.0));
    let markers: Vec<Value> = view
        .layer()
        .map(|layer| layer.content().markers.iter().map(|marker| marker_json(marker, origin)).collect())
        .unwrap_or_default();
    let body = json!({ "marks": view.marks(), "overlay": markers });
    view.close();
    print_json(&body)
}

fn marker_json(marker: &OverlayMarker, origin: Point) -> Value {
    json!({
        "id": marker.mark_id,
        "label": marker.label,
        "screen": { "x": marker.position.x, "y": marker.position.y },
        "status": marker.badge.as_ref().map(StatusBadge::text),
        "style": marker.inline_style(origin),
    })
}

fn apply_style(draft: &mut DraftMediator, placement: &PlacementArgs) -> Result<(), ClientError> {
    if let Some(text) = &placement.text {
        draft.set_text(text)?;
    }
    if let Some(size) = placement.font_size {
        draft.set_font_size(size)?;
    }
    if let Some(color) = &placement.color {
        draft.set_font_color(color)?;
    }
    if let Some(font) = placement.font {
        draft.set_font_family(font)?;
    }
    draft.drag_to(Point::new(placement.x, placement.y))?;
    Ok(())
}

async fn run_sign(
    ctx: CliContext,
    document_id: &str,
    placement: &PlacementArgs,
    invite: Option<String>,
) -> Result<(), CliError> {
    let mut view = open_view(ctx, document_id, placement.zoom).await?;
    view.begin_signature()?;
    apply_style(view.draft_mut(), placement)?;
    let signature_id = view.save_signature().await?;
    if let Some(email) = &invite {
        view.send_invite(email).await?;
    }
    view.close();
    print_json(&json!({ "_id": signature_id, "invited": invite }))
}

async fn run_finalize(ctx: CliContext, document_id: &str, out: Option<PathBuf>) -> Result<(), CliError> {
    let bytes = ctx.api.finalize(&ctx.session, document_id).await?;
    let path = out.unwrap_or_else(|| {
        let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
        PathBuf::from(format!("signed-{millis}.pdf"))
    });
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|source| CliError::Write { path: path.clone(), source })?;
    print_json(&json!({ "saved": path, "bytes": bytes.len() }))
}

async fn run_public(ctx: &CliContext, public: PublicCommand) -> Result<(), CliError> {
    match public.command {
        PublicSubcommand::Show { token } => {
            let signing = PublicSigning::open(ctx.api.clone(), &token).await?;
            let mark = signing.mark();
            let preview = render_overlay(
                std::slice::from_ref(mark),
                Some(&ViewportGeometry::at_zoom(1.0)?),
                DisplayMode::Tracking,
            );
            print_json(&json!({
                "mark": mark,
                "status": preview.markers.first().and_then(|m| m.badge.as_ref()).map(StatusBadge::text),
            }))
        }
        PublicSubcommand::Sign { token, placement } => {
            let mut signing = PublicSigning::open(ctx.api.clone(), &token).await?;
            let geometry = ViewportGeometry::at_zoom(placement.zoom)?;
            apply_style(signing.draft_mut(), &placement)?;
            signing.submit(Some(&geometry)).await?;
            print_json(&json!({ "signed": true }))
        }
        PublicSubcommand::Reject { token, reason } => {
            let mut signing = PublicSigning::open(ctx.api.clone(), &token).await?;
            signing.reject(&reason).await?;
            print_json(&json!({ "rejected": true, "reason": reason }))
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
