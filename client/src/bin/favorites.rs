//! Inspect and edit marketplace favorites from the command line.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mockable::DefaultClock;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use marketplace_client::ClientSettings;
use marketplace_client::domain::ports::Notifier;
use marketplace_client::domain::{
    EntityId, FavoriteEntry, FavoriteKind, FavoritesSync, Listing, PersistentStore,
    ReconcileOutcome, Session, StoredUser, decode_role_token,
};
use marketplace_client::outbound::favorites_api::HttpFavoritesApi;
use marketplace_client::outbound::notices::NoticeQueue;
use marketplace_client::outbound::storage::FileKeyValueStore;
use ortho_config::OrthoConfig;

/// `favorites` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "favorites",
    about = "Inspect and edit marketplace favorites stored on this device",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List saved favorites of one kind.
    List {
        /// `house` or `job`.
        #[arg(long)]
        kind: FavoriteKind,
    },
    /// Save a listing given as `{ "id", "type", "snapshot" }` JSON.
    Add {
        /// Listing JSON.
        #[arg(long, value_name = "json", value_parser = parse_listing)]
        json: Listing,
    },
    /// Forget a saved favorite.
    Remove {
        /// `house` or `job`.
        #[arg(long)]
        kind: FavoriteKind,
        /// Listing identifier.
        #[arg(long, value_parser = parse_entity_id)]
        id: EntityId,
    },
    /// Flip a favorite locally and confirm it with the backend.
    Toggle {
        /// Listing JSON.
        #[arg(long, value_name = "json", value_parser = parse_listing)]
        json: Listing,
    },
    /// Replace local favorites of one kind with the backend's.
    Sync {
        /// `house` or `job`.
        #[arg(long)]
        kind: FavoriteKind,
    },
    /// Store credentials returned by the backend login endpoint.
    SignIn {
        /// Bearer token.
        #[arg(long)]
        token: String,
        /// User object JSON carrying the encoded `user_type`.
        #[arg(long, value_name = "json", value_parser = parse_user)]
        user: StoredUser,
    },
    /// Forget stored credentials.
    Logout,
    /// Show the role decoded from the stored session.
    Whoami,
    /// Decode a role token without touching storage.
    DecodeRole {
        /// Encoded role token.
        token: String,
    },
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    if let Command::DecodeRole { token } = &args.command {
        println!("{}", decode_role_token(token));
        return Ok(());
    }

    let settings = ClientSettings::load_from_iter([OsString::from("favorites")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let storage_dir = settings.storage_dir();
    let medium = FileKeyValueStore::open(&storage_dir).map_err(io::Error::other)?;
    let notices = Arc::new(NoticeQueue::default());
    let store = PersistentStore::new(Arc::new(medium), notices.clone());
    let mut session = Session::start(store, Arc::new(DefaultClock));

    let result = run(args.command, &settings, &mut session, notices.clone()).await;
    if let Ok(SessionFlow::End) = result {
        session.logout();
    }
    for notice in notices.drain() {
        eprintln!("{}: {}", notice.level, notice.message);
    }
    result.map(|_| ())
}

/// Whether the session outlives the command.
enum SessionFlow {
    Keep,
    End,
}

async fn run(
    command: Command,
    settings: &ClientSettings,
    session: &mut Session,
    notifier: Arc<dyn Notifier>,
) -> io::Result<SessionFlow> {
    match command {
        Command::List { kind } => {
            for entry in session.favorites().entries(kind) {
                print_entry(entry);
            }
        }
        Command::Add { json } => {
            ensure_can_favorite(session, json.kind())?;
            let added = session.favorites_mut().add(&json);
            println!("added={added}");
        }
        Command::Remove { kind, id } => {
            let removed = session.favorites_mut().remove(&id, kind);
            println!("removed={removed}");
        }
        Command::Toggle { json } => {
            ensure_can_favorite(session, json.kind())?;
            let sync = remote_sync(settings, session, notifier)?;
            match sync.toggle(session.favorites_mut(), &json).await {
                Ok(favorited) => println!("favorited={favorited}"),
                Err(error) => {
                    let local = session.favorites().is_favorite(&json.id, json.kind());
                    println!("favorited={local}");
                    return Err(io::Error::other(format!("toggle failed: {error}")));
                }
            }
        }
        Command::Sync { kind } => {
            let sync = remote_sync(settings, session, notifier)?;
            match sync.reconcile(session.favorites_mut(), kind).await {
                ReconcileOutcome::Reconciled { count } => println!("reconciled={count}"),
                ReconcileOutcome::Stale => println!("reconciled=stale"),
            }
        }
        Command::SignIn { token, user } => {
            let role = session.sign_in(&token, user);
            println!("role={}", role.map_or("unknown", |role| role.as_str()));
        }
        Command::Logout => return Ok(SessionFlow::End),
        Command::Whoami => match (session.user(), session.role()) {
            (Some(user), Some(role)) => println!("{} <{}> role={role}", user.name, user.email),
            (Some(user), None) => println!("{} <{}> role=unknown", user.name, user.email),
            (None, _) => println!("anonymous"),
        },
        Command::DecodeRole { token } => println!("{}", decode_role_token(&token)),
    }
    Ok(SessionFlow::Keep)
}

fn remote_sync(
    settings: &ClientSettings,
    session: &Session,
    notifier: Arc<dyn Notifier>,
) -> io::Result<FavoritesSync<HttpFavoritesApi>> {
    let base_url = settings
        .api_base_url()
        .map_err(io::Error::other)?
        .ok_or_else(|| io::Error::other("MARKETPLACE_API_BASE_URL is not configured"))?;
    let timeout = settings.request_timeout();
    let mut api = HttpFavoritesApi::new(base_url, timeout)
        .map_err(|error| io::Error::other(format!("create HTTP client: {error}")))?;
    if let Some(token) = settings.bearer_token().or(session.bearer_token()) {
        api = api.with_bearer_token(token);
    }
    Ok(FavoritesSync::new(Arc::new(api), notifier).with_timeout(timeout))
}

fn ensure_can_favorite(session: &Session, kind: FavoriteKind) -> io::Result<()> {
    if session.can_favorite(kind) {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "the signed-in role cannot save {kind} favorites"
        )))
    }
}

fn print_entry(entry: &FavoriteEntry) {
    let saved_at = entry
        .saved_at()
        .map_or_else(|| "-".to_owned(), |saved_at| saved_at.to_rfc3339());
    println!(
        "{}\t{}\t{}\t{}",
        entry.kind(),
        entry.id(),
        saved_at,
        entry.snapshot().title()
    );
}

fn parse_listing(raw: &str) -> Result<Listing, String> {
    serde_json::from_str(raw).map_err(|error| format!("invalid listing JSON: {error}"))
}

fn parse_user(raw: &str) -> Result<StoredUser, String> {
    serde_json::from_str(raw).map_err(|error| format!("invalid user JSON: {error}"))
}

fn parse_entity_id(raw: &str) -> Result<EntityId, String> {
    EntityId::new(raw).map_err(|error| error.to_string())
}
