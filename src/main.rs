use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpResponse, HttpServer, cookie::Key, middleware, web};

use doctrack::assets::ASSET_BUCKET;
use doctrack::auth::{AccountDirectory, IdentityProvider, StaticAccounts};
use doctrack::config::AppConfig;
use doctrack::errors::ApiErrorResponse;
use doctrack::realtime::{ChangeFeed, listener};
use doctrack::state::AppState;
use doctrack::store::Store;
use doctrack::store::memory::MemoryStore;
use doctrack::store::postgres::PgStore;
use doctrack::{db, handlers};

fn session_key(raw: Option<&str>) -> Key {
    match raw {
        Some(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Some(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+); generating random key", val.len());
            Key::generate()
        }
        None => {
            log::warn!("No SESSION_KEY set; generating random key (sessions lost on restart)");
            Key::generate()
        }
    }
}

fn io_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };

    let (store, identity): (Arc<dyn Store>, Arc<dyn IdentityProvider>) = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .map_err(|e| io_error("Failed to connect to database", e))?;
            db::run_migrations(&pool)
                .await
                .map_err(|e| io_error("Failed to run migrations", e))?;

            let feed = ChangeFeed::default();
            listener::spawn(&pool, feed.clone())
                .await
                .map_err(|e| io_error("Failed to listen for changes", e))?;

            let directory = AccountDirectory::new(pool.clone());
            for (email, password) in &config.dev_accounts {
                directory
                    .upsert_account(email, password)
                    .await
                    .map_err(|e| io_error("Failed to provision account", e))?;
            }
            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool, feed));
            let identity: Arc<dyn IdentityProvider> = Arc::new(directory);
            (store, identity)
        }
        None => {
            log::warn!("DATABASE_URL not set; using the in-memory store (nothing is persisted)");
            let accounts = StaticAccounts::new(&config.dev_accounts)
                .map_err(|e| io_error("Failed to load dev accounts", e))?;
            if accounts.is_empty() {
                log::warn!("No DOCTRACK_DEV_ACCOUNTS configured; nobody can sign in");
            }
            let store: Arc<dyn Store> = Arc::new(MemoryStore::seeded());
            let identity: Arc<dyn IdentityProvider> = Arc::new(accounts);
            (store, identity)
        }
    };
    if config.admin_identities.is_empty() {
        log::warn!("DOCTRACK_ADMIN_IDENTITIES is empty; no account can delete documents");
    }

    let state = web::Data::new(AppState::new(store.clone(), identity, &config));
    if let Err(e) = state.cache.refresh_all().await {
        log::warn!("Initial cache load failed: {e}");
    }
    state.cache.spawn_refresher();

    let asset_root = config.asset_dir.join(ASSET_BUCKET);
    std::fs::create_dir_all(&asset_root)?;
    let asset_mount = format!("{}/{ASSET_BUCKET}", config.public_asset_base);
    let secret_key = session_key(config.session_key.as_deref());

    log::info!("Starting server at http://{} ({} store)", config.bind_addr, store.backend_name());

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
            .cookie_secure(false)
            .cookie_http_only(true)
            .build();

        let mut app = App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure);
        // Only serve local files when the public URL is a local path.
        if asset_mount.starts_with('/') {
            app = app.service(actix_files::Files::new(&asset_mount, &asset_root));
        }
        app.default_service(web::to(|| async {
            HttpResponse::NotFound().json(ApiErrorResponse {
                error: "Not found".to_string(),
                details: None,
            })
        }))
    })
    .bind(config.bind_addr)?
    .run()
    .await
}
