use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use dotenv::dotenv;
use std::sync::Arc;

mod blob;
mod config;
mod controllers;
mod gate;
mod http;
mod media;
mod models;
mod seed;
mod store;
mod view;

use blob::{BlobStore, CloudinaryStore};
use config::{Config, StorageBackend};
use gate::SessionGate;
use store::{DocumentBackend, LocalBackend, RecordStore, RemoteBackend};

pub struct AppState {
    pub config: Config,
    pub store: Arc<RecordStore>,
    pub blob: Option<Arc<dyn BlobStore>>,
    pub gate: Arc<SessionGate>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    let blob: Option<Arc<dyn BlobStore>> = config
        .cloud
        .clone()
        .map(|cloud| Arc::new(CloudinaryStore::new(cloud)) as Arc<dyn BlobStore>);

    let backend: Box<dyn DocumentBackend> = match config.storage_backend {
        StorageBackend::Local => {
            log::info!(
                "Storing collection documents under {}",
                config.data_dir.display()
            );
            Box::new(LocalBackend::new(config.data_dir.clone()))
        }
        StorageBackend::Cloud => {
            let blob = blob
                .clone()
                .expect("STORAGE_BACKEND=cloud requires the media service credentials");
            log::info!("Storing collection documents in the media service");
            Box::new(RemoteBackend::new(blob))
        }
    };
    let store = Arc::new(RecordStore::new(backend));

    let gate = Arc::new(SessionGate::new(
        config.author_secret.clone(),
        config.reader_secret.clone(),
    ));

    if config.storage_backend == StorageBackend::Local {
        if let Err(e) = seed::seed_initial_data(&store).await {
            log::warn!("Could not seed initial data: {}", e);
        }
    }

    log::info!("Starting Keepsake server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                config: config.clone(),
                store: Arc::clone(&store),
                blob: blob.clone(),
                gate: Arc::clone(&gate),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::auth::config)
            .configure(controllers::photos::config)
            .configure(controllers::videos::config)
            .configure(controllers::letters::config)
            .configure(controllers::timeline::config)
            .configure(controllers::surprise::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
