#![allow(dead_code)]

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use chrono::{DateTime, Utc};
use image_board::{
    entities::{entity::Entity, image::{Image, NewImage}},
    repositories::{memory_repo::MemoryStore, provider::{MemoryRepositoryProvider, RepositoryProvider}},
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};
use reqwest::{redirect::Policy, Client};
use std::{net::TcpListener, sync::Arc, time::Duration};

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub store: Arc<MemoryStore>,
    pub config: AppConfig,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(AppConfig::for_testing()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let provider: Arc<dyn RepositoryProvider> = Arc::new(MemoryRepositoryProvider::new(store.clone()));
        let state = web::Data::new(AppState::new(&config, provider));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let cors_origins = config.cors_origins();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(NormalizePath::trim())
                .configure(configure_routes(cors_origins.clone()))
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(1)
        .disable_signals()
        .run();

        actix_rt::spawn(server);

        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        while client.get(format!("{}/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Self {
            address,
            client,
            store,
            config,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn seed_image(&self, url: &str, created_at: DateTime<Utc>) -> Image {
        self.store
            .seed_image(&NewImage::new(url), Entity::new(created_at))
            .expect("Failed to seed image")
    }

    pub fn seed_deleted_image(&self, url: &str, created_at: DateTime<Utc>) -> Image {
        let mut entity = Entity::new(created_at);
        entity.is_deleted = true;
        entity.deleted_at = Some(created_at);

        self.store
            .seed_image(&NewImage::new(url), entity)
            .expect("Failed to seed image")
    }

    pub async fn submit(&self, image_url: &str) -> reqwest::Response {
        self.client
            .post(self.url("/images/"))
            .form(&[("image_url", image_url)])
            .send()
            .await
            .expect("Failed to submit image")
    }
}
