pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use crate::services::{
    gemini_service::{GeminiService, TextGenerator},
    paper_service::PaperService,
    pdf_service::PdfService,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub paper_service: Arc<PaperService>,
    pub pdf_service: PdfService,
}

impl AppState {
    pub fn new() -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap();
        let provider: Arc<dyn TextGenerator> = Arc::new(GeminiService::new(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            http_client,
        ));

        Self::with_provider(provider, config.cache_capacity)
    }

    /// Builds the state around an arbitrary generator; tests use this to
    /// substitute a mock for the Gemini client.
    pub fn with_provider(provider: Arc<dyn TextGenerator>, cache_capacity: usize) -> Self {
        Self {
            paper_service: Arc::new(PaperService::new(provider, cache_capacity)),
            pdf_service: PdfService::new(),
        }
    }
}
