mod error;
mod normalize;
mod oracle;
mod routes;

use crate::oracle::{AzureOracle, OpenAiOracle, OracleClient};
use axum::Router;
use common::models::Provider;
use env_logger::Env;
use log::{error, info, warn};
use serde::Deserialize;
use std::process::exit;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_redoc::Redoc;
use utoipa_redoc::Servable;

fn get_default_port() -> u16 {
    8080
}

fn get_default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn get_default_model() -> String {
    "gpt-4o".to_string()
}

fn get_default_azure_api_version() -> String {
    "2024-08-01-preview".to_string()
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "get_default_port")]
    port: u16,
    openai_api_key: Option<String>,
    #[serde(default = "get_default_openai_base_url")]
    openai_base_url: String,
    #[serde(default = "get_default_model")]
    openai_model: String,
    azure_openai_endpoint: Option<String>,
    azure_openai_api_key: Option<String>,
    #[serde(default = "get_default_model")]
    azure_openai_deployment_name: String,
    #[serde(default = "get_default_azure_api_version")]
    azure_openai_api_version: String,
}

#[cfg(test)]
impl Config {
    pub fn test_default() -> Self {
        Config {
            port: get_default_port(),
            openai_api_key: None,
            openai_base_url: get_default_openai_base_url(),
            openai_model: get_default_model(),
            azure_openai_endpoint: None,
            azure_openai_api_key: None,
            azure_openai_deployment_name: get_default_model(),
            azure_openai_api_version: get_default_azure_api_version(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    openai: OracleClient,
    azure: OracleClient,
}

impl AppState {
    pub fn new(openai: OracleClient, azure: OracleClient) -> Self {
        AppState { openai, azure }
    }

    pub fn from_config(config: &Config) -> Self {
        AppState::new(
            OracleClient::new(Arc::new(OpenAiOracle::new(config))),
            OracleClient::new(Arc::new(AzureOracle::new(config))),
        )
    }

    pub fn oracle(&self, provider: Provider) -> &OracleClient {
        match provider {
            Provider::OpenAi => &self.openai,
            Provider::Azure => &self.azure,
        }
    }
}

#[derive(OpenApi)]
#[openapi(info(
    description = "API giving Norwegian learners sentence-by-sentence feedback using llms"
))]
struct ApiDoc;

pub fn app(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(routes::split))
        .routes(routes!(routes::analyze))
        .routes(routes!(routes::check))
        .routes(routes!(routes::languages))
        .split_for_parts();

    router
        .merge(Redoc::with_url("/redoc", api))
        .with_state(state)
}

async fn run() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = envy::from_env::<Config>()?;

    let state = AppState::from_config(&config);
    for provider in [Provider::OpenAi, Provider::Azure] {
        if let Err(e) = state.oracle(provider).ensure_configured() {
            warn!("{e}; requests for {provider} will fail");
        }
    }

    info!("Starting on port {}", config.port);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn main() {
    let rt = tokio::runtime::Runtime::new().unwrap();

    if let Err(err) = rt.block_on(run()) {
        error!("{}", err);
        exit(1)
    }
}
