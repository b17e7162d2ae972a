use std::io::Error;
use std::sync::Arc;
use std::time::Duration;

use delivery::{
    application::{
        handlers::{
            EnvelopeHandler,
            delivery::{DeliveryPipeline, DispatchHandler},
            email::EmailDispatch,
            sms::SmsDispatch,
            whatsapp::WhatsAppDispatch,
        },
        services::secure_config::SecureConfigCodec,
        usecases::{get_message::GetMessageUseCase, produce_message::ProduceMessageUseCase},
    },
    config::Config,
    infrastructure::{
        messaging::jetstream::JetstreamBus,
        providers::factory::VendorProviderFactory,
        repositories::postgres::{
            PostgresMessageRepository, PostgresProviderRepository, PostgresTemplateRepository,
        },
    },
    presentation::http::endpoints::{
        delivery::DeliveryEndpoints,
        messages::MessagesEndpoints,
        root::{ApiState, Endpoints},
    },
    telemetry,
};
use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::{main, task::JoinHandle};
use tracing::{info, warn};

#[main]
async fn main() -> Result<(), Error> {
    let config = Config::try_parse().map_err(Error::other)?;
    telemetry::init(config.log_format);

    run(config).await.map_err(Error::other)
}

async fn connect(url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    Ok(PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(url)
        .await?)
}

async fn run(config: Config) -> anyhow::Result<()> {
    let primary = connect(&config.database_url, config.database_max_connections).await?;
    let replica = connect(&config.database_reader_url, config.database_max_connections).await?;
    sqlx::migrate!("./migrations").run(&primary).await?;
    info!("database migrations applied");

    let messages = PostgresMessageRepository::new(primary.clone(), replica.clone());
    let templates = PostgresTemplateRepository::new(replica.clone());
    let providers = PostgresProviderRepository::new(replica);

    let bus = JetstreamBus::connect(&config.jetstream).await?;
    let factory = VendorProviderFactory::new(
        SecureConfigCodec::new(config.encryption_key.clone()),
        config.vendor_timeout,
    )?;

    let pipeline = Arc::new(DeliveryPipeline::new(
        messages.clone(),
        templates,
        providers,
        factory,
    ));

    let handlers: [(Arc<dyn EnvelopeHandler>, usize); 3] = [
        (
            Arc::new(DispatchHandler::new(pipeline.clone(), WhatsAppDispatch)),
            config.whatsapp_workers,
        ),
        (
            Arc::new(DispatchHandler::new(pipeline.clone(), SmsDispatch)),
            config.sms_workers,
        ),
        (
            Arc::new(DispatchHandler::new(pipeline, EmailDispatch)),
            config.email_workers,
        ),
    ];
    let mut workers: Vec<JoinHandle<()>> = Vec::new();
    for (handler, count) in handlers {
        workers.extend(bus.worker_pool(handler, count).await?);
    }

    let state = Arc::new(ApiState {
        produce_usecase: Arc::new(ProduceMessageUseCase::new(messages.clone(), bus)),
        get_message_usecase: Arc::new(GetMessageUseCase::new(messages)),
    });

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);
    info!(%server_url, "starting server");

    let api_service = OpenApiService::new(
        (
            Endpoints,
            DeliveryEndpoints::new(state.clone()),
            MessagesEndpoints::new(state),
        ),
        "Delivery API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{}/api", server_url));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    let result = Server::new(TcpListener::bind(format!("0.0.0.0:{}", config.port)))
        .run_with_graceful_shutdown(
            app,
            async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    warn!(error = %err, "failed to listen for shutdown signal");
                }
                info!("shutdown signal received");
            },
            Some(Duration::from_secs(10)),
        )
        .await;

    for worker in &workers {
        worker.abort();
    }
    info!(workers = workers.len(), "consumer workers stopped");

    Ok(result?)
}
