use actix_files::Files;
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use clap::Parser;
use log::info;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use goflow::cloud::controller::{CloudController, ControllerError};
use goflow::cloud::filter::CategoryFilter;
use goflow::datasets::json_source::JsonFileSource;
use goflow::datasets::registry::{ExperimentRegistry, NewExperiment};
use goflow::datasets::source::DatasetSource;

#[derive(Parser, Debug)]
#[command(name = "goflow", about, version)]
struct CliArgs {
    #[arg(
        long = "data-dir",
        value_name = "DIRECTORY",
        help = "Directory containing the experiment and GO term datasets in JSON format.",
        default_value = "data"
    )]
    data_dir: String,

    #[arg(
        long = "host",
        value_name = "ADDRESS",
        help = "Address to bind the server to.",
        default_value = "127.0.0.1"
    )]
    host: String,

    #[arg(
        long = "port",
        value_name = "PORT",
        help = "Port to bind the server to.",
        default_value_t = 8080
    )]
    port: u16,
}

struct AppState {
    registry: Mutex<ExperimentRegistry>,
    controller: Mutex<CloudController<JsonFileSource>>,
}

fn error_response(error: &ControllerError) -> HttpResponse {
    let body = json!({ "error": error.to_string() });
    match error {
        ControllerError::NoExperimentSelected => HttpResponse::Conflict().json(body),
        ControllerError::StaleSelection(_) => HttpResponse::NotFound().json(body),
        ControllerError::Dataset(_) => HttpResponse::BadGateway().json(body),
    }
}

async fn list_experiments(state: web::Data<AppState>) -> HttpResponse {
    let registry = state.registry.lock().await;
    HttpResponse::Ok().json(registry.all())
}

async fn add_experiment(
    state: web::Data<AppState>,
    body: web::Json<NewExperiment>,
) -> HttpResponse {
    let mut registry = state.registry.lock().await;
    let experiment = registry.append(body.into_inner());
    info!(
        "registered experiment {} ('{}')",
        experiment.experiment_id, experiment.name
    );
    HttpResponse::Created().json(experiment)
}

async fn select_experiment(state: web::Data<AppState>, path: web::Path<u32>) -> HttpResponse {
    let experiment_id = path.into_inner();
    let experiment = {
        let registry = state.registry.lock().await;
        registry.get(experiment_id).cloned()
    };
    let Some(experiment) = experiment else {
        return HttpResponse::NotFound().json(json!({
            "error": format!("unknown experiment {experiment_id}")
        }));
    };
    let mut controller = state.controller.lock().await;
    match controller.select_experiment(experiment).await {
        Ok(()) => HttpResponse::Ok().json(controller.visible_terms()),
        Err(e) => error_response(&e),
    }
}

async fn cloud_view(state: web::Data<AppState>) -> HttpResponse {
    let controller = state.controller.lock().await;
    HttpResponse::Ok().json(json!({
        "state": controller.view_state(),
        "experiment": controller.selected_experiment(),
        "filters": controller.filters(),
        "terms": controller.visible_terms(),
    }))
}

#[derive(Debug, Deserialize)]
struct FilterUpdate {
    category: Option<CategoryFilter>,
    min_enrichment: Option<f64>,
}

async fn change_filter(state: web::Data<AppState>, body: web::Json<FilterUpdate>) -> HttpResponse {
    let update = body.into_inner();
    let min_enrichment = update.min_enrichment.map(|value| value.max(0.0));
    let mut controller = state.controller.lock().await;
    match controller.change_filter(update.category, min_enrichment).await {
        Ok(()) => HttpResponse::Ok().json(controller.visible_terms()),
        Err(e) => error_response(&e),
    }
}

async fn select_term(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let go_id = path.into_inner();
    let mut controller = state.controller.lock().await;
    match controller.select_term(&go_id).await {
        Ok(term) => HttpResponse::Ok().json(term),
        Err(e) => error_response(&e),
    }
}

async fn back_to_cloud(state: web::Data<AppState>) -> HttpResponse {
    let mut controller = state.controller.lock().await;
    controller.back();
    HttpResponse::Ok().json(json!({ "state": controller.view_state() }))
}

async fn summary(state: web::Data<AppState>) -> HttpResponse {
    let experiments = {
        let registry = state.registry.lock().await;
        registry.all().to_vec()
    };
    let controller = state.controller.lock().await;
    let mut rows = Vec::with_capacity(experiments.len());
    for experiment in &experiments {
        let go_term_count = controller.term_count(experiment).await;
        rows.push(json!({
            "experiment_id": experiment.experiment_id,
            "name": experiment.name,
            "organism_name": experiment.organism_name,
            "go_term_count": go_term_count,
        }));
    }
    HttpResponse::Ok().json(rows)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli_args = CliArgs::parse();

    let source = JsonFileSource::new(&cli_args.data_dir);
    let seed = source
        .experiments()
        .await
        .with_context(|| format!("reading experiment list from '{}'", cli_args.data_dir))?;
    info!(
        "loaded {} experiments from {}",
        seed.len(),
        cli_args.data_dir
    );

    let state = web::Data::new(AppState {
        registry: Mutex::new(ExperimentRegistry::new(seed)),
        controller: Mutex::new(CloudController::new(source)),
    });

    info!(
        "starting GoFlow server on {}:{}",
        cli_args.host, cli_args.port
    );
    let data_dir = cli_args.data_dir.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .route("/api/experiments", web::get().to(list_experiments))
            .route("/api/experiments", web::post().to(add_experiment))
            .route(
                "/api/experiments/{id}/select",
                web::post().to(select_experiment),
            )
            .route("/api/cloud", web::get().to(cloud_view))
            .route("/api/filters", web::put().to(change_filter))
            .route("/api/terms/{go_id}/select", web::post().to(select_term))
            .route("/api/back", web::post().to(back_to_cloud))
            .route("/api/summary", web::get().to(summary))
            .service(Files::new("/data", data_dir.clone()))
    })
    .bind((cli_args.host.as_str(), cli_args.port))
    .with_context(|| format!("binding {}:{}", cli_args.host, cli_args.port))?
    .run()
    .await?;

    Ok(())
}
