mod api;
mod config;
mod crud;
mod db;
mod error;
mod models;
mod schedule;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use config::Config;
use db::Db;
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "horarios_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    let conn = db::open(&config.db_path)?;
    db::create_tables(&conn)?;

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    let app = Router::new()
        .route("/healthz", get(api::healthz))
        .route("/roles", post(api::create_rol).get(api::get_roles))
        .route(
            "/roles/{rol_id}",
            get(api::get_rol).put(api::update_rol).delete(api::delete_rol),
        )
        .route("/permisos", post(api::create_permiso).get(api::get_permisos))
        .route(
            "/permisos/{permiso_id}",
            get(api::get_permiso)
                .put(api::update_permiso)
                .delete(api::delete_permiso),
        )
        .route("/usuarios", post(api::create_usuario).get(api::get_usuarios))
        .route(
            "/usuarios/{usuario_id}",
            get(api::get_usuario)
                .put(api::update_usuario)
                .delete(api::delete_usuario),
        )
        .route(
            "/horarios_usuarios",
            post(api::create_horario_usuario).get(api::get_horarios_usuarios),
        )
        .route(
            "/horarios_usuarios/{horario_usuario_id}",
            get(api::get_horario_usuario)
                .put(api::update_horario_usuario)
                .delete(api::delete_horario_usuario),
        )
        .route("/materias", post(api::create_materia).get(api::get_materias))
        .route(
            "/materias/{materia_id}",
            get(api::get_materia)
                .put(api::update_materia)
                .delete(api::delete_materia),
        )
        .route(
            "/detalles_materias",
            post(api::create_detalle_materia).get(api::get_detalles_materias),
        )
        .route(
            "/detalles_materias/{detalle_materia_id}",
            get(api::get_detalle_materia)
                .put(api::update_detalle_materia)
                .delete(api::delete_detalle_materia),
        )
        .route(
            "/horarios_materias",
            post(api::create_horario_materia).get(api::get_horarios_materias),
        )
        .route(
            "/horarios_materias/{horario_materia_id}",
            get(api::get_horario_materia)
                .put(api::update_horario_materia)
                .delete(api::delete_horario_materia),
        )
        .route(
            "/detalles_horarios",
            post(api::create_detalle_horario).get(api::get_detalles_horarios),
        )
        .route(
            "/detalles_horarios/{detalle_horario_id}",
            get(api::get_detalle_horario)
                .put(api::update_detalle_horario)
                .delete(api::delete_detalle_horario),
        )
        .route(
            "/compartir_horario",
            post(api::create_compartir_horario).get(api::get_compartir_horarios),
        )
        .route(
            "/compartir_horario/{compartir_horario_id}",
            get(api::get_compartir_horario)
                .put(api::update_compartir_horario)
                .delete(api::delete_compartir_horario),
        )
        .route(
            "/comentarios_horario",
            post(api::create_comentario_horario).get(api::get_comentarios_horarios),
        )
        .route(
            "/comentarios_horario/{comentario_horario_id}",
            get(api::get_comentario_horario)
                .put(api::update_comentario_horario)
                .delete(api::delete_comentario_horario),
        )
        .route("/orders", post(api::create_order).get(api::get_orders))
        .route(
            "/orders/{order_id}",
            get(api::get_order)
                .put(api::update_order)
                .delete(api::delete_order),
        )
        .route("/obtener_horario/{url_acceso}", get(api::obtener_horario))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("horarios-api listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
