use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::{
    crud,
    error::ApiError,
    models::{
        ComentarioHorario, CompartirHorario, DetalleHorario, DetalleMateria, HorarioMateria,
        HorarioUsuario, Materia, Order, Permiso, Rol, Usuario, COMENTARIOS_HORARIO_COLUMNS,
        COMPARTIR_HORARIO_COLUMNS, DETALLES_HORARIOS_COLUMNS, DETALLES_MATERIAS_COLUMNS,
        HORARIOS_MATERIAS_COLUMNS, HORARIOS_USUARIOS_COLUMNS, MATERIAS_COLUMNS, ORDERS_COLUMNS,
        PERMISOS_COLUMNS, ROLES_COLUMNS, USUARIOS_COLUMNS,
    },
    schedule,
    AppState,
};

pub async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true, "timestamp": Utc::now() }))
}

//
// ROLES
//

pub async fn create_rol(
    State(state): State<AppState>,
    Json(payload): Json<Rol>,
) -> Result<Json<Rol>, ApiError> {
    let conn = state.db.lock().await;
    crud::insert(&conn, "ROLES", &payload)?;
    Ok(Json(payload))
}

pub async fn get_roles(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(&conn, "ROLES", ROLES_COLUMNS)?))
}

pub async fn get_rol(
    State(state): State<AppState>,
    Path(rol_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "ROLES",
        "id",
        rol_id,
        ROLES_COLUMNS,
    )?))
}

pub async fn update_rol(
    State(state): State<AppState>,
    Path(rol_id): Path<i64>,
    Json(payload): Json<Rol>,
) -> Result<Json<Rol>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "ROLES", "id", rol_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_rol(
    State(state): State<AppState>,
    Path(rol_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "ROLES", "id", rol_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// PERMISOS
//

pub async fn create_permiso(
    State(state): State<AppState>,
    Json(payload): Json<Permiso>,
) -> Result<Json<Permiso>, ApiError> {
    let conn = state.db.lock().await;
    crud::insert(&conn, "PERMISOS", &payload)?;
    Ok(Json(payload))
}

pub async fn get_permisos(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(&conn, "PERMISOS", PERMISOS_COLUMNS)?))
}

pub async fn get_permiso(
    State(state): State<AppState>,
    Path(permiso_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "PERMISOS",
        "id",
        permiso_id,
        PERMISOS_COLUMNS,
    )?))
}

pub async fn update_permiso(
    State(state): State<AppState>,
    Path(permiso_id): Path<i64>,
    Json(payload): Json<Permiso>,
) -> Result<Json<Permiso>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "PERMISOS", "id", permiso_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_permiso(
    State(state): State<AppState>,
    Path(permiso_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "PERMISOS", "id", permiso_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// USUARIOS
//

pub async fn create_usuario(
    State(state): State<AppState>,
    Json(payload): Json<Usuario>,
) -> Result<Json<Usuario>, ApiError> {
    let conn = state.db.lock().await;
    crud::insert(&conn, "USUARIOS", &payload)?;
    Ok(Json(payload))
}

pub async fn get_usuarios(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(&conn, "USUARIOS", USUARIOS_COLUMNS)?))
}

pub async fn get_usuario(
    State(state): State<AppState>,
    Path(usuario_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "USUARIOS",
        "id",
        usuario_id,
        USUARIOS_COLUMNS,
    )?))
}

pub async fn update_usuario(
    State(state): State<AppState>,
    Path(usuario_id): Path<i64>,
    Json(payload): Json<Usuario>,
) -> Result<Json<Usuario>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "USUARIOS", "id", usuario_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_usuario(
    State(state): State<AppState>,
    Path(usuario_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "USUARIOS", "id", usuario_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// HORARIOS USUARIOS
//

pub async fn create_horario_usuario(
    State(state): State<AppState>,
    Json(payload): Json<HorarioUsuario>,
) -> Result<Json<HorarioUsuario>, ApiError> {
    let conn = state.db.lock().await;
    crud::insert(&conn, "HORARIOS_USUARIOS", &payload)?;
    Ok(Json(payload))
}

pub async fn get_horarios_usuarios(
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(
        &conn,
        "HORARIOS_USUARIOS",
        HORARIOS_USUARIOS_COLUMNS,
    )?))
}

pub async fn get_horario_usuario(
    State(state): State<AppState>,
    Path(horario_usuario_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "HORARIOS_USUARIOS",
        "id",
        horario_usuario_id,
        HORARIOS_USUARIOS_COLUMNS,
    )?))
}

pub async fn update_horario_usuario(
    State(state): State<AppState>,
    Path(horario_usuario_id): Path<i64>,
    Json(payload): Json<HorarioUsuario>,
) -> Result<Json<HorarioUsuario>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "HORARIOS_USUARIOS", "id", horario_usuario_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_horario_usuario(
    State(state): State<AppState>,
    Path(horario_usuario_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "HORARIOS_USUARIOS", "id", horario_usuario_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// MATERIAS
//

pub async fn create_materia(
    State(state): State<AppState>,
    Json(payload): Json<Materia>,
) -> Result<Json<Materia>, ApiError> {
    let conn = state.db.lock().await;
    crud::insert(&conn, "MATERIAS", &payload)?;
    Ok(Json(payload))
}

pub async fn get_materias(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(&conn, "MATERIAS", MATERIAS_COLUMNS)?))
}

pub async fn get_materia(
    State(state): State<AppState>,
    Path(materia_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "MATERIAS",
        "id",
        materia_id,
        MATERIAS_COLUMNS,
    )?))
}

pub async fn update_materia(
    State(state): State<AppState>,
    Path(materia_id): Path<i64>,
    Json(payload): Json<Materia>,
) -> Result<Json<Materia>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "MATERIAS", "id", materia_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_materia(
    State(state): State<AppState>,
    Path(materia_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "MATERIAS", "id", materia_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// DETALLES MATERIAS
//

pub async fn create_detalle_materia(
    State(state): State<AppState>,
    Json(payload): Json<DetalleMateria>,
) -> Result<Json<DetalleMateria>, ApiError> {
    let conn = state.db.lock().await;
    crud::insert(&conn, "DETALLES_MATERIAS", &payload)?;
    Ok(Json(payload))
}

pub async fn get_detalles_materias(
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(
        &conn,
        "DETALLES_MATERIAS",
        DETALLES_MATERIAS_COLUMNS,
    )?))
}

pub async fn get_detalle_materia(
    State(state): State<AppState>,
    Path(detalle_materia_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "DETALLES_MATERIAS",
        "id",
        detalle_materia_id,
        DETALLES_MATERIAS_COLUMNS,
    )?))
}

pub async fn update_detalle_materia(
    State(state): State<AppState>,
    Path(detalle_materia_id): Path<i64>,
    Json(payload): Json<DetalleMateria>,
) -> Result<Json<DetalleMateria>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "DETALLES_MATERIAS", "id", detalle_materia_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_detalle_materia(
    State(state): State<AppState>,
    Path(detalle_materia_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "DETALLES_MATERIAS", "id", detalle_materia_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// HORARIOS MATERIAS
//

pub async fn create_horario_materia(
    State(state): State<AppState>,
    Json(payload): Json<HorarioMateria>,
) -> Result<Json<HorarioMateria>, ApiError> {
    let conn = state.db.lock().await;
    crud::insert(&conn, "HORARIOS_MATERIAS", &payload)?;
    Ok(Json(payload))
}

pub async fn get_horarios_materias(
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(
        &conn,
        "HORARIOS_MATERIAS",
        HORARIOS_MATERIAS_COLUMNS,
    )?))
}

pub async fn get_horario_materia(
    State(state): State<AppState>,
    Path(horario_materia_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "HORARIOS_MATERIAS",
        "id",
        horario_materia_id,
        HORARIOS_MATERIAS_COLUMNS,
    )?))
}

pub async fn update_horario_materia(
    State(state): State<AppState>,
    Path(horario_materia_id): Path<i64>,
    Json(payload): Json<HorarioMateria>,
) -> Result<Json<HorarioMateria>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "HORARIOS_MATERIAS", "id", horario_materia_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_horario_materia(
    State(state): State<AppState>,
    Path(horario_materia_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "HORARIOS_MATERIAS", "id", horario_materia_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// DETALLES HORARIOS
//

pub async fn create_detalle_horario(
    State(state): State<AppState>,
    Json(payload): Json<DetalleHorario>,
) -> Result<Json<DetalleHorario>, ApiError> {
    let conn = state.db.lock().await;
    crud::insert(&conn, "DETALLES_HORARIOS", &payload)?;
    Ok(Json(payload))
}

pub async fn get_detalles_horarios(
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(
        &conn,
        "DETALLES_HORARIOS",
        DETALLES_HORARIOS_COLUMNS,
    )?))
}

pub async fn get_detalle_horario(
    State(state): State<AppState>,
    Path(detalle_horario_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "DETALLES_HORARIOS",
        "id",
        detalle_horario_id,
        DETALLES_HORARIOS_COLUMNS,
    )?))
}

pub async fn update_detalle_horario(
    State(state): State<AppState>,
    Path(detalle_horario_id): Path<i64>,
    Json(payload): Json<DetalleHorario>,
) -> Result<Json<DetalleHorario>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "DETALLES_HORARIOS", "id", detalle_horario_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_detalle_horario(
    State(state): State<AppState>,
    Path(detalle_horario_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "DETALLES_HORARIOS", "id", detalle_horario_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// COMPARTIR HORARIO
//

pub async fn create_compartir_horario(
    State(state): State<AppState>,
    Json(mut payload): Json<CompartirHorario>,
) -> Result<Json<CompartirHorario>, ApiError> {
    // An empty token means "generate one for me".
    if payload.url_acceso.trim().is_empty() {
        payload.url_acceso = Uuid::new_v4().to_string();
    }
    let conn = state.db.lock().await;
    crud::insert(&conn, "COMPARTIR_HORARIO", &payload)?;
    info!(url_acceso = %payload.url_acceso, "Share link created");
    Ok(Json(payload))
}

pub async fn get_compartir_horarios(
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(
        &conn,
        "COMPARTIR_HORARIO",
        COMPARTIR_HORARIO_COLUMNS,
    )?))
}

pub async fn get_compartir_horario(
    State(state): State<AppState>,
    Path(compartir_horario_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "COMPARTIR_HORARIO",
        "id",
        compartir_horario_id,
        COMPARTIR_HORARIO_COLUMNS,
    )?))
}

pub async fn update_compartir_horario(
    State(state): State<AppState>,
    Path(compartir_horario_id): Path<i64>,
    Json(payload): Json<CompartirHorario>,
) -> Result<Json<CompartirHorario>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "COMPARTIR_HORARIO", "id", compartir_horario_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_compartir_horario(
    State(state): State<AppState>,
    Path(compartir_horario_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "COMPARTIR_HORARIO", "id", compartir_horario_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// COMENTARIOS HORARIO
//

pub async fn create_comentario_horario(
    State(state): State<AppState>,
    Json(payload): Json<ComentarioHorario>,
) -> Result<Json<ComentarioHorario>, ApiError> {
    let conn = state.db.lock().await;
    crud::insert(&conn, "COMENTARIOS_HORARIO", &payload)?;
    Ok(Json(payload))
}

pub async fn get_comentarios_horarios(
    State(state): State<AppState>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(
        &conn,
        "COMENTARIOS_HORARIO",
        COMENTARIOS_HORARIO_COLUMNS,
    )?))
}

pub async fn get_comentario_horario(
    State(state): State<AppState>,
    Path(comentario_horario_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "COMENTARIOS_HORARIO",
        "id",
        comentario_horario_id,
        COMENTARIOS_HORARIO_COLUMNS,
    )?))
}

pub async fn update_comentario_horario(
    State(state): State<AppState>,
    Path(comentario_horario_id): Path<i64>,
    Json(payload): Json<ComentarioHorario>,
) -> Result<Json<ComentarioHorario>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "COMENTARIOS_HORARIO", "id", comentario_horario_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_comentario_horario(
    State(state): State<AppState>,
    Path(comentario_horario_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "COMENTARIOS_HORARIO", "id", comentario_horario_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// ORDERS
//

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<Order>,
) -> Result<Json<Order>, ApiError> {
    let conn = state.db.lock().await;
    crud::insert(&conn, "ORDERS", &payload)?;
    Ok(Json(payload))
}

pub async fn get_orders(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_all(&conn, "ORDERS", ORDERS_COLUMNS)?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    Ok(Json(crud::select_by_id(
        &conn,
        "ORDERS",
        "order_id",
        order_id,
        ORDERS_COLUMNS,
    )?))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(payload): Json<Order>,
) -> Result<Json<Order>, ApiError> {
    let conn = state.db.lock().await;
    crud::update_by_id(&conn, "ORDERS", "order_id", order_id, &payload)?;
    Ok(Json(payload))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let conn = state.db.lock().await;
    crud::delete_by_id(&conn, "ORDERS", "order_id", order_id)?;
    Ok(Json(json!({ "message": "Record deleted" })))
}

//
// OBTENER HORARIO
//

pub async fn obtener_horario(
    State(state): State<AppState>,
    Path(url_acceso): Path<String>,
) -> Result<Json<Vec<schedule::HorarioCompartido>>, ApiError> {
    let conn = state.db.lock().await;

    // A shared schedule with no materias produces zero join rows, so the
    // share link itself decides found vs. not found.
    let known: Option<i64> = conn
        .query_row(
            "SELECT id FROM COMPARTIR_HORARIO WHERE url_acceso = ?1",
            params![url_acceso],
            |row| row.get(0),
        )
        .optional()?;
    if known.is_none() {
        return Err(ApiError::NotFound(format!(
            "COMPARTIR_HORARIO url_acceso = {url_acceso}"
        )));
    }

    let rows = schedule::fetch_schedule_rows(&conn, &url_acceso)?;
    let documents = schedule::build_tree(rows)?;
    Ok(Json(documents))
}
