use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rol {
    pub nombre: String,
}

pub const ROLES_COLUMNS: &[&str] = &["id", "nombre"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permiso {
    pub id_rol: i64,
    pub leer: i64,
    pub escribir: i64,
    pub eliminar: i64,
    pub modificar: i64,
    pub tabla: Option<String>,
}

pub const PERMISOS_COLUMNS: &[&str] = &[
    "id",
    "id_rol",
    "leer",
    "escribir",
    "eliminar",
    "modificar",
    "tabla",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usuario {
    pub id_rol: i64,
    pub nombre: String,
    pub email: String,
    pub contrasena: String,
}

pub const USUARIOS_COLUMNS: &[&str] = &["id", "id_rol", "nombre", "email", "contrasena"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorarioUsuario {
    pub id_usuario: i64,
    pub nombre: String,
}

pub const HORARIOS_USUARIOS_COLUMNS: &[&str] = &["id", "id_usuario", "nombre"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Materia {
    pub id_horario: i64,
    pub nombre: String,
    pub color: String,
}

pub const MATERIAS_COLUMNS: &[&str] = &["id", "id_horario", "nombre", "color"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetalleMateria {
    pub id_materia: i64,
    pub descripcion: String,
    pub mostrar: i64,
}

pub const DETALLES_MATERIAS_COLUMNS: &[&str] = &["id", "id_materia", "descripcion", "mostrar"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorarioMateria {
    pub id_materia: i64,
    pub dia: String,
    pub hora_inicio: String,
    pub hora_fin: String,
}

pub const HORARIOS_MATERIAS_COLUMNS: &[&str] =
    &["id", "id_materia", "dia", "hora_inicio", "hora_fin"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetalleHorario {
    pub id_horario_materia: i64,
    pub descripcion: String,
    pub mostrar: i64,
}

pub const DETALLES_HORARIOS_COLUMNS: &[&str] =
    &["id", "id_horario_materia", "descripcion", "mostrar"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompartirHorario {
    pub url_acceso: String,
    pub id_horario: i64,
}

pub const COMPARTIR_HORARIO_COLUMNS: &[&str] = &["id", "url_acceso", "id_horario"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComentarioHorario {
    pub id_horario: i64,
    pub comentario: String,
    pub id_usuario: i64,
    pub publicado: DateTime<Utc>,
}

pub const COMENTARIOS_HORARIO_COLUMNS: &[&str] =
    &["id", "id_horario", "comentario", "id_usuario", "publicado"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub product_name: String,
    pub quantity: i64,
}

pub const ORDERS_COLUMNS: &[&str] = &["order_id", "product_name", "quantity"];
