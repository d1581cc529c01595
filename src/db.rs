use std::{path::Path, sync::Arc};

use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::ApiError;

pub type Db = Arc<Mutex<Connection>>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS ROLES (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS PERMISOS (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_rol INTEGER NOT NULL REFERENCES ROLES(id),
    leer INTEGER NOT NULL,
    escribir INTEGER NOT NULL,
    eliminar INTEGER NOT NULL,
    modificar INTEGER NOT NULL,
    tabla TEXT
);
CREATE TABLE IF NOT EXISTS USUARIOS (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_rol INTEGER NOT NULL REFERENCES ROLES(id),
    nombre TEXT NOT NULL,
    email TEXT NOT NULL,
    contrasena TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS HORARIOS_USUARIOS (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_usuario INTEGER NOT NULL REFERENCES USUARIOS(id),
    nombre TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS MATERIAS (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_horario INTEGER NOT NULL REFERENCES HORARIOS_USUARIOS(id),
    nombre TEXT NOT NULL,
    color TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS DETALLES_MATERIAS (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_materia INTEGER NOT NULL REFERENCES MATERIAS(id),
    descripcion TEXT,
    mostrar INTEGER
);
CREATE TABLE IF NOT EXISTS HORARIOS_MATERIAS (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_materia INTEGER NOT NULL REFERENCES MATERIAS(id),
    dia TEXT NOT NULL,
    hora_inicio TEXT NOT NULL,
    hora_fin TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS DETALLES_HORARIOS (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_horario_materia INTEGER NOT NULL REFERENCES HORARIOS_MATERIAS(id),
    descripcion TEXT,
    mostrar INTEGER
);
CREATE TABLE IF NOT EXISTS COMPARTIR_HORARIO (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url_acceso TEXT NOT NULL UNIQUE,
    id_horario INTEGER NOT NULL REFERENCES HORARIOS_USUARIOS(id)
);
CREATE TABLE IF NOT EXISTS COMENTARIOS_HORARIO (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    id_horario INTEGER NOT NULL REFERENCES HORARIOS_USUARIOS(id),
    comentario TEXT NOT NULL,
    id_usuario INTEGER NOT NULL REFERENCES USUARIOS(id),
    publicado TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS ORDERS (
    order_id INTEGER PRIMARY KEY,
    product_name TEXT NOT NULL,
    quantity INTEGER NOT NULL
);
";

pub fn open(path: &Path) -> Result<Connection, ApiError> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

pub fn create_tables(conn: &Connection) -> Result<(), ApiError> {
    conn.execute_batch(SCHEMA)?;
    info!("Database schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::create_tables;
    use rusqlite::Connection;

    #[test]
    fn create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        create_tables(&conn).expect("first run");
        create_tables(&conn).expect("second run");

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'MATERIAS'",
                [],
                |row| row.get(0),
            )
            .expect("table lookup");
        assert_eq!(count, 1);
    }
}
