use rusqlite::{params, params_from_iter, types::Value as SqlValue, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;

// Generic statement builders shared by every CRUD endpoint. Table and column
// names come from a fixed in-crate registry, never from the request; all row
// values are bound through placeholders.

fn to_sql_value(value: &Value) -> Result<SqlValue, ApiError> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(flag) => Ok(SqlValue::Integer(*flag as i64)),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Ok(SqlValue::Integer(int))
            } else if let Some(real) = number.as_f64() {
                Ok(SqlValue::Real(real))
            } else {
                Err(ApiError::Contract(format!(
                    "unrepresentable number in payload: {number}"
                )))
            }
        }
        Value::String(text) => Ok(SqlValue::Text(text.clone())),
        other => Err(ApiError::Contract(format!(
            "unsupported payload value: {other}"
        ))),
    }
}

fn to_json_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(int) => Value::from(int),
        SqlValue::Real(real) => Value::from(real),
        SqlValue::Text(text) => Value::String(text),
        SqlValue::Blob(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

fn payload_columns<T: Serialize>(payload: &T) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ApiError::Contract(format!(
            "payload must serialize to an object, got {other}"
        ))),
        Err(err) => Err(ApiError::Contract(err.to_string())),
    }
}

fn read_record(row: &rusqlite::Row<'_>, columns: &[&str]) -> rusqlite::Result<Value> {
    let mut record = Map::new();
    for (idx, column) in columns.iter().enumerate() {
        record.insert(
            (*column).to_string(),
            to_json_value(row.get::<_, SqlValue>(idx)?),
        );
    }
    Ok(Value::Object(record))
}

pub fn insert<T: Serialize>(conn: &Connection, table: &str, payload: &T) -> Result<(), ApiError> {
    let map = payload_columns(payload)?;
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    let placeholders: Vec<String> = (1..=keys.len()).map(|idx| format!("?{idx}")).collect();
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        keys.join(", "),
        placeholders.join(", ")
    );
    let values = map
        .values()
        .map(to_sql_value)
        .collect::<Result<Vec<_>, _>>()?;
    conn.execute(&sql, params_from_iter(values))?;
    Ok(())
}

pub fn select_all(
    conn: &Connection,
    table: &str,
    columns: &[&str],
) -> Result<Vec<Value>, ApiError> {
    let sql = format!("SELECT {} FROM {table}", columns.join(", "));
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| read_record(row, columns))?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

pub fn select_by_id(
    conn: &Connection,
    table: &str,
    key: &str,
    id: i64,
    columns: &[&str],
) -> Result<Value, ApiError> {
    let sql = format!("SELECT {} FROM {table} WHERE {key} = ?1", columns.join(", "));
    let mut stmt = conn.prepare(&sql)?;
    let record = stmt
        .query_row(params![id], |row| read_record(row, columns))
        .optional()?;
    record.ok_or_else(|| ApiError::NotFound(format!("{table} {key} = {id}")))
}

pub fn update_by_id<T: Serialize>(
    conn: &Connection,
    table: &str,
    key: &str,
    id: i64,
    payload: &T,
) -> Result<(), ApiError> {
    let map = payload_columns(payload)?;
    let assignments: Vec<String> = map
        .keys()
        .enumerate()
        .map(|(idx, column)| format!("{column} = ?{}", idx + 1))
        .collect();
    let sql = format!(
        "UPDATE {table} SET {} WHERE {key} = ?{}",
        assignments.join(", "),
        map.len() + 1
    );
    let mut values = map
        .values()
        .map(to_sql_value)
        .collect::<Result<Vec<_>, _>>()?;
    values.push(SqlValue::Integer(id));
    let affected = conn.execute(&sql, params_from_iter(values))?;
    if affected == 0 {
        return Err(ApiError::NotFound(format!("{table} {key} = {id}")));
    }
    Ok(())
}

pub fn delete_by_id(conn: &Connection, table: &str, key: &str, id: i64) -> Result<(), ApiError> {
    let affected = conn.execute(&format!("DELETE FROM {table} WHERE {key} = ?1"), params![id])?;
    if affected == 0 {
        return Err(ApiError::NotFound(format!("{table} {key} = {id}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{delete_by_id, insert, select_all, select_by_id, update_by_id};
    use crate::{
        db::create_tables,
        error::ApiError,
        models::{Rol, ROLES_COLUMNS},
    };
    use rusqlite::Connection;
    use serde_json::json;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        create_tables(&conn).expect("schema");
        conn
    }

    #[test]
    fn insert_then_select_round_trips_columns() {
        let conn = test_conn();
        insert(
            &conn,
            "ROLES",
            &Rol {
                nombre: "profesor".to_string(),
            },
        )
        .expect("insert");

        let record = select_by_id(&conn, "ROLES", "id", 1, ROLES_COLUMNS).expect("select");
        assert_eq!(record["id"], json!(1));
        assert_eq!(record["nombre"], json!("profesor"));
    }

    #[test]
    fn select_all_lists_every_row() {
        let conn = test_conn();
        for nombre in ["alumno", "profesor", "admin"] {
            insert(
                &conn,
                "ROLES",
                &Rol {
                    nombre: nombre.to_string(),
                },
            )
            .expect("insert");
        }

        let records = select_all(&conn, "ROLES", ROLES_COLUMNS).expect("select all");
        assert_eq!(records.len(), 3);
        assert_eq!(records[1]["nombre"], json!("profesor"));
    }

    #[test]
    fn update_missing_row_is_not_found() {
        let conn = test_conn();
        let err = update_by_id(
            &conn,
            "ROLES",
            "id",
            99,
            &Rol {
                nombre: "nadie".to_string(),
            },
        )
        .expect_err("no row to update");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn update_rewrites_payload_columns() {
        let conn = test_conn();
        insert(
            &conn,
            "ROLES",
            &Rol {
                nombre: "alumno".to_string(),
            },
        )
        .expect("insert");
        update_by_id(
            &conn,
            "ROLES",
            "id",
            1,
            &Rol {
                nombre: "delegado".to_string(),
            },
        )
        .expect("update");

        let record = select_by_id(&conn, "ROLES", "id", 1, ROLES_COLUMNS).expect("select");
        assert_eq!(record["nombre"], json!("delegado"));
    }

    #[test]
    fn delete_missing_row_is_not_found() {
        let conn = test_conn();
        let err = delete_by_id(&conn, "ROLES", "id", 1).expect_err("nothing to delete");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn null_and_bool_payload_values_are_storable() {
        let conn = test_conn();
        insert(&conn, "ROLES", &Rol { nombre: "admin".to_string() }).expect("insert rol");
        insert(
            &conn,
            "PERMISOS",
            &json!({
                "id_rol": 1,
                "leer": true,
                "escribir": false,
                "eliminar": 0,
                "modificar": 1,
                "tabla": null
            }),
        )
        .expect("insert permiso");

        let record = select_by_id(
            &conn,
            "PERMISOS",
            "id",
            1,
            crate::models::PERMISOS_COLUMNS,
        )
        .expect("select");
        assert_eq!(record["leer"], json!(1));
        assert_eq!(record["escribir"], json!(0));
        assert_eq!(record["tabla"], json!(null));
    }

    #[test]
    fn nested_payload_values_are_rejected() {
        let conn = test_conn();
        let err = insert(&conn, "ROLES", &json!({ "nombre": ["not", "a", "scalar"] }))
            .expect_err("nested value");
        assert!(matches!(err, ApiError::Contract(_)));
    }
}
