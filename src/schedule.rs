use std::collections::{HashMap, HashSet};

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::ApiError;

// One row of the denormalized share query. The detail and comment columns are
// nullable because their tables are left-joined; the materia and hour-block
// columns are inner-joined and a null there means the contract is broken.
#[derive(Debug, Clone)]
pub struct ScheduleRow {
    pub url_compartido: String,
    pub nombre_horario: String,
    pub materia_id: Option<i64>,
    pub materia_nombre: Option<String>,
    pub materia_color: Option<String>,
    pub detalle_materia_descripcion: Option<String>,
    pub detalle_materia_mostrar: Option<i64>,
    pub bloque_id: Option<i64>,
    pub dia: Option<String>,
    pub hora_inicio: Option<String>,
    pub hora_fin: Option<String>,
    pub detalle_bloque_descripcion: Option<String>,
    pub detalle_bloque_mostrar: Option<i64>,
    pub comentario: Option<String>,
    pub publicado: Option<String>,
    pub nombre_usuario: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comentario {
    pub comentario: String,
    pub fecha: String,
    pub nombre_usuario: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detalle {
    pub descripcion: String,
    pub mostrar: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BloqueHorario {
    pub id: i64,
    pub dia: String,
    pub hora_inicio: String,
    pub hora_fin: String,
    pub descripciones: Vec<Detalle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MateriaHorario {
    pub id: i64,
    pub nombre: String,
    pub color: String,
    pub descripciones: Vec<Detalle>,
    pub horarios: Vec<BloqueHorario>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorarioCompartido {
    pub url_compartido: String,
    pub nombre_horario: String,
    pub comentarios: Vec<Comentario>,
    pub materias: Vec<MateriaHorario>,
}

const SCHEDULE_QUERY: &str = "\
SELECT ch.url_acceso, hu.nombre, \
       m.id, m.nombre, m.color, \
       dm.descripcion, dm.mostrar, \
       hm.id, hm.dia, hm.hora_inicio, hm.hora_fin, \
       dh.descripcion, dh.mostrar, \
       c.comentario, c.publicado, u.nombre \
FROM COMPARTIR_HORARIO ch \
JOIN HORARIOS_USUARIOS hu ON hu.id = ch.id_horario \
JOIN MATERIAS m ON m.id_horario = hu.id \
JOIN HORARIOS_MATERIAS hm ON hm.id_materia = m.id \
LEFT JOIN DETALLES_MATERIAS dm ON dm.id_materia = m.id \
LEFT JOIN DETALLES_HORARIOS dh ON dh.id_horario_materia = hm.id \
LEFT JOIN COMENTARIOS_HORARIO c ON c.id_horario = hu.id \
LEFT JOIN USUARIOS u ON u.id = c.id_usuario \
WHERE ch.url_acceso = ?1";

pub fn fetch_schedule_rows(
    conn: &Connection,
    url_acceso: &str,
) -> Result<Vec<ScheduleRow>, ApiError> {
    let mut stmt = conn.prepare(SCHEDULE_QUERY)?;
    let rows = stmt.query_map(params![url_acceso], |row| {
        Ok(ScheduleRow {
            url_compartido: row.get(0)?,
            nombre_horario: row.get(1)?,
            materia_id: row.get(2)?,
            materia_nombre: row.get(3)?,
            materia_color: row.get(4)?,
            detalle_materia_descripcion: row.get(5)?,
            detalle_materia_mostrar: row.get(6)?,
            bloque_id: row.get(7)?,
            dia: row.get(8)?,
            hora_inicio: row.get(9)?,
            hora_fin: row.get(10)?,
            detalle_bloque_descripcion: row.get(11)?,
            detalle_bloque_mostrar: row.get(12)?,
            comentario: row.get(13)?,
            publicado: row.get(14)?,
            nombre_usuario: row.get(15)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::Contract(format!("schedule row missing {field}")))
}

/// Collapses the flat join result into one nested document per share URL.
///
/// Documents, materias and hour blocks keep first-occurrence order; the index
/// maps exist only to fold the join fan-out back into single entities and are
/// dropped when the build finishes. Only the first detail row the join emits
/// for a materia or an hour block is kept; later detail rows under the same
/// key are dropped.
pub fn build_tree(rows: Vec<ScheduleRow>) -> Result<Vec<HorarioCompartido>, ApiError> {
    let mut documents: Vec<HorarioCompartido> = Vec::new();
    let mut document_index: HashMap<String, usize> = HashMap::new();
    let mut materia_index: HashMap<(String, i64), (usize, usize)> = HashMap::new();
    let mut bloque_index: HashSet<(String, i64, i64)> = HashSet::new();

    for row in rows {
        let ScheduleRow {
            url_compartido,
            nombre_horario,
            materia_id,
            materia_nombre,
            materia_color,
            detalle_materia_descripcion,
            detalle_materia_mostrar,
            bloque_id,
            dia,
            hora_inicio,
            hora_fin,
            detalle_bloque_descripcion,
            detalle_bloque_mostrar,
            comentario,
            publicado,
            nombre_usuario,
        } = row;

        let materia_id = required(materia_id, "materia id")?;
        let materia_nombre = required(materia_nombre, "materia nombre")?;
        let materia_color = required(materia_color, "materia color")?;
        let bloque_id = required(bloque_id, "hour-block id")?;
        let dia = required(dia, "hour-block dia")?;
        let hora_inicio = required(hora_inicio, "hour-block hora_inicio")?;
        let hora_fin = required(hora_fin, "hour-block hora_fin")?;

        let doc_idx = *document_index
            .entry(url_compartido.clone())
            .or_insert_with(|| {
                documents.push(HorarioCompartido {
                    url_compartido: url_compartido.clone(),
                    nombre_horario,
                    comentarios: Vec::new(),
                    materias: Vec::new(),
                });
                documents.len() - 1
            });

        if let (Some(comentario), Some(fecha), Some(nombre_usuario)) =
            (comentario, publicado, nombre_usuario)
        {
            let candidate = Comentario {
                comentario,
                fecha,
                nombre_usuario,
            };
            let comentarios = &mut documents[doc_idx].comentarios;
            if !comentarios.contains(&candidate) {
                comentarios.push(candidate);
            }
        }

        let (materia_doc, materia_pos) = *materia_index
            .entry((url_compartido.clone(), materia_id))
            .or_insert_with(|| {
                let mut materia = MateriaHorario {
                    id: materia_id,
                    nombre: materia_nombre,
                    color: materia_color.to_lowercase(),
                    descripciones: Vec::new(),
                    horarios: Vec::new(),
                };
                if let Some(descripcion) =
                    detalle_materia_descripcion.filter(|text| !text.is_empty())
                {
                    materia.descripciones.push(Detalle {
                        descripcion,
                        mostrar: detalle_materia_mostrar,
                    });
                }
                let materias = &mut documents[doc_idx].materias;
                materias.push(materia);
                (doc_idx, materias.len() - 1)
            });

        if bloque_index.insert((url_compartido, materia_id, bloque_id)) {
            let mut bloque = BloqueHorario {
                id: bloque_id,
                dia,
                hora_inicio,
                hora_fin,
                descripciones: Vec::new(),
            };
            if let Some(descripcion) = detalle_bloque_descripcion.filter(|text| !text.is_empty()) {
                bloque.descripciones.push(Detalle {
                    descripcion,
                    mostrar: detalle_bloque_mostrar,
                });
            }
            documents[materia_doc].materias[materia_pos].horarios.push(bloque);
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::{build_tree, fetch_schedule_rows, ScheduleRow};
    use crate::{db::create_tables, error::ApiError};
    use rusqlite::Connection;

    fn row(url: &str, materia_id: i64, bloque_id: i64) -> ScheduleRow {
        ScheduleRow {
            url_compartido: url.to_string(),
            nombre_horario: "Semestre 2026-1".to_string(),
            materia_id: Some(materia_id),
            materia_nombre: Some(format!("Materia {materia_id}")),
            materia_color: Some("Red".to_string()),
            detalle_materia_descripcion: None,
            detalle_materia_mostrar: None,
            bloque_id: Some(bloque_id),
            dia: Some("Lunes".to_string()),
            hora_inicio: Some("08:00".to_string()),
            hora_fin: Some("09:30".to_string()),
            detalle_bloque_descripcion: None,
            detalle_bloque_mostrar: None,
            comentario: None,
            publicado: None,
            nombre_usuario: None,
        }
    }

    fn with_comment(mut base: ScheduleRow, text: &str, fecha: &str, autor: &str) -> ScheduleRow {
        base.comentario = Some(text.to_string());
        base.publicado = Some(fecha.to_string());
        base.nombre_usuario = Some(autor.to_string());
        base
    }

    #[test]
    fn empty_input_yields_no_documents() {
        let documents = build_tree(Vec::new()).expect("build");
        assert!(documents.is_empty());
    }

    #[test]
    fn two_materias_one_bloque_each() {
        let documents =
            build_tree(vec![row("U1", 1, 10), row("U1", 2, 20)]).expect("build");
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].materias.len(), 2);
        assert_eq!(documents[0].materias[0].horarios.len(), 1);
        assert_eq!(documents[0].materias[1].horarios.len(), 1);
        assert!(documents[0].comentarios.is_empty());
    }

    #[test]
    fn fan_out_collapses_to_single_entities() {
        let rows = vec![
            with_comment(row("U1", 5, 9), "primero", "2026-03-01", "ana"),
            with_comment(row("U1", 5, 9), "segundo", "2026-03-02", "ben"),
            with_comment(row("U1", 5, 9), "tercero", "2026-03-03", "eva"),
        ];
        let documents = build_tree(rows).expect("build");
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].materias.len(), 1);
        assert_eq!(documents[0].materias[0].horarios.len(), 1);
        assert_eq!(documents[0].comentarios.len(), 3);
    }

    #[test]
    fn identical_comments_are_counted_once() {
        let rows = vec![
            with_comment(row("U1", 1, 1), "hola", "2026-03-01", "ana"),
            with_comment(row("U1", 1, 2), "hola", "2026-03-01", "ana"),
        ];
        let documents = build_tree(rows).expect("build");
        assert_eq!(documents[0].comentarios.len(), 1);
        assert_eq!(documents[0].materias[0].horarios.len(), 2);
    }

    #[test]
    fn documents_follow_first_occurrence_order() {
        let rows = vec![row("U2", 1, 1), row("U1", 2, 2), row("U2", 3, 3)];
        let documents = build_tree(rows).expect("build");
        let urls: Vec<&str> = documents
            .iter()
            .map(|doc| doc.url_compartido.as_str())
            .collect();
        assert_eq!(urls, vec!["U2", "U1"]);
        assert_eq!(documents[0].materias.len(), 2);
    }

    #[test]
    fn color_is_normalized_to_lowercase() {
        for color in ["RED", "Red", "red"] {
            let mut input = row("U1", 1, 1);
            input.materia_color = Some(color.to_string());
            let documents = build_tree(vec![input]).expect("build");
            assert_eq!(documents[0].materias[0].color, "red");
        }
    }

    #[test]
    fn empty_detail_description_is_skipped() {
        let mut input = row("U1", 1, 1);
        input.detalle_materia_descripcion = Some(String::new());
        input.detalle_bloque_descripcion = None;
        let documents = build_tree(vec![input]).expect("build");
        assert!(documents[0].materias[0].descripciones.is_empty());
        assert!(documents[0].materias[0].horarios[0].descripciones.is_empty());
    }

    #[test]
    fn only_first_detail_per_materia_survives() {
        let mut first = row("U1", 1, 1);
        first.detalle_materia_descripcion = Some("primera".to_string());
        first.detalle_materia_mostrar = Some(1);
        let mut second = row("U1", 1, 2);
        second.detalle_materia_descripcion = Some("segunda".to_string());

        let documents = build_tree(vec![first, second]).expect("build");
        let materia = &documents[0].materias[0];
        assert_eq!(materia.descripciones.len(), 1);
        assert_eq!(materia.descripciones[0].descripcion, "primera");
        assert_eq!(materia.descripciones[0].mostrar, Some(1));
    }

    #[test]
    fn only_first_detail_per_bloque_survives() {
        let mut first = row("U1", 1, 1);
        first.detalle_bloque_descripcion = Some("aula 3".to_string());
        let mut second = row("U1", 1, 1);
        second.detalle_bloque_descripcion = Some("aula 7".to_string());

        let documents = build_tree(vec![first, second]).expect("build");
        let bloque = &documents[0].materias[0].horarios[0];
        assert_eq!(bloque.descripciones.len(), 1);
        assert_eq!(bloque.descripciones[0].descripcion, "aula 3");
    }

    #[test]
    fn missing_materia_id_fails_the_build() {
        let mut input = row("U1", 1, 1);
        input.materia_id = None;
        let err = build_tree(vec![input]).expect_err("contract violation");
        assert!(matches!(err, ApiError::Contract(_)));
    }

    #[test]
    fn missing_bloque_id_fails_the_build() {
        let mut input = row("U1", 1, 1);
        input.bloque_id = None;
        let err = build_tree(vec![input]).expect_err("contract violation");
        assert!(matches!(err, ApiError::Contract(_)));
    }

    fn seeded_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        create_tables(&conn).expect("schema");
        conn.execute_batch(
            "INSERT INTO ROLES (nombre) VALUES ('alumno');
             INSERT INTO USUARIOS (id_rol, nombre, email, contrasena)
                 VALUES (1, 'Ana', 'ana@example.com', 'secreta');
             INSERT INTO HORARIOS_USUARIOS (id_usuario, nombre) VALUES (1, 'Semestre 2026-1');
             INSERT INTO MATERIAS (id_horario, nombre, color) VALUES (1, 'Algebra', 'RED');
             INSERT INTO MATERIAS (id_horario, nombre, color) VALUES (1, 'Fisica', 'Blue');
             INSERT INTO DETALLES_MATERIAS (id_materia, descripcion, mostrar)
                 VALUES (1, 'Grupo B', 1);
             INSERT INTO HORARIOS_MATERIAS (id_materia, dia, hora_inicio, hora_fin)
                 VALUES (1, 'Lunes', '08:00', '09:30');
             INSERT INTO HORARIOS_MATERIAS (id_materia, dia, hora_inicio, hora_fin)
                 VALUES (2, 'Martes', '10:00', '11:30');
             INSERT INTO DETALLES_HORARIOS (id_horario_materia, descripcion, mostrar)
                 VALUES (2, 'Laboratorio', 0);
             INSERT INTO COMPARTIR_HORARIO (url_acceso, id_horario) VALUES ('tok-123', 1);
             INSERT INTO COMENTARIOS_HORARIO (id_horario, comentario, id_usuario, publicado)
                 VALUES (1, 'buen horario', 1, '2026-03-01T10:00:00Z');",
        )
        .expect("seed");
        conn
    }

    #[test]
    fn fetch_and_build_from_seeded_database() {
        let conn = seeded_conn();
        let rows = fetch_schedule_rows(&conn, "tok-123").expect("fetch");
        assert!(!rows.is_empty());

        let documents = build_tree(rows).expect("build");
        assert_eq!(documents.len(), 1);

        let doc = &documents[0];
        assert_eq!(doc.url_compartido, "tok-123");
        assert_eq!(doc.nombre_horario, "Semestre 2026-1");
        assert_eq!(doc.comentarios.len(), 1);
        assert_eq!(doc.comentarios[0].nombre_usuario, "Ana");
        assert_eq!(doc.materias.len(), 2);

        // The join carries no ORDER BY, so look the materias up by name.
        let algebra = doc
            .materias
            .iter()
            .find(|m| m.nombre == "Algebra")
            .expect("Algebra present");
        assert_eq!(algebra.color, "red");
        assert_eq!(algebra.descripciones.len(), 1);
        assert_eq!(algebra.descripciones[0].descripcion, "Grupo B");
        assert_eq!(algebra.horarios.len(), 1);
        assert_eq!(algebra.horarios[0].dia, "Lunes");
        assert!(algebra.horarios[0].descripciones.is_empty());

        let fisica = doc
            .materias
            .iter()
            .find(|m| m.nombre == "Fisica")
            .expect("Fisica present");
        assert_eq!(fisica.color, "blue");
        assert!(fisica.descripciones.is_empty());
        assert_eq!(fisica.horarios[0].descripciones.len(), 1);
        assert_eq!(fisica.horarios[0].descripciones[0].descripcion, "Laboratorio");
    }

    #[test]
    fn unknown_url_fetches_no_rows() {
        let conn = seeded_conn();
        let rows = fetch_schedule_rows(&conn, "tok-999").expect("fetch");
        assert!(rows.is_empty());
    }
}
