//! Resource declarations
//!
//! Each list screen of the dashboard is one `Resource`: where it lives on the
//! backend, how its records are identified, the field schema, which select
//! options come from another collection and which summary cards it shows.

use crate::error::{DashError, Result};
use crate::schema::{FieldSchema, FieldSpec, SelectOption};
use crate::summary::{CardSpec, SummaryKind};
use crate::validation::Rule;

/// Select options loaded from another collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Related {
    /// Field of this resource whose options are filled
    pub field: String,
    pub path: String,
    /// Field of the related records used as the option value
    pub value_field: String,
    /// Field of the related records used as the option label
    pub label_field: String,
    pub item_type: String,
}

impl Related {
    fn programs(field: &str) -> Self {
        Self {
            field: field.to_string(),
            path: "programas".to_string(),
            value_field: "programa_id".to_string(),
            label_field: "nombre_programa".to_string(),
            item_type: "programa".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Command-line name, e.g. `students`
    pub name: String,
    pub title: String,
    /// Backend path segment, e.g. `estudiantes`
    pub path: String,
    /// Singular noun used in notices and dialogs
    pub item_type: String,
    pub schema: FieldSchema,
    pub related: Vec<Related>,
    pub cards: Vec<CardSpec>,
}

impl Resource {
    pub fn identity(&self) -> &str {
        self.schema.identity()
    }
}

/// Every resource of the dashboard, in menu order
pub fn all() -> Result<Vec<Resource>> {
    Ok(vec![
        students()?,
        programs()?,
        agents()?,
        inscriptions()?,
        active_students()?,
        moodle_students()?,
    ])
}

/// Look up a resource by command-line name or backend path
pub fn find(name: &str) -> Result<Resource> {
    all()?
        .into_iter()
        .find(|r| r.name == name || r.path == name)
        .ok_or_else(|| DashError::UnknownResource(name.to_string()))
}

/// Names accepted by `find`
pub fn names() -> &'static [&'static str] {
    &[
        "students",
        "programs",
        "agents",
        "inscriptions",
        "active-students",
        "moodle-students",
    ]
}

fn digits(spec: FieldSpec) -> FieldSpec {
    spec.rule(Rule::Digits).rule(Rule::MaxLen(11))
}

fn letters(spec: FieldSpec) -> FieldSpec {
    spec.rule(Rule::Letters)
}

fn total(title: &str) -> CardSpec {
    CardSpec::new(title, SummaryKind::Total)
}

pub fn students() -> Result<Resource> {
    let schema = FieldSchema::builder("cedula_estudiantes")
        .field(digits(FieldSpec::text("cedula_estudiantes", "Cédula")))
        .field(
            FieldSpec::select(
                "tipo_documento",
                "Tipo de Documento",
                vec![
                    SelectOption::new("cedula", "Cédula"),
                    SelectOption::new("pasaporte", "Pasaporte"),
                    SelectOption::new("otro", "Otro"),
                ],
            )
            .required(),
        )
        .field(letters(FieldSpec::text("apellido1", "Primer Apellido").required()))
        .field(letters(FieldSpec::text("apellido2", "Segundo Apellido")))
        .field(letters(FieldSpec::text("nombre1", "Primer Nombre").required()))
        .field(letters(FieldSpec::text("nombre2", "Segundo Nombre")))
        .field(digits(FieldSpec::tel("telefono", "Teléfono").required()))
        .field(FieldSpec::text("direccion", "Dirección").required())
        .field(FieldSpec::email("correo", "Correo Electrónico").required())
        .field(FieldSpec::select("programa_id", "Programa", Vec::new()).required())
        .build()?;

    Ok(Resource {
        name: "students".into(),
        title: "Estudiantes".into(),
        path: "estudiantes".into(),
        item_type: "estudiante".into(),
        schema,
        related: vec![Related::programs("programa_id")],
        cards: vec![
            total("Total Estudiantes"),
            CardSpec::new(
                "Promedio por Programa",
                SummaryKind::PerOption {
                    field: "programa_id".into(),
                },
            ),
            CardSpec::new(
                "Distribución por Programa",
                SummaryKind::OptionShare {
                    field: "programa_id".into(),
                },
            ),
        ],
    })
}

pub fn programs() -> Result<Resource> {
    let schema = FieldSchema::builder("programa_id")
        .generated_identity()
        .field(FieldSpec::text("programa_id", "ID"))
        .field(FieldSpec::text("nombre_programa", "Nombre del Programa").required())
        .field(FieldSpec::text("snies_programa", "SNIES del Programa"))
        .build()?;

    Ok(Resource {
        name: "programs".into(),
        title: "Programas".into(),
        path: "programas".into(),
        item_type: "programa".into(),
        schema,
        related: Vec::new(),
        cards: vec![total("Total Programas")],
    })
}

pub fn agents() -> Result<Resource> {
    let schema = FieldSchema::builder("agente_id")
        .generated_identity()
        .field(FieldSpec::text("agente_id", "ID"))
        .field(FieldSpec::text("nombre_agente", "Nombre del Agente").required())
        .build()?;

    Ok(Resource {
        name: "agents".into(),
        title: "Agentes".into(),
        path: "agentes".into(),
        item_type: "agente".into(),
        schema,
        related: Vec::new(),
        cards: vec![total("Total Agentes")],
    })
}

pub fn inscriptions() -> Result<Resource> {
    let schema = FieldSchema::builder("inscripcion_id")
        .generated_identity()
        .field(FieldSpec::text("inscripcion_id", "ID"))
        .field(digits(FieldSpec::text("cedula", "Cédula").required()))
        .field(letters(FieldSpec::text("nombre", "Nombre")))
        .field(FieldSpec::date("date", "Fecha de Inscripción").required())
        .field(FieldSpec::select("carrera", "Carrera", Vec::new()).required())
        .field(
            FieldSpec::select(
                "jornada",
                "Jornada",
                vec![
                    SelectOption::new("diurna", "Diurna"),
                    SelectOption::new("nocturna", "Nocturna"),
                    SelectOption::new("fines_de_semana", "Fines de Semana"),
                ],
            )
            .required(),
        )
        .field(FieldSpec::date("nacimiento", "Fecha de Nacimiento"))
        .build()?;

    Ok(Resource {
        name: "inscriptions".into(),
        title: "Inscripciones".into(),
        path: "inscripciones".into(),
        item_type: "inscripcion".into(),
        schema,
        related: vec![Related::programs("carrera")],
        cards: vec![
            total("Total Inscripciones"),
            CardSpec::new(
                "Promedio por Carrera",
                SummaryKind::PerOption {
                    field: "carrera".into(),
                },
            ),
            CardSpec::new(
                "Promedio de Edades",
                SummaryKind::AverageAge {
                    field: "nacimiento".into(),
                },
            ),
        ],
    })
}

pub fn active_students() -> Result<Resource> {
    let schema = FieldSchema::builder("cedula_estudiantes_activos")
        .field(digits(FieldSpec::text("cedula_estudiantes_activos", "Cédula")))
        .field(FieldSpec::text("apellido1", "P. Apellido"))
        .field(FieldSpec::text("apellido2", "S. Apellido"))
        .field(FieldSpec::text("nombre1", "P. Nombre"))
        .field(FieldSpec::text("nombre2", "S. Nombre"))
        .field(FieldSpec::tel("telefono", "Teléfono"))
        .field(FieldSpec::text("estado_u", "Estado"))
        .field(FieldSpec::text("jornada", "Jornada"))
        .field(FieldSpec::text("sheetname", "Programa"))
        .field(FieldSpec::text("filename", "Archivo"))
        .build()?;

    Ok(Resource {
        name: "active-students".into(),
        title: "Estudiantes Activos".into(),
        path: "estudiantes-activos".into(),
        item_type: "estudiante_activo".into(),
        schema,
        related: Vec::new(),
        cards: vec![
            total("Total Estudiantes Activos"),
            CardSpec::new(
                "Distribución por Estado",
                SummaryKind::Distribution {
                    field: "estado_u".into(),
                },
            ),
        ],
    })
}

pub fn moodle_students() -> Result<Resource> {
    let schema = FieldSchema::builder("cedula_estudiantes_moodle")
        .field(digits(FieldSpec::text("cedula_estudiantes_moodle", "Cédula")))
        .field(FieldSpec::select("programa_id", "Programa", Vec::new()))
        .build()?;

    Ok(Resource {
        name: "moodle-students".into(),
        title: "Estudiantes Moodle".into(),
        path: "estudiantes-moodle".into(),
        item_type: "estudiante_moodle".into(),
        schema,
        related: vec![Related::programs("programa_id")],
        cards: vec![
            total("Total Estudiantes Moodle"),
            CardSpec::new(
                "Promedio de Estudiantes por Programa",
                SummaryKind::MeanOptionShare {
                    field: "programa_id".into(),
                },
            ),
            CardSpec::new(
                "Distribución por Programa",
                SummaryKind::OptionShare {
                    field: "programa_id".into(),
                },
            ),
        ],
    })
}
