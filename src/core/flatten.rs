//! Flatten/Nest: Brücke zwischen verschachtelten persistierten Properties und der
//! flachen Feldmenge, mit der Formulare arbeiten.
//!
//! Schlüssel werden mit [`FLAT_SEPARATOR`] verbunden. Arrays bleiben als ganzer Wert
//! unter ihrem Elternschlüssel stehen. `nest(flatten(x)) == x` gilt, solange Arrays
//! nur an Blatt-Positionen vorkommen und kein Schlüssel den Separator enthält; ein
//! Array mit verschachtelten Objekten wird nicht in Felder zerlegt.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Trenner zwischen Schlüssel-Segmenten in der flachen Form.
pub const FLAT_SEPARATOR: &str = "___";

/// Flache Feldmenge (Reihenfolge wie in den verschachtelten Properties).
pub type FlatMap = IndexMap<String, Value>;

/// Verschachtelte Properties → flache Feldmenge.
///
/// Nicht-leere Objekte werden rekursiv aufgelöst; leere Objekte, Arrays, Skalare und
/// `null` werden unverändert übernommen.
pub fn flatten(properties: &Map<String, Value>) -> FlatMap {
    let mut flat = FlatMap::new();
    flatten_into(&mut flat, None, properties);
    flat
}

fn flatten_into(flat: &mut FlatMap, prefix: Option<&str>, object: &Map<String, Value>) {
    for (key, value) in object {
        let flat_key = match prefix {
            Some(prefix) => format!("{prefix}{FLAT_SEPARATOR}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => {
                flatten_into(flat, Some(&flat_key), inner);
            }
            _ => {
                flat.insert(flat_key, value.clone());
            }
        }
    }
}

/// Flache Feldmenge → verschachtelte Properties.
///
/// Zwischenobjekte werden bei Bedarf angelegt. Kollidiert ein Pfad mit einem
/// vorhandenen Nicht-Objekt, gewinnt der spätere (tiefere) Schlüssel.
pub fn nest(flat: &FlatMap) -> Map<String, Value> {
    let mut root = Map::new();
    for (flat_key, value) in flat {
        let mut segments = flat_key.split(FLAT_SEPARATOR).peekable();
        let mut cursor = &mut root;
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                cursor.insert(segment.to_string(), value.clone());
                break;
            }
            let slot = cursor
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                log::debug!("Flat-Key {flat_key}: Wert unter `{segment}` durch Objekt ersetzt");
                *slot = Value::Object(Map::new());
            }
            let Value::Object(next) = slot else {
                break;
            };
            cursor = next;
        }
    }
    root
}

/// Flacht ein JSON-Schema so ab, dass es die flache Feldmenge beschreibt.
///
/// Verschachtelte `properties` von Objekt-Feldern werden zu Schlüsseln mit
/// Separator; `required` wird übernommen, wenn das Elternfeld selbst Pflicht ist.
/// Das Schema wird nicht validiert: unbekannte Formen bleiben unverändert.
pub fn flatten_schema(schema: &Value) -> Value {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return schema.clone();
    };
    let required = required_keys(schema);

    let mut flat_properties = Map::new();
    let mut flat_required = Vec::new();
    flatten_schema_into(
        &mut flat_properties,
        &mut flat_required,
        None,
        properties,
        &required,
        true,
    );

    let mut result = schema.as_object().cloned().unwrap_or_default();
    result.insert("properties".to_string(), Value::Object(flat_properties));
    if flat_required.is_empty() {
        result.shift_remove("required");
    } else {
        result.insert(
            "required".to_string(),
            Value::Array(flat_required.into_iter().map(Value::String).collect()),
        );
    }
    Value::Object(result)
}

fn required_keys(schema: &Value) -> Vec<String> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn flatten_schema_into(
    flat_properties: &mut Map<String, Value>,
    flat_required: &mut Vec<String>,
    prefix: Option<&str>,
    properties: &Map<String, Value>,
    required: &[String],
    parent_required: bool,
) {
    for (key, field) in properties {
        let flat_key = match prefix {
            Some(prefix) => format!("{prefix}{FLAT_SEPARATOR}{key}"),
            None => key.clone(),
        };
        let is_required = parent_required && required.iter().any(|r| r == key);

        let nested = field
            .get("properties")
            .and_then(Value::as_object)
            .filter(|inner| !inner.is_empty());
        match nested {
            Some(inner) => {
                let inner_required = required_keys(field);
                flatten_schema_into(
                    flat_properties,
                    flat_required,
                    Some(&flat_key),
                    inner,
                    &inner_required,
                    is_required,
                );
            }
            None => {
                if is_required {
                    flat_required.push(flat_key.clone());
                }
                flat_properties.insert(flat_key, field.clone());
            }
        }
    }
}
