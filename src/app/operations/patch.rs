//! Strukturelle JSON-Patches: Diff zweier Dokumente und Anwendung eines Patches.
//!
//! Der Diff folgt dem verbreiteten `compare`-Algorithmus: alte Schlüssel in
//! umgekehrter Reihenfolge (Rekursion in gleichartige Container, `replace` bei
//! geänderten Werten, `remove` bei fehlenden Schlüsseln), danach `add` für neue
//! Schlüssel. Array-Elemente werden per Index verglichen, Pfade nach RFC 6901
//! maskiert.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Einzelne Patch-Operation mit JSON-Pointer-Pfad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    /// Wert einfügen (Objekt-Schlüssel oder Array-Index)
    Add {
        /// JSON-Pointer
        path: String,
        /// Neuer Wert
        value: Value,
    },
    /// Wert entfernen
    Remove {
        /// JSON-Pointer
        path: String,
    },
    /// Wert ersetzen
    Replace {
        /// JSON-Pointer
        path: String,
        /// Neuer Wert
        value: Value,
    },
}

impl PatchOperation {
    /// Pfad der Operation.
    pub fn path(&self) -> &str {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. } => path,
        }
    }
}

/// Geordnete Liste von Patch-Operationen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch(pub Vec<PatchOperation>);

impl Patch {
    /// `true` wenn der Patch keine Operation enthält.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Anzahl der Operationen.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iteriert über die Operationen.
    pub fn iter(&self) -> std::slice::Iter<'_, PatchOperation> {
        self.0.iter()
    }
}

/// Fehler beim Anwenden eines Patches.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    /// Der Pfad ist kein gültiger JSON-Pointer.
    #[error("Operation {index}: ungültiger Pfad `{path}`")]
    InvalidPath {
        /// Index der Operation im Patch
        index: usize,
        /// Betroffener Pfad
        path: String,
    },
    /// Der Pfad zeigt auf einen nicht existierenden Wert.
    #[error("Operation {index}: Ziel `{path}` existiert nicht")]
    MissingTarget {
        /// Index der Operation im Patch
        index: usize,
        /// Betroffener Pfad
        path: String,
    },
}

/// Maskiert ein Pfad-Segment nach RFC 6901 (`~` → `~0`, `/` → `~1`).
pub fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Diff zweier Dokumente.
pub fn diff(old: &Value, new: &Value) -> Patch {
    diff_with_atomic(old, new, &[])
}

/// Diff zweier Dokumente; die Top-Level-Schlüssel in `atomic` werden als ganzer
/// Wert verglichen (eine Änderung ergibt genau ein `replace` auf dem Schlüssel).
pub fn diff_with_atomic(old: &Value, new: &Value, atomic: &[&str]) -> Patch {
    let mut operations = Vec::new();
    generate(old, new, "", atomic, &mut operations);
    Patch(operations)
}

fn generate(old: &Value, new: &Value, path: &str, atomic: &[&str], out: &mut Vec<PatchOperation>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let mut deleted = false;
            for (key, old_value) in old_map.iter().rev() {
                let child = format!("{path}/{}", escape_segment(key));
                match new_map.get(key) {
                    Some(new_value) => {
                        let is_atomic = path.is_empty() && atomic.contains(&key.as_str());
                        compare_child(old_value, new_value, &child, is_atomic, atomic, out);
                    }
                    None => {
                        out.push(PatchOperation::Remove { path: child });
                        deleted = true;
                    }
                }
            }
            if !deleted && old_map.len() == new_map.len() {
                return;
            }
            for (key, new_value) in new_map {
                if !old_map.contains_key(key) {
                    out.push(PatchOperation::Add {
                        path: format!("{path}/{}", escape_segment(key)),
                        value: new_value.clone(),
                    });
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            for (index, old_value) in old_items.iter().enumerate().rev() {
                let child = format!("{path}/{index}");
                match new_items.get(index) {
                    Some(new_value) => compare_child(old_value, new_value, &child, false, atomic, out),
                    None => out.push(PatchOperation::Remove { path: child }),
                }
            }
            for (index, new_value) in new_items.iter().enumerate().skip(old_items.len()) {
                out.push(PatchOperation::Add {
                    path: format!("{path}/{index}"),
                    value: new_value.clone(),
                });
            }
        }
        _ => {
            if old != new {
                out.push(PatchOperation::Replace {
                    path: path.to_string(),
                    value: new.clone(),
                });
            }
        }
    }
}

fn compare_child(
    old: &Value,
    new: &Value,
    path: &str,
    atomic: bool,
    atomic_keys: &[&str],
    out: &mut Vec<PatchOperation>,
) {
    let same_container = matches!(
        (old, new),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    );
    if same_container && !atomic {
        generate(old, new, path, atomic_keys, out);
    } else if old != new {
        out.push(PatchOperation::Replace {
            path: path.to_string(),
            value: new.clone(),
        });
    }
}

/// Wendet `patch` auf `document` an.
///
/// Schlägt eine Operation fehl, bleibt `document` unverändert.
pub fn apply_patch(document: &mut Value, patch: &Patch) -> Result<(), PatchError> {
    let mut working = document.clone();
    for (index, operation) in patch.iter().enumerate() {
        apply_operation(&mut working, index, operation)?;
    }
    *document = working;
    Ok(())
}

fn parse_pointer(index: usize, path: &str) -> Result<Vec<String>, PatchError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = path.strip_prefix('/') else {
        return Err(PatchError::InvalidPath {
            index,
            path: path.to_string(),
        });
    };
    Ok(rest.split('/').map(unescape_segment).collect())
}

fn apply_operation(
    document: &mut Value,
    index: usize,
    operation: &PatchOperation,
) -> Result<(), PatchError> {
    let path = operation.path();
    let missing = || PatchError::MissingTarget {
        index,
        path: path.to_string(),
    };

    let mut segments = parse_pointer(index, path)?;
    let Some(last) = segments.pop() else {
        // Wurzel
        return match operation {
            PatchOperation::Add { value, .. } | PatchOperation::Replace { value, .. } => {
                *document = value.clone();
                Ok(())
            }
            PatchOperation::Remove { .. } => Err(missing()),
        };
    };

    let mut parent = &mut *document;
    for segment in &segments {
        parent = match parent {
            Value::Object(map) => map.get_mut(segment).ok_or_else(missing)?,
            Value::Array(items) => {
                let i = segment.parse::<usize>().map_err(|_| missing())?;
                items.get_mut(i).ok_or_else(missing)?
            }
            _ => return Err(missing()),
        };
    }

    match (parent, operation) {
        (Value::Object(map), PatchOperation::Add { value, .. }) => {
            map.insert(last, value.clone());
        }
        (Value::Object(map), PatchOperation::Replace { value, .. }) => {
            let slot = map.get_mut(&last).ok_or_else(missing)?;
            *slot = value.clone();
        }
        (Value::Object(map), PatchOperation::Remove { .. }) => {
            map.shift_remove(&last).ok_or_else(missing)?;
        }
        (Value::Array(items), PatchOperation::Add { value, .. }) => {
            let i = if last == "-" {
                items.len()
            } else {
                last.parse::<usize>().map_err(|_| missing())?
            };
            if i > items.len() {
                return Err(missing());
            }
            items.insert(i, value.clone());
        }
        (Value::Array(items), PatchOperation::Replace { value, .. }) => {
            let i = last.parse::<usize>().map_err(|_| missing())?;
            let slot = items.get_mut(i).ok_or_else(missing)?;
            *slot = value.clone();
        }
        (Value::Array(items), PatchOperation::Remove { .. }) => {
            let i = last.parse::<usize>().map_err(|_| missing())?;
            if i >= items.len() {
                return Err(missing());
            }
            items.remove(i);
        }
        _ => return Err(missing()),
    }
    Ok(())
}
