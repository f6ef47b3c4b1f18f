//! Zentrale Konfiguration des Infrastruktur-Editors.
//!
//! `EditorOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

// ── Picking & Snapping ──────────────────────────────────────────────

/// Greif-Radius (Welteinheiten) für Bereichsenden, Stützpunkte und Marker-Schilder.
pub const PICK_RADIUS: f64 = 5.0;
/// Maximaler Abstand (Welteinheiten), bis zu dem ein Punkt-Objekt auf ein Gleis rastet.
pub const SNAP_RADIUS: f64 = 20.0;
/// Snap-Radius (Welteinheiten) für Weichen-Ports auf Gleis-Endpunkte.
pub const ENDPOINT_SNAP_RADIUS: f64 = 10.0;

// ── Lineare Referenzierung ──────────────────────────────────────────

/// Relative Abweichung geometrisch ↔ deklariert, ab der gewarnt wird.
pub const LENGTH_DRIFT_WARNING: f64 = 0.05;
/// Umrechnung Koordinateneinheiten → deklarierte Längeneinheiten.
pub const GEOMETRY_UNIT_SCALE: f64 = 1.0;

// ── Backend ─────────────────────────────────────────────────────────

/// Standard-Infrastruktur, gegen die Commits laufen.
pub const DEFAULT_INFRA_ID: u64 = 1;

/// Dateiname der Optionen-Datei.
pub const OPTIONS_FILE_NAME: &str = "infra_editor.toml";

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle zur Laufzeit änderbaren Editor-Optionen.
/// Wird als `infra_editor.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorOptions {
    // ── Picking ─────────────────────────────────────────────────
    /// Greif-Radius für Bereichsenden, Stützpunkte und Schilder
    pub pick_radius: f64,
    /// Snap-Radius für Punkt-Objekte auf Gleise
    pub snap_radius: f64,
    /// Snap-Radius für Weichen-Ports
    #[serde(default = "default_endpoint_snap_radius")]
    pub endpoint_snap_radius: f64,

    // ── Geometrie ───────────────────────────────────────────────
    /// Warnschwelle für Längen-Drift (relativ)
    pub length_drift_warning: f64,
    /// Umrechnung Koordinaten → Längeneinheiten
    #[serde(default = "default_geometry_unit_scale")]
    pub geometry_unit_scale: f64,

    // ── Backend ─────────────────────────────────────────────────
    /// Infrastruktur-ID für Fetch- und Commit-Anfragen
    pub infra_id: u64,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            pick_radius: PICK_RADIUS,
            snap_radius: SNAP_RADIUS,
            endpoint_snap_radius: ENDPOINT_SNAP_RADIUS,
            length_drift_warning: LENGTH_DRIFT_WARNING,
            geometry_unit_scale: GEOMETRY_UNIT_SCALE,
            infra_id: DEFAULT_INFRA_ID,
        }
    }
}

/// Serde-Default für `endpoint_snap_radius` (Abwärtskompatibilität bestehender TOML-Dateien).
fn default_endpoint_snap_radius() -> f64 {
    ENDPOINT_SNAP_RADIUS
}

/// Serde-Default für `geometry_unit_scale` (Abwärtskompatibilität).
fn default_geometry_unit_scale() -> f64 {
    GEOMETRY_UNIT_SCALE
}

impl EditorOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("infra_editor"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join(OPTIONS_FILE_NAME)
    }

    /// Drift-Prüfung mit den konfigurierten Werten.
    pub fn drift_check(&self) -> crate::core::DriftCheck {
        crate::core::DriftCheck {
            unit_scale: self.geometry_unit_scale,
            warning_ratio: self.length_drift_warning,
        }
    }
}
