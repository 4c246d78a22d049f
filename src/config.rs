//! Configuratie van een volledige scène: resolutie, vorm, palet, deformatie
//! en besturing, plus de benoemde presets.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::control::ControlConfig;
use crate::geom::{
    DispersionError, DispersionParams, DispersionStyle, Palette, PetalShape, SurfaceError,
    SurfaceOptions,
};

/// Fouten bij het opbouwen of aanpassen van een [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ongeldige oppervlakteconfiguratie ({layer}): {source}")]
    Surface {
        layer: &'static str,
        #[source]
        source: SurfaceError,
    },
    #[error("ongeldige deformatieparameter: {0}")]
    Dispersion(#[from] DispersionError),
    #[error("ongeldige besturingsparameter `{0}`")]
    Control(&'static str),
    #[error("onbekende preset `{0}`")]
    UnknownPreset(String),
    #[error("onbekende parameter `{0}`")]
    UnknownParameter(String),
    #[error("parameter `{0}` moet een eindig getal zijn")]
    NonFinite(String),
}

/// Volledige configuratie; elk veld heeft een standaardwaarde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Zaad voor de randomgenerator; `None` kiest er één.
    pub seed: Option<u64>,
    pub mesh_rows: usize,
    pub mesh_cols: usize,
    pub point_rows: usize,
    pub point_cols: usize,
    /// Of de puntenwolk als tweede laag wordt opgebouwd.
    pub point_layer: bool,
    pub shape: PetalShape,
    pub palette: Palette,
    pub dispersion: DispersionParams,
    pub control: ControlConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Preset::Studio.config()
    }
}

impl EngineConfig {
    /// Opties voor de massieve laag (met normalen).
    #[must_use]
    pub fn mesh_options(&self) -> SurfaceOptions {
        SurfaceOptions::new(self.mesh_rows, self.mesh_cols)
            .shape(self.shape)
            .palette(self.palette)
            .compute_normals(true)
    }

    /// Opties voor de puntenwolk (zonder normalen).
    #[must_use]
    pub fn point_options(&self) -> SurfaceOptions {
        SurfaceOptions::new(self.point_rows, self.point_cols)
            .shape(self.shape)
            .palette(self.palette)
            .compute_normals(false)
    }

    /// Controleer alle onderdelen zonder iets te genereren.
    ///
    /// # Errors
    /// Zie [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mesh_options()
            .validate()
            .map_err(|source| ConfigError::Surface {
                layer: "mesh",
                source,
            })?;
        if self.point_layer {
            self.point_options()
                .validate()
                .map_err(|source| ConfigError::Surface {
                    layer: "points",
                    source,
                })?;
        }
        self.dispersion.validate()?;
        if let Some(name) = self.control.first_invalid() {
            return Err(ConfigError::Control(name));
        }
        Ok(())
    }

    /// Namen die [`set_param`](Self::set_param) accepteert.
    pub const PARAM_NAMES: &'static [&'static str] = &[
        "expansionForce",
        "shredDrift",
        "noiseFrequency",
        "noiseAmplitude",
        "chaosSpeed",
        "minMeshOpacity",
        "pointSize",
        "pointOpacityMax",
        "freezeThreshold",
        "radialReference",
        "verticalWhip",
        "sandTravel",
        "sandGravity",
        "sandSwirl",
        "heightDelay",
        "morphMinDist",
        "morphMaxDist",
        "morphRate",
        "pinchThreshold",
        "pulseGainDegrees",
        "releaseDecay",
        "spinDecay",
        "morphSpinDamping",
        "activeThreshold",
        "peakThreshold",
        "peakTarget",
        "cycleDurationMs",
        "cycleExponent",
    ];

    /// Pas één deformatie- of besturingsparameter aan.
    ///
    /// Bij een ongeldige waarde blijft de configuratie ongewijzigd.
    ///
    /// # Errors
    /// Niet-eindige waarden, onbekende namen en waarden die de validatie
    /// niet doorstaan.
    pub fn set_param(&mut self, name: &str, value: f64) -> Result<(), ConfigError> {
        if !value.is_finite() {
            return Err(ConfigError::NonFinite(name.to_owned()));
        }
        let mut next = self.clone();
        let slot = next
            .param_slot(name)
            .ok_or_else(|| ConfigError::UnknownParameter(name.to_owned()))?;
        *slot = value;

        next.dispersion.validate()?;
        if let Some(field) = next.control.first_invalid() {
            return Err(ConfigError::Control(field));
        }
        *self = next;
        Ok(())
    }

    /// Huidige waarde van een parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<f64> {
        let mut probe = self.clone();
        probe.param_slot(name).map(|slot| *slot)
    }

    fn param_slot(&mut self, name: &str) -> Option<&mut f64> {
        let d = &mut self.dispersion;
        let c = &mut self.control;
        let slot = match name {
            "expansionForce" => &mut d.expansion_force,
            "shredDrift" => &mut d.shred_drift,
            "noiseFrequency" => &mut d.noise_frequency,
            "noiseAmplitude" => &mut d.noise_amplitude,
            "chaosSpeed" => &mut d.chaos_speed,
            "minMeshOpacity" => &mut d.min_mesh_opacity,
            "pointSize" => &mut d.point_size,
            "pointOpacityMax" => &mut d.point_opacity_max,
            "freezeThreshold" => &mut d.freeze_threshold,
            "radialReference" => &mut d.radial_reference,
            "verticalWhip" => &mut d.vertical_whip,
            "sandTravel" => &mut d.sand_travel,
            "sandGravity" => &mut d.sand_gravity,
            "sandSwirl" => &mut d.sand_swirl,
            "heightDelay" => &mut d.height_delay,
            "morphMinDist" => &mut c.morph_min_dist,
            "morphMaxDist" => &mut c.morph_max_dist,
            "morphRate" => &mut c.morph_rate,
            "pinchThreshold" => &mut c.pinch_threshold,
            "pulseGainDegrees" => &mut c.pulse_gain_degrees,
            "releaseDecay" => &mut c.release_decay,
            "spinDecay" => &mut c.spin_decay,
            "morphSpinDamping" => &mut c.morph_spin_damping,
            "activeThreshold" => &mut c.active_threshold,
            "peakThreshold" => &mut c.peak_threshold,
            "peakTarget" => &mut c.peak_target,
            "cycleDurationMs" => &mut c.cycle_duration_ms,
            "cycleExponent" => &mut c.cycle_exponent,
            _ => return None,
        };
        Some(slot)
    }
}

/// Benoemde parametersets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Dichte dahlia, sterke ruis, bevriest vanaf 0.85.
    Studio,
    /// Dichte dahlia, fijne snelle ruis, bevriest pas vlak voor 1.
    Gallery,
    /// Open spiraal die als zand uiteenvalt, alleen de massieve laag, met een
    /// tragere autoplay-cyclus van 6 s.
    Sandfall,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Studio, Preset::Gallery, Preset::Sandfall];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Preset::Studio => "studio",
            Preset::Gallery => "gallery",
            Preset::Sandfall => "sandfall",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Preset::Studio => "dense dahlia, wide whip noise, freezes at 0.85",
            Preset::Gallery => "dense dahlia, fine fast noise, freezes at 0.985",
            Preset::Sandfall => "open spiral dissolving into falling sand",
        }
    }

    /// Zoek een preset op naam (hoofdletterongevoelig).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(name))
    }

    /// # Errors
    /// [`ConfigError::UnknownPreset`] voor een onbekende naam.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        Self::from_name(name).ok_or_else(|| ConfigError::UnknownPreset(name.to_owned()))
    }

    #[must_use]
    pub fn config(self) -> EngineConfig {
        let base = EngineConfig {
            seed: None,
            mesh_rows: 90,
            mesh_cols: 1200,
            point_rows: 800,
            point_cols: 800,
            point_layer: true,
            shape: PetalShape::dense_dahlia(),
            palette: Palette::default(),
            dispersion: DispersionParams::default(),
            control: ControlConfig::default(),
        };

        match self {
            Preset::Studio => base,
            Preset::Gallery => EngineConfig {
                dispersion: DispersionParams {
                    min_mesh_opacity: 0.2,
                    expansion_force: 1.0,
                    shred_drift: 5.0,
                    noise_frequency: 40.0,
                    noise_amplitude: 15.0,
                    chaos_speed: 0.005,
                    point_size: 3.4,
                    freeze_threshold: 0.985,
                    ..DispersionParams::default()
                },
                ..base
            },
            Preset::Sandfall => EngineConfig {
                shape: PetalShape::open_spiral(),
                point_layer: false,
                dispersion: DispersionParams {
                    style: DispersionStyle::SandFall,
                    min_mesh_opacity: 0.4,
                    ..DispersionParams::default()
                },
                control: ControlConfig {
                    cycle_duration_ms: 6000.0,
                    ..ControlConfig::default()
                },
                ..base
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        for preset in Preset::ALL {
            assert!(preset.config().validate().is_ok(), "{}", preset.name());
        }
    }

    #[test]
    fn preset_lookup_ignores_case() {
        assert_eq!(Preset::from_name("Gallery"), Some(Preset::Gallery));
        assert_eq!(Preset::from_name(" sandfall "), Some(Preset::Sandfall));
        assert!(matches!(
            Preset::parse("tulip"),
            Err(ConfigError::UnknownPreset(name)) if name == "tulip"
        ));
    }

    #[test]
    fn freeze_threshold_differs_per_preset() {
        assert_eq!(Preset::Studio.config().dispersion.freeze_threshold, 0.85);
        assert_eq!(Preset::Gallery.config().dispersion.freeze_threshold, 0.985);
    }

    #[test]
    fn sandfall_cycles_slower_and_keeps_a_visible_mesh() {
        let config = Preset::Sandfall.config();
        assert_eq!(config.control.cycle_duration_ms, 6000.0);
        assert_eq!(config.dispersion.min_mesh_opacity, 0.4);
        assert_eq!(Preset::Studio.config().control.cycle_duration_ms, 2000.0);
    }

    #[test]
    fn set_param_updates_known_names() {
        let mut config = EngineConfig::default();
        config.set_param("noiseAmplitude", 12.0).unwrap();
        config.set_param("morphRate", 2.5).unwrap();
        assert_eq!(config.dispersion.noise_amplitude, 12.0);
        assert_eq!(config.param("morphRate"), Some(2.5));
        for name in EngineConfig::PARAM_NAMES {
            assert!(config.param(name).is_some(), "{name}");
        }
    }

    #[test]
    fn set_param_rejects_bad_input_without_side_effects() {
        let mut config = EngineConfig::default();
        let before = config.clone();

        assert!(matches!(
            config.set_param("chaosSpeed", f64::NAN),
            Err(ConfigError::NonFinite(_))
        ));
        assert!(matches!(
            config.set_param("petalCount", 3.0),
            Err(ConfigError::UnknownParameter(_))
        ));
        assert!(matches!(
            config.set_param("radialReference", 0.0),
            Err(ConfigError::Dispersion(_))
        ));
        assert!(matches!(
            config.set_param("morphMaxDist", 0.01),
            Err(ConfigError::Control("morphMaxDist"))
        ));
        assert_eq!(config, before);
    }

    #[test]
    fn set_param_rejects_runaway_control_values() {
        let mut config = EngineConfig::default();
        let before = config.clone();
        for (name, value) in [
            ("cycleExponent", -1.0),
            ("cycleExponent", 0.0),
            ("spinDecay", 1.5),
            ("releaseDecay", -0.1),
            ("morphSpinDamping", 2.0),
        ] {
            assert!(
                matches!(config.set_param(name, value), Err(ConfigError::Control(field)) if field == name),
                "{name} = {value}"
            );
        }
        assert_eq!(config, before);
        config.set_param("spinDecay", 1.0).unwrap();
        assert_eq!(config.control.spin_decay, 1.0);
    }

    #[test]
    fn zero_resolution_is_a_config_error() {
        let config = EngineConfig {
            point_rows: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Surface { layer: "points", .. })
        ));

        let single_layer = EngineConfig {
            point_layer: false,
            ..config
        };
        assert!(single_layer.validate().is_ok());
    }
}
