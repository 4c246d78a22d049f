//! Een volledige bloem: massieve laag, optionele puntenwolk, één besturing
//! en één ruisklok voor beide lagen.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ConfigError, EngineConfig};
use crate::control::{ControlCue, ControlInput, ControlIntegrator, ControlState};
use crate::geom::{
    DispersionEngine, FrameBuffers, FrameDiagnostics, LiveFrame, PetalSurface,
    generate_petal_surface,
};

/// Eén gegenereerd oppervlak met zijn dubbele framebuffer.
#[derive(Debug, Clone)]
pub struct Layer {
    surface: PetalSurface,
    buffers: FrameBuffers,
}

impl Layer {
    fn new(surface: PetalSurface) -> Self {
        let buffers = FrameBuffers::new(surface.base_positions());
        Self { surface, buffers }
    }

    #[must_use]
    pub fn surface(&self) -> &PetalSurface {
        &self.surface
    }

    /// Het laatst gepubliceerde frame.
    #[must_use]
    pub fn frame(&self) -> &LiveFrame {
        self.buffers.front()
    }
}

/// Resultaat van één [`FlowerScene::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub control: ControlState,
    pub mesh: FrameDiagnostics,
    pub points: Option<FrameDiagnostics>,
}

/// Bezit de oppervlakken, de besturing en de deformatie-engine.
#[derive(Debug, Clone)]
pub struct FlowerScene {
    config: EngineConfig,
    mesh: Layer,
    points: Option<Layer>,
    control: ControlIntegrator,
    engine: DispersionEngine,
}

impl FlowerScene {
    /// Bouw een scène met het zaad uit de configuratie (of een willekeurig
    /// zaad als er geen is).
    ///
    /// # Errors
    /// Zie [`ConfigError`].
    pub fn from_config(config: EngineConfig) -> Result<Self, ConfigError> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new(config, &mut rng)
    }

    /// Bouw een scène met een expliciete randomgenerator.
    ///
    /// # Errors
    /// Zie [`ConfigError`].
    pub fn new(config: EngineConfig, rng: &mut impl Rng) -> Result<Self, ConfigError> {
        config.validate()?;

        let (mesh_surface, mesh_diag) = generate_petal_surface(&config.mesh_options(), rng)
            .map_err(|source| ConfigError::Surface {
                layer: "mesh",
                source,
            })?;
        log::debug!("meshlaag: {mesh_diag}");

        let points = if config.point_layer {
            let (surface, diag) = generate_petal_surface(&config.point_options(), rng).map_err(
                |source| ConfigError::Surface {
                    layer: "points",
                    source,
                },
            )?;
            log::debug!("puntenlaag: {diag}");
            Some(Layer::new(surface))
        } else {
            None
        };

        let engine = DispersionEngine::new(config.dispersion)?;
        let control = ControlIntegrator::new(config.control);

        Ok(Self {
            mesh: Layer::new(mesh_surface),
            points,
            control,
            engine,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn mesh(&self) -> &Layer {
        &self.mesh
    }

    #[must_use]
    pub fn points(&self) -> Option<&Layer> {
        self.points.as_ref()
    }

    #[must_use]
    pub fn control_state(&self) -> &ControlState {
        self.control.state()
    }

    pub fn take_cues(&mut self) -> Vec<ControlCue> {
        self.control.take_cues()
    }

    /// Pas één parameter aan; deformatie en besturing nemen hem direct over.
    ///
    /// # Errors
    /// Zie [`EngineConfig::set_param`].
    pub fn set_param(&mut self, name: &str, value: f64) -> Result<(), ConfigError> {
        self.config.set_param(name, value)?;
        self.engine.set_params(self.config.dispersion)?;
        self.control.set_config(self.config.control);
        Ok(())
    }

    /// Eén tick: besturing bijwerken, beide lagen deformeren in hun
    /// achterbuffer en daarna pas publiceren.
    ///
    /// # Errors
    /// Alleen bij een interne inconsistentie tussen frame en oppervlak.
    pub fn tick(&mut self, input: ControlInput, now_ms: f64) -> Result<TickReport, ConfigError> {
        let control = *self.control.update(input, now_ms);
        let phase = self.engine.advance(&control);

        let mesh = self
            .engine
            .apply(&self.mesh.surface, &phase, self.mesh.buffers.back_mut())?;
        let points = match self.points.as_mut() {
            Some(layer) => Some(
                self.engine
                    .apply(&layer.surface, &phase, layer.buffers.back_mut())?,
            ),
            None => None,
        };

        self.mesh.buffers.swap();
        if let Some(layer) = self.points.as_mut() {
            layer.buffers.swap();
        }

        crate::debug_log!("tick {now_ms:.1} ms: {mesh}");
        Ok(TickReport {
            control,
            mesh,
            points,
        })
    }

    /// Deformeer de massieve laag voor een vaste toestand, zonder de
    /// besturing te raadplegen. Bedoeld voor offline rendering.
    ///
    /// # Errors
    /// Alleen bij een interne inconsistentie tussen frame en oppervlak.
    pub fn render_at(&mut self, control: &ControlState) -> Result<FrameDiagnostics, ConfigError> {
        let phase = self.engine.advance(control);
        let diag = self
            .engine
            .apply(&self.mesh.surface, &phase, self.mesh.buffers.back_mut())?;
        self.mesh.buffers.swap();
        Ok(diag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;

    fn small(preset: Preset) -> EngineConfig {
        EngineConfig {
            seed: Some(9),
            mesh_rows: 6,
            mesh_cols: 40,
            point_rows: 10,
            point_cols: 10,
            ..preset.config()
        }
    }

    #[test]
    fn builds_both_layers() {
        let scene = FlowerScene::from_config(small(Preset::Studio)).unwrap();
        assert_eq!(scene.mesh().surface().vertex_count(), 7 * 41);
        assert_eq!(scene.points().unwrap().surface().vertex_count(), 11 * 11);
        assert!(scene.mesh().surface().normals().is_some());
        assert!(scene.points().unwrap().surface().normals().is_none());
    }

    #[test]
    fn sandfall_has_no_point_layer() {
        let scene = FlowerScene::from_config(small(Preset::Sandfall)).unwrap();
        assert!(scene.points().is_none());
    }

    #[test]
    fn same_seed_builds_same_scene() {
        let a = FlowerScene::from_config(small(Preset::Gallery)).unwrap();
        let b = FlowerScene::from_config(small(Preset::Gallery)).unwrap();
        assert_eq!(a.mesh().surface(), b.mesh().surface());
    }

    #[test]
    fn layers_share_one_noise_phase() {
        let mut scene = FlowerScene::from_config(small(Preset::Studio)).unwrap();
        let mut report = None;
        for tick in 1..=20 {
            report = Some(
                scene
                    .tick(
                        ControlInput::Hands {
                            left: 0.0,
                            right: 0.1,
                        },
                        f64::from(tick) * 16.0,
                    )
                    .unwrap(),
            );
        }
        let report = report.unwrap();
        let points = report.points.unwrap();
        assert_eq!(report.mesh.noise_phase, points.noise_phase);
        assert_eq!(report.mesh.frozen, points.frozen);
        assert!(report.control.factor > 0.0);
        assert!(scene.mesh().frame().mesh_opacity < 1.0);
    }

    #[test]
    fn set_param_reaches_the_engine() {
        let mut scene = FlowerScene::from_config(small(Preset::Studio)).unwrap();
        scene.set_param("minMeshOpacity", 0.5).unwrap();
        let diag = scene.render_at(&ControlState::at(1.0, 0.0)).unwrap();
        assert_eq!(diag.factor, 1.0);
        assert!((scene.mesh().frame().mesh_opacity - 0.5).abs() < 1e-12);
        assert!(scene.set_param("minMeshOpacity", 2.0).is_err());
        assert_eq!(scene.config().dispersion.min_mesh_opacity, 0.5);
    }
}
