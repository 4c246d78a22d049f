#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod control;
pub mod geom;
pub mod scene;

use std::fmt;

use config::{EngineConfig, Preset};
use control::ControlInput;
use scene::FlowerScene;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("kon rayon threadpool niet initialiseren: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Publiek aanspreekpunt voor de browser.
///
/// De host roept per animatieframe [`tick`](Engine::tick) (of
/// [`autoplay`](Engine::autoplay)) aan en leest daarna de buffers uit.
/// Kleuren, indices en normalen veranderen na de constructie niet meer.
#[wasm_bindgen]
pub struct Engine {
    scene: FlowerScene,
}

#[wasm_bindgen]
impl Engine {
    /// Standaardpreset met een willekeurig zaad.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<Engine, JsValue> {
        Self::from_engine_config(EngineConfig::default()).map_err(to_js_error)
    }

    /// Bouw een engine vanuit een benoemde preset.
    #[wasm_bindgen]
    pub fn with_preset(name: &str, seed: Option<u64>) -> Result<Engine, JsValue> {
        let preset = Preset::parse(name).map_err(to_js_error)?;
        let config = EngineConfig {
            seed,
            ..preset.config()
        };
        Self::from_engine_config(config).map_err(to_js_error)
    }

    /// Bouw een engine vanuit een (gedeeltelijk) configuratieobject.
    #[wasm_bindgen]
    pub fn from_config(config: JsValue) -> Result<Engine, JsValue> {
        let config: EngineConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|err| js_error(&format!("ongeldige configuratie: {err}")))?;
        Self::from_engine_config(config).map_err(to_js_error)
    }

    /// Namen van alle presets.
    #[wasm_bindgen]
    pub fn preset_names() -> Vec<String> {
        Preset::ALL
            .iter()
            .map(|preset| preset.name().to_owned())
            .collect()
    }

    /// Verwerk één frame met handafstanden.
    #[wasm_bindgen]
    pub fn tick(&mut self, left: f64, right: f64, now_ms: f64) -> Result<(), JsValue> {
        self.scene
            .tick(ControlInput::Hands { left, right }, now_ms)
            .map(|_| ())
            .map_err(to_js_error)
    }

    /// Verwerk één frame zonder handen.
    #[wasm_bindgen]
    pub fn autoplay(&mut self, now_ms: f64) -> Result<(), JsValue> {
        self.scene
            .tick(ControlInput::Autoplay, now_ms)
            .map(|_| ())
            .map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn mesh_vertex_count(&self) -> usize {
        self.scene.mesh().surface().vertex_count()
    }

    #[wasm_bindgen]
    pub fn mesh_positions(&self) -> Vec<f32> {
        self.scene.mesh().frame().positions_f32()
    }

    /// Schrijf de meshposities in een bestaande buffer; geeft `false` als de
    /// lengte niet klopt.
    #[wasm_bindgen]
    pub fn write_mesh_positions(&self, out: &mut [f32]) -> bool {
        self.scene.mesh().frame().write_positions_f32(out)
    }

    #[wasm_bindgen]
    pub fn mesh_colors(&self) -> Vec<f32> {
        self.scene.mesh().surface().colors_f32()
    }

    #[wasm_bindgen]
    pub fn mesh_normals(&self) -> Vec<f32> {
        self.scene.mesh().surface().normals_f32()
    }

    #[wasm_bindgen]
    pub fn mesh_indices(&self) -> Vec<u32> {
        self.scene.mesh().surface().indices().to_vec()
    }

    /// Posities van de puntenwolk; leeg als de preset er geen heeft.
    #[wasm_bindgen]
    pub fn point_positions(&self) -> Vec<f32> {
        self.scene
            .points()
            .map(|layer| layer.frame().positions_f32())
            .unwrap_or_default()
    }

    #[wasm_bindgen]
    pub fn point_colors(&self) -> Vec<f32> {
        self.scene
            .points()
            .map(|layer| layer.surface().colors_f32())
            .unwrap_or_default()
    }

    #[wasm_bindgen]
    pub fn factor(&self) -> f64 {
        self.scene.control_state().factor
    }

    /// Rotatie rond de centrale as in radialen.
    #[wasm_bindgen]
    pub fn rotation(&self) -> f64 {
        self.scene.control_state().rotation
    }

    #[wasm_bindgen]
    pub fn mesh_opacity(&self) -> f64 {
        self.scene.mesh().frame().mesh_opacity
    }

    #[wasm_bindgen]
    pub fn point_opacity(&self) -> f64 {
        self.scene.mesh().frame().point_opacity
    }

    #[wasm_bindgen]
    pub fn point_size(&self) -> f64 {
        self.scene.config().dispersion.point_size
    }

    /// Stel een deformatie- of besturingsparameter in op naam.
    #[wasm_bindgen]
    pub fn set_param(&mut self, name: &str, value: f64) -> Result<(), JsValue> {
        if !value.is_finite() {
            return Err(js_error("parameterwaarde moet een eindig getal zijn"));
        }
        self.scene.set_param(name.trim(), value).map_err(to_js_error)
    }

    /// Haal de cues op die sinds de vorige aanroep zijn ontstaan.
    #[wasm_bindgen]
    pub fn take_cues(&mut self) -> Result<JsValue, JsValue> {
        let cues = self.scene.take_cues();
        serde_wasm_bindgen::to_value(&cues).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Huidige configuratie als object.
    #[wasm_bindgen]
    pub fn get_params(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.scene.config())
            .map_err(|err| JsError::new(&err.to_string()).into())
    }
}

impl Engine {
    /// Bouw een engine vanuit een Rust-configuratie.
    ///
    /// # Errors
    /// Zie [`config::ConfigError`].
    pub fn from_engine_config(config: EngineConfig) -> Result<Self, config::ConfigError> {
        let scene = FlowerScene::from_config(config)?;
        log::debug!(
            "engine klaar: {} meshpunten, puntenwolk {}",
            scene.mesh().surface().vertex_count(),
            scene
                .points()
                .map_or(0, |layer| layer.surface().vertex_count())
        );
        Ok(Self { scene })
    }

    #[must_use]
    pub fn scene(&self) -> &FlowerScene {
        &self.scene
    }

    /// Neem de cues over zonder JS-conversie.
    pub fn drain_cues(&mut self) -> Vec<control::ControlCue> {
        self.scene.take_cues()
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
