#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("flower_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use dahlia_engine::config::{EngineConfig, Preset};
    use dahlia_engine::control::ControlState;
    use dahlia_engine::geom::{FrameDiagnostics, SurfaceDiagnostics, generate_petal_surface};
    use dahlia_engine::geom::{DispersionEngine, LiveFrame, PetalSurface};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;
    const DEFAULT_SEED: u64 = 1;

    const USAGE: &str = r"flower_cli (dahlia-engine)

USAGE:
  flower_cli list
  flower_cli run <preset> [options]

OPTIONS (run):
  --factor <f>       Morph factor in [0, 1] (default 0)
  --time <ms>        Elapsed time in milliseconds (default 0)
  --rows <n>         Radius steps of the mesh layer (default from preset)
  --cols <n>         Angle steps of the mesh layer (default from preset)
  --seed <n>         Random seed (default 1)
  --obj <path>       Write the deformed mesh as Wavefront OBJ with vertex colors
  --snap <path>      Write a quantized text snapshot (stdout when omitted)
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
";

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_presets();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_presets() {
        for preset in Preset::ALL {
            println!("{:<10} {}", preset.name(), preset.description());
        }
    }

    struct RunOptions {
        factor: f64,
        time_ms: f64,
        rows: Option<usize>,
        cols: Option<usize>,
        seed: u64,
        obj_path: Option<PathBuf>,
        snap_path: Option<PathBuf>,
        overwrite: bool,
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let preset_name = args.next().ok_or("missing preset name")?;
        let preset = Preset::from_name(&preset_name).ok_or_else(|| unknown_preset(&preset_name))?;

        let mut options = RunOptions {
            factor: 0.0,
            time_ms: 0.0,
            rows: None,
            cols: None,
            seed: DEFAULT_SEED,
            obj_path: None,
            snap_path: None,
            overwrite: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--factor" => options.factor = args.parsed("--factor")?,
                "--time" => options.time_ms = args.parsed("--time")?,
                "--rows" => options.rows = Some(args.parsed("--rows")?),
                "--cols" => options.cols = Some(args.parsed("--cols")?),
                "--seed" => options.seed = args.parsed("--seed")?,
                "--obj" => options.obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => options.snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => options.overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if !(0.0..=1.0).contains(&options.factor) {
            return Err(format!("--factor must be in [0, 1], got {}", options.factor));
        }
        if !options.time_ms.is_finite() || options.time_ms < 0.0 {
            return Err(format!("--time must be a non-negative number, got {}", options.time_ms));
        }

        let output = render(preset, &options)?;

        if let Some(path) = options.snap_path.as_deref() {
            write_text_file(path, &output.snapshot, options.overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = options.obj_path.as_deref() {
            write_obj_file(path, &output.surface, &output.frame, preset.name(), options.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        eprintln!(
            "{}: vertices={} triangles={} | {}",
            preset.name(),
            output.surface.vertex_count(),
            output.surface.triangle_count(),
            output.frame_diag
        );

        Ok(())
    }

    struct RenderOutput {
        surface: PetalSurface,
        frame: LiveFrame,
        frame_diag: FrameDiagnostics,
        snapshot: String,
    }

    fn render(preset: Preset, options: &RunOptions) -> Result<RenderOutput, String> {
        let base = preset.config();
        let config = EngineConfig {
            seed: Some(options.seed),
            mesh_rows: options.rows.unwrap_or(base.mesh_rows),
            mesh_cols: options.cols.unwrap_or(base.mesh_cols),
            point_layer: false,
            ..base
        };
        config.validate().map_err(|e| e.to_string())?;

        let mut rng = StdRng::seed_from_u64(options.seed);
        let (surface, surface_diag) =
            generate_petal_surface(&config.mesh_options(), &mut rng).map_err(|e| e.to_string())?;

        let mut engine = DispersionEngine::new(config.dispersion).map_err(|e| e.to_string())?;
        let mut frame = LiveFrame::new(surface.vertex_count());
        let frame_diag = engine
            .step(
                &surface,
                &ControlState::at(options.factor, options.time_ms),
                &mut frame,
            )
            .map_err(|e| e.to_string())?;

        let snapshot = snapshot(preset, options, |out| {
            write_surface_diagnostics(out, &surface_diag);
            write_frame_diagnostics(out, &frame_diag);
            write_frame(out, &surface, &frame);
        });

        Ok(RenderOutput {
            surface,
            frame,
            frame_diag,
            snapshot,
        })
    }

    fn unknown_preset(name: &str) -> String {
        let mut msg = format!("unknown preset `{name}`\n\navailable presets:\n");
        for preset in Preset::ALL {
            let _ = writeln!(msg, "  {}", preset.name());
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        refuse_overwrite(path, overwrite)?;
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn refuse_overwrite(path: &Path, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        Ok(())
    }

    fn write_obj_file(
        path: &Path,
        surface: &PetalSurface,
        frame: &LiveFrame,
        name: &str,
        overwrite: bool,
    ) -> Result<(), String> {
        surface.validate().map_err(|e| format!("surface validation failed: {e}"))?;
        refuse_overwrite(path, overwrite)?;

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);
        let err = |e: std::io::Error| format!("write obj: {e}");

        writeln!(w, "# dahlia-engine flower_cli").map_err(err)?;
        writeln!(w, "o {name}").map_err(err)?;

        // `v x y z r g b` is the common vertex-color extension.
        for (p, c) in frame.positions().iter().zip(surface.colors()) {
            writeln!(w, "v {} {} {} {} {} {}", p[0], p[1], p[2], c[0], c[1], c[2]).map_err(err)?;
        }

        let normals = surface.normals();
        if let Some(normals) = normals {
            for n in normals {
                writeln!(w, "vn {} {} {}", n[0], n[1], n[2]).map_err(err)?;
            }
        }

        for tri in surface.indices().chunks_exact(3) {
            let a = tri[0] + 1;
            let b = tri[1] + 1;
            let c = tri[2] + 1;
            let written = if normals.is_some() {
                writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}")
            } else {
                writeln!(w, "f {a} {b} {c}")
            };
            written.map_err(err)?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == 0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_vec3_line(out: &mut String, prefix: &str, v: [f64; 3]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push(' ');
        write_f64(out, v[2]);
        out.push('\n');
    }

    fn write_scalar_line(out: &mut String, key: &str, value: f64) {
        let _ = write!(out, "{key} ");
        write_f64(out, value);
        out.push('\n');
    }

    fn write_surface_diagnostics(out: &mut String, diag: &SurfaceDiagnostics) {
        let _ = writeln!(out, "surface.grid {} {}", diag.rows, diag.cols);
        let _ = writeln!(out, "surface.vertex_count {}", diag.vertex_count);
        let _ = writeln!(out, "surface.triangle_count {}", diag.triangle_count);
        write_scalar_line(out, "surface.max_planar_radius", diag.max_planar_radius);
        write_scalar_line(out, "surface.height_span", diag.height_span);
        let _ = writeln!(out, "surface.degenerate_normals {}", diag.degenerate_normal_count);
        for warning in &diag.warnings {
            let _ = writeln!(out, "surface.warning {warning}");
        }
    }

    fn write_frame_diagnostics(out: &mut String, diag: &FrameDiagnostics) {
        write_scalar_line(out, "frame.factor", diag.factor);
        write_scalar_line(out, "frame.noise_phase", diag.noise_phase);
        let _ = writeln!(out, "frame.frozen {}", diag.frozen);
        write_scalar_line(out, "frame.max_displacement", diag.max_displacement);
    }

    fn write_frame(out: &mut String, surface: &PetalSurface, frame: &LiveFrame) {
        write_scalar_line(out, "frame.mesh_opacity", frame.mesh_opacity);
        write_scalar_line(out, "frame.point_opacity", frame.point_opacity);

        let _ = writeln!(out, "frame.positions {}", frame.vertex_count());
        for p in frame.positions().iter().copied() {
            write_vec3_line(out, "p", p);
        }

        let _ = writeln!(out, "surface.colors {}", surface.vertex_count());
        for c in surface.colors().iter().copied() {
            write_vec3_line(out, "c", c);
        }

        let _ = writeln!(out, "surface.indices {}", surface.indices().len());
        for tri in surface.indices().chunks_exact(3) {
            let _ = writeln!(out, "i {} {} {}", tri[0], tri[1], tri[2]);
        }
    }

    fn snapshot(preset: Preset, options: &RunOptions, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# dahlia-engine snapshot v1");
        let _ = writeln!(out, "preset {}", preset.name());
        let _ = writeln!(out, "seed {}", options.seed);
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }

        fn parsed<T: std::str::FromStr>(&mut self, flag: &str) -> Result<T, String>
        where
            T::Err: std::fmt::Display,
        {
            let raw = self.value(flag)?;
            raw.parse()
                .map_err(|e| format!("invalid value `{raw}` for {flag}: {e}"))
        }
    }
}
