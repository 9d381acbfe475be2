//! Runs a simulation: prepares the output folder, writes the XML
//! description, optionally shows it in AppCSXCAD and calls `openEMS`.

use crate::io::csx::write_openems_xml;
use crate::sim::fdtd::Fdtd;
use crate::sim::structure::SolidSummary;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Environment variable overriding the solver binary.
pub const OPENEMS_BIN_ENV: &str = "OPENEMS_BIN";
/// Environment variable overriding the geometry viewer binary.
pub const APPCSXCAD_BIN_ENV: &str = "APPCSXCAD_BIN";

/// Options of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Solver verbosity, 0 (quiet) to 3.
    pub verbose: u8,
    /// Wipe the output folder before writing into it.
    pub cleanup: bool,
    /// Dry run: set up the operator and stop before time-stepping.
    pub setup_only: bool,
    /// Dump the PEC skeleton for inspection (e.g. in ParaView).
    pub debug_pec: bool,
    /// Open the XML description in AppCSXCAD before running.
    pub show_geometry: bool,
    /// Write the XML description but do not start the solver.
    pub write_only: bool,
    /// Output folder, relative to the deck directory.
    pub output_dir: PathBuf,
    /// File name of the XML description inside `output_dir`.
    pub csx_file: String,
    /// Solver binary; falls back to `$OPENEMS_BIN`, then `openEMS`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openems_bin: Option<PathBuf>,
    /// Viewer binary; falls back to `$APPCSXCAD_BIN`, then `AppCSXCAD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appcsxcad_bin: Option<PathBuf>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            verbose: 3,
            cleanup: true,
            setup_only: false,
            debug_pec: false,
            show_geometry: true,
            write_only: false,
            output_dir: PathBuf::from("simulation_output"),
            csx_file: "fea.xml".to_string(),
            openems_bin: None,
            appcsxcad_bin: None,
        }
    }
}

impl RunOptions {
    pub fn openems_binary(&self) -> PathBuf {
        resolve_binary(self.openems_bin.as_deref(), OPENEMS_BIN_ENV, "openEMS")
    }

    pub fn appcsxcad_binary(&self) -> PathBuf {
        resolve_binary(self.appcsxcad_bin.as_deref(), APPCSXCAD_BIN_ENV, "AppCSXCAD")
    }
}

fn resolve_binary(explicit: Option<&Path>, env_var: &str, default: &str) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(env_var) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => PathBuf::from(default),
    }
}

/// What a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub sim_path: PathBuf,
    pub csx_path: PathBuf,
    pub solids: Vec<SolidSummary>,
    pub solver_ran: bool,
}

/// Creates the output folder; with `cleanup` an existing one is removed
/// first so every run starts from an empty folder.
pub fn prepare_output_dir(path: &Path, cleanup: bool) -> Result<()> {
    if cleanup && path.exists() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to clear output folder: {}", path.display()))?;
    }
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create output folder: {}", path.display()))
}

/// Command-line arguments passed to `openEMS` after the binary name.
pub fn solver_args(csx_path: &Path, opts: &RunOptions) -> Vec<String> {
    let mut args = vec![csx_path.display().to_string()];
    match opts.verbose {
        0 => {}
        1 => args.push("-v".to_string()),
        2 => args.push("-vv".to_string()),
        _ => args.push("-vvv".to_string()),
    }
    if opts.debug_pec {
        args.push("--debug-PEC".to_string());
    }
    if opts.setup_only {
        args.push("--no-simulation".to_string());
    }
    args
}

/// Opens `csx_path` in the geometry viewer and waits for it to close.
pub fn launch_viewer(csx_path: &Path, opts: &RunOptions) -> Result<()> {
    let bin = opts.appcsxcad_binary();
    info!(viewer = %bin.display(), file = %csx_path.display(), "Opening geometry viewer");
    let status = Command::new(&bin)
        .arg(csx_path)
        .status()
        .with_context(|| format!("Failed to start viewer: {}", bin.display()))?;
    if !status.success() {
        bail!("Viewer {} exited with {status}", bin.display());
    }
    Ok(())
}

/// Runs the solver on `csx_path` inside `sim_path`. Blocks until it exits.
pub fn run_solver(csx_path: &Path, sim_path: &Path, opts: &RunOptions) -> Result<()> {
    let bin = opts.openems_binary();
    let args = solver_args(csx_path, opts);
    info!(solver = %bin.display(), args = ?args, "Starting openEMS");
    let status = Command::new(&bin)
        .args(&args)
        .current_dir(sim_path)
        .status()
        .with_context(|| format!("Failed to start solver: {}", bin.display()))?;
    if !status.success() {
        bail!("Solver {} exited with {status}", bin.display());
    }
    info!("openEMS finished");
    Ok(())
}

/// Full pipeline for a built setup. `base_dir` is the deck directory, the
/// output folder is created inside it. Reported paths are absolute.
pub fn run(fdtd: &Fdtd, base_dir: &Path, opts: &RunOptions) -> Result<RunReport> {
    fdtd.validate()?;

    let solids = fdtd.csx().read_solid_models()?;

    // The solver runs inside the output folder
    let base_dir = std::path::absolute(base_dir)
        .with_context(|| format!("Cannot resolve deck directory: {}", base_dir.display()))?;
    let sim_path = base_dir.join(&opts.output_dir);
    prepare_output_dir(&sim_path, opts.cleanup)?;

    let csx_path = sim_path.join(&opts.csx_file);
    write_openems_xml(&csx_path, fdtd)?;
    info!(file = %csx_path.display(), "Wrote simulation description");

    if opts.show_geometry
        && let Err(err) = launch_viewer(&csx_path, opts)
    {
        warn!("Geometry viewer failed: {err:#}");
    }

    let solver_ran = if opts.write_only {
        info!("Skipping solver run");
        false
    } else {
        run_solver(&csx_path, &sim_path, opts)?;
        true
    };

    Ok(RunReport {
        sim_path,
        csx_path,
        solids,
        solver_ran,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_options() {
        let opts = RunOptions::default();
        assert_eq!(opts.verbose, 3);
        assert!(opts.cleanup);
        assert!(!opts.setup_only);
        assert!(!opts.debug_pec);
        assert_eq!(opts.csx_file, "fea.xml");
    }

    #[test]
    fn test_solver_args() {
        let path = Path::new("/tmp/sim/fea.xml");
        let mut opts = RunOptions::default();
        assert_eq!(solver_args(path, &opts), vec!["/tmp/sim/fea.xml", "-vvv"]);

        opts.verbose = 0;
        opts.setup_only = true;
        opts.debug_pec = true;
        assert_eq!(
            solver_args(path, &opts),
            vec!["/tmp/sim/fea.xml", "--debug-PEC", "--no-simulation"]
        );

        opts.verbose = 1;
        opts.setup_only = false;
        opts.debug_pec = false;
        assert_eq!(solver_args(path, &opts), vec!["/tmp/sim/fea.xml", "-v"]);
    }

    #[test]
    fn test_explicit_binary_wins() {
        let opts = RunOptions {
            openems_bin: Some(PathBuf::from("/opt/openEMS/bin/openEMS")),
            ..RunOptions::default()
        };
        assert_eq!(opts.openems_binary(), PathBuf::from("/opt/openEMS/bin/openEMS"));
    }

    #[test]
    fn test_prepare_output_dir() -> Result<()> {
        let dir = tempdir()?;
        let sim = dir.path().join("simulation_output");
        prepare_output_dir(&sim, true)?;
        std::fs::write(sim.join("old.h5"), b"stale")?;

        prepare_output_dir(&sim, false)?;
        assert!(sim.join("old.h5").exists());

        prepare_output_dir(&sim, true)?;
        assert!(sim.exists());
        assert!(!sim.join("old.h5").exists());
        Ok(())
    }

    fn meshed_setup() -> Result<Fdtd> {
        let mut fdtd = Fdtd::new(100, 1e-5);
        fdtd.set_sinus_excite(1e9)?;
        for axis in crate::Axis::ALL {
            fdtd.csx_mut().grid_mut().replace_range(axis, 0., 2., 1.)?;
        }
        Ok(fdtd)
    }

    #[test]
    fn test_viewer_failure_is_not_fatal() -> Result<()> {
        let dir = tempdir()?;
        let fdtd = meshed_setup()?;
        let opts = RunOptions {
            show_geometry: true,
            write_only: true,
            appcsxcad_bin: Some(dir.path().join("no-such-AppCSXCAD")),
            ..RunOptions::default()
        };
        assert!(launch_viewer(&dir.path().join("fea.xml"), &opts).is_err());

        let report = run(&fdtd, dir.path(), &opts)?;
        assert!(!report.solver_ran);
        assert!(report.csx_path.exists());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_viewer_exit_status_is_not_fatal() -> Result<()> {
        let dir = tempdir()?;
        let opts = RunOptions {
            show_geometry: true,
            write_only: true,
            appcsxcad_bin: Some(PathBuf::from("false")),
            ..RunOptions::default()
        };
        let report = run(&meshed_setup()?, dir.path(), &opts)?;
        let xml = std::fs::read_to_string(&report.csx_path)?;
        assert!(xml.contains("<RectilinearGrid"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_run_solver_exit_status() -> Result<()> {
        let dir = tempdir()?;
        let csx = dir.path().join("fea.xml");

        let ok = RunOptions {
            openems_bin: Some(PathBuf::from("true")),
            ..RunOptions::default()
        };
        run_solver(&csx, dir.path(), &ok)?;

        let failing = RunOptions {
            openems_bin: Some(PathBuf::from("false")),
            ..RunOptions::default()
        };
        assert!(run_solver(&csx, dir.path(), &failing).is_err());

        let missing = RunOptions {
            openems_bin: Some(dir.path().join("no-such-openEMS")),
            ..RunOptions::default()
        };
        assert!(run_solver(&csx, dir.path(), &missing).is_err());
        Ok(())
    }
}
