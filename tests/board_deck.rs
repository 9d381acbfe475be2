use anyhow::Result;
use emsim3d::io::stl::box_mesh;
use emsim3d::io::{StlFormat, read_deck, read_stl, write_deck, write_stl};
use emsim3d::sim::runner::{self, RunOptions};
use emsim3d::{Axis, Deck, Point};
use std::fs;
use std::path::Path;
use tempfile::{Builder, tempdir};

/// Writes placeholder solid models for the board deck into `dir`.
fn write_board_models(dir: &Path) -> Result<()> {
    let models = [
        (
            "copper_gen_model.stl",
            Point::new(100., -55., 1.46),
            Point::new(110., -45., 1.495),
            StlFormat::Binary,
        ),
        (
            "Air_gen_model.stl",
            Point::new(64., -90., -1.),
            Point::new(137., -31., 3.),
            StlFormat::Ascii,
        ),
        (
            "fr4_gen_model.stl",
            Point::new(70., -85., 0.),
            Point::new(130., -35., 1.46),
            StlFormat::Binary,
        ),
    ];
    for (file, lo, hi, format) in models {
        write_stl(&dir.join(file), &box_mesh(lo, hi), file, format)?;
    }
    Ok(())
}

fn offline_options() -> RunOptions {
    RunOptions {
        show_geometry: false,
        write_only: true,
        ..RunOptions::default()
    }
}

#[test]
fn test_board_deck_writes_description() -> Result<()> {
    let dir = tempdir()?;
    write_board_models(dir.path())?;

    let deck = Deck::board_default();
    let fdtd = deck.build(dir.path())?;
    let report = runner::run(&fdtd, dir.path(), &offline_options())?;

    assert!(!report.solver_ran);
    assert_eq!(report.sim_path, dir.path().join("simulation_output"));
    assert_eq!(report.csx_path, report.sim_path.join("fea.xml"));
    assert_eq!(report.solids.len(), 3);
    assert!(report.solids.iter().all(|s| s.triangles == 12));

    let xml = fs::read_to_string(&report.csx_path)?;
    assert!(xml.contains(r#"<Excitation Type="1" f0="24000000"/>"#));
    assert!(xml.contains(r#"NumberOfTimesteps="1000000" endCriteria="0.00001""#));
    for name in [
        "PEC",
        "copper",
        "air",
        "fr4",
        "port_resist_1",
        "port_excite_1",
        "port_ut_1",
        "port_it_1",
        "ht_Sim",
        "et_Sim",
    ] {
        assert!(xml.contains(&format!(r#"Name="{name}""#)), "missing {name}");
    }
    assert!(xml.contains(r#"<DumpBox ID="8" Name="ht_Sim" DumpType="1" DumpMode="2" FileType="0">"#));
    assert!(xml.contains(r#"<DumpBox ID="9" Name="et_Sim" DumpType="0" DumpMode="2" FileType="0">"#));

    let fr4 = dir.path().join("fr4_gen_model.stl");
    assert!(xml.contains(&format!(r#"FilePath="{}""#, fr4.display())));
    Ok(())
}

#[test]
fn test_rerun_clears_output() -> Result<()> {
    let dir = tempdir()?;
    write_board_models(dir.path())?;
    let fdtd = Deck::board_default().build(dir.path())?;

    let first = runner::run(&fdtd, dir.path(), &offline_options())?;
    fs::write(first.sim_path.join("et_Sim_0001.vtr"), b"old")?;

    let second = runner::run(&fdtd, dir.path(), &offline_options())?;
    assert!(second.csx_path.exists());
    assert!(!second.sim_path.join("et_Sim_0001.vtr").exists());
    Ok(())
}

#[test]
fn test_missing_solid_model_fails() -> Result<()> {
    let dir = tempdir()?;
    let fdtd = Deck::board_default().build(dir.path())?;
    let err = runner::run(&fdtd, dir.path(), &offline_options()).unwrap_err();
    assert!(format!("{err:#}").contains("copper"));
    assert!(!dir.path().join("simulation_output").exists());
    Ok(())
}

#[test]
fn test_deck_file_roundtrip_and_build() -> Result<()> {
    let dir = tempdir()?;
    let mut deck = Deck::board_default();
    deck.name = "small_board".to_string();
    deck.run = offline_options();
    for range in deck.mesh.iter_mut() {
        range.step = 1.0;
    }

    let path = dir.path().join("board.json");
    write_deck(&path, &deck)?;
    let loaded = read_deck(&path)?;
    assert_eq!(loaded, deck);

    write_board_models(dir.path())?;
    let fdtd = loaded.build(dir.path())?;
    // 64..137 step 1 reaches 137 exactly
    assert_eq!(fdtd.csx().grid().line_count(Axis::X), 74);

    let report = runner::run(&fdtd, dir.path(), &loaded.run)?;
    let mesh = read_stl(&report.solids[0].path)?;
    assert_eq!(mesh.face_count(), 12);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_relative_deck_dir_reaches_solver() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let dir = Builder::new().prefix("board_rel").tempdir_in(&cwd)?;
    let base = dir.path().strip_prefix(&cwd)?;
    assert!(base.is_relative());
    write_board_models(base)?;

    let fdtd = Deck::board_default().build(base)?;
    // `cat` stands in for the solver and fails unless it can open the description
    let opts = RunOptions {
        verbose: 0,
        show_geometry: false,
        openems_bin: Some("cat".into()),
        ..RunOptions::default()
    };
    let report = runner::run(&fdtd, base, &opts)?;

    assert!(report.solver_ran);
    assert!(report.sim_path.is_absolute());
    assert!(report.csx_path.is_absolute());
    assert!(report.solids.iter().all(|s| s.path.is_absolute()));
    Ok(())
}
