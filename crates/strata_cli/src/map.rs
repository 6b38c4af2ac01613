//! Command implementations: option translation, design I/O, and session
//! dispatch for the `map` and `reint` subcommands.

use crate::{MapArgs, ReintArgs};
use std::fs;
use std::io::Write;
use std::path::Path;
use strata_bridge::genlib::{parse_lut_arg, parse_luts_arg};
use strata_bridge::script::{MapMode, ScriptParams, ScriptSource};
use strata_bridge::{BridgeError, MapConfig, Result, Session, SubprocessRunner};
use strata_ir::Design;

/// Runs the `map` subcommand.
pub fn run(args: &MapArgs) -> Result<()> {
    let config = build_config(args)?;
    let reintegrate = config.reintegrate;
    let mut design = read_design(&args.design)?;
    let session = Session::new(config, SubprocessRunner::new(args.exe.clone()))?;
    session.run_map(&mut design)?;
    if reintegrate {
        write_design(&design, args.output.as_deref())?;
    }
    Ok(())
}

/// Runs the `reint` subcommand.
pub fn run_reint(args: &ReintArgs) -> Result<()> {
    // The mode decides how mapped cell names are translated back, so it
    // has to match what the map phase ran with.
    let mode = if !args.liberty.is_empty() || !args.genlib.is_empty() {
        MapMode::Library {
            liberty: args.liberty.clone(),
            genlib: args.genlib.clone(),
            constr: None,
        }
    } else {
        MapMode::Default
    };
    let config = MapConfig {
        mode,
        dff: args.dff,
        clk: args.clk.clone(),
        keepff: args.keepff,
        work_root: args.work_dir.clone(),
        ..Default::default()
    };
    let mut design = read_design(&args.design)?;
    let session = Session::new(config, SubprocessRunner::new("abc"))?;
    session.run_reint(&mut design)?;
    write_design(&design, args.output.as_deref())
}

fn read_design(path: &Path) -> Result<Design> {
    let text = fs::read_to_string(path).map_err(|e| BridgeError::io(path, e))?;
    serde_json::from_str(&text)
        .map_err(|e| BridgeError::Config(format!("cannot parse {}: {e}", path.display())))
}

fn write_design(design: &Design, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(design)
        .map_err(|e| BridgeError::Config(format!("cannot serialize design: {e}")))?;
    match output {
        Some(path) => {
            fs::write(path, json.as_bytes()).map_err(|e| BridgeError::io(path, e))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(json.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
                .map_err(|e| BridgeError::io("<stdout>", e))?;
        }
    }
    Ok(())
}

fn build_mode(args: &MapArgs) -> Result<MapMode> {
    let lut_costs = match (&args.lut, &args.luts) {
        (Some(_), Some(_)) => {
            return Err(BridgeError::Config(
                "--lut and --luts are mutually exclusive".to_string(),
            ))
        }
        (Some(arg), None) => Some(parse_lut_arg(arg)?),
        (None, Some(arg)) => Some(parse_luts_arg(arg)?),
        (None, None) => None,
    };
    if let Some(costs) = lut_costs {
        if args.sop {
            return Err(BridgeError::Config(
                "--sop cannot be combined with LUT mapping".to_string(),
            ));
        }
        return Ok(MapMode::Lut(costs));
    }
    if !args.liberty.is_empty() || !args.genlib.is_empty() {
        return Ok(MapMode::Library {
            liberty: args.liberty.clone(),
            genlib: args.genlib.clone(),
            constr: args.constr.clone(),
        });
    }
    if args.constr.is_some() {
        return Err(BridgeError::Config(
            "--constr requires a library (--liberty or --genlib)".to_string(),
        ));
    }
    if args.sop {
        return Ok(MapMode::Sop);
    }
    Ok(MapMode::Default)
}

fn build_config(args: &MapArgs) -> Result<MapConfig> {
    Ok(MapConfig {
        exe: args.exe.clone(),
        mode: build_mode(args)?,
        script: args
            .script
            .as_deref()
            .map(ScriptSource::parse)
            .unwrap_or(ScriptSource::Default),
        params: ScriptParams {
            delay: args.delay,
            sop_inputs: args.sop_inputs,
            sop_products: args.sop_products,
            lut_shared: args.lut_shared,
        },
        gates: args.gates.clone(),
        fast: args.fast,
        dff: args.dff,
        clk: args.clk.clone(),
        keepff: args.keepff,
        dress: args.dress,
        mux4: args.mux4,
        mux8: args.mux8,
        mux16: args.mux16,
        work_root: args.work_dir.clone(),
        show_workdir: args.show_tempdir,
        reintegrate: !args.no_reint,
    })
}
