//! Pass orchestration over a whole design.
//!
//! A [`Session`] owns the validated configuration and the tool runner and
//! drives the pipeline once per (module, clock domain) pair. All run-wide
//! state lives here or in the [`Design`] itself (the `autoidx` counter that
//! keeps generated names unique across passes); nothing is process-global.

use crate::driver::{OutputFilter, ToolRunner, SCRIPT_FILE};
use crate::emit;
use crate::error::{BridgeError, Result};
use crate::extract::{extract_cell, mark_boundaries};
use crate::genlib::{self, resolve_gate_set};
use crate::loops::break_loops;
use crate::partition::{partition, DomainKey};
use crate::registry::SignalRegistry;
use crate::reintegrate::splice_mapped;
use crate::script::{build_script, MapMode, ScriptParams, ScriptSource};
use log::info;
use std::fs;
use std::path::PathBuf;
use strata_ir::{CellId, Design, FfInit, Module, ModuleId, SigMap};

/// Everything one mapping run needs to know.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Optimizer executable name or path.
    pub exe: String,
    /// What the optimizer maps against.
    pub mode: MapMode,
    /// Where the command script comes from.
    pub script: ScriptSource,
    /// Tuning parameters substituted into the script.
    pub params: ScriptParams,
    /// Raw gate-set argument (names and aliases, `-NAME` removes).
    pub gates: Option<String>,
    /// Use the fast (single-pass) script variants.
    pub fast: bool,
    /// Map flip-flops too, partitioning the module into clock domains.
    pub dff: bool,
    /// Restrict flip-flop mapping to one domain: `[!]clk[,[!]en]`.
    pub clk: String,
    /// Mark flip-flop output wires with the keep attribute.
    pub keepff: bool,
    /// Append the name-reconciliation command to the script.
    pub dress: bool,
    /// Offer a 4-to-1 mux in the generated library.
    pub mux4: bool,
    /// Offer an 8-to-1 mux in the generated library.
    pub mux8: bool,
    /// Offer a 16-to-1 mux in the generated library.
    pub mux16: bool,
    /// Directory under which per-pass work directories are created.
    pub work_root: PathBuf,
    /// Show work-directory paths in relayed tool output instead of
    /// redacting them.
    pub show_workdir: bool,
    /// Splice results back during the map phase. Disabled for the
    /// decoupled workflow, where a later reintegration run picks up the
    /// work directories.
    pub reintegrate: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            exe: "abc".to_string(),
            mode: MapMode::Default,
            script: ScriptSource::Default,
            params: ScriptParams::default(),
            gates: None,
            fast: false,
            dff: false,
            clk: String::new(),
            keepff: false,
            dress: false,
            mux4: false,
            mux8: false,
            mux16: false,
            work_root: PathBuf::from("strata_work"),
            show_workdir: false,
            reintegrate: true,
        }
    }
}

impl MapConfig {
    /// Rejects invalid option combinations before any pass starts.
    pub fn validate(&self) -> Result<()> {
        if let MapMode::Lut(costs) = &self.mode {
            if costs.is_empty() {
                return Err(BridgeError::Config("empty LUT cost list".to_string()));
            }
            if costs.len() > 16 {
                return Err(BridgeError::Config(format!(
                    "LUTs with {} inputs are not supported (max 16)",
                    costs.len()
                )));
            }
        }
        resolve_gate_set(self.gates.as_deref())?;
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Map,
    Reint,
}

/// Drives the flatten → optimize → splice pipeline over a design.
pub struct Session<R> {
    config: MapConfig,
    runner: R,
}

impl<R: ToolRunner> Session<R> {
    /// Validates the configuration and builds a session around a runner.
    pub fn new(config: MapConfig, runner: R) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    /// The validated configuration.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Runs the full pipeline: flatten, invoke the optimizer, and (unless
    /// disabled) splice the results back.
    pub fn run_map(&self, design: &mut Design) -> Result<()> {
        self.run(design, Phase::Map)
    }

    /// Decoupled second phase: re-derives the flattened state of every
    /// pass and splices from the existing work directories. A pass whose
    /// `output.blif` is missing is skipped.
    pub fn run_reint(&self, design: &mut Design) -> Result<()> {
        self.run(design, Phase::Reint)
    }

    fn run(&self, design: &mut Design, phase: Phase) -> Result<()> {
        let module_ids = design.modules.ids();
        for mid in module_ids {
            let dff = self.config.dff || !self.config.clk.is_empty();
            let domains: Vec<(DomainKey, Option<Vec<CellId>>)> = {
                let module = &design.modules[mid];
                let mut sigmap = SigMap::from_module(module);
                if dff && self.config.clk.is_empty() {
                    let parts = partition(module, &mut sigmap);
                    info!(
                        "found {} clock domains in module {}",
                        parts.len(),
                        module.name
                    );
                    parts.into_iter().map(|(k, v)| (k, Some(v))).collect()
                } else {
                    vec![(clock_domain(module, &mut sigmap, &self.config.clk, dff)?, None)]
                }
            };
            for (index, (domain, cells)) in domains.iter().enumerate() {
                self.run_pass(design, mid, index, domain, cells.as_deref(), phase)?;
            }
            design.modules[mid].compact_cells();
        }
        Ok(())
    }

    fn run_pass(
        &self,
        design: &mut Design,
        mid: ModuleId,
        index: usize,
        domain: &DomainKey,
        cells: Option<&[CellId]>,
        phase: Phase,
    ) -> Result<()> {
        let pass = design.bump_autoidx();
        let module = &mut design.modules[mid];
        let autoidx = &mut design.autoidx;

        info!(
            "mapping module {} ({})",
            module.name,
            domain.describe(module)
        );
        let workdir = self
            .config
            .work_root
            .join(format!("{}_{index}", sanitize_dir_name(&module.name)));

        let mut sigmap = SigMap::from_module(module);
        let initvals = FfInit::from_module(module, &mut sigmap);
        let mut registry = SignalRegistry::new();
        let cell_ids: Vec<CellId> = match cells {
            Some(list) => list.to_vec(),
            None => module.live_cells().map(|c| c.id).collect(),
        };
        for cid in cell_ids {
            extract_cell(
                module,
                &mut registry,
                &mut sigmap,
                &initvals,
                domain,
                cid,
                self.config.keepff,
            );
        }
        mark_boundaries(module, &mut registry, &mut sigmap, domain);
        let breaks = break_loops(module, &mut registry, &mut sigmap, &initvals, autoidx);
        if breaks > 0 {
            info!("broke {breaks} combinational loops in module {}", module.name);
        }

        let mut blif = Vec::new();
        let result = emit::write_netlist(&mut blif, module, &registry)
            .map_err(|e| BridgeError::io(workdir.join("input.blif"), e))?;
        if result.is_empty() {
            info!("nothing to map in module {}", module.name);
            return Ok(());
        }
        info!(
            "extracted {} gates over {} signals ({} inputs, {} outputs)",
            result.gate_count,
            registry.len(),
            result.pi_map.len(),
            result.po_map.len(),
        );

        if phase == Phase::Map {
            fs::create_dir_all(&workdir).map_err(|e| BridgeError::io(&workdir, e))?;
            write_file(&workdir.join("input.blif"), &blif)?;
            match &self.config.mode {
                MapMode::Lut(costs) => {
                    let mut buf = Vec::new();
                    genlib::write_lutdefs(&mut buf, costs)
                        .map_err(|e| BridgeError::io(workdir.join("lutdefs.txt"), e))?;
                    write_file(&workdir.join("lutdefs.txt"), &buf)?;
                }
                MapMode::Sop | MapMode::Default => {
                    let library = resolve_gate_set(self.config.gates.as_deref())?;
                    let mut buf = Vec::new();
                    genlib::write_genlib(
                        &mut buf,
                        &library,
                        self.config.mux4,
                        self.config.mux8,
                        self.config.mux16,
                    )
                    .map_err(|e| BridgeError::io(workdir.join("stdcells.genlib"), e))?;
                    write_file(&workdir.join("stdcells.genlib"), &buf)?;
                }
                MapMode::Library { .. } => {}
            }
            let script = build_script(
                &workdir,
                &self.config.mode,
                &self.config.script,
                &self.config.params,
                self.config.fast,
                self.config.dress,
            );
            write_file(&workdir.join(SCRIPT_FILE), script.as_bytes())?;

            let mut filter = OutputFilter::new(
                &workdir,
                self.config.show_workdir,
                result.pi_map.clone(),
                result.po_map.clone(),
            );
            self.runner.run(&workdir, &mut filter)?;
            if !self.config.reintegrate {
                return Ok(());
            }
        }

        let out_path = workdir.join("output.blif");
        let text = match fs::read_to_string(&out_path) {
            Ok(text) => text,
            Err(e) if phase == Phase::Reint && e.kind() == std::io::ErrorKind::NotFound => {
                info!("no {} to reintegrate, skipping", out_path.display());
                return Ok(());
            }
            Err(e) => return Err(BridgeError::io(&out_path, e)),
        };
        let mapped = strata_blif::parse_module(&text)?;
        let builtin_lib = !matches!(self.config.mode, MapMode::Library { .. });
        splice_mapped(
            module,
            &registry,
            domain,
            &mapped,
            pass,
            result.saw_def_init,
            builtin_lib,
        );
        Ok(())
    }
}

fn write_file(path: &std::path::Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents).map_err(|e| BridgeError::io(path, e))
}

fn polarity(spec: &str) -> (bool, &str) {
    match spec.strip_prefix('!') {
        Some(name) => (false, name),
        None => (true, spec),
    }
}

/// Resolves a `[!]clk[,[!]en]` clock specification against a module.
///
/// A named wire that does not exist leaves the corresponding signal empty;
/// with flip-flop mapping requested that is a configuration error, since
/// no flip-flop could ever match the domain.
fn clock_domain(
    module: &Module,
    sigmap: &mut SigMap,
    clk_str: &str,
    dff: bool,
) -> Result<DomainKey> {
    let mut domain = DomainKey::default_key();
    if !clk_str.is_empty() {
        let (clk_part, en_part) = match clk_str.split_once(',') {
            Some((clk, en)) => (clk, Some(en)),
            None => (clk_str, None),
        };
        let (pol, name) = polarity(clk_part);
        domain.clk_polarity = pol;
        if let Some(id) = module.wire(name) {
            domain.clk = sigmap.apply(&module.wire_spec(id));
        }
        if let Some(en_part) = en_part {
            let (pol, name) = polarity(en_part);
            domain.en_polarity = pol;
            if let Some(id) = module.wire(name) {
                domain.en = sigmap.apply(&module.wire_spec(id));
            }
        }
        if dff && domain.clk.is_empty() {
            return Err(BridgeError::Config(format!(
                "clock domain {clk_str} not found in module {}",
                module.name
            )));
        }
    }
    Ok(domain)
}

fn sanitize_dir_name(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| if matches!(c, '\'' | '$' | '\\') { '-' } else { c })
        .collect();
    let mut out = mapped.trim_start_matches('-').to_string();
    if out.len() > 252 {
        let mut end = 252;
        while !out.is_char_boundary(end) {
            end -= 1;
        }
        out.truncate(end);
    }
    out
}
