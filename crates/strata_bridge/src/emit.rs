//! BLIF emission of one domain's node graph.
//!
//! Node `id` is written as `st__n<id>`; the reintegrator relies on that
//! prefix to resolve names back to their originating bits. The `.names`
//! cover of every gate kind is its exact truth table, and flip-flops become
//! `.latch` lines with reset 0, 1, or 2 (unknown).

use crate::registry::{GateKind, SignalRegistry};
use std::collections::BTreeMap;
use std::io::{self, Write};
use strata_ir::{Logic, Module};

/// Name prefix of emitted graph nodes.
pub const NODE_PREFIX: &str = "st__n";

/// What the emitter produced, used to drive the tool invocation and
/// reintegration of the same pass.
#[derive(Debug, Default)]
pub struct EmitResult {
    /// Primary-input index to display name, for tool-output annotation.
    pub pi_map: BTreeMap<usize, String>,
    /// Primary-output index to display name.
    pub po_map: BTreeMap<usize, String>,
    /// Number of gates written.
    pub gate_count: usize,
    /// True if any latch carried a definite reset value; enables
    /// initial-value recovery after mapping.
    pub saw_def_init: bool,
}

impl EmitResult {
    /// True if the domain has nothing for the optimizer to map.
    pub fn is_empty(&self) -> bool {
        self.po_map.is_empty()
    }
}

fn rows(kind: GateKind) -> (usize, &'static [&'static str]) {
    match kind {
        GateKind::Buf => (1, &["1 1"]),
        GateKind::Not => (1, &["0 1"]),
        GateKind::And => (2, &["11 1"]),
        GateKind::Nand => (2, &["0- 1", "-0 1"]),
        GateKind::Or => (2, &["-1 1", "1- 1"]),
        GateKind::Nor => (2, &["00 1"]),
        GateKind::Xor => (2, &["01 1", "10 1"]),
        GateKind::Xnor => (2, &["00 1", "11 1"]),
        GateKind::AndNot => (2, &["10 1"]),
        GateKind::OrNot => (2, &["1- 1", "-0 1"]),
        GateKind::Mux => (3, &["1-0 1", "-11 1"]),
        GateKind::Nmux => (3, &["0-0 1", "-01 1"]),
        GateKind::Aoi3 => (3, &["-00 1", "0-0 1"]),
        GateKind::Oai3 => (3, &["00- 1", "--0 1"]),
        GateKind::Aoi4 => (4, &["-0-0 1", "-00- 1", "0--0 1", "0-0- 1"]),
        GateKind::Oai4 => (4, &["00-- 1", "--00 1"]),
        GateKind::None | GateKind::Ff => unreachable!("not a combinational gate"),
    }
}

/// Writes the node graph as a BLIF model named `netlist`.
///
/// # Panics
///
/// Panics if a combinational node is missing one of its fan-ins; extraction
/// guarantees they are fully populated.
pub fn write_netlist<W: Write>(
    w: &mut W,
    module: &Module,
    registry: &SignalRegistry,
) -> io::Result<EmitResult> {
    let mut result = EmitResult::default();

    writeln!(w, ".model netlist")?;

    write!(w, ".inputs")?;
    let mut count_input = 0;
    for node in registry.nodes() {
        if !node.is_boundary || node.kind != GateKind::None {
            continue;
        }
        write!(w, " {NODE_PREFIX}{}", node.id)?;
        result
            .pi_map
            .insert(count_input, module.display_bit(node.bit));
        count_input += 1;
    }
    if count_input == 0 {
        write!(w, " dummy_input")?;
    }
    writeln!(w)?;

    write!(w, ".outputs")?;
    let mut count_output = 0;
    for node in registry.nodes() {
        if !node.is_boundary || node.kind == GateKind::None {
            continue;
        }
        write!(w, " {NODE_PREFIX}{}", node.id)?;
        result
            .po_map
            .insert(count_output, module.display_bit(node.bit));
        count_output += 1;
    }
    writeln!(w)?;

    for node in registry.nodes() {
        writeln!(
            w,
            "# {NODE_PREFIX}{:<5} {}",
            node.id,
            module.display_bit(node.bit)
        )?;
    }

    for node in registry.nodes() {
        if node.bit.wire().is_none() {
            writeln!(w, ".names {NODE_PREFIX}{}", node.id)?;
            if node.bit.as_const() == Some(Logic::One) {
                writeln!(w, "1")?;
            }
        }
    }

    for node in registry.nodes() {
        match node.kind {
            GateKind::None => continue,
            GateKind::Ff => {
                let d = node.fanin[0].expect("flip-flop node without data fan-in");
                let reset = match node.init {
                    Logic::Zero => 0,
                    Logic::One => 1,
                    Logic::X => 2,
                };
                if node.init.is_definite() {
                    result.saw_def_init = true;
                }
                writeln!(
                    w,
                    ".latch {NODE_PREFIX}{d} {NODE_PREFIX}{} {reset}",
                    node.id
                )?;
            }
            kind => {
                let (arity, cover) = rows(kind);
                write!(w, ".names")?;
                for slot in &node.fanin[..arity] {
                    let fanin = slot.unwrap_or_else(|| {
                        panic!("gate node {} missing a fan-in", node.id)
                    });
                    write!(w, " {NODE_PREFIX}{fanin}")?;
                }
                writeln!(w, " {NODE_PREFIX}{}", node.id)?;
                for row in cover {
                    writeln!(w, "{row}")?;
                }
            }
        }
        result.gate_count += 1;
    }

    writeln!(w, ".end")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::GateNode;
    use strata_ir::{FfInit, ModuleId, SigBit, SigMap};

    struct Fixture {
        module: Module,
        registry: SignalRegistry,
        sigmap: SigMap,
        initvals: FfInit,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                module: Module::new(ModuleId::from_raw(0), "top"),
                registry: SignalRegistry::new(),
                sigmap: SigMap::new(),
                initvals: FfInit::default(),
            }
        }

        fn node(&mut self, name: &str, kind: GateKind, fanin: &[usize]) -> usize {
            let wire = match self.module.wire(name) {
                Some(id) => id,
                None => self.module.add_wire(name, 1),
            };
            let mut slots = [None; 4];
            for (slot, &f) in slots.iter_mut().zip(fanin) {
                *slot = Some(f);
            }
            self.registry.register(
                &mut self.sigmap,
                &self.initvals,
                SigBit::Wire { wire, offset: 0 },
                kind,
                slots,
            )
        }

        fn boundary(&mut self, id: usize) {
            self.registry.node_mut(id).is_boundary = true;
        }

        fn emit(&self) -> (String, EmitResult) {
            let mut buf = Vec::new();
            let result = write_netlist(&mut buf, &self.module, &self.registry).unwrap();
            (String::from_utf8(buf).unwrap(), result)
        }
    }

    fn eval_gate(kind: GateKind, v: &[bool]) -> bool {
        match kind {
            GateKind::Buf => v[0],
            GateKind::Not => !v[0],
            GateKind::And => v[0] & v[1],
            GateKind::Nand => !(v[0] & v[1]),
            GateKind::Or => v[0] | v[1],
            GateKind::Nor => !(v[0] | v[1]),
            GateKind::Xor => v[0] ^ v[1],
            GateKind::Xnor => !(v[0] ^ v[1]),
            GateKind::AndNot => v[0] & !v[1],
            GateKind::OrNot => v[0] | !v[1],
            GateKind::Mux => {
                if v[2] {
                    v[1]
                } else {
                    v[0]
                }
            }
            GateKind::Nmux => {
                if v[2] {
                    !v[1]
                } else {
                    !v[0]
                }
            }
            GateKind::Aoi3 => !((v[0] & v[1]) | v[2]),
            GateKind::Oai3 => !((v[0] | v[1]) & v[2]),
            GateKind::Aoi4 => !((v[0] & v[1]) | (v[2] & v[3])),
            GateKind::Oai4 => !((v[0] | v[1]) & (v[2] | v[3])),
            GateKind::None | GateKind::Ff => unreachable!(),
        }
    }

    fn eval_cover(cover: &[&str], v: &[bool]) -> bool {
        cover.iter().any(|row| {
            let pattern = row.split_whitespace().next().unwrap();
            pattern.chars().zip(v).all(|(c, &val)| match c {
                '-' => true,
                '1' => val,
                '0' => !val,
                _ => panic!("bad cover char {c}"),
            })
        })
    }

    #[test]
    fn covers_match_gate_functions_exhaustively() {
        let kinds = [
            GateKind::Buf,
            GateKind::Not,
            GateKind::And,
            GateKind::Nand,
            GateKind::Or,
            GateKind::Nor,
            GateKind::Xor,
            GateKind::Xnor,
            GateKind::AndNot,
            GateKind::OrNot,
            GateKind::Mux,
            GateKind::Nmux,
            GateKind::Aoi3,
            GateKind::Oai3,
            GateKind::Aoi4,
            GateKind::Oai4,
        ];
        for kind in kinds {
            let (arity, cover) = rows(kind);
            for assignment in 0..(1u32 << arity) {
                let v: Vec<bool> = (0..arity).map(|i| assignment & (1 << i) != 0).collect();
                assert_eq!(
                    eval_cover(cover, &v),
                    eval_gate(kind, &v),
                    "{kind:?} cover disagrees at {v:?}"
                );
            }
        }
    }

    #[test]
    fn inputs_outputs_and_comments() {
        let mut fx = Fixture::new();
        let a = fx.node("a", GateKind::None, &[]);
        let y = fx.node("y", GateKind::Not, &[a]);
        fx.boundary(a);
        fx.boundary(y);
        let (text, result) = fx.emit();
        assert!(text.starts_with(".model netlist\n"));
        assert!(text.contains("\n.inputs st__n0\n"));
        assert!(text.contains("\n.outputs st__n1\n"));
        assert!(text.contains(".names st__n0 st__n1\n0 1\n"));
        assert!(text.contains("# st__n0     a\n"));
        assert!(text.ends_with(".end\n"));
        assert_eq!(result.pi_map[&0], "a");
        assert_eq!(result.po_map[&0], "y");
        assert_eq!(result.gate_count, 1);
        assert!(!result.saw_def_init);
    }

    #[test]
    fn dummy_input_placeholder() {
        let mut fx = Fixture::new();
        let a = fx.node("a", GateKind::None, &[]);
        let y = fx.node("y", GateKind::Buf, &[a]);
        fx.boundary(y);
        let (text, result) = fx.emit();
        assert!(text.contains(".inputs dummy_input\n"));
        assert!(result.pi_map.is_empty());
        assert!(!result.is_empty());
    }

    #[test]
    fn latch_reset_values() {
        let mut fx = Fixture::new();
        let d = fx.node("d", GateKind::None, &[]);
        let q = fx.node("q", GateKind::Ff, &[d]);
        fx.boundary(q);
        fx.registry.node_mut(q).init = Logic::One;
        let (text, result) = fx.emit();
        assert!(text.contains(".latch st__n0 st__n1 1\n"));
        assert!(result.saw_def_init);

        let mut fx = Fixture::new();
        let d = fx.node("d", GateKind::None, &[]);
        let q = fx.node("q", GateKind::Ff, &[d]);
        fx.boundary(q);
        let (text, result) = fx.emit();
        assert!(text.contains(".latch st__n0 st__n1 2\n"));
        assert!(!result.saw_def_init);
    }

    #[test]
    fn constant_nodes_are_declared() {
        let mut fx = Fixture::new();
        let one = fx.registry.register(
            &mut fx.sigmap,
            &fx.initvals,
            SigBit::Const(Logic::One),
            GateKind::None,
            [None; 4],
        );
        let zero = fx.registry.register(
            &mut fx.sigmap,
            &fx.initvals,
            SigBit::Const(Logic::Zero),
            GateKind::None,
            [None; 4],
        );
        let y = fx.node("y", GateKind::And, &[one, zero]);
        fx.boundary(y);
        let (text, _) = fx.emit();
        assert!(text.contains(".names st__n0\n1\n"));
        assert!(text.contains(".names st__n1\n.names"));
    }

    #[test]
    fn mux_cover_exact_rows() {
        let mut fx = Fixture::new();
        let a = fx.node("a", GateKind::None, &[]);
        let b = fx.node("b", GateKind::None, &[]);
        let s = fx.node("s", GateKind::None, &[]);
        let y = fx.node("y", GateKind::Mux, &[a, b, s]);
        fx.boundary(y);
        let (text, _) = fx.emit();
        assert!(text.contains(".names st__n0 st__n1 st__n2 st__n3\n1-0 1\n-11 1\n"));
    }

    #[test]
    fn node_without_boundary_is_internal() {
        let mut fx = Fixture::new();
        let a = fx.node("a", GateKind::None, &[]);
        let t = fx.node("t", GateKind::Not, &[a]);
        let y = fx.node("y", GateKind::Not, &[t]);
        fx.boundary(a);
        fx.boundary(y);
        let (text, result) = fx.emit();
        assert!(!text.contains(".outputs st__n1"));
        assert_eq!(result.po_map.len(), 1);
        assert_eq!(result.gate_count, 2);
    }

    #[test]
    fn stats_from_node_without_outputs() {
        let fx = Fixture::new();
        let (text, result) = fx.emit();
        assert!(text.contains(".inputs dummy_input\n"));
        assert!(result.is_empty());
    }
}
