//! Parser for the BLIF netlists the external optimizer writes back.
//!
//! Only the subset the optimizer actually emits is accepted: `.model`,
//! `.inputs`, `.outputs`, `.names` with SOP covers, `.latch`, `.gate` /
//! `.subckt`, and `.end`. Anything else is a syntax error.
//!
//! `.names` covers become [`CellKind::Lut`] cells. Cover column `i`
//! corresponds to input `i` of the header, which is bit `i` of the LUT's `A`
//! port and bit `i` of the truth-table index. `.gate` pins are kept in file
//! order; the last pin is the gate output.

use crate::error::BlifError;
use log::debug;
use strata_ir::{
    CellKind, Connection, Logic, LogicVec, Module, ModuleId, PortDirection, SigBit, SigSpec,
};

/// Hard limit on `.names` inputs; the truth table has `2^width` bits.
const MAX_LUT_INPUTS: usize = 16;

struct NamesBlock {
    line: usize,
    inputs: Vec<SigBit>,
    output: SigBit,
    rows: Vec<(String, char)>,
}

struct Parser {
    module: Module,
    pending: Option<NamesBlock>,
    done: bool,
}

/// Parses one BLIF model into a standalone [`Module`].
pub fn parse_module(input: &str) -> Result<Module, BlifError> {
    let mut parser = Parser {
        module: Module::new(ModuleId::from_raw(0), "netlist"),
        pending: None,
        done: false,
    };

    let mut carry = String::new();
    let mut start_line = 0;
    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let text = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        if let Some(stripped) = text.trim_end().strip_suffix('\\') {
            if carry.is_empty() {
                start_line = line_no;
            }
            carry.push_str(stripped);
            carry.push(' ');
            continue;
        }
        let (logical, at) = if carry.is_empty() {
            (text.to_string(), line_no)
        } else {
            let mut joined = std::mem::take(&mut carry);
            joined.push_str(text);
            (joined, start_line)
        };
        parser.line(&logical, at)?;
        if parser.done {
            break;
        }
    }
    if !parser.done {
        return Err(BlifError::UnexpectedEof);
    }
    debug!(
        "parsed BLIF model {:?}: {} wires, {} cells",
        parser.module.name,
        parser.module.wires.len(),
        parser.module.cells.len()
    );
    Ok(parser.module)
}

impl Parser {
    fn line(&mut self, text: &str, line: usize) -> Result<(), BlifError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(());
        }
        if !tokens[0].starts_with('.') {
            return self.cover_row(&tokens, line);
        }
        self.flush_names()?;
        match tokens[0] {
            ".model" => {
                if let Some(name) = tokens.get(1) {
                    self.module.name = name.to_string();
                }
                Ok(())
            }
            ".inputs" => self.ports(&tokens[1..], PortDirection::Input, line),
            ".outputs" => self.ports(&tokens[1..], PortDirection::Output, line),
            ".names" => self.names_header(&tokens[1..], line),
            ".latch" => self.latch(&tokens[1..], line),
            ".gate" | ".subckt" => self.gate(&tokens[1..], line),
            ".end" => {
                self.done = true;
                Ok(())
            }
            other => Err(BlifError::syntax(
                line,
                format!("unsupported statement {other}"),
            )),
        }
    }

    fn bit(&mut self, name: &str) -> SigBit {
        let wire = match self.module.wire(name) {
            Some(id) => id,
            None => self.module.add_wire(name, 1),
        };
        SigBit::Wire { wire, offset: 0 }
    }

    fn ports(&mut self, names: &[&str], direction: PortDirection, line: usize) -> Result<(), BlifError> {
        for name in names {
            let bit = self.bit(name);
            let wire = bit.wire().ok_or_else(|| {
                BlifError::syntax(line, format!("port {name} is not a wire"))
            })?;
            self.module.wires[wire].port = Some(direction);
        }
        Ok(())
    }

    fn names_header(&mut self, nets: &[&str], line: usize) -> Result<(), BlifError> {
        let Some((output, inputs)) = nets.split_last() else {
            return Err(BlifError::syntax(line, ".names without nets"));
        };
        if inputs.len() > MAX_LUT_INPUTS {
            return Err(BlifError::LutTooWide {
                line,
                width: inputs.len(),
            });
        }
        let inputs: Vec<SigBit> = inputs.iter().map(|n| self.bit(n)).collect();
        let output = self.bit(output);
        self.pending = Some(NamesBlock {
            line,
            inputs,
            output,
            rows: Vec::new(),
        });
        Ok(())
    }

    fn cover_row(&mut self, tokens: &[&str], line: usize) -> Result<(), BlifError> {
        let Some(block) = self.pending.as_mut() else {
            return Err(BlifError::syntax(line, "cover row outside a .names block"));
        };
        let (pattern, value) = match (block.inputs.len(), tokens) {
            (0, [value]) => (String::new(), value),
            (_, [pattern, value]) if !block.inputs.is_empty() => (pattern.to_string(), value),
            _ => return Err(BlifError::syntax(line, "malformed cover row")),
        };
        if pattern.len() != block.inputs.len()
            || !pattern.chars().all(|c| matches!(c, '0' | '1' | '-'))
        {
            return Err(BlifError::syntax(line, "malformed cover pattern"));
        }
        let value = match *value {
            "1" => '1',
            "0" => '0',
            _ => return Err(BlifError::syntax(line, "cover output must be 0 or 1")),
        };
        block.rows.push((pattern, value));
        Ok(())
    }

    fn flush_names(&mut self) -> Result<(), BlifError> {
        let Some(block) = self.pending.take() else {
            return Ok(());
        };
        let width = block.inputs.len();
        if width == 0 {
            let value = if block.rows.iter().any(|(_, v)| *v == '1') {
                Logic::One
            } else {
                Logic::Zero
            };
            self.module
                .connect(SigSpec::from_bit(block.output), SigSpec::from_const(value));
            return Ok(());
        }
        let phase = block.rows.first().map(|(_, v)| *v).unwrap_or('1');
        if block.rows.iter().any(|(_, v)| *v != phase) {
            return Err(BlifError::syntax(
                block.line,
                "mixed on-set and off-set covers",
            ));
        }
        let (background, foreground) = if phase == '1' {
            (Logic::Zero, Logic::One)
        } else {
            (Logic::One, Logic::Zero)
        };
        let mut init = LogicVec::from_bits(vec![background; 1 << width]);
        for (pattern, _) in &block.rows {
            for index in 0..(1u32 << width) {
                let matches = pattern.chars().enumerate().all(|(i, c)| match c {
                    '-' => true,
                    '1' => index & (1 << i) != 0,
                    _ => index & (1 << i) == 0,
                });
                if matches {
                    init.set(index, foreground);
                }
            }
        }
        let name = format!("$lut${}", block.line);
        self.module.add_cell(
            &name,
            CellKind::Lut {
                width: width as u32,
                init,
            },
            vec![
                Connection::input("A", SigSpec::from_bits(block.inputs)),
                Connection::output("Y", SigSpec::from_bit(block.output)),
            ],
        );
        Ok(())
    }

    fn latch(&mut self, tokens: &[&str], line: usize) -> Result<(), BlifError> {
        let (d, q, init_token) = match tokens {
            [d, q] => (d, q, None),
            [d, q, init] => (d, q, Some(init)),
            [d, q, _type, _ctrl] => (d, q, None),
            [d, q, _type, _ctrl, init] => (d, q, Some(init)),
            _ => return Err(BlifError::syntax(line, "malformed .latch")),
        };
        let init = match init_token {
            Some(&"0") => Logic::Zero,
            Some(&"1") => Logic::One,
            Some(&"2") | Some(&"3") | None => Logic::X,
            Some(other) => {
                return Err(BlifError::syntax(
                    line,
                    format!("bad latch init value {other}"),
                ))
            }
        };
        let d = self.bit(d);
        let q = self.bit(q);
        if init.is_definite() {
            let wire = q
                .wire()
                .ok_or_else(|| BlifError::syntax(line, "latch output is not a wire"))?;
            self.module.wires[wire].init = Some(LogicVec::from_bits(vec![init]));
        }
        let name = format!("$latch${line}");
        self.module.add_cell(
            &name,
            CellKind::Latch { init },
            vec![
                Connection::input("D", SigSpec::from_bit(d)),
                Connection::output("Q", SigSpec::from_bit(q)),
            ],
        );
        Ok(())
    }

    fn gate(&mut self, tokens: &[&str], line: usize) -> Result<(), BlifError> {
        let Some((type_name, pins)) = tokens.split_first() else {
            return Err(BlifError::syntax(line, ".gate without a type"));
        };
        if pins.is_empty() {
            return Err(BlifError::syntax(line, ".gate without pins"));
        }
        let mut connections = Vec::with_capacity(pins.len());
        for (i, pin) in pins.iter().enumerate() {
            let Some((formal, actual)) = pin.split_once('=') else {
                return Err(BlifError::syntax(line, format!("malformed pin {pin}")));
            };
            let signal = SigSpec::from_bit(self.bit(actual));
            // The optimizer writes pins in library order, output last.
            let direction = if i + 1 == pins.len() {
                PortDirection::Output
            } else {
                PortDirection::Input
            };
            connections.push(Connection {
                port_name: formal.to_string(),
                direction,
                signal,
            });
        }
        let name = format!("$gate${line}");
        self.module.add_cell(
            &name,
            CellKind::Foreign {
                type_name: type_name.to_string(),
                parameters: Vec::new(),
            },
            connections,
        );
        Ok(())
    }
}
