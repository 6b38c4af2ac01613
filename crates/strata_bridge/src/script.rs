//! Optimizer command-script assembly.
//!
//! Scripts are built from token lists rather than by string surgery: a
//! template is a sequence of literal fragments and named parameter slots,
//! and the delay-driven retime rewrite is a dedicated token instead of a
//! substring replacement. Custom scripts come either inline (`+cmd,cmd`)
//! or from a file (`source <path>`), and skip template processing entirely.

use std::path::{Path, PathBuf};

/// What the optimizer maps against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapMode {
    /// External cell libraries, optionally with a constraints file.
    Library {
        /// Liberty-format library files.
        liberty: Vec<PathBuf>,
        /// Genlib-format library files.
        genlib: Vec<PathBuf>,
        /// Timing constraints file.
        constr: Option<PathBuf>,
    },
    /// FPGA LUTs with the given per-size cost table.
    Lut(Vec<u32>),
    /// Sum-of-products covers over the generated library.
    Sop,
    /// The generated standard-cell library.
    Default,
}

/// Where the script body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// The built-in template for the active [`MapMode`].
    Default,
    /// Inline commands from a `+cmd,cmd` argument (stored without the `+`).
    Inline(String),
    /// Commands sourced from a script file.
    File(PathBuf),
}

impl ScriptSource {
    /// Interprets a `--script` argument: a leading `+` means inline
    /// commands, anything else is a file path.
    pub fn parse(arg: &str) -> ScriptSource {
        match arg.strip_prefix('+') {
            Some(inline) => ScriptSource::Inline(inline.to_string()),
            None => ScriptSource::File(PathBuf::from(arg)),
        }
    }
}

/// Tuning parameters substituted into the script templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptParams {
    /// Delay target; also enables the retime rewrite.
    pub delay: Option<u32>,
    /// Maximum SOP cover inputs.
    pub sop_inputs: Option<u32>,
    /// Maximum SOP cover products.
    pub sop_products: Option<u32>,
    /// Shared LUT inputs for `lutpack`.
    pub lut_shared: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
enum Token {
    Lit(&'static str),
    Delay,
    SopInputs,
    SopProducts,
    LutShared,
    /// `dretime`, or `dretime; retime -o {D}` under a delay target.
    Retime,
}

use Token::{Delay, Lit, LutShared, Retime, SopInputs, SopProducts};

const LIB: &[Token] = &[
    Lit("strash; ifraig; scorr; dc2; "),
    Retime,
    Lit("; strash; &get -n; &dch -f; &nf "),
    Delay,
    Lit("; &put"),
];
const CTR: &[Token] = &[
    Lit("strash; ifraig; scorr; dc2; "),
    Retime,
    Lit("; strash; &get -n; &dch -f; &nf "),
    Delay,
    Lit("; &put; buffer; upsize "),
    Delay,
    Lit("; dnsize "),
    Delay,
    Lit("; stime -p"),
];
const LUT: &[Token] = &[
    Lit("strash; ifraig; scorr; dc2; "),
    Retime,
    Lit("; strash; dch -f; if; mfs2"),
];
const SOP: &[Token] = &[
    Lit("strash; ifraig; scorr; dc2; "),
    Retime,
    Lit("; strash; dch -f; cover "),
    SopInputs,
    Lit(" "),
    SopProducts,
];

const FAST_LIB: &[Token] = &[Lit("strash; "), Retime, Lit("; map "), Delay];
const FAST_CTR: &[Token] = &[
    Lit("strash; "),
    Retime,
    Lit("; map "),
    Delay,
    Lit("; buffer; upsize "),
    Delay,
    Lit("; dnsize "),
    Delay,
    Lit("; stime -p"),
];
const FAST_LUT: &[Token] = &[Lit("strash; "), Retime, Lit("; if")];
const FAST_SOP: &[Token] = &[
    Lit("strash; "),
    Retime,
    Lit("; cover "),
    SopInputs,
    Lit(" "),
    SopProducts,
];
const FAST_DFL: &[Token] = &[Lit("strash; "), Retime, Lit("; map")];

const LUTPACK: &[Token] = &[Lit("; lutpack "), LutShared];

fn render(tokens: &[Token], params: &ScriptParams, out: &mut String) {
    let flag = |prefix: &str, value: Option<u32>| match value {
        Some(v) => format!("{prefix} {v}"),
        None => String::new(),
    };
    for token in tokens {
        match token {
            Lit(text) => out.push_str(text),
            Delay => out.push_str(&flag("-D", params.delay)),
            SopInputs => out.push_str(&flag("-I", params.sop_inputs)),
            SopProducts => out.push_str(&flag("-P", params.sop_products)),
            LutShared => out.push_str(&format!("-S {}", params.lut_shared.unwrap_or(1))),
            Retime => {
                out.push_str("dretime");
                if let Some(d) = params.delay {
                    out.push_str(&format!("; retime -o -D {d}"));
                }
            }
        }
    }
}

fn template(mode: &MapMode, fast: bool) -> &'static [Token] {
    match (mode, fast) {
        (MapMode::Library { constr: Some(_), .. }, false) => CTR,
        (MapMode::Library { constr: Some(_), .. }, true) => FAST_CTR,
        (MapMode::Library { .. } | MapMode::Default, false) => LIB,
        (MapMode::Library { .. }, true) => FAST_LIB,
        (MapMode::Lut(_), false) => LUT,
        (MapMode::Lut(_), true) => FAST_LUT,
        (MapMode::Sop, false) => SOP,
        (MapMode::Sop, true) => FAST_SOP,
        (MapMode::Default, true) => FAST_DFL,
    }
}

/// Prepends an echo of every command so relayed tool output narrates the
/// script's progress.
fn add_echos(script: &str) -> String {
    let mut out = String::new();
    let mut token = String::new();
    let mut chars = script.chars().peekable();
    while let Some(c) = chars.next() {
        token.push(c);
        if c == ';' {
            while chars.peek() == Some(&' ') {
                chars.next();
            }
            out.push_str(&format!("echo + {token} {token} "));
            token.clear();
        }
    }
    if !token.is_empty() {
        if !out.is_empty() {
            out.push_str(&format!("echo + {token}; "));
        }
        out.push_str(&token);
    }
    out
}

/// Assembles the complete script the optimizer runs, one command per line.
///
/// The script reads `input.blif` from the work directory, loads the
/// library appropriate to `mode`, runs the selected (or custom) command
/// body, optionally reconciles names with `dress`, and writes
/// `output.blif` back.
pub fn build_script(
    workdir: &Path,
    mode: &MapMode,
    source: &ScriptSource,
    params: &ScriptParams,
    fast: bool,
    dress: bool,
) -> String {
    let dir = workdir.display();
    let mut script = format!("read_blif {dir}/input.blif; ");

    match mode {
        MapMode::Library {
            liberty,
            genlib,
            constr,
        } => {
            for file in liberty {
                script.push_str(&format!("read_lib -w \"{}\"; ", file.display()));
            }
            for file in genlib {
                script.push_str(&format!("read_library \"{}\"; ", file.display()));
            }
            if let Some(file) = constr {
                script.push_str(&format!("read_constr -v \"{}\"; ", file.display()));
            }
        }
        MapMode::Lut(_) => script.push_str(&format!("read_lut {dir}/lutdefs.txt; ")),
        MapMode::Sop | MapMode::Default => {
            script.push_str(&format!("read_library {dir}/stdcells.genlib; "));
        }
    }

    match source {
        ScriptSource::Inline(commands) => {
            for c in commands.chars() {
                match c {
                    ',' => script.push(' '),
                    '\'' => script.push_str("'\\''"),
                    c => script.push(c),
                }
            }
        }
        ScriptSource::File(file) => script.push_str(&format!("source {}", file.display())),
        ScriptSource::Default => {
            render(template(mode, fast), params, &mut script);
            if let MapMode::Lut(costs) = mode {
                let uniform = costs.windows(2).all(|w| w[0] == w[1]);
                if uniform && !fast {
                    render(LUTPACK, params, &mut script);
                }
            }
        }
    }

    if dress {
        script.push_str("; dress");
    }
    script.push_str(&format!("; write_blif {dir}/output.blif"));

    let script = add_echos(&script);
    script.replace("; ", ";\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(mode: &MapMode, source: &ScriptSource, params: &ScriptParams, fast: bool) -> String {
        build_script(Path::new("/work/top_0"), mode, source, params, fast, false)
    }

    #[test]
    fn default_mode_uses_generated_library() {
        let text = build(
            &MapMode::Default,
            &ScriptSource::Default,
            &ScriptParams::default(),
            false,
        );
        assert!(text.contains("read_blif /work/top_0/input.blif;"));
        assert!(text.contains("read_library /work/top_0/stdcells.genlib;"));
        assert!(text.contains("&dch -f;"));
        assert!(text.contains("dretime;"));
        assert!(!text.contains("retime -o"));
        assert!(text.ends_with("write_blif /work/top_0/output.blif"));
    }

    #[test]
    fn every_command_is_echoed() {
        let text = build(
            &MapMode::Default,
            &ScriptSource::Default,
            &ScriptParams::default(),
            true,
        );
        for line in text.lines() {
            if line.starts_with("echo + ") {
                continue;
            }
            // Each real command is preceded by its own echo.
            assert!(
                text.contains(&format!("echo + {}", line.trim_end_matches(';'))),
                "unechoed command: {line}"
            );
        }
    }

    #[test]
    fn delay_target_enables_retime_rewrite() {
        let params = ScriptParams {
            delay: Some(300),
            ..Default::default()
        };
        let text = build(&MapMode::Default, &ScriptSource::Default, &params, false);
        assert!(text.contains("retime -o -D 300;"));
        assert!(text.contains("&nf -D 300;"));
    }

    #[test]
    fn dress_is_appended_on_request() {
        let text = build_script(
            Path::new("/work/top_0"),
            &MapMode::Default,
            &ScriptSource::Default,
            &ScriptParams::default(),
            false,
            true,
        );
        assert!(text.contains("echo + dress;\ndress;\n"));
    }

    #[test]
    fn constraints_select_the_timing_template() {
        let mode = MapMode::Library {
            liberty: vec![PathBuf::from("cells.lib")],
            genlib: vec![],
            constr: Some(PathBuf::from("timing.constr")),
        };
        let text = build(&mode, &ScriptSource::Default, &ScriptParams::default(), false);
        assert!(text.contains("read_lib -w \"cells.lib\";"));
        assert!(text.contains("read_constr -v \"timing.constr\";"));
        assert!(text.contains("stime -p;"));
    }

    #[test]
    fn uniform_lut_costs_add_lutpack() {
        let mode = MapMode::Lut(vec![1, 1, 1, 1]);
        let text = build(&mode, &ScriptSource::Default, &ScriptParams::default(), false);
        assert!(text.contains("read_lut /work/top_0/lutdefs.txt;"));
        assert!(text.contains("mfs2;"));
        assert!(text.contains("lutpack -S 1;"));

        let mode = MapMode::Lut(vec![1, 1, 2, 4]);
        let text = build(&mode, &ScriptSource::Default, &ScriptParams::default(), false);
        assert!(!text.contains("lutpack"));

        let mode = MapMode::Lut(vec![1, 1, 1, 1]);
        let text = build(&mode, &ScriptSource::Default, &ScriptParams::default(), true);
        assert!(!text.contains("lutpack"));
        assert!(text.contains("if;"));
    }

    #[test]
    fn sop_parameters_flow_into_cover() {
        let params = ScriptParams {
            sop_inputs: Some(6),
            sop_products: Some(12),
            ..Default::default()
        };
        let text = build(&MapMode::Sop, &ScriptSource::Default, &params, false);
        assert!(text.contains("cover -I 6 -P 12;"));
    }

    #[test]
    fn inline_scripts_replace_commas_and_skip_templates() {
        let source = ScriptSource::parse("+strash,dc2;balance");
        assert_eq!(
            source,
            ScriptSource::Inline("strash,dc2;balance".to_string())
        );
        let params = ScriptParams {
            delay: Some(100),
            ..Default::default()
        };
        let text = build(&MapMode::Default, &source, &params, false);
        assert!(text.contains("strash dc2;"));
        assert!(text.contains("balance;"));
        // Custom scripts never get the retime rewrite.
        assert!(!text.contains("retime"));
    }

    #[test]
    fn file_scripts_are_sourced() {
        let source = ScriptSource::parse("my.script");
        let text = build(&MapMode::Default, &source, &ScriptParams::default(), false);
        assert!(text.contains("source my.script;"));
    }
}
