//! Optimizer invocation and output relay.
//!
//! The pipeline talks to the external tool through the [`ToolRunner`]
//! trait; [`SubprocessRunner`] is the production implementation, and tests
//! substitute in-process stand-ins. Tool output is pushed character by
//! character through [`OutputFilter`], which strips terminal escape
//! sequences, honors carriage-return overwrites, redacts the work
//! directory path, and annotates start/end-point reports with the display
//! names of the signals they refer to.

use crate::error::{BridgeError, Result};
use log::info;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

/// Name of the script file inside each work directory.
pub const SCRIPT_FILE: &str = "abc.script";

/// Runs the optimizer over a prepared work directory.
///
/// The directory already contains `input.blif`, the library files, and
/// [`SCRIPT_FILE`]; the runner must leave `output.blif` behind on success.
pub trait ToolRunner {
    /// Executes the tool, relaying its output through `filter`.
    fn run(&self, workdir: &Path, filter: &mut OutputFilter) -> Result<()>;
}

/// Spawns the optimizer binary as a subprocess via the shell, with stderr
/// folded into stdout so diagnostics pass through the same filter.
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    exe: String,
}

impl SubprocessRunner {
    /// Creates a runner for the given executable name or path.
    pub fn new(exe: impl Into<String>) -> Self {
        Self { exe: exe.into() }
    }
}

impl ToolRunner for SubprocessRunner {
    fn run(&self, workdir: &Path, filter: &mut OutputFilter) -> Result<()> {
        let command = format!(
            "{} -s -f {} 2>&1",
            self.exe,
            workdir.join(SCRIPT_FILE).display()
        );
        info!("running optimizer: {command}");

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| BridgeError::io(workdir, e))?;
        let stdout = child.stdout.take().expect("stdout was piped");
        for byte in stdout.bytes() {
            let byte = byte.map_err(|e| BridgeError::io(workdir, e))?;
            if let Some(line) = filter.next_char(byte as char) {
                info!("abc: {line}");
            }
        }
        if let Some(line) = filter.finish() {
            info!("abc: {line}");
        }

        let status = child.wait().map_err(|e| BridgeError::io(workdir, e))?;
        if !status.success() {
            return Err(BridgeError::ToolFailed {
                command,
                code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

/// Line filter for relayed tool output.
pub struct OutputFilter {
    escape_state: u8,
    got_cr: bool,
    linebuf: String,
    workdir: String,
    show_workdir: bool,
    pi_map: BTreeMap<usize, String>,
    po_map: BTreeMap<usize, String>,
}

impl OutputFilter {
    /// Creates a filter for one pass. `pi_map`/`po_map` come from the
    /// emitter and name the flattened primary inputs and outputs.
    pub fn new(
        workdir: &Path,
        show_workdir: bool,
        pi_map: BTreeMap<usize, String>,
        po_map: BTreeMap<usize, String>,
    ) -> Self {
        Self {
            escape_state: 0,
            got_cr: false,
            linebuf: String::new(),
            workdir: workdir.display().to_string(),
            show_workdir,
            pi_map,
            po_map,
        }
    }

    /// Feeds one character; returns a rendered line when one completes.
    pub fn next_char(&mut self, ch: char) -> Option<String> {
        if self.escape_state == 0 && ch == '\x1b' {
            self.escape_state = 1;
            return None;
        }
        if self.escape_state == 1 {
            self.escape_state = if ch == '[' { 2 } else { 0 };
            return None;
        }
        if self.escape_state == 2 {
            if !ch.is_ascii_digit() && ch != ';' {
                self.escape_state = 0;
            }
            return None;
        }
        self.escape_state = 0;
        if ch == '\r' {
            self.got_cr = true;
            return None;
        }
        if ch == '\n' {
            let line = std::mem::take(&mut self.linebuf);
            self.got_cr = false;
            return Some(self.render(&line));
        }
        if self.got_cr {
            // The tool uses CR to redraw progress lines in place.
            self.linebuf.clear();
            self.got_cr = false;
        }
        self.linebuf.push(ch);
        None
    }

    /// Flushes a trailing line not terminated by a newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.linebuf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.linebuf);
        Some(self.render(&line))
    }

    fn render(&self, line: &str) -> String {
        if let Some(annotated) = self.annotate_endpoints(line) {
            return annotated;
        }
        if self.show_workdir {
            line.to_string()
        } else {
            line.replace(&self.workdir, "<abc-temp-dir>")
        }
    }

    /// Expands `Start-point = pi<N>.  End-point = po<N>.` timing reports
    /// with the display names behind the flattened indices.
    fn annotate_endpoints(&self, line: &str) -> Option<String> {
        let rest = line.strip_prefix("Start-point = pi")?;
        let (pi, rest) = take_number(rest)?;
        let rest = rest.strip_prefix(".  End-point = po")?;
        let (po, rest) = take_number(rest)?;
        if rest != "." {
            return None;
        }
        let name = |map: &BTreeMap<usize, String>, idx: usize| {
            map.get(&idx).map_or("???", String::as_str).to_string()
        };
        Some(format!(
            "Start-point = pi{pi} ({}).  End-point = po{po} ({}).",
            name(&self.pi_map, pi),
            name(&self.po_map, po),
        ))
    }
}

fn take_number(s: &str) -> Option<(usize, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}
