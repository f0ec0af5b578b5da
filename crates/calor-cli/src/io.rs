//! JSON files read and written by the CLI.

use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use calor_core::{HeatWorldInput, HeatWorldOutput};
use calor_engine::RunError;
use serde::{Deserialize, Serialize};

/// A run input as stored on disk. Properties are raw flag words.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct InputFile {
    pub n: usize,
    pub alpha: f32,
    pub properties: Vec<u32>,
    pub state: Vec<f32>,
}

impl InputFile {
    /// Validate into a run input. Failures are input-stage run errors.
    pub fn into_input(self) -> Result<HeatWorldInput, RunError> {
        Ok(HeatWorldInput::from_raw(
            self.n,
            self.alpha,
            &self.properties,
            self.state,
        )?)
    }
}

impl From<&HeatWorldInput> for InputFile {
    fn from(input: &HeatWorldInput) -> Self {
        Self {
            n: input.n,
            alpha: input.alpha,
            properties: input.property_words(),
            state: input.state.clone(),
        }
    }
}

/// A run result as stored on disk.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OutputFile {
    pub state: Vec<f32>,
}

impl From<HeatWorldOutput> for OutputFile {
    fn from(output: HeatWorldOutput) -> Self {
        Self {
            state: output.state,
        }
    }
}

/// Read `path`, or standard input for `-`.
pub fn read_text(path: &Path) -> Result<String, Box<dyn Error>> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()).into())
}

/// Write `text` to `path`, or standard output when `path` is `None` or `-`.
pub fn write_text(path: Option<&Path>, text: &str) -> Result<(), Box<dyn Error>> {
    match path {
        Some(p) if p != Path::new("-") => fs::write(p, text)
            .map_err(|e| format!("cannot write {}: {e}", p.display()).into()),
        _ => {
            let mut out = io::stdout().lock();
            out.write_all(text.as_bytes())?;
            out.write_all(b"\n")?;
            Ok(())
        }
    }
}

pub fn load_input(path: &Path) -> Result<HeatWorldInput, Box<dyn Error>> {
    let text = read_text(path)?;
    let file: InputFile = serde_json::from_str(&text)
        .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
    Ok(file.into_input()?)
}
