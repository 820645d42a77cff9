// Shared test data for the use-case tests: a small synthetic
// Cleveland-format file where older patients with lower max
// heart rate tend to be diagnosed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::application::config::PipelineConfig;

/// Headerless UCI text, 60 patients, with a few "?" cells.
pub fn uci_text() -> String {
    let mut out = String::new();
    for i in 0..60u32 {
        let age     = 35 + (i * 7) % 40;
        let thalach = 190 - age + (i % 9);
        let target  = if age + (i % 5) > 56 { 1 + i % 4 } else { 0 };
        let ca      = if i == 5 { "?".to_string() } else { format!("{}.0", i % 4) };
        let thal    = if i == 7 { "?".to_string() } else { format!("{}.0", [3, 6, 7][(i % 3) as usize]) };
        out.push_str(&format!(
            "{age}.0,{}.0,{}.0,{}.0,{}.0,{}.0,{}.0,{thalach}.0,{}.0,{:.1},{}.0,{ca},{thal},{target}\n",
            i % 2,
            1 + i % 4,
            120 + i % 30,
            200 + (i * 7) % 100,
            (i / 3) % 2,
            i % 3,
            (i / 2) % 2,
            (i % 5) as f64 * 0.5,
            1 + i % 3,
        ));
    }
    out
}

/// Write the synthetic file into `dir` and return its path.
pub fn write_uci_file(dir: &Path) -> PathBuf {
    let path = dir.join("cleveland.data");
    fs::write(&path, uci_text()).unwrap();
    path
}

/// Default configuration with every path under `dir`.
pub fn config_in(dir: &Path) -> PipelineConfig {
    PipelineConfig::default().relative_to(dir)
}
