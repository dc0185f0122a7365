use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{missing_file, ConvertArgs};
use crate::exit_codes;
use nkhdf5::{pipeline, PipelineConfig, RecordingStore, Result};

pub fn execute(args: ConvertArgs) -> i32 {
    let config = match args.config.resolve() {
        Ok(config) => config,
        Err(e) => return exit_codes::report(&e),
    };
    let store = args.store.store();
    let out_dir = args.output.clone().unwrap_or_else(|| config.hdf5_dir());

    let result = match &args.file {
        Some(file) => convert_single(&config, &store, file, &out_dir).map(|p| vec![p]),
        None => pipeline::convert_edf_dir_to(&config, &store, &config.edf_dir(), &out_dir),
    };

    match result {
        Ok(paths) => {
            for path in &paths {
                println!("{}", path.display());
            }
            exit_codes::SUCCESS
        }
        Err(e) => exit_codes::report(&e),
    }
}

fn convert_single<S: RecordingStore>(
    config: &PipelineConfig,
    store: &S,
    file: &Path,
    out_dir: &Path,
) -> Result<PathBuf> {
    let name = match file.file_name().and_then(|n| n.to_str()) {
        Some(name) if file.is_file() => name,
        _ => return Err(missing_file(file)),
    };
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(out_dir)?;
    pipeline::convert_edf_file(config, store, dir, name, out_dir)
}
