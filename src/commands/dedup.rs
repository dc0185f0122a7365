use crate::cli::DedupArgs;
use crate::exit_codes;
use nkhdf5::pipeline;

pub fn execute(args: DedupArgs) -> i32 {
    let config = match args.config.resolve() {
        Ok(config) => config,
        Err(e) => return exit_codes::report(&e),
    };

    match pipeline::clean_biomarkers(&config, &args.store.store()) {
        Ok(paths) => {
            for path in &paths {
                println!("{}", path.display());
            }
            exit_codes::SUCCESS
        }
        Err(e) => exit_codes::report(&e),
    }
}
