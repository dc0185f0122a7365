use crate::cli::CatalogArgs;
use crate::exit_codes;
use crate::output;
use nkhdf5::pipeline;

pub fn execute(args: CatalogArgs) -> i32 {
    let config = match args.config.resolve() {
        Ok(config) => config,
        Err(e) => return exit_codes::report(&e),
    };

    let entries = match pipeline::write_catalog(&config) {
        Ok(entries) => entries,
        Err(e) => return exit_codes::report(&e),
    };

    if args.json {
        return output::print_json(&entries, false);
    }

    println!(
        "Wrote {} ({} EDF file(s))",
        config.catalog_path().display(),
        entries.len()
    );
    exit_codes::SUCCESS
}
