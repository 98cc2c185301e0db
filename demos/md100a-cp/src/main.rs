use std::path::PathBuf;

use md100a::{FileContainer, FilterParams, PatientId, ProcessingMode, SaveOptions, StripSelection};
use pico_args::Arguments;

const HELP: &str = "\
Copy strips of an MD100A .cEcg file into a new file

USAGE:
  md100a-cp [OPTIONS] --id ID <INPUT> <OUTPUT>

OPTIONS:
  --id ID           Patient id written to the new file (1 to 999999999999999)
  --strips LIST     Strips to copy, e.g. \"1-2, 3, 9-10\" [default: all]
  --mode NAME       Processing mode applied to every strip [default: Default]
  --window N        Median window in samples [default: 50]
  --cutoff HZ       Low-pass cutoff [default: 8]
  -h, --help        Print this help
";

fn main() -> eyre::Result<()> {
    env_logger::init();

    let mut args = Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }
    let id: PatientId = args.value_from_str("--id")?;
    let strips: Option<String> = args.opt_value_from_str("--strips")?;
    let mode: ProcessingMode = args.opt_value_from_str("--mode")?.unwrap_or_default();
    let defaults = FilterParams::default();
    let window: i64 = args
        .opt_value_from_str("--window")?
        .unwrap_or(defaults.median_window() as i64);
    let cutoff: f64 = args
        .opt_value_from_str("--cutoff")?
        .unwrap_or(defaults.lowpass_cutoff());
    let input: PathBuf = args.free_from_str()?;
    let output: PathBuf = args.free_from_str()?;

    let file = FileContainer::from_path(&input)?;
    let selection = match strips {
        Some(spec) => StripSelection::parse(&spec, file.len())?,
        None => StripSelection::all(file.len()),
    };
    let options = SaveOptions::new(id, selection)
        .with_mode(mode)
        .with_params(FilterParams::try_new(window, cutoff)?);

    file.save_to_path(&output, &options)?;
    println!(
        "Wrote {} strips from {} to {}",
        options.strips.len(),
        input.display(),
        output.display()
    );
    Ok(())
}
