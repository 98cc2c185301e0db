use std::path::PathBuf;

use md100a::{
    peaks::PeakDetector, FileContainer, FilterParams, PeakConfig, ProcessingMode,
    RSA_OUTLIER_FRACTION,
};
use pico_args::Arguments;

const HELP: &str = "\
Print a summary of an MD100A .cEcg file

USAGE:
  md100a-info [OPTIONS] <FILE>

OPTIONS:
  --mode NAME       Processing mode applied before the peak search [default: Default]
  --threshold MV    Smallest peak height [default: 25]
  -h, --help        Print this help
";

fn main() -> eyre::Result<()> {
    env_logger::init();

    let mut args = Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }
    let mode: ProcessingMode = args
        .opt_value_from_str("--mode")?
        .unwrap_or_default();
    let threshold: Option<f64> = args.opt_value_from_str("--threshold")?;
    let path: PathBuf = args.free_from_str()?;

    let detector = PeakDetector::new(PeakConfig {
        threshold: threshold.unwrap_or(PeakConfig::default().threshold),
        ..Default::default()
    });
    let params = FilterParams::default();

    let file = FileContainer::from_path(&path)?;
    let header = file.header();
    println!("File:       {}", path.display());
    println!("Id:         {}", header.id());
    println!("Name:       {}", header.name());
    println!("Gender:     {}", header.gender());
    println!("Birthdate:  {}", header.birthdate());
    println!("Height:     {}", header.height());
    println!("Weight:     {}", header.weight());
    println!("Telephone:  {}", header.telephone());
    println!("Address:    {}", header.address());
    println!("Allergies:  {}", header.allergies());
    println!("Diagnosis:  {}", header.diagnosis());
    println!("Strips:     {}", file.len());
    println!("Mode:       {mode}");

    for (number, strip) in file.strips().iter().enumerate().map(|(i, s)| (i + 1, s)) {
        let metadata = strip.metadata();
        let time = metadata
            .timestamp()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "invalid date".to_string());
        let samples = strip.processed(mode, &params);
        let peaks = detector.peak_indices(&samples);
        let rate = md100a::rsa::average_heart_rate(&peaks, RSA_OUTLIER_FRACTION)
            .map(|bpm| format!("{bpm:.0} bpm"))
            .unwrap_or_else(|| "-".to_string());
        let missing = samples.iter().filter(|s| s.is_nan()).count();
        println!();
        println!("Strip {number}: {time}");
        println!("  Device heart rate: {} bpm", metadata.heart_rate);
        println!("  Device diagnosis:  {}", metadata.diagnosis());
        println!("  Peaks:             {}", peaks.len());
        println!("  Peak heart rate:   {rate}");
        if missing > 0 {
            println!("  Missing samples:   {missing}");
        }
    }
    Ok(())
}
