//! Command-line entry point
//!
//! Thin binding over the library, mirroring the argument order of the
//! scripting interface:
//! `noisered <profile> <start> <end> <source> <gain> <sensitivity> <smoothing> <dest>`

use std::process::ExitCode;

use noisered::{reduce_noise_file, ReduceRequest, ReductionParams};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let request = match parse_args(&args) {
        Ok(request) => request,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!(
                "Usage: noisered <profile_path> <profile_start> <profile_end> \
                 <source_path> <noise_gain_db> <sensitivity_db> <smoothing_frames> <dest_path>"
            );
            return ExitCode::FAILURE;
        }
    };

    match reduce_noise_file(&request) {
        Ok(report) => {
            println!(
                "{} ({:.2}s at {} Hz)",
                report.output_path, report.duration, report.sample_rate
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Noise reduction failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<ReduceRequest, String> {
    if args.len() != 8 {
        return Err(format!("Expected 8 arguments, got {}", args.len()));
    }

    fn num<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, String> {
        value
            .parse()
            .map_err(|_| format!("Invalid value for {}: {}", name, value))
    }

    Ok(ReduceRequest {
        profile_path: args[0].clone(),
        profile_start: num(&args[1], "profile_start")?,
        profile_end: num(&args[2], "profile_end")?,
        source_path: args[3].clone(),
        params: ReductionParams {
            noise_gain_db: num(&args[4], "noise_gain_db")?,
            sensitivity_db: num(&args[5], "sensitivity_db")?,
            smoothing_frames: num(&args[6], "smoothing_frames")?,
        },
        dest_path: args[7].clone(),
    })
}
