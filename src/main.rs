use std::process::ExitCode;

use epinet::runner::run_with_args;

fn main() -> ExitCode {
    match run_with_args() {
        Ok(result) => {
            println!(
                "{} stopped by {} at t={:.3} after {} events",
                result.model, result.stop_reason, result.final_time, result.events
            );
            for (compartment, count) in &result.counts {
                println!("{compartment}\t{count}");
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
