//! Command-line theorem prover

use std::process::ExitCode;
use std::time::Duration;

use satforge::saturation::SaturationResult;
use satforge::{
    parse_problem_file, OrderingKind, PrecedenceMode, Prover, ProverConfig, SelectionStrategy,
};
use tracing_subscriber::EnvFilter;

fn usage(program: &str) {
    eprintln!("Usage: {} <problem.p> [options]", program);
    eprintln!("\nOptions:");
    eprintln!("  --timeout <seconds>     Wall-clock limit (default: 60)");
    eprintln!("  --steps <n>             Iteration limit (default: unlimited)");
    eprintln!("  --max-clauses <n>       Clause limit (default: unlimited)");
    eprintln!("  --mem <mb>              Memory limit in MB");
    eprintln!("  --ord <kbo|lpo>         Simplification ordering (default: kbo)");
    eprintln!("  --precedence <freq|invfreq|arity>");
    eprintln!("                          Symbol precedence (default: invfreq)");
    eprintln!("  --select <none|first-neg|all-neg|max-neg>");
    eprintln!("                          Literal selection (default: max-neg)");
    eprintln!("  --age-ratio <n>         Every n-th clause picked by age (default: 5)");
    eprintln!("  --no-subsumption        Disable subsumption");
    eprintln!("  --no-demod              Disable demodulation");
    eprintln!("  --no-simplify-reflect   Disable simplify-reflect");
    eprintln!("  --no-condensation       Disable condensation");
    eprintln!("  --no-literal-cutting    Disable subsumption resolution");
    eprintln!("  --proof                 Print the refutation");
    eprintln!("  --stats                 Print run statistics (JSON)");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
        return ExitCode::from(3);
    }

    let filename = &args[1];
    let mut config = ProverConfig::default();
    let mut print_proof = false;
    let mut print_stats = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--timeout" => {
                i += 1;
                match args.get(i).and_then(|v| v.parse::<u64>().ok()) {
                    Some(secs) => config.timeout = Duration::from_secs(secs),
                    None => return arg_error("--timeout expects a number of seconds"),
                }
            }
            "--steps" => {
                i += 1;
                match args.get(i).and_then(|v| v.parse::<usize>().ok()) {
                    Some(n) => config.max_steps = n,
                    None => return arg_error("--steps expects a number"),
                }
            }
            "--max-clauses" => {
                i += 1;
                match args.get(i).and_then(|v| v.parse::<usize>().ok()) {
                    Some(n) => config.max_clauses = n,
                    None => return arg_error("--max-clauses expects a number"),
                }
            }
            "--mem" => {
                i += 1;
                match args.get(i).and_then(|v| v.parse::<usize>().ok()) {
                    Some(n) => config.memory_limit_mb = Some(n),
                    None => return arg_error("--mem expects a number of MB"),
                }
            }
            "--ord" => {
                i += 1;
                config.ordering = match args.get(i).map(String::as_str) {
                    Some("kbo") => OrderingKind::Kbo,
                    Some("lpo") => OrderingKind::Lpo,
                    _ => return arg_error("--ord expects kbo or lpo"),
                };
            }
            "--precedence" => {
                i += 1;
                config.precedence = match args.get(i).map(String::as_str) {
                    Some("freq") => PrecedenceMode::ByFrequency,
                    Some("invfreq") => PrecedenceMode::ByInvFrequency,
                    Some("arity") => PrecedenceMode::ByArity,
                    _ => return arg_error("--precedence expects freq, invfreq, or arity"),
                };
            }
            "--select" => {
                i += 1;
                config.selection = match args.get(i).map(String::as_str) {
                    Some("none") => SelectionStrategy::NoSelection,
                    Some("first-neg") => SelectionStrategy::SelectFirstNegative,
                    Some("all-neg") => SelectionStrategy::SelectAllNegative,
                    Some("max-neg") => SelectionStrategy::SelectMaxNegative,
                    _ => return arg_error("--select expects none, first-neg, all-neg, or max-neg"),
                };
            }
            "--age-ratio" => {
                i += 1;
                match args.get(i).and_then(|v| v.parse::<u32>().ok()) {
                    Some(n) if n > 0 => config.age_ratio = n,
                    _ => return arg_error("--age-ratio expects a positive number"),
                }
            }
            "--no-subsumption" => config.enable_subsumption = false,
            "--no-demod" => config.enable_demodulation = false,
            "--no-simplify-reflect" => config.enable_simplify_reflect = false,
            "--no-condensation" => config.enable_condensation = false,
            "--no-literal-cutting" => config.enable_literal_cutting = false,
            "--proof" => print_proof = true,
            "--stats" => print_stats = true,
            other => {
                eprintln!("Unknown option: {}", other);
                usage(&args[0]);
                return ExitCode::from(3);
            }
        }
        i += 1;
    }

    let parsed = match parse_problem_file(std::path::Path::new(filename)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(3);
        }
    };

    let has_conjecture = parsed.clauses.iter().any(|c| c.role.is_goal());
    let mut prover = Prover::new(parsed.ctx, config);
    prover.add_passive(parsed.clauses);
    let result = prover.saturate();

    if print_stats {
        match serde_json::to_string_pretty(&prover.state.stats) {
            Ok(json) => eprintln!("{}", json),
            Err(e) => eprintln!("Error serializing statistics: {}", e),
        }
    }

    match result {
        SaturationResult::Refutation(proof) => {
            if has_conjecture {
                println!("% SZS status Theorem");
            } else {
                println!("% SZS status Unsatisfiable");
            }
            if print_proof {
                println!("% SZS output start CNFRefutation");
                print!("{}", proof.tptp(&prover.ctx));
                println!("% SZS output end CNFRefutation");
            }
            ExitCode::from(0)
        }
        SaturationResult::Saturated => {
            if has_conjecture {
                println!("% SZS status CounterSatisfiable");
            } else {
                println!("% SZS status Satisfiable");
            }
            ExitCode::from(1)
        }
        SaturationResult::ResourceOut(reason) => {
            println!("% SZS status ResourceOut");
            eprintln!("% stopped: {}", reason);
            ExitCode::from(2)
        }
    }
}

fn arg_error(message: &str) -> ExitCode {
    eprintln!("Error: {}", message);
    ExitCode::from(3)
}
