use std::path::PathBuf;

use abatement_plan::{Catalog, Report, Selection, render_trace};
use abatement_solver::{
    BigM, DEFAULT_BIG_M, DEFAULT_CAP, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, SolutionStatus,
    Solver, Strategy, Tableau,
};
use clap::{Parser, Subcommand, ValueEnum};
use log::{LevelFilter, debug};

#[derive(Parser)]
#[command(name = "abatement")]
#[command(about = "Least-cost selection of pollution mitigation projects", long_about = None)]
struct Cli {
    /// Log solver progress (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Choose project quantities that meet every target at minimum cost
    Solve {
        /// Projects matrix CSV (Project Name, Costs, one column per pollutant)
        projects: PathBuf,
        /// Pollutant targets CSV (Pollutant, Target)
        targets: PathBuf,
        /// Project to include (repeatable, defaults to every project)
        #[arg(short, long = "project")]
        projects_selected: Vec<String>,
        /// Maximum units of any single project
        #[arg(long, default_value_t = DEFAULT_CAP)]
        cap: f64,
        /// Penalty on artificial variables
        #[arg(long, default_value_t = DEFAULT_BIG_M)]
        big_m: f64,
        /// Numerical zero threshold
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
        /// Maximum simplex pivots
        #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
        max_iterations: usize,
        /// Tableau construction
        #[arg(long, value_enum, default_value = "primal")]
        strategy: StrategyArg,
        /// Print every simplex tableau
        #[arg(long, conflicts_with = "no_trace")]
        trace: bool,
        /// Do not keep intermediate tableaus
        #[arg(long)]
        no_trace: bool,
        /// Write the implemented projects to a CSV file
        #[arg(short, long)]
        export: Option<PathBuf>,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Show one project's cost and reductions
    Inspect {
        projects: PathBuf,
        targets: PathBuf,
        /// Project name
        project: String,
    },
    /// Check the CSV files for errors
    Check { projects: PathBuf, targets: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Big-M primal tableau
    Primal,
    /// Dual tableau
    Dual,
}

#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    report: &'a Report,
    trace: &'a [Tableau],
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Solve {
            projects,
            targets,
            projects_selected,
            cap,
            big_m,
            tolerance,
            max_iterations,
            strategy,
            trace,
            no_trace,
            export,
            format,
        } => {
            let catalog = load(&projects, &targets);

            let selection = if projects_selected.is_empty() {
                Selection::all(&catalog)
            } else {
                Selection::from_names(projects_selected)
            };
            let plan = match catalog.compile_with_cap(&selection, cap) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            let strategy = match strategy {
                StrategyArg::Primal => Strategy::BigM(BigM::new().with_penalty(big_m)),
                StrategyArg::Dual => Strategy::Dual,
            };
            let solver = Solver::new()
                .with_strategy(strategy)
                .with_tolerance(tolerance)
                .with_max_iterations(max_iterations)
                .with_trace(!no_trace);
            debug!("solver: {:?}", solver);

            let solution = match solver.solve(&plan.problem) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Invalid problem: {}", e);
                    std::process::exit(1);
                }
            };
            let report = Report::new(&plan, &solution);

            if let Some(path) = export {
                if let Err(e) = report.save_csv(&path) {
                    eprintln!("Error writing {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            }

            if format == "json" {
                let output = JsonOutput {
                    report: &report,
                    trace: if trace { &solution.trace[..] } else { &[] },
                };
                match serde_json::to_string_pretty(&output) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
                if !solution.is_optimal() {
                    std::process::exit(1);
                }
                return;
            }

            if trace {
                println!("Simplex iterations:");
                println!();
                print!("{}", render_trace(&solution.trace));
            }

            match report.status {
                SolutionStatus::Optimal => {
                    println!("Status: OPTIMAL");
                    println!("Minimum total cost: {:.2}", report.total_cost);
                    println!("Projects implemented: {}", report.implemented_count());
                    println!("Iterations: {}", report.iterations);
                    println!();
                    println!("Projects:");
                    for row in report.implemented() {
                        println!("  {:45} {:10.4} units {:14.2}", row.project, row.units, row.total_cost);
                    }
                }
                SolutionStatus::Infeasible => {
                    println!("Status: INFEASIBLE");
                    println!("The selected projects cannot meet the reduction targets.");
                    for s in &report.shortfalls {
                        println!(
                            "  {:10} needs {:.2}, at most {:.2} reachable (short by {:.2})",
                            s.pollutant, s.required, s.achievable, s.amount
                        );
                    }
                    std::process::exit(1);
                }
                SolutionStatus::IterationLimit => {
                    println!("Status: ITERATION LIMIT");
                    println!(
                        "Stopped after {} iterations; the plan below may not be optimal.",
                        report.iterations
                    );
                    for row in report.implemented() {
                        println!("  {:45} {:10.4} units", row.project, row.units);
                    }
                    std::process::exit(1);
                }
            }
        }
        Commands::Inspect {
            projects,
            targets,
            project,
        } => {
            let catalog = load(&projects, &targets);
            let Some(found) = catalog.project(&project) else {
                eprintln!("Unknown project: {}", project);
                std::process::exit(1);
            };

            println!("{}", found.name);
            println!("  {:10} {:12.2}", "Cost", found.cost);
            for (target, reduction) in catalog.targets().iter().zip(&found.reductions) {
                println!("  {:10} {:12.4}", target.pollutant, reduction);
            }
        }
        Commands::Check { projects, targets } => {
            let catalog = load(&projects, &targets);
            println!("✓ {} and {} are valid", projects.display(), targets.display());
            println!("  {} projects", catalog.projects().len());
            println!("  {} pollutant targets", catalog.targets().len());

            let plan = match catalog.compile(&Selection::all(&catalog)) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("✗ {}", e);
                    std::process::exit(1);
                }
            };
            let shortfalls = plan.problem.shortfalls(DEFAULT_TOLERANCE);
            if shortfalls.is_empty() {
                println!("  every target is reachable at a cap of {}", DEFAULT_CAP);
            } else {
                for s in shortfalls {
                    println!(
                        "  {} is out of reach even with every project (short by {:.2})",
                        plan.pollutants[s.pollutant], s.amount
                    );
                }
            }
        }
    }
}

fn load(projects: &PathBuf, targets: &PathBuf) -> Catalog {
    match Catalog::load(projects, targets) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading data: {}", e);
            std::process::exit(1);
        }
    }
}
