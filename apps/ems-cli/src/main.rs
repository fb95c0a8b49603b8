use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ems_app::{AppResult, compile_service, project_service, rules};
use ems_program::Comparison;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ems-cli")]
#[command(about = "EMS CLI - EnergyPlus Runtime Language program generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax, structure and program references
    Validate {
        /// Path to the project file (.yaml, .yml or .json)
        project_path: PathBuf,
    },
    /// List the programs and subroutines a project generates
    Programs {
        /// Path to the project file
        project_path: PathBuf,
    },
    /// Compile a project to EnergyManagementSystem IDF objects
    Compile {
        /// Path to the project file
        project_path: PathBuf,
        /// Output IDF file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a threshold rule program built from command-line rules
    Piecewise {
        /// Variable every rule is compared against
        comparison_variable: String,
        /// Rule as BOUNDARY:VARIABLE:EXPRESSION, in evaluation order
        #[arg(short, long = "rule", required = true, allow_hyphen_values = true)]
        rules: Vec<String>,
        /// Fallback as VARIABLE:EXPRESSION
        #[arg(short, long)]
        default: String,
        /// Comparison operator
        #[arg(short, long, default_value = "<=")]
        comparison: Comparison,
    },
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { project_path } => cmd_validate(&project_path),
        Commands::Programs { project_path } => cmd_programs(&project_path),
        Commands::Compile {
            project_path,
            output,
        } => cmd_compile(&project_path, output.as_deref()),
        Commands::Piecewise {
            comparison_variable,
            rules,
            default,
            comparison,
        } => cmd_piecewise(&comparison_variable, &rules, &default, comparison),
    }
}

fn cmd_validate(project_path: &Path) -> AppResult<()> {
    println!("Validating project: {}", project_path.display());
    let project = project_service::load_project(project_path)?;
    project_service::validate_project(&project)?;
    println!("✓ Project is valid");
    Ok(())
}

fn cmd_programs(project_path: &Path) -> AppResult<()> {
    let project = project_service::load_project(project_path)?;
    let programs = project_service::list_programs(&project)?;

    if programs.is_empty() {
        println!("No programs found in project");
        return Ok(());
    }

    println!("Programs in project:");
    for program in programs {
        let schedule = match &program.schedule {
            Some((manager, point)) => format!("{manager} @ {point}"),
            None => "unscheduled".to_string(),
        };
        println!(
            "  {} [{}] {} lines, {}",
            program.name,
            program.kind.label(),
            program.line_count,
            schedule
        );
        if !program.reads.is_empty() {
            println!("    reads: {}", program.reads.join(", "));
        }
    }
    Ok(())
}

fn cmd_compile(project_path: &Path, output: Option<&Path>) -> AppResult<()> {
    debug!(project = %project_path.display(), "compiling");
    let compiled = compile_service::compile_file(project_path)?;

    match output {
        Some(path) => {
            compile_service::write_output(path, &compiled)?;
            println!("✓ Wrote {} to {}", compiled.model.summary(), path.display());
        }
        None => print!("{}", compiled.idf),
    }
    Ok(())
}

fn cmd_piecewise(
    comparison_variable: &str,
    rule_args: &[String],
    default: &str,
    comparison: Comparison,
) -> AppResult<()> {
    let parsed = rule_args
        .iter()
        .map(|arg| rules::parse_rule_arg(arg))
        .collect::<AppResult<Vec<_>>>()?;
    let default = rules::parse_action_arg(default)?;
    let text = rules::compile_rules(comparison_variable, comparison, &parsed, Some(default))?;
    println!("{text}");
    Ok(())
}
