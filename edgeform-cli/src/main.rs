use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{info, warn};

use edgeform_core::differ::create_plan;
use edgeform_core::effect::Effect;
use edgeform_core::interpreter::{EffectOutcome, Interpreter, InterpreterConfig};
use edgeform_core::plan::Plan;
use edgeform_core::resource::{Resource, ResourceId, State};
use edgeform_provider::config::{self, ProviderConfig};
use edgeform_provider::{EdgeformProvider, schemas};
use edgeform_state::{LocalBackend, LockInfo, ResourceState, StateBackend, StateFile};

mod declaration;
mod output;

use output::{format_effect, print_attributes, print_plan, print_schema};

#[derive(Parser)]
#[command(name = "edgeform")]
#[command(about = "Declarative management of edge platform configuration", long_about = None)]
struct Cli {
    /// Credentials file with one TOML table per account section
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Section of the credentials file to use
    #[arg(long, global = true, default_value = config::DEFAULT_SECTION)]
    section: String,

    /// Path to the state file
    #[arg(long, global = true, default_value = LocalBackend::DEFAULT_STATE_FILE)]
    state: PathBuf,

    /// Log provider calls
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe resource and data source types
    Schema {
        /// Type to describe; lists every type when omitted
        resource_type: Option<String>,
    },
    /// Validate a declaration file
    Validate {
        /// Path to declaration file
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Show execution plan without applying changes
    Plan {
        /// Path to declaration file
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Apply changes to reach the desired state
    Apply {
        /// Path to declaration file
        #[arg(default_value = "main.json")]
        file: PathBuf,
    },
    /// Destroy every resource recorded in the state
    Destroy {
        /// Skip confirmation prompt (auto-approve)
        #[arg(long)]
        auto_approve: bool,
    },
    /// Adopt an existing remote entity under a block name
    Import {
        resource_type: String,
        name: String,
        /// Composite ID of the remote entity, e.g. 43253:pol1
        id: String,
    },
    /// Remove a lock left behind by an interrupted run
    ForceUnlock { lock_id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let backend = LocalBackend::with_path(cli.state.clone());
    let result = match &cli.command {
        Commands::Schema { resource_type } => run_schema(resource_type.as_deref()),
        Commands::Validate { file } => run_validate(file),
        Commands::Plan { file } => run_plan(&cli, &backend, file).await,
        Commands::Apply { file } => run_apply(&cli, &backend, file).await,
        Commands::Destroy { auto_approve } => run_destroy(&cli, &backend, *auto_approve).await,
        Commands::Import {
            resource_type,
            name,
            id,
        } => run_import(&cli, &backend, ResourceId::new(resource_type, name), id).await,
        Commands::ForceUnlock { lock_id } => run_force_unlock(&backend, lock_id).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_schema(resource_type: Option<&str>) -> Result<(), String> {
    let resources = schemas::resources();
    let data_sources = schemas::data_sources();

    match resource_type {
        Some(name) => {
            if let Some(schema) = resources.iter().find(|s| s.resource_type == name) {
                print_schema(schema, "resource");
            } else if let Some(schema) = data_sources.iter().find(|s| s.resource_type == name) {
                print_schema(schema, "data");
            } else {
                return Err(format!("Unknown type '{}'", name));
            }
        }
        None => {
            println!("{}", "Resources:".cyan().bold());
            for schema in &resources {
                println!("  • {}", schema.resource_type);
            }
            println!("{}", "Data sources:".cyan().bold());
            for schema in &data_sources {
                println!("  • {}", schema.resource_type);
            }
        }
    }
    Ok(())
}

fn load_blocks(file: &Path) -> Result<Vec<Resource>, String> {
    let blocks = declaration::load(file)?;
    declaration::validate(&blocks, &schemas::resources(), &schemas::data_sources())?;
    Ok(blocks)
}

fn run_validate(file: &Path) -> Result<(), String> {
    println!("{}", "Validating...".cyan());

    let blocks = load_blocks(file)?;

    println!(
        "{}",
        format!("✓ {} blocks validated successfully.", blocks.len())
            .green()
            .bold()
    );
    for block in &blocks {
        let kind = if block.is_data_source() { "data" } else { "resource" };
        println!("  • {} {}", kind.dimmed(), block.id);
    }
    Ok(())
}

fn interpreter(cli: &Cli) -> Result<Interpreter<EdgeformProvider>, String> {
    let config = ProviderConfig::load(cli.config.as_deref(), &cli.section)
        .map_err(|e| format!("Configuration error: {}", e))?;
    let provider = EdgeformProvider::from_config(&config).map_err(|e| e.to_string())?;
    Ok(Interpreter::new(provider).with_config(InterpreterConfig {
        dry_run: false,
        continue_on_error: true,
    }))
}

async fn read_state(backend: &LocalBackend) -> Result<StateFile, String> {
    Ok(backend
        .read_state()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_default())
}

async fn write_state(backend: &LocalBackend, state: &mut StateFile) -> Result<(), String> {
    state.increment_serial();
    backend
        .write_state(state)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))
}

async fn release(backend: &LocalBackend, lock: &LockInfo) {
    if let Err(e) = backend.release_lock(lock).await {
        warn!("failed to release lock {}: {}", lock.id, e);
        eprintln!(
            "{} failed to release state lock {}: {}",
            "Warning:".yellow().bold(),
            lock.id,
            e
        );
    }
}

/// Re-read every recorded resource so the plan works from live attributes
async fn refresh_states(
    interpreter: &Interpreter<EdgeformProvider>,
    state_file: &StateFile,
) -> Result<HashMap<ResourceId, State>, String> {
    let mut current = HashMap::new();
    for recorded in state_file.states() {
        let state = interpreter
            .refresh(&recorded)
            .await
            .map_err(|e| format!("Failed to refresh {}: {}", recorded.id, e))?;
        current.insert(state.id.clone(), state);
    }
    Ok(current)
}

async fn run_plan(cli: &Cli, backend: &LocalBackend, file: &Path) -> Result<(), String> {
    let blocks = load_blocks(file)?;
    let interpreter = interpreter(cli)?;

    let state_file = read_state(backend).await?;
    let current = refresh_states(&interpreter, &state_file).await?;

    print_plan(&create_plan(&blocks, &current));
    Ok(())
}

async fn run_apply(cli: &Cli, backend: &LocalBackend, file: &Path) -> Result<(), String> {
    let blocks = load_blocks(file)?;
    let interpreter = interpreter(cli)?;

    let lock = backend
        .acquire_lock("apply")
        .await
        .map_err(|e| e.to_string())?;
    let result = apply_locked(backend, &interpreter, &blocks).await;
    release(backend, &lock).await;
    result
}

async fn apply_locked(
    backend: &LocalBackend,
    interpreter: &Interpreter<EdgeformProvider>,
    blocks: &[Resource],
) -> Result<(), String> {
    let mut state_file = read_state(backend).await?;
    let current = refresh_states(interpreter, &state_file).await?;
    for state in current.values() {
        if let Some(entry) = ResourceState::from_state(state) {
            state_file.upsert_resource(entry);
        }
    }

    let plan = create_plan(blocks, &current);
    print_plan(&plan);
    if plan.is_empty() {
        return write_state(backend, &mut state_file).await;
    }

    println!();
    println!("{}", "Applying changes...".cyan().bold());
    println!();

    execute(backend, interpreter, &plan, &mut state_file, "Apply").await
}

/// Run `plan`, record each outcome in `state_file` and persist it
async fn execute(
    backend: &LocalBackend,
    interpreter: &Interpreter<EdgeformProvider>,
    plan: &Plan,
    state_file: &mut StateFile,
    operation: &str,
) -> Result<(), String> {
    let result = interpreter.apply(plan).await;

    let mut changed = 0;
    for (effect, outcome) in plan.effects().iter().zip(&result.outcomes) {
        match outcome {
            Ok(outcome) => {
                println!("  {} {}", "✓".green(), format_effect(effect));
                if let EffectOutcome::Read { state } = outcome {
                    print_attributes(&state.attributes);
                }
                if effect.is_mutating() {
                    changed += 1;
                }
                record(state_file, outcome);
            }
            Err(e) => println!("  {} {} - {}", "✗".red(), format_effect(effect), e),
        }
    }

    write_state(backend, state_file).await?;

    println!();
    if result.is_success() {
        info!("{} finished with {} changes", operation, changed);
        println!(
            "{}",
            format!("{} complete! {} changes applied.", operation, changed)
                .green()
                .bold()
        );
        Ok(())
    } else {
        Err(format!(
            "{} failed. {} succeeded, {} failed.",
            operation, result.success_count, result.failure_count
        ))
    }
}

/// Apply one successful outcome to the recorded state
fn record(state_file: &mut StateFile, outcome: &EffectOutcome) {
    match outcome {
        EffectOutcome::Created { state } | EffectOutcome::Updated { state } => {
            match ResourceState::from_state(state) {
                Some(entry) => state_file.upsert_resource(entry),
                None => warn!("{} has no identifier; not recorded", state.id),
            }
        }
        EffectOutcome::Deleted { id } => {
            state_file.remove_resource(&id.resource_type, &id.name);
        }
        EffectOutcome::Read { .. } | EffectOutcome::Skipped { .. } => {}
    }
}

/// Delete effects for everything recorded, in reverse recorded order
fn destroy_plan(state_file: &StateFile) -> Plan {
    let mut plan = Plan::new();
    for state in state_file.states().into_iter().rev() {
        plan.add(Effect::Delete(state));
    }
    plan
}

fn confirm(prompt: &str) -> Result<bool, String> {
    println!("{}", prompt.yellow().bold());
    println!(
        "  {}",
        "This action cannot be undone. Type 'yes' to confirm.".yellow()
    );
    print!("\n  Enter a value: ");
    std::io::stdout().flush().map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    println!();
    Ok(input.trim() == "yes")
}

async fn run_destroy(cli: &Cli, backend: &LocalBackend, auto_approve: bool) -> Result<(), String> {
    let interpreter = interpreter(cli)?;

    let lock = backend
        .acquire_lock("destroy")
        .await
        .map_err(|e| e.to_string())?;
    let result = destroy_locked(backend, &interpreter, auto_approve).await;
    release(backend, &lock).await;
    result
}

async fn destroy_locked(
    backend: &LocalBackend,
    interpreter: &Interpreter<EdgeformProvider>,
    auto_approve: bool,
) -> Result<(), String> {
    let mut state_file = read_state(backend).await?;
    let plan = destroy_plan(&state_file);
    if plan.is_empty() {
        println!("{}", "No resources recorded in state.".yellow());
        return Ok(());
    }

    print_plan(&plan);
    println!();

    if !auto_approve && !confirm("Do you really want to destroy all resources?")? {
        println!("{}", "Destroy cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Destroying resources...".red().bold());
    println!();

    execute(backend, interpreter, &plan, &mut state_file, "Destroy").await
}

async fn run_import(
    cli: &Cli,
    backend: &LocalBackend,
    id: ResourceId,
    identifier: &str,
) -> Result<(), String> {
    if !schemas::resources()
        .iter()
        .any(|s| s.resource_type == id.resource_type)
    {
        return Err(format!("Unknown resource type '{}'", id.resource_type));
    }
    let interpreter = interpreter(cli)?;

    let lock = backend
        .acquire_lock("import")
        .await
        .map_err(|e| e.to_string())?;
    let result = import_locked(backend, &interpreter, &id, identifier).await;
    release(backend, &lock).await;
    result
}

async fn import_locked(
    backend: &LocalBackend,
    interpreter: &Interpreter<EdgeformProvider>,
    id: &ResourceId,
    identifier: &str,
) -> Result<(), String> {
    let mut state_file = read_state(backend).await?;
    if let Some(existing) = state_file.find_resource(&id.resource_type, &id.name) {
        return Err(format!(
            "{} is already managed (ID {})",
            id, existing.identifier
        ));
    }

    let state = interpreter
        .import(id, identifier)
        .await
        .map_err(|e| e.to_string())?;
    let entry = ResourceState::from_state(&state)
        .ok_or_else(|| format!("{} did not report an ID after import", id))?;
    state_file.upsert_resource(entry);
    write_state(backend, &mut state_file).await?;

    println!("  {} Imported {}", "✓".green(), id.to_string().cyan().bold());
    print_attributes(&state.attributes);
    Ok(())
}

async fn run_force_unlock(backend: &LocalBackend, lock_id: &str) -> Result<(), String> {
    backend
        .force_unlock(lock_id)
        .await
        .map_err(|e| e.to_string())?;
    println!("{}", format!("Lock {} removed.", lock_id).green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use edgeform_core::resource::Value;

    #[test]
    fn cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_and_defaults() {
        let cli = Cli::try_parse_from(["edgeform", "plan", "--section", "staging", "-v"]).unwrap();

        assert_eq!(cli.section, "staging");
        assert!(cli.verbose);
        assert_eq!(cli.state, PathBuf::from("edgeform.state.json"));
        assert!(matches!(cli.command, Commands::Plan { ref file } if file == Path::new("main.json")));
    }

    #[test]
    fn import_arguments() {
        let cli = Cli::try_parse_from([
            "edgeform",
            "import",
            "edgeform_appsec_ip_geo_protection",
            "web",
            "43253:pol1",
        ])
        .unwrap();

        match cli.command {
            Commands::Import {
                resource_type,
                name,
                id,
            } => {
                assert_eq!(resource_type, "edgeform_appsec_ip_geo_protection");
                assert_eq!(name, "web");
                assert_eq!(id, "43253:pol1");
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn destroy_requires_no_file() {
        let cli = Cli::try_parse_from(["edgeform", "destroy", "--auto-approve"]).unwrap();
        assert!(matches!(cli.command, Commands::Destroy { auto_approve: true }));
    }

    fn geo_state(name: &str, identifier: &str) -> State {
        State::existing(
            ResourceId::new("edgeform_appsec_ip_geo_protection", name),
            HashMap::from([("enabled".to_string(), Value::Bool(true))]),
        )
        .with_identifier(identifier)
    }

    #[test]
    fn record_outcomes() {
        let mut state_file = StateFile::new();

        record(
            &mut state_file,
            &EffectOutcome::Created {
                state: geo_state("web", "43253:pol1"),
            },
        );
        record(
            &mut state_file,
            &EffectOutcome::Created {
                state: geo_state("api", "43253:pol2"),
            },
        );
        let entry = state_file
            .find_resource("edgeform_appsec_ip_geo_protection", "web")
            .unwrap();
        assert_eq!(entry.identifier, "43253:pol1");
        assert_eq!(entry.attributes.get("enabled"), Some(&serde_json::json!(true)));

        record(
            &mut state_file,
            &EffectOutcome::Deleted {
                id: ResourceId::new("edgeform_appsec_ip_geo_protection", "web"),
            },
        );
        assert!(
            state_file
                .find_resource("edgeform_appsec_ip_geo_protection", "web")
                .is_none()
        );
        assert_eq!(state_file.resources.len(), 1);
    }

    #[test]
    fn outcomes_without_identifier_are_not_recorded() {
        let mut state_file = StateFile::new();
        let state = State::existing(
            ResourceId::new("edgeform_appsec_ip_geo_protection", "web"),
            HashMap::new(),
        );

        record(&mut state_file, &EffectOutcome::Updated { state });
        assert!(state_file.resources.is_empty());
    }

    #[test]
    fn destroy_plan_reverses_state_order() {
        let mut state_file = StateFile::new();
        state_file.upsert_resource(ResourceState::new(
            "edgeform_appsec_ip_geo_protection",
            "a",
            "43253:pol1",
        ));
        state_file.upsert_resource(ResourceState::new(
            "edgeform_iam_blocked_user_properties",
            "b",
            "ident:12",
        ));

        let plan = destroy_plan(&state_file);
        let ids: Vec<String> = plan
            .effects()
            .iter()
            .map(|e| e.resource_id().to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                "edgeform_iam_blocked_user_properties.b",
                "edgeform_appsec_ip_geo_protection.a"
            ]
        );
        assert_eq!(plan.summary().delete, 2);
    }

    #[tokio::test]
    async fn force_unlock_removes_lock() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::with_path(dir.path().join("edgeform.state.json"));

        let lock = backend.acquire_lock("apply").await.unwrap();
        run_force_unlock(&backend, &lock.id).await.unwrap();
        assert!(run_force_unlock(&backend, &lock.id).await.is_err());
    }
}
