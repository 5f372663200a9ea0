mod config;
mod telemetry;

use anyhow::{anyhow, Context};
use appforge_artifact::CodeArtifact;
use appforge_core::InMemoryAppStore;
use appforge_generation::{ChatCompletionsClient, GenerationRequest, Orchestrator};
use appforge_sandbox::{DocumentBuilder, IsolationPolicy};
use appforge_service::ServiceState;
use appforge_validator::SyntaxValidator;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use config::AppforgeConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("appforge")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate, validate and sandbox AI-authored UI components")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to appforge.toml"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a component source file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Component source"),
                ),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate a component from a description")
                .arg(
                    Arg::new("description")
                        .long("description")
                        .required(true)
                        .help("What the app should do"),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .required(true)
                        .help("App category"),
                )
                .arg(
                    Arg::new("price")
                        .long("price")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Listing price"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the code here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Build the sandbox document for a component")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Component source"),
                )
                .arg(
                    Arg::new("title")
                        .long("title")
                        .default_value("App Preview")
                        .help("Document title"),
                )
                .arg(
                    Arg::new("generation")
                        .long("generation")
                        .default_value("1")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Mount generation stamped on channel events"),
                )
                .arg(
                    Arg::new("iframe")
                        .long("iframe")
                        .action(ArgAction::SetTrue)
                        .help("Wrap the document in sandboxed iframe markup"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the document here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP service")
                .arg(
                    Arg::new("listen")
                        .long("listen")
                        .help("Listen address, overrides the config"),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();
    telemetry::init(matches.get_flag("log-json"))?;

    let config = config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("validate", args)) => validate(&config, args),
        Some(("generate", args)) => generate(&config, args).await,
        Some(("render", args)) => render(&config, args),
        Some(("serve", args)) => serve(config, args).await,
        _ => Err(anyhow!("unknown command")),
    }
}

fn required<'a, T>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(id)
        .ok_or_else(|| anyhow!("missing --{id}"))
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn emit(out: Option<&PathBuf>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = text.len(), "Wrote output");
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn check(config: &AppforgeConfig, path: &Path) -> anyhow::Result<CodeArtifact> {
    let source = read_source(path)?;
    let validator = SyntaxValidator::new(config.generation.entry_symbol.clone());
    Ok(validator.check(CodeArtifact::candidate(source, 1)?)?)
}

fn validate(config: &AppforgeConfig, args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let artifact = check(config, required::<PathBuf>(args, "file")?)?;
    match artifact.state().reason() {
        None => {
            println!("valid");
            Ok(ExitCode::SUCCESS)
        }
        Some(reason) => {
            println!("{reason}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn generate(config: &AppforgeConfig, args: &ArgMatches) -> anyhow::Result<ExitCode> {
    if config.provider.api_key.is_none() {
        tracing::warn!("No API key configured; set APPFORGE_API_KEY");
    }
    let client = ChatCompletionsClient::new(&config.provider)
        .context("failed to build the chat completions client")?;
    let orchestrator = Orchestrator::new(Arc::new(client), config.generation.clone());

    let request = GenerationRequest::new(
        required::<String>(args, "description")?.as_str(),
        required::<String>(args, "category")?.as_str(),
        *required::<f64>(args, "price")?,
    );

    match orchestrator.generate(&request).await {
        Ok(outcome) => {
            emit(args.get_one::<PathBuf>("out"), outcome.code())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::error!(error = %err, status = err.status_code(), "Generation failed");
            eprintln!("{}", err.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn render(config: &AppforgeConfig, args: &ArgMatches) -> anyhow::Result<ExitCode> {
    let artifact = check(config, required::<PathBuf>(args, "file")?)?;
    if let Some(reason) = artifact.state().reason() {
        eprintln!("{reason}");
        return Ok(ExitCode::FAILURE);
    }

    let title = required::<String>(args, "title")?;
    let generation = *required::<u64>(args, "generation")?;
    let documents = DocumentBuilder::new(
        config.sandbox.assets.clone(),
        config.generation.entry_symbol.clone(),
    )?;
    let mut html = documents.build(&artifact, title, generation)?;
    if args.get_flag("iframe") {
        let isolation = IsolationPolicy::with_extra(config.sandbox.allow.iter().cloned())?;
        html = isolation.iframe_markup(&html, title, generation);
    }

    emit(args.get_one::<PathBuf>("out"), &html)?;
    Ok(ExitCode::SUCCESS)
}

async fn serve(mut config: AppforgeConfig, args: &ArgMatches) -> anyhow::Result<ExitCode> {
    if let Some(listen) = args.get_one::<String>("listen") {
        config.server.listen.clone_from(listen);
    }
    let addr = config.server.listen_addr()?;

    let client = ChatCompletionsClient::new(&config.provider)
        .context("failed to build the chat completions client")?;
    let orchestrator = Orchestrator::new(Arc::new(client), config.generation.clone());
    let state = ServiceState::new(orchestrator, Arc::new(InMemoryAppStore::new()), &config.sandbox)?;

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for ctrl-c");
        }
    };
    appforge_service::serve(state, addr, shutdown)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn render_parses_generation_and_flags() {
        let matches = cli()
            .try_get_matches_from([
                "appforge",
                "--log-json",
                "render",
                "app.jsx",
                "--generation",
                "3",
                "--iframe",
            ])
            .unwrap();
        assert!(matches.get_flag("log-json"));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "render");
        assert_eq!(*required::<u64>(args, "generation").unwrap(), 3);
        assert_eq!(required::<String>(args, "title").unwrap(), "App Preview");
        assert!(args.get_flag("iframe"));
    }

    #[test]
    fn render_rejects_generation_zero() {
        let result = cli().try_get_matches_from(["appforge", "render", "app.jsx", "--generation", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn generate_requires_price() {
        let result = cli().try_get_matches_from([
            "appforge",
            "generate",
            "--description",
            "tips",
            "--category",
            "Finance",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn validate_reports_diagnostic_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.jsx");
        let bad = dir.path().join("bad.jsx");
        fs::write(&good, "function App() { return <div>ok</div>; }").unwrap();
        fs::write(&bad, "export default function App() { return null; }").unwrap();

        let config = AppforgeConfig::default();
        assert!(check(&config, &good).unwrap().is_valid());
        let reason = check(&config, &bad)
            .unwrap()
            .state()
            .reason()
            .map(str::to_string)
            .unwrap();
        assert!(reason.contains("export"));
    }
}
