use std::path::PathBuf;

use anyhow::{anyhow, Context};
use dotenvy::dotenv;
use tokio::io::AsyncReadExt;
use tracing::info;

mod config;
mod handlers;
mod llm;
mod prompt;
mod utils;

use config::CONFIG;
use handlers::generate::{generate_image, GenerateOutcome};
use llm::ReplicateClient;
use prompt::vocabulary::FIELDS;
use prompt::{PromptPair, Selection};
use utils::logging::init_logging;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliCommand {
    Generate {
        file_path: Option<PathBuf>,
        dry_run: bool,
    },
    Vocabulary,
    Help,
}

fn usage() -> &'static str {
    "Usage:\n  ideal-type-generator generate [--file <path>] [--dry-run]\n  ideal-type-generator vocabulary\n\nThe selection is read as JSON from --file, or from stdin when --file is omitted:\n  {\"gender\":\"여성\",\"age\":\"20대\",\"bodyType\":\"보통\",\"style\":\"캐주얼\",\"personality\":\"테토\",\"faceType\":\"계란형\",\"customText\":\"long flowing hair\"}"
}

fn parse_args(args: &[String]) -> anyhow::Result<CliCommand> {
    let Some(command) = args.get(1) else {
        return Ok(CliCommand::Help);
    };

    match command.as_str() {
        "generate" => {}
        "vocabulary" => {
            if let Some(extra) = args.get(2) {
                return Err(anyhow!("Unexpected argument for vocabulary: {extra}"));
            }
            return Ok(CliCommand::Vocabulary);
        }
        "--help" | "-h" | "help" => return Ok(CliCommand::Help),
        other => return Err(anyhow!("Unknown command: {other}\n{}", usage())),
    }

    let mut file_path: Option<PathBuf> = None;
    let mut dry_run = false;

    let mut index = 2;
    while index < args.len() {
        match args[index].as_str() {
            "--file" => {
                index += 1;
                let value = args
                    .get(index)
                    .ok_or_else(|| anyhow!("Missing value for --file"))?;
                file_path = Some(PathBuf::from(value));
            }
            "--dry-run" => {
                dry_run = true;
            }
            "--help" | "-h" => return Ok(CliCommand::Help),
            other => {
                return Err(anyhow!(
                    "Unknown generate argument: {other}\n{}",
                    usage()
                ));
            }
        }
        index += 1;
    }

    Ok(CliCommand::Generate { file_path, dry_run })
}

async fn read_selection(file_path: Option<&PathBuf>) -> anyhow::Result<Selection> {
    let raw = match file_path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read selection from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buffer)
                .await
                .context("Failed to read selection from stdin")?;
            buffer
        }
    };

    if raw.trim().is_empty() {
        return Err(anyhow!("Empty selection body"));
    }
    serde_json::from_str(&raw).context("Invalid selection JSON")
}

fn print_vocabulary() {
    for (field, table) in FIELDS {
        println!("{field}:");
        for entry in table.iter() {
            println!("  {} ({}) -> {}", entry.label, entry.alias, entry.fragment);
        }
    }
}

fn print_outcome(outcome: &GenerateOutcome) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome.body)?);
    Ok(())
}

fn dry_run_pair(selection: &Selection) -> anyhow::Result<PromptPair> {
    prompt::validate(selection)
        .into_result()
        .map_err(|message| anyhow!("Selection is invalid: {message}"))?;
    Ok(prompt::build_pair(selection))
}

async fn run_generate(file_path: Option<PathBuf>, dry_run: bool) -> anyhow::Result<bool> {
    let selection = read_selection(file_path.as_ref()).await?;

    if dry_run {
        let pair = dry_run_pair(&selection)?;
        println!("{}", serde_json::to_string_pretty(&pair)?);
        return Ok(true);
    }

    let client = ReplicateClient::from_config(&CONFIG);
    let outcome = generate_image(&client, &CONFIG, &selection).await;
    info!("Generation finished with status {}", outcome.status);
    print_outcome(&outcome)?;
    Ok(outcome.is_success())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args)?;

    match command {
        CliCommand::Help => {
            println!("{}", usage());
            Ok(())
        }
        CliCommand::Vocabulary => {
            print_vocabulary();
            Ok(())
        }
        CliCommand::Generate { file_path, dry_run } => {
            let _guards = init_logging();
            info!("Starting ideal-type image generation");
            if run_generate(file_path, dry_run).await? {
                Ok(())
            } else {
                Err(anyhow!("Image generation did not succeed"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        std::iter::once("ideal-type-generator")
            .chain(values.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn no_arguments_prints_help() {
        assert_eq!(parse_args(&args(&[])).unwrap(), CliCommand::Help);
    }

    #[test]
    fn parses_generate_with_file_and_dry_run() {
        let command = parse_args(&args(&["generate", "--file", "sel.json", "--dry-run"])).unwrap();
        assert_eq!(
            command,
            CliCommand::Generate {
                file_path: Some(PathBuf::from("sel.json")),
                dry_run: true,
            }
        );
    }

    #[test]
    fn generate_defaults_to_stdin() {
        assert_eq!(
            parse_args(&args(&["generate"])).unwrap(),
            CliCommand::Generate {
                file_path: None,
                dry_run: false,
            }
        );
    }

    #[test]
    fn dry_run_reports_invalid_selection_instead_of_generation_failure() {
        let selection = Selection {
            gender: "여성".to_string(),
            ..Selection::default()
        };
        let err = dry_run_pair(&selection).unwrap_err();
        assert_eq!(err.to_string(), "Selection is invalid: Please select an age range.");

        let complete = Selection {
            gender: "여성".to_string(),
            age: "20대".to_string(),
            body_type: "보통".to_string(),
            style: "캐주얼".to_string(),
            personality: "테토".to_string(),
            face_type: "계란형".to_string(),
            custom_text: None,
        };
        assert_eq!(dry_run_pair(&complete).unwrap(), prompt::build_pair(&complete));
    }

    #[test]
    fn rejects_unknown_and_incomplete_arguments() {
        assert!(parse_args(&args(&["generate", "--file"])).is_err());
        assert!(parse_args(&args(&["generate", "--steps", "10"])).is_err());
        assert!(parse_args(&args(&["serve"])).is_err());
        assert!(parse_args(&args(&["vocabulary", "extra"])).is_err());
    }
}
