//! The `quizforge list-models` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::traits::ModelInfo;
use quizforge_providers::ollama::OllamaProvider;
use quizforge_providers::{create_provider, load_config_from, ProviderConfig};

pub async fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let mut names: Vec<&String> = config.providers.keys().collect();
    names.sort();

    if let Some(filter) = &provider_filter {
        anyhow::ensure!(
            config.providers.contains_key(filter),
            "provider '{filter}' not found in config"
        );
    }

    let mut found_any = false;

    for name in names {
        if provider_filter.as_ref().is_some_and(|f| f != name) {
            continue;
        }
        let provider_config = &config.providers[name];

        let models = match provider_config {
            ProviderConfig::Ollama { base_url } => {
                match OllamaProvider::new(base_url)?.list_models_async().await {
                    Ok(models) => models,
                    Err(e) => {
                        eprintln!("Provider {name}: {e:#}");
                        continue;
                    }
                }
            }
            _ => create_provider(provider_config)?.available_models(),
        };

        if !models.is_empty() {
            found_any = true;
            print_models(name, &models);
        }
    }

    if !found_any {
        println!("No models found. Run `quizforge init` to create a config file.");
    }

    Ok(())
}

fn print_models(provider: &str, models: &[ModelInfo]) {
    println!("Provider: {provider}");
    for model in models {
        if model.max_context > 0 {
            println!(
                "  {} - {} ({}K context)",
                model.id,
                model.name,
                model.max_context / 1000
            );
        } else {
            println!("  {} - {}", model.id, model.name);
        }
    }
    println!();
}
