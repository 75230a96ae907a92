//! The `quizforge inspect` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::detect::looks_like_mcq;
use quizforge_core::extract::extract_text;
use quizforge_core::model::Document;
use quizforge_core::parser::parse_with_policy;
use quizforge_providers::load_config_from;

use super::question_table;

pub fn execute(file: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let policy = config.normalize_policy()?;
    let document = Document::from_path(&file)?;

    let text = extract_text(&document);
    let detected = looks_like_mcq(&text);

    println!("File: {}", file.display());
    println!("Kind: {:?}", document.kind);
    println!("Extracted: {} chars", text.chars().count());
    println!(
        "MCQ markup detected: {}",
        if detected { "yes" } else { "no" }
    );

    if !detected {
        println!(
            "Upload would generate questions with {}/{}",
            config.default_provider, config.default_model
        );
        return Ok(());
    }

    let questions = parse_with_policy(&text, &policy);
    println!("Parsed questions: {}", questions.len());
    if questions.is_empty() {
        println!(
            "Nothing parsed; upload would fall back to {}/{}",
            config.default_provider, config.default_model
        );
    } else {
        println!("\n{}", question_table(&questions));
    }

    Ok(())
}
