//! The `quizforge init` command.

use std::path::Path;

use anyhow::{Context, Result};

use quizforge_providers::CONFIG_FILE_NAME;

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE_NAME).exists() {
        println!("{CONFIG_FILE_NAME} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE_NAME, SAMPLE_CONFIG)
            .with_context(|| format!("failed to write {CONFIG_FILE_NAME}"))?;
        println!("Created {CONFIG_FILE_NAME}");
    }

    let sample = Path::new("sample-quiz.txt");
    if sample.exists() {
        println!("sample-quiz.txt already exists, skipping.");
    } else {
        std::fs::write(sample, SAMPLE_QUIZ)?;
        println!("Created sample-quiz.txt");
    }

    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_FILE_NAME} with your API key, or set QUIZFORGE_OPENAI_KEY");
    println!("  2. Run: quizforge inspect sample-quiz.txt");
    println!("  3. Run: quizforge upload sample-quiz.txt");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizforge configuration

default_provider = "openai"
default_model = "gpt-4o-mini"
question_count = 10
max_tokens = 1200
temperature = 0.1
generation_timeout_secs = 60
max_retries = 2
retry_delay_ms = 500

# Used when a question has no answer, or one outside A-D.
default_answer = "A"
placeholder = "N/A"

parallelism = 4
store_dir = "./quizforge-data"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"
"#;

const SAMPLE_QUIZ: &str = "\
Q1. Which planet is known as the Red Planet?
A) Venus
B) Mars
C) Jupiter
D) Saturn
Answer: B

Q2. What is the chemical symbol for water?
A) H2O
B) CO2
C) O2
D) NaCl
Answer: A
";
