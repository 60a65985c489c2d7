//! A terminal front end for the research assistant.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::pin::pin;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use research_agent::core::transcript::Turn;
use research_agent::core::{TaskOutcome, TaskStatus};
use research_agent::{ResearchAssistant, ResearchAssistantBuilder, Redactor};
use research_agent_openai_model::{OpenAIConfigBuilder, OpenAIProvider};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";
const API_KEY_VARS: &[&str] = &["AGENT_API_KEY", "HF_TOKEN", "HUGGINGFACE_API_KEY"];

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Some(api_key) = API_KEY_VARS.iter().find_map(|var| env::var(var).ok())
    else {
        eprintln!(
            "none of {} environment variables is set",
            API_KEY_VARS.join(", ")
        );
        return;
    };

    let mut config = OpenAIConfigBuilder::with_api_key(api_key);
    if let Ok(base_url) = env::var("AGENT_BASE_URL") {
        config = config.with_base_url(base_url);
    }
    if let Ok(model) = env::var("AGENT_MODEL") {
        config = config.with_model(model);
    }
    let model_provider = OpenAIProvider::new(config.build());

    let (turn_tx, mut turn_rx) = mpsc::unbounded_channel();
    let mut builder = ResearchAssistantBuilder::with_model_provider(model_provider)
        .with_answer_redaction(env_flag("AGENT_REDACT_ANSWER"))
        .on_turn(move |turn| {
            turn_tx.send(turn.clone()).ok();
        });

    if let Ok(value) = env::var("AGENT_MAX_ITERATIONS") {
        let Ok(max_iterations) = value.trim().parse::<usize>() else {
            eprintln!("AGENT_MAX_ITERATIONS must be a number, got {value:?}");
            return;
        };
        builder = builder.with_max_iterations(max_iterations);
    }
    if let Ok(terms) = env::var("AGENT_SENSITIVE_TERMS") {
        match Redactor::new(terms.split(',')) {
            Ok(redactor) => builder = builder.with_redactor(redactor),
            Err(err) => {
                eprintln!("invalid AGENT_SENSITIVE_TERMS: {err}");
                return;
            }
        }
    }
    let assistant = builder.build();

    // A single instruction given on the command line.
    let args = env::args().skip(1).collect::<Vec<_>>();
    if !args.is_empty() {
        run_instruction(&assistant, &args.join(" "), &mut turn_rx).await;
        return;
    }

    // One reader for the whole session, lines it has buffered ahead
    // belong to the next prompts.
    let mut stdin = io::BufReader::new(io::stdin());
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut stdin).await else {
            break;
        };
        let instruction = line.trim();
        if instruction.is_empty() {
            println!("Please enter an instruction.");
            continue;
        }
        run_instruction(&assistant, instruction, &mut turn_rx).await;
    }
}

async fn run_instruction(
    assistant: &ResearchAssistant,
    instruction: &str,
    turn_rx: &mut mpsc::UnboundedReceiver<Turn>,
) {
    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let mut progress_bar: Option<ProgressBar> = None;
    let mut task = pin!(assistant.run(instruction));

    let outcome = loop {
        // Create a new progress bar if it has been finished.
        progress_bar
            .get_or_insert_with(|| {
                let progress_bar = ProgressBar::new_spinner();
                progress_bar.set_style(progress_style.clone());
                progress_bar.set_message("🤔 Researching...");
                progress_bar
            })
            .inc(1);

        let turn = select! {
            outcome = &mut task => break outcome,
            Some(turn) = turn_rx.recv() => turn,
            _ = sleep(Duration::from_millis(100)) => continue,
        };

        // Finish the progress bar before printing anything else.
        if let Some(progress_bar) = progress_bar.take() {
            progress_bar.finish_and_clear();
        }
        print_turn(&turn);
    };

    if let Some(progress_bar) = progress_bar.take() {
        progress_bar.finish_and_clear();
    }
    // Turns recorded right before the task returned.
    while let Ok(turn) = turn_rx.try_recv() {
        print_turn(&turn);
    }
    print_outcome(&outcome);
}

fn print_turn(turn: &Turn) {
    match turn {
        Turn::Thought(text) => {
            println!("{}💭 {}", BAR_CHAR.bright_black(), text.dimmed());
        }
        Turn::Action(request) => {
            println!(
                "{}🔧 {} {}",
                BAR_CHAR.bright_yellow(),
                request.tool_name.bright_white().bold(),
                request.raw_input
            );
        }
        Turn::Observation(text) => {
            println!("{}👀 {}", BAR_CHAR.bright_blue(), text);
        }
        Turn::Notice(text) => {
            println!("{}⚠️  {}", BAR_CHAR.bright_red(), text.yellow());
        }
        // Printed with the outcome.
        Turn::FinalAnswer(_) => {}
    }
}

fn print_outcome(outcome: &TaskOutcome) {
    let bar = match outcome.status {
        TaskStatus::Succeeded => BAR_CHAR.bright_green().to_string(),
        TaskStatus::StoppedByLimit => BAR_CHAR.bright_yellow().to_string(),
        TaskStatus::Aborted => BAR_CHAR.bright_red().to_string(),
    };
    println!(
        "\n{bar}🤖 {}\n{bar}{}\n",
        outcome.answer.bright_white(),
        format!(
            "{:?} after {} iteration(s)",
            outcome.status, outcome.iterations_used
        )
        .dimmed()
    );
}

fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

async fn read_line<R>(input: &mut R) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();

    match input.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
