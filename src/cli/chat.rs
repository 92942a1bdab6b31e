use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use uuid::Uuid;

use crate::ai::chat::{
    ChainConfig, ChatError, ChatSession, Entry, Orchestrator, SessionConfig, Submission,
};
use crate::ai::provider::SimulatedProvider;
use crate::api::init_tracing;
use crate::core::AppConfig;
use crate::core::config::parse_model_list;

#[derive(Debug, PartialEq)]
enum Input {
    Message(String),
    ChainMode(bool),
    ChainModels(Vec<String>),
    Model(String),
    History,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Input::Message(line.to_string()));
    };
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((command, ""));

    match (name, arg) {
        ("chain", "on") => Ok(Input::ChainMode(true)),
        ("chain", "off") => Ok(Input::ChainMode(false)),
        ("chain", "") => Err(String::from("Usage: /chain on|off|model1,model2,...")),
        ("chain", models) => Ok(Input::ChainModels(parse_model_list(models))),
        ("model", "") => Err(String::from("Usage: /model <id>")),
        ("model", id) => Ok(Input::Model(id.to_string())),
        ("history", _) => Ok(Input::History),
        ("quit" | "exit", _) => Ok(Input::Quit),
        _ => Err(format!("Unknown command: /{}", name)),
    }
}

fn format_entry(entry: &Entry) -> String {
    match entry.model_id() {
        Some(model) if entry.chained() => format!("[{} | chain]\n{}", model, entry.content()),
        Some(model) => format!("[{}]\n{}", model, entry.content()),
        None => format!(">>> {}", entry.content()),
    }
}

fn describe(config: &SessionConfig) -> String {
    if config.chain.is_active() {
        format!("Chain: {}", config.chain.models().join(" -> "))
    } else {
        format!("Model: {}", config.selected_model)
    }
}

/// Run one submission, printing model entries as each is appended.
async fn submit_and_print(
    orchestrator: &Orchestrator,
    session: &ChatSession,
    submission: &Submission,
) -> Result<(), ChatError> {
    let mut entries = session.subscribe();
    let run = orchestrator.submit(session, submission);
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            Ok(entry) = entries.recv() => {
                if !entry.is_user() {
                    println!("{}\n", format_entry(&entry));
                }
            }
        }
    };
    while let Ok(entry) = entries.try_recv() {
        if !entry.is_user() {
            println!("{}\n", format_entry(&entry));
        }
    }

    result.map(|_| ())
}

/// Apply a config edit, keeping the old config if the edit is invalid.
fn edit_config(
    session: &ChatSession,
    edit: impl FnOnce(SessionConfig) -> Result<SessionConfig, ChatError>,
) {
    match edit(session.config()) {
        Ok(config) => {
            println!("{}", describe(&config));
            session.set_config(config);
        }
        Err(e) => println!("Error: {}", e),
    }
}

pub async fn run(model: Option<String>, chain: Option<String>, fast: bool) -> Result<()> {
    init_tracing(&format!("{}=warn", env!("CARGO_CRATE_NAME")));

    let config = AppConfig::default();
    let catalog = config.catalog()?;
    let provider = if fast {
        SimulatedProvider::instant(&catalog)?
    } else {
        config.provider(&catalog)?
    };
    let orchestrator = Orchestrator::builder().provider(provider).build()?;

    let mut session_config = config.session_config()?;
    if let Some(model) = model {
        session_config = SessionConfig::new(&model, session_config.chain)?;
    }
    if let Some(chain) = chain {
        session_config.chain = ChainConfig::new(parse_model_list(&chain), true)?;
    }
    println!("{}", describe(&session_config));

    let session = Arc::new(ChatSession::new(
        &Uuid::new_v4().to_string(),
        session_config,
    ));
    let mut rl = DefaultEditor::new()?;

    loop {
        let readline = rl.readline(">>> ");
        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };
        let _ = rl.add_history_entry(line.as_str());

        match parse_input(&line) {
            Ok(Input::Message(text)) => {
                match submit_and_print(&orchestrator, &session, &Submission::new(&text)).await {
                    Ok(()) | Err(ChatError::EmptySubmission) => {}
                    Err(e) => println!("Error: {}", e),
                }
            }
            Ok(Input::ChainMode(active)) => edit_config(&session, |mut c| {
                c.chain.set_active(active);
                Ok(c)
            }),
            Ok(Input::ChainModels(models)) => edit_config(&session, |mut c| {
                c.chain = ChainConfig::new(models, true)?;
                Ok(c)
            }),
            Ok(Input::Model(id)) => {
                if !catalog.contains(&id) {
                    println!("{} isn't in the catalog, responses use the generic template", id);
                }
                edit_config(&session, |c| SessionConfig::new(&id, c.chain))
            }
            Ok(Input::History) => {
                for entry in session.entries() {
                    println!("{}\n", format_entry(&entry));
                }
            }
            Ok(Input::Quit) => break,
            Err(usage) => println!("{}", usage),
        }
    }

    Ok(())
}
