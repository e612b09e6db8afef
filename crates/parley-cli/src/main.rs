//! Parley: practice negotiations against a spoken AI counterpart.
//!
//! Commands: `start <scenario>`, `style <name>`, `continue`, `end`,
//! `sessions`, `load <n>`, `export [path]`, `help`, `quit`. With an API key
//! configured the pipeline uses the production speech and chat backends;
//! without one it falls back to placeholders so the flow can be exercised
//! dry.

use anyhow::{anyhow, Context, Result};
use parley_core::{
    render_report, ApiEmotionClassifier, ApiResponseGenerator, ChatClient, CoachConfig,
    ConversationStyle, NullSynthesizer, PlaceholderClassifier, PlaceholderResponder,
    PlaceholderTranscriber, SessionMachine, SessionStore, TurnPipeline,
};
use parley_voice::{
    ApiTts, CaptureConfig, EndpointConfig, MicSource, Recorder, Speaker, VoiceSynthesizer,
    WhisperApiStt,
};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[parley] .env not loaded: {e} (using system environment)");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CoachConfig::from_env();
    let store = SessionStore::new(&config.session_log);
    let mut pipeline = build_pipeline(&config)?;
    let mut machine = SessionMachine::new();
    let mut style = ConversationStyle::default();

    println!("Parley - negotiation practice coach");
    println!("Practice your negotiation skills against a spoken counterpart.\n");

    let previous = store.load_all().context("reading session log")?;
    if previous.is_empty() {
        println!("No previous negotiations found.");
    } else {
        println!("Previous negotiations:");
        for (i, session) in previous.iter().enumerate() {
            println!("  [{}] {}", i + 1, session.label());
        }
    }
    println!("\nType `help` for commands.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };

        let outcome = match command {
            "" => Ok(()),
            "help" => {
                print_help();
                Ok(())
            }
            "style" => set_style(&mut style, rest),
            "start" => start(&mut machine, &mut pipeline, style, rest),
            "continue" => run_continue(&mut machine, &mut pipeline),
            "end" => end(&mut machine, &store),
            "sessions" => list_sessions(&store),
            "load" => load(&mut machine, &store, rest),
            "export" => export(&machine, rest),
            "quit" | "exit" => break,
            other => Err(anyhow!("unknown command: {other} (try `help`)")),
        };
        if let Err(e) = outcome {
            // a failed turn leaves the session active; the user decides
            // whether to retry with `continue`
            eprintln!("error: {e:#}");
        }
    }

    if machine.is_active() {
        warn!("quitting with an unfinished negotiation; it was not saved");
    }
    Ok(())
}

/// Wire the five turn stages. Production backends when a key is configured,
/// placeholders otherwise.
fn build_pipeline(config: &CoachConfig) -> Result<TurnPipeline> {
    let mic = MicSource::open(CaptureConfig::default()).context("opening microphone")?;
    let capture = Box::new(Recorder::new(mic, EndpointConfig::default()));

    let pipeline = match &config.api_key {
        Some(key) => {
            info!("using production speech and chat backends");
            let chat = ChatClient::new(
                &config.api_base_url,
                key,
                Some(config.chat_model.clone()),
            )?;
            let stt = WhisperApiStt::new(
                &config.api_base_url,
                key,
                Some(config.stt_model.clone()),
            )?;
            let tts = ApiTts::new(
                &config.api_base_url,
                key,
                Some(config.tts_model.clone()),
                Some(config.tts_voice.clone()),
            )?;
            let speaker = Speaker::new().context("opening audio output")?;
            TurnPipeline {
                capture,
                transcriber: Box::new(stt),
                classifier: Box::new(ApiEmotionClassifier::new(chat.clone())),
                responder: Box::new(ApiResponseGenerator::new(chat)),
                synthesizer: Box::new(VoiceSynthesizer::new(tts, speaker)),
            }
        }
        None => {
            info!("no API key configured; using placeholder backends (set PARLEY_API_KEY or OPENAI_API_KEY)");
            TurnPipeline {
                capture,
                transcriber: Box::new(PlaceholderTranscriber::new()),
                classifier: Box::new(PlaceholderClassifier),
                responder: Box::new(PlaceholderResponder),
                synthesizer: Box::new(NullSynthesizer),
            }
        }
    };
    Ok(pipeline)
}

fn print_help() {
    println!("commands:");
    println!("  style <collaborative|aggressive|neutral>  set the counterpart's tone");
    println!("  start <scenario…>   begin a negotiation and record your first turn");
    println!("  continue            record another turn");
    println!("  end                 finish, score, and save the session");
    println!("  sessions            list saved sessions");
    println!("  load <n>            display a saved session");
    println!("  export [path]       write the displayed session as a Markdown report");
    println!("  quit                leave");
}

fn set_style(style: &mut ConversationStyle, rest: &str) -> Result<()> {
    if rest.is_empty() {
        println!("conversation style: {style}");
        return Ok(());
    }
    *style = rest.parse()?;
    println!("conversation style set to {style}");
    Ok(())
}

fn start(
    machine: &mut SessionMachine,
    pipeline: &mut TurnPipeline,
    style: ConversationStyle,
    scenario: &str,
) -> Result<()> {
    if scenario.is_empty() {
        return Err(anyhow!("usage: start <scenario…>"));
    }
    println!("Speak into your microphone.");
    let turn = machine.start(scenario, style, pipeline)?;
    print_turn(turn);
    Ok(())
}

fn run_continue(machine: &mut SessionMachine, pipeline: &mut TurnPipeline) -> Result<()> {
    println!("Speak into your microphone.");
    let turn = machine.continue_turn(pipeline)?;
    print_turn(turn);
    Ok(())
}

fn print_turn(turn: &parley_core::Turn) {
    println!("You said: {}", turn.user);
    println!("Counterpart: {}", turn.ai);
}

fn end(machine: &mut SessionMachine, store: &SessionStore) -> Result<()> {
    let record = machine.end(store)?;
    let score = &record.feedback.score;
    println!("Negotiation ended. Here's your final feedback:\n");
    println!("  Clarity:        {:.2}/10", score.clarity);
    println!("  Persuasiveness: {:.2}/10", score.persuasiveness);
    println!("  Total:          {:.2}/10\n", score.total);
    println!("{}\n", record.feedback.points_to_consider);
    println!("{}\n", record.feedback.performance_analysis);
    println!("Areas for improvement:");
    for improvement in &record.feedback.improvements {
        println!("  - {improvement}");
    }
    Ok(())
}

fn list_sessions(store: &SessionStore) -> Result<()> {
    let sessions = store.load_all()?;
    if sessions.is_empty() {
        println!("No previous negotiations found.");
        return Ok(());
    }
    for (i, session) in sessions.iter().enumerate() {
        println!("  [{}] {}", i + 1, session.label());
    }
    Ok(())
}

fn load(machine: &mut SessionMachine, store: &SessionStore, rest: &str) -> Result<()> {
    let index: usize = rest
        .parse()
        .map_err(|_| anyhow!("usage: load <session number>"))?;
    let mut sessions = store.load_all()?;
    if index == 0 || index > sessions.len() {
        return Err(anyhow!(
            "no session [{index}]; `sessions` lists what is saved"
        ));
    }
    let record = sessions.remove(index - 1);
    println!("Showing previous negotiation: {}", record.label());
    for (i, turn) in record.conversation.iter().enumerate() {
        println!("  Turn {}:", i + 1);
        println!("    You: {}", turn.user);
        println!("    Counterpart: {}", turn.ai);
    }
    machine.load(record)?;
    Ok(())
}

fn export(machine: &SessionMachine, rest: &str) -> Result<()> {
    let record = machine
        .current_record()
        .ok_or_else(|| anyhow!("no finished session to export; `end` or `load` one first"))?;
    let path = if rest.is_empty() {
        "negotiation_session.md"
    } else {
        rest
    };
    std::fs::write(path, render_report(record)).with_context(|| format!("writing {path}"))?;
    println!("Session exported to {path}");
    Ok(())
}
