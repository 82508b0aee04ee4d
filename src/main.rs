//! The kindling binary: reads a Tinder script (from the command line, a
//! config file, or the built-in demo), runs it, and prints the outcome as
//! plain text or JSON.

use std::env;
use std::fs;

use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kindling::engine::Halt;
use kindling::error::{KindlingError, Result};
use kindling::tinder::Engine;

/// Settings read from an optional `kindling.*` config file, overridable
/// through KINDLING_-prefixed environment variables. A positional argument
/// beats the configured script path.
#[derive(Debug, Deserialize, Default)]
struct Settings {
    script: Option<String>,
    step_limit: Option<usize>,
    json: Option<bool>,
}

// The enrollment policy rule base the engine grew up on. Runs under each
// strategy so their different firing orders are visible side by side.
const DEMO_SCRIPT: &str = r#"
fact student(Carol),
     request-course(Carol, CS550),
     graduate-only(CS550),
     not-graduate-student(Carol),
     course-prerequisite(CS550, CS350),
     not-completed(Carol, CS350),
     no-waiver(Carol, CS350),
     has-hold(Carol);

rule graduate-only-course-restriction @7
  when graduate-only(?course), not-graduate-student(?student)
  then cannot-enroll-course(?student, ?course);

rule missing-prerequisite-prevents-enrollment @8
  when course-prerequisite(?course, ?prereq),
       not-completed(?student, ?prereq),
       no-waiver(?student, ?prereq)
  then cannot-enroll-course(?student, ?course);

rule credit-limit-prevents-enrollment @6
  when would-exceed-credit-limit(?student, ?course)
  then cannot-enroll-course(?student, ?course);

rule time-conflict-prevents-enrollment @5
  when enrolled-in(?student, ?sectionA),
       request-section(?student, ?sectionB),
       section-overlap(?sectionA, ?sectionB)
  then cannot-enroll(?student, ?sectionB);

rule administrative-hold-prevents-enrollment @9
  when has-hold(?student), request-course(?student, ?course)
  then cannot-enroll-course(?student, ?course);

rule cannot-enroll-course-implies-drop-request @4
  when cannot-enroll-course(?student, ?course), request-course(?student, ?course)
  then dropped-request(?student, ?course);

rule dropped-request-implies-notify-student @3
  when dropped-request(?student, ?course)
  then notified-student(?student, ?course);

infer priority;
explain notified-student(Carol, CS550);
infer specificity;
infer order;
show "cannot-";
"#;

fn settings() -> Result<Settings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("kindling").required(false))
        .add_source(config::Environment::with_prefix("KINDLING"))
        .build()?;
    Ok(settings.try_deserialize()?)
}

fn run() -> Result<()> {
    let settings = settings()?;
    let script = match env::args().nth(1).or_else(|| settings.script.clone()) {
        Some(path) => fs::read_to_string(&path).map_err(|e| {
            KindlingError::Config(format!("cannot read script {}: {}", path, e))
        })?,
        None => {
            info!("no script given, running the built-in enrollment demo");
            String::from(DEMO_SCRIPT)
        }
    };
    let mut engine = match settings.step_limit {
        Some(limit) => Engine::with_step_limit(limit),
        None => Engine::new(),
    };
    let result = engine.execute_collect(&script)?;

    if settings.json.unwrap_or(false) {
        let rendered = serde_json::to_string_pretty(&result)
            .map_err(|e| KindlingError::Execution(e.to_string()))?;
        println!("{}", rendered);
        return Ok(());
    }

    for run in &result.runs {
        println!("=== {} strategy ===", run.strategy);
        for key in &run.fired {
            println!("fired {}", key);
        }
        match run.halt {
            Halt::Quiescent { cycles } => {
                println!("halted after {} cycles, no applicable rules", cycles)
            }
            Halt::StepLimit { limit } => println!("halted, step limit {} exceeded", limit),
        }
        println!("final working memory:");
        for fact in &run.memory {
            println!("  {}", fact);
        }
        println!();
    }
    for explanation in &result.explanations {
        println!("{}", explanation);
        println!();
    }
    for listing in &result.listings {
        for fact in listing {
            println!("{}", fact);
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    if let Err(e) = run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
