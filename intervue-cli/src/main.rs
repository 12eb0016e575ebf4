use std::path::{Path, PathBuf};

use anyhow::Context;
use intervue_appcore::service::{AppService, EvaluationReport};
use intervue_core::proctoring::{Frame, ProctoringVerdict};
use intervue_core::timer::format_elapsed;
use intervue_core::types::{Role, Stage};
use intervue_engine::actor::SessionHandle;
use intervue_engine::session::SessionSnapshot;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

const CONFIG_ENV: &str = "INTERVUE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "intervue.json";

const HELP: &str = "\
Commands:
  /camera on|off          start or stop the camera stream
  /frame <path>           feed one camera frame (every 10th is classified)
  /verdict <people> [phone]
                          inject a proctoring verdict directly
  /status                 stage, timer and warnings
  /submit                 submit a finished interview for grading
  /quit                   leave
Anything else is sent as your answer.";

const KEY_USAGE: &str = "usage: intervue key status | clear | set-llm <key> | set-detector <key>";

type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, PartialEq, Eq)]
enum KeyCommand {
    Status,
    Clear,
    SetLlm(String),
    SetDetector(String),
}

/// `None` when the arguments are not a `key` subcommand.
fn parse_key_command(args: &[String]) -> anyhow::Result<Option<KeyCommand>> {
    let mut args = args.iter().map(String::as_str);
    if args.next() != Some("key") {
        return Ok(None);
    }
    let cmd = match (args.next(), args.next()) {
        (Some("status"), None) => KeyCommand::Status,
        (Some("clear"), None) => KeyCommand::Clear,
        (Some("set-llm"), Some(v)) if !v.trim().is_empty() => KeyCommand::SetLlm(v.to_string()),
        (Some("set-detector"), Some(v)) if !v.trim().is_empty() => {
            KeyCommand::SetDetector(v.to_string())
        }
        _ => anyhow::bail!(KEY_USAGE),
    };
    Ok(Some(cmd))
}

fn run_key_command(cmd: KeyCommand) -> anyhow::Result<()> {
    match cmd {
        KeyCommand::Status => {
            let present = |p: bool| if p { "stored" } else { "missing" };
            println!(
                "LLM API key: {}",
                present(AppService::get_llm_api_key_present()?)
            );
            println!(
                "Detector API key: {}",
                present(AppService::get_detector_api_key_present()?)
            );
        }
        KeyCommand::Clear => {
            AppService::clear_api_keys()?;
            println!("Cleared stored API keys.");
        }
        KeyCommand::SetLlm(v) => {
            AppService::set_llm_api_key(&v)?;
            println!("Stored LLM API key.");
        }
        KeyCommand::SetDetector(v) => {
            AppService::set_detector_api_key(&v)?;
            println!("Stored detector API key.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some(cmd) = parse_key_command(&args)? {
        return run_key_command(cmd);
    }

    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let svc = AppService::from_config_path(config_path.clone())
        .with_context(|| format!("start from config {}", config_path.display()))?;
    log::info!("using config {}", config_path.display());
    if svc.config().mock_oracles {
        println!("Running in MOCK mode. AI responses are placeholders.");
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let candidate = loop {
        let Some(user_id) = prompt(&mut input, "User ID: ").await? else {
            return Ok(());
        };
        let Some(secret) = prompt(&mut input, "Password: ").await? else {
            return Ok(());
        };
        match svc.login(&user_id, &secret).await {
            Ok(c) => break c,
            Err(e) => println!("{e}"),
        }
    };
    println!("Welcome, {}! ({})", candidate.name, candidate.email);
    println!("{HELP}");

    let handle = svc.start_interview(candidate).await?;
    let mut printed = 0;
    let snap = handle.snapshot().await?;
    print_new_messages(&snap, &mut printed);
    println!("Turn the camera on (/camera on) to answer.");

    while let Some(line) = prompt(&mut input, "> ").await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match run_command(&svc, &handle, line).await {
            Ok(Outcome::Snapshot(snap)) => {
                print_new_messages(&snap, &mut printed);
                print_stage_notice(&snap);
            }
            Ok(Outcome::Report(report)) => {
                print_report(&report);
                break;
            }
            Ok(Outcome::Nothing) => {}
            Ok(Outcome::Quit) => break,
            Err(e) => println!("error: {e:#}"),
        }
    }

    Ok(())
}

enum Outcome {
    Snapshot(SessionSnapshot),
    Report(EvaluationReport),
    Nothing,
    Quit,
}

async fn run_command(
    svc: &AppService,
    handle: &SessionHandle,
    line: &str,
) -> anyhow::Result<Outcome> {
    if !line.starts_with('/') {
        return Ok(Outcome::Snapshot(handle.submit_answer(line).await?));
    }

    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or_default();
    match cmd {
        "/camera" => {
            let playing = match parts.next() {
                Some("on") => true,
                Some("off") => false,
                _ => anyhow::bail!("usage: /camera on|off"),
            };
            Ok(Outcome::Snapshot(handle.on_camera_state(playing).await?))
        }
        "/frame" => {
            let path = parts.next().context("usage: /frame <path>")?;
            let frame = read_frame(Path::new(path)).await?;
            match handle.on_frame(&frame).await? {
                Some(snap) => Ok(Outcome::Snapshot(snap)),
                None => {
                    println!("(frame not classified)");
                    Ok(Outcome::Nothing)
                }
            }
        }
        "/verdict" => {
            let person_count: u32 = parts
                .next()
                .context("usage: /verdict <people> [phone]")?
                .parse()
                .context("people must be a number")?;
            let phone_detected = parts.next() == Some("phone");
            let verdict = ProctoringVerdict {
                person_count,
                phone_detected,
            };
            Ok(Outcome::Snapshot(handle.on_frame_verdict(verdict).await?))
        }
        "/status" => {
            let snap = handle.snapshot().await?;
            println!(
                "stage={} time={} question={}/{} warnings={}/{} proctor=\"{}\" camera={}",
                snap.stage,
                format_elapsed(snap.elapsed_secs),
                (snap.question_index + 1).min(snap.total_questions),
                snap.total_questions,
                snap.warning_count,
                snap.max_warnings,
                snap.proctor_status.message(),
                if snap.camera_active { "on" } else { "off" },
            );
            Ok(Outcome::Nothing)
        }
        "/submit" => Ok(Outcome::Report(svc.submit_for_grading(handle).await?)),
        "/quit" => Ok(Outcome::Quit),
        "/help" => {
            println!("{HELP}");
            Ok(Outcome::Nothing)
        }
        other => anyhow::bail!("unknown command {other}; try /help"),
    }
}

async fn prompt(input: &mut Input, label: &str) -> anyhow::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?)
}

async fn read_frame(path: &Path) -> anyhow::Result<Frame> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read frame {}", path.display()))?;
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    Ok(Frame::new(mime, bytes))
}

fn print_new_messages(snap: &SessionSnapshot, printed: &mut usize) {
    for msg in snap.messages.iter().skip(*printed) {
        if msg.role == Role::Assistant {
            println!("\nAlex: {}\n", msg.content);
        }
    }
    *printed = snap.messages.len();
}

fn print_stage_notice(snap: &SessionSnapshot) {
    if snap.proctor_status.is_violation() {
        println!(
            "{} ({}/{})",
            snap.proctor_status.message(),
            snap.warning_count,
            snap.max_warnings
        );
    }
    match snap.stage {
        Stage::InterviewComplete => println!("Interview complete. Type /submit to see your evaluation."),
        Stage::Terminated => println!(
            "Interview terminated after {} proctoring warnings.",
            snap.warning_count
        ),
        Stage::TerminatedCamera => {
            println!("Interview terminated: the camera was turned off during the interview.")
        }
        _ if !snap.camera_active && snap.stage.is_running() => {
            println!("Camera is off; answers are disabled until it is on.")
        }
        _ => {}
    }
}

fn print_report(report: &EvaluationReport) {
    println!("\n=== Evaluation ===");
    if report.is_empty() {
        println!("{}", report.narrative);
        return;
    }

    println!(
        "Score: {}/{} ({:.1}%)   Warnings: {}",
        report.summary.total_score,
        report.summary.max_score,
        report.summary.final_percentage,
        report.warning_count
    );
    if let Some(id) = report.result_id {
        println!("Saved as result #{id}");
    }
    println!("\n{}\n", report.narrative);
    for row in &report.rows {
        println!(
            "Q{} [{}] {}/5 ({:?}): {}",
            row.number, row.topic, row.score, row.band, row.feedback
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn key_subcommands_parse() {
        assert_eq!(parse_key_command(&args(&[])).unwrap(), None);
        assert_eq!(
            parse_key_command(&args(&["key", "status"])).unwrap(),
            Some(KeyCommand::Status)
        );
        assert_eq!(
            parse_key_command(&args(&["key", "clear"])).unwrap(),
            Some(KeyCommand::Clear)
        );
        assert_eq!(
            parse_key_command(&args(&["key", "set-llm", "sk-1"])).unwrap(),
            Some(KeyCommand::SetLlm("sk-1".into()))
        );
        assert_eq!(
            parse_key_command(&args(&["key", "set-detector", "det"])).unwrap(),
            Some(KeyCommand::SetDetector("det".into()))
        );
    }

    #[test]
    fn malformed_key_subcommands_are_rejected() {
        assert!(parse_key_command(&args(&["key"])).is_err());
        assert!(parse_key_command(&args(&["key", "set-llm"])).is_err());
        assert!(parse_key_command(&args(&["key", "set-llm", " "])).is_err());
        assert!(parse_key_command(&args(&["key", "status", "extra"])).is_err());
    }
}
