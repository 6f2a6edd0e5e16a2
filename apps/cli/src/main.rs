use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::{FREE_TEXT_PROMPT, QUESTIONS};
use signup_flow::{
    FlowError, FlowEvent, FlowState, HttpSignupStore, SignupFlow, FIXED_STEPS, TOTAL_STEPS,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast;

mod config;

#[derive(Parser, Debug)]
struct Args {
    /// Signup store endpoint; overrides signup.toml and SIGNUP_STORE_URL.
    #[arg(long)]
    store_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(url) = args.store_url {
        settings.store_url = Some(url);
    }
    let store_url = settings
        .store_url
        .context("no signup store configured; pass --store-url or set SIGNUP_STORE_URL")?;
    let store = HttpSignupStore::from_url(&store_url)
        .with_context(|| format!("invalid store url '{store_url}'"))?;

    let flow = SignupFlow::with_timings(
        Arc::new(store),
        Duration::from_secs(settings.submit_timeout_secs),
        Duration::from_millis(settings.thank_you_delay_ms),
    );
    let mut events = flow.subscribe_events();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Join the early access waitlist");
    flow.open().await;

    loop {
        match flow.state().await {
            FlowState::Idle => break,
            FlowState::EmailEntry => {
                if !prompt_email(&flow, &mut lines).await? {
                    break;
                }
            }
            FlowState::Questionnaire { step } if step < FIXED_STEPS => {
                if !prompt_question(&flow, &mut lines, step).await? {
                    break;
                }
            }
            FlowState::Questionnaire { .. } => {
                if !prompt_frustration(&flow, &mut lines).await? {
                    break;
                }
            }
            FlowState::Success => {
                println!();
                println!("Welcome to the waitlist! We'll reach out as soon as we launch.");
                flow.dismiss().await?;
                break;
            }
            FlowState::SubmittingEmail | FlowState::SubmittingAnswers | FlowState::ThankYou => {
                wait_until_settled(&flow, &mut events).await;
            }
        }
    }

    Ok(())
}

/// Returns false when stdin is closed; the flow is cancelled in that case.
async fn prompt_email(flow: &Arc<SignupFlow>, lines: &mut Lines<BufReader<Stdin>>) -> Result<bool> {
    let current = flow.session().await.email;
    let current = current.trim();
    if current.is_empty() {
        print!("Email address: ");
    } else {
        print!("Email address [{current}]: ");
    }
    io::stdout().flush()?;

    let Some(line) = lines.next_line().await? else {
        flow.cancel().await;
        return Ok(false);
    };
    if !line.trim().is_empty() {
        flow.set_email(&line).await?;
    }
    if !flow.submit_email().await? {
        println!("An email address is required to join the waitlist.");
    }
    Ok(true)
}

async fn prompt_question(
    flow: &Arc<SignupFlow>,
    lines: &mut Lines<BufReader<Stdin>>,
    step: usize,
) -> Result<bool> {
    let question = &QUESTIONS[step];
    let labels = question.id.option_labels();
    println!();
    println!("Question {} of {}: {}", step + 1, TOTAL_STEPS, question.prompt);
    for (index, label) in labels.iter().enumerate() {
        println!("  {}) {label}", index + 1);
    }
    print!("Choice (Enter to skip): ");
    io::stdout().flush()?;

    let Some(line) = lines.next_line().await? else {
        flow.cancel().await;
        return Ok(false);
    };
    let choice = line.trim();
    if choice.is_empty() {
        flow.skip().await?;
        return Ok(true);
    }
    match choice.parse::<usize>() {
        Ok(number) if number >= 1 => match flow.select_option(number - 1).await {
            Ok(()) => {
                flow.next().await?;
            }
            Err(FlowError::UnknownOption { .. }) => {
                println!("Pick a number between 1 and {}.", labels.len());
            }
            Err(err) => return Err(err.into()),
        },
        _ => println!("Pick a number between 1 and {}.", labels.len()),
    }
    Ok(true)
}

async fn prompt_frustration(
    flow: &Arc<SignupFlow>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<bool> {
    println!();
    println!("Question {TOTAL_STEPS} of {TOTAL_STEPS}: {FREE_TEXT_PROMPT}");
    print!("Answer (Enter to skip): ");
    io::stdout().flush()?;

    let Some(line) = lines.next_line().await? else {
        flow.cancel().await;
        return Ok(false);
    };
    flow.set_frustration(line.trim()).await?;
    flow.complete().await?;
    Ok(true)
}

#[derive(Debug, PartialEq, Eq)]
enum Notice {
    ThankYou,
    Failure,
}

fn notice_for(event: &FlowEvent) -> Option<Notice> {
    match event {
        FlowEvent::StateChanged(FlowState::ThankYou) => Some(Notice::ThankYou),
        FlowEvent::SubmissionFailed { .. } => Some(Notice::Failure),
        _ => None,
    }
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::ThankYou => {
            println!("Thanks for signing up! A few quick questions while you're here...");
        }
        Notice::Failure => println!("Something went wrong. Please try again."),
    }
}

fn is_busy(state: FlowState) -> bool {
    matches!(
        state,
        FlowState::SubmittingEmail | FlowState::SubmittingAnswers | FlowState::ThankYou
    )
}

/// Follows the event stream while a submission or the thank-you screen is up,
/// printing notices as they arrive. A submission can fail and revert before
/// this is even called, so the stream is read first and checked against the
/// flow state second, and once settled the remaining backlog is drained; the
/// failure notice trails the reverting state change and must never be left
/// unread for a later prompt to surface.
async fn wait_until_settled(
    flow: &Arc<SignupFlow>,
    events: &mut broadcast::Receiver<FlowEvent>,
) -> Vec<Notice> {
    let mut notices = Vec::new();
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(notice) = notice_for(&event) {
                    print_notice(&notice);
                    notices.push(notice);
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return notices,
        }
        if !is_busy(flow.state().await) {
            break;
        }
    }
    while let Ok(event) = events.try_recv() {
        if let Some(notice) = notice_for(&event) {
            print_notice(&notice);
            notices.push(notice);
        }
    }
    notices
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn failure_notice_survives_a_fast_reverting_submission() {
        std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind reserved port");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let store = HttpSignupStore::from_url(&format!("http://{addr}/")).expect("parse url");
        let flow = SignupFlow::with_timings(
            Arc::new(store),
            Duration::from_secs(15),
            Duration::from_millis(1500),
        );
        let mut events = flow.subscribe_events();

        flow.open().await;
        flow.set_email("user@example.com").await.expect("set email");
        assert!(flow.submit_email().await.expect("submit"));

        // Let the refused connection revert the flow before the wait starts,
        // so the notice is only reachable through the event backlog.
        while flow.state().await != FlowState::EmailEntry {
            tokio::task::yield_now().await;
        }

        let notices = wait_until_settled(&flow, &mut events).await;
        assert_eq!(notices, vec![Notice::Failure]);

        // Nothing stale is left behind to print during a later submission.
        assert!(events.try_recv().is_err());
    }
}
