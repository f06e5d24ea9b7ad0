//! Ask command - one question to the agent.

use anyhow::{Context as _, Result, bail};
use clap::Args;
use console::Style;
use copilot_client::{CopilotClient, collect_answer};
use copilot_config::ConnectionSettings;

use super::Context;

/// Question asked when none is given.
pub const DEFAULT_QUESTION: &str = "How much is the Adventure Dining Table?";

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to send
    #[arg(default_value = DEFAULT_QUESTION)]
    pub question: String,

    /// Fail unless the answer contains this text
    #[arg(short, long)]
    pub expect: Option<String>,

    /// Use the service-to-service (client credentials) flow
    #[arg(long)]
    pub s2s: bool,
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let resolver = ctx.resolver();
    let settings = if args.s2s {
        ConnectionSettings::from_resolver_with_flow(&resolver, true)
    } else {
        ConnectionSettings::from_resolver(&resolver)
    }
    .context("Invalid connection settings")?;

    let dim = Style::new().dim();
    if ctx.verbose {
        eprintln!("{}", dim.apply_to(format!("Agent: {}", settings.schema_name)));
        eprintln!("{}", dim.apply_to(format!("Flow: {}", settings.auth.name())));
        eprintln!("{}", dim.apply_to(format!("Cloud: {}", settings.cloud)));
    }

    let client = CopilotClient::connect(settings)?;

    let greeting = collect_answer(client.start_conversation().await?).await?;
    if ctx.verbose && !greeting.is_empty() {
        eprintln!("{}", dim.apply_to(format!("Greeting: {}", greeting)));
    }

    let answer = collect_answer(client.ask_question(args.question.as_str()).await?).await?;
    let matched = args.expect.as_deref().map(|expected| answer.contains(expected));

    if ctx.json_output {
        let output = serde_json::json!({
            "conversation_id": client.conversation_id(),
            "question": args.question.as_str(),
            "answer": answer.as_str(),
            "expected": args.expect.as_deref(),
            "matched": matched,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", answer);
    }

    if let (Some(expected), Some(false)) = (&args.expect, matched) {
        let red = Style::new().red();
        eprintln!(
            "{} answer does not contain {:?}",
            red.apply_to("Mismatch:"),
            expected
        );
        bail!("answer does not contain {:?}", expected);
    }

    Ok(())
}
