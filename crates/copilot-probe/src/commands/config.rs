//! Config command - show resolved settings.

use anyhow::Result;
use clap::Args;
use console::Style;
use copilot_config::{ConfigResolver, ResolvedValue, keys};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print secrets instead of masking them
    #[arg(long)]
    pub show_secrets: bool,
}

/// One row of the settings table.
struct Setting {
    name: &'static str,
    keys: &'static [&'static str],
    default: Option<&'static str>,
    secret: bool,
}

const SETTINGS: &[Setting] = &[
    Setting { name: "tenant", keys: keys::TENANT_ID, default: None, secret: false },
    Setting { name: "client id", keys: keys::APP_CLIENT_ID, default: None, secret: false },
    Setting { name: "client secret", keys: keys::APP_CLIENT_SECRET, default: None, secret: true },
    Setting { name: "username", keys: &[keys::USERNAME], default: None, secret: false },
    Setting { name: "password", keys: &[keys::PASSWORD], default: None, secret: true },
    Setting { name: "environment", keys: &[keys::ENVIRONMENT_ID], default: None, secret: false },
    Setting { name: "agent", keys: &[keys::AGENT_ID], default: Some(keys::DEFAULT_AGENT_ID), secret: false },
    Setting { name: "endpoint", keys: &[keys::ENDPOINT], default: Some(keys::DEFAULT_ENDPOINT), secret: false },
    Setting { name: "cloud", keys: &[keys::CLOUD], default: Some("Prod"), secret: false },
    Setting { name: "use s2s", keys: &[keys::USE_S2S], default: Some("false"), secret: false },
    Setting { name: "agent type", keys: &[keys::AGENT_TYPE], default: Some("Published"), secret: false },
    Setting { name: "direct connect", keys: &[keys::DIRECT_CONNECT_URL], default: None, secret: false },
    Setting { name: "authority", keys: &[keys::AUTHORITY_HOST], default: None, secret: false },
];

fn resolve(resolver: &ConfigResolver, setting: &Setting) -> Option<ResolvedValue> {
    resolver.first_of(setting.keys).or_else(|| {
        setting
            .default
            .map(|default| resolver.resolve_or(setting.keys[0], default))
    })
}

fn shown(setting: &Setting, value: &str, show_secrets: bool) -> String {
    if setting.secret && !show_secrets {
        mask(value)
    } else {
        value.to_string()
    }
}

fn mask(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let resolver = ctx.resolver();

    let rows: Vec<(&Setting, Option<ResolvedValue>)> = SETTINGS
        .iter()
        .map(|setting| (setting, resolve(&resolver, setting)))
        .collect();

    if ctx.json_output {
        let entries: Vec<serde_json::Value> = rows
            .iter()
            .map(|(setting, resolved)| match resolved {
                Some(r) => serde_json::json!({
                    "name": setting.name,
                    "key": r.key,
                    "value": shown(setting, &r.value, args.show_secrets),
                    "source": r.source.to_string(),
                }),
                None => serde_json::json!({
                    "name": setting.name,
                    "key": setting.keys.join(" or "),
                    "value": null,
                    "source": null,
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let bold = Style::new().bold();
    let dim = Style::new().dim();
    let yellow = Style::new().yellow();

    if let Some(dir) = resolver.start_dir() {
        println!("{}", dim.apply_to(format!("Settings store search starts at {}", dir.display())));
        println!();
    }

    for (setting, resolved) in &rows {
        match resolved {
            Some(r) => println!(
                "{:>15}  {}  {}",
                bold.apply_to(setting.name),
                shown(setting, &r.value, args.show_secrets),
                dim.apply_to(format!("({})", r.source)),
            ),
            None => println!(
                "{:>15}  {}",
                bold.apply_to(setting.name),
                yellow.apply_to(format!("not set ({})", setting.keys.join(" or "))),
            ),
        }
    }

    Ok(())
}
