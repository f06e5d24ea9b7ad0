//! Addressing for Power Platform environments.
//!
//! A Copilot Studio agent is reached through its environment's API host:
//!
//! ```text
//! https://<prefix>.<suffix>.environment.<api-suffix>/copilotstudio/<catalog>/authenticated/bots/<schema>/conversations
//! ```
//!
//! where `<prefix>`/`<suffix>` come from the environment id with dashes
//! removed, split so the cloud's suffix length lands in `<suffix>`.

use url::Url;

use crate::error::{ConfigError, Result};
use crate::keys;
use crate::settings::ConnectionSettings;

/// API version sent with every conversation request.
pub const API_VERSION: &str = "2022-03-01-preview";

/// Power Platform API host for the settings' cloud.
///
/// The `Other` cloud takes its host from the configured service endpoint.
pub fn api_host(settings: &ConnectionSettings) -> Result<String> {
    match settings.cloud.api_suffix() {
        Some(suffix) => Ok(suffix.to_string()),
        None => settings
            .endpoint
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ConfigError::invalid(keys::ENDPOINT, settings.endpoint.as_str(), "URL has no host")
            }),
    }
}

/// The single OAuth scope for the agent API.
pub fn scope_from_settings(settings: &ConnectionSettings) -> Result<String> {
    Ok(format!("https://{}/.default", api_host(settings)?))
}

/// Host name for an environment id in the settings' cloud.
pub fn environment_host(settings: &ConnectionSettings) -> Result<String> {
    let normalized: String = settings
        .environment_id
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| *c != '-')
        .collect();

    let invalid = |reason: &str| ConfigError::invalid(keys::ENVIRONMENT_ID, &settings.environment_id, reason);

    if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid("environment id must be alphanumeric"));
    }

    let suffix_len = settings.cloud.id_suffix_length();
    if normalized.len() <= suffix_len {
        return Err(invalid("environment id is too short"));
    }

    let (prefix, suffix) = normalized.split_at(normalized.len() - suffix_len);
    Ok(format!(
        "{}.{}.environment.{}",
        prefix,
        suffix,
        api_host(settings)?
    ))
}

/// URL for starting a conversation, or for a turn within `conversation_id`.
pub fn connection_url(settings: &ConnectionSettings, conversation_id: Option<&str>) -> Result<Url> {
    let mut url = match &settings.direct_connect_url {
        Some(base) => base.clone(),
        None => Url::parse(&format!("https://{}/", environment_host(settings)?))?,
    };

    {
        let not_a_base = || ConfigError::invalid(keys::DIRECT_CONNECT_URL, url_string(settings), "URL cannot be a base");
        let mut segments = url.path_segments_mut().map_err(|_| not_a_base())?;
        segments.pop_if_empty();
        if settings.direct_connect_url.is_none() {
            segments.extend([
                "copilotstudio",
                settings.agent_type.path_segment(),
                "authenticated",
                "bots",
                settings.schema_name.as_str(),
            ]);
        }
    }

    let ends_with_conversations = url
        .path_segments()
        .and_then(|mut s| s.next_back())
        .is_some_and(|last| last.eq_ignore_ascii_case("conversations"));

    if let Ok(mut segments) = url.path_segments_mut() {
        if !ends_with_conversations {
            segments.push("conversations");
        }
        if let Some(id) = conversation_id {
            segments.push(id);
        }
    }

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "api-version")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair("api-version", API_VERSION);

    Ok(url)
}

fn url_string(settings: &ConnectionSettings) -> String {
    settings
        .direct_connect_url
        .as_ref()
        .map(|u| u.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::{AgentType, PowerPlatformCloud};

    fn settings(cloud: PowerPlatformCloud) -> ConnectionSettings {
        ConnectionSettings::builder()
            .environment_id("A1B2C3D4-0000-1111-2222-333344445555")
            .schema_name("crf6d_aiSearchConnectionExample")
            .tenant_id("tenant")
            .username("u")
            .password("p")
            .cloud(cloud)
            .build()
            .unwrap()
    }

    #[test]
    fn test_scope_for_prod() {
        assert_eq!(
            scope_from_settings(&settings(PowerPlatformCloud::Prod)).unwrap(),
            "https://api.powerplatform.com/.default"
        );
    }

    #[test]
    fn test_scope_for_other_uses_endpoint_host() {
        let mut s = settings(PowerPlatformCloud::Other);
        s.endpoint = Url::parse("https://api.custom.example.com").unwrap();
        assert_eq!(
            scope_from_settings(&s).unwrap(),
            "https://api.custom.example.com/.default"
        );
    }

    #[test]
    fn test_environment_host_prod_splits_two() {
        assert_eq!(
            environment_host(&settings(PowerPlatformCloud::Prod)).unwrap(),
            "a1b2c3d40000111122223333444455.55.environment.api.powerplatform.com"
        );
    }

    #[test]
    fn test_environment_host_gov_splits_one() {
        assert_eq!(
            environment_host(&settings(PowerPlatformCloud::Gov)).unwrap(),
            "a1b2c3d400001111222233334444555.5.environment.api.gov.powerplatform.microsoftonline.us"
        );
    }

    #[test]
    fn test_environment_host_rejects_short_or_odd_ids() {
        let mut s = settings(PowerPlatformCloud::Prod);
        s.environment_id = "ab".to_string();
        assert!(environment_host(&s).is_err());

        s.environment_id = "abc.def".to_string();
        assert!(environment_host(&s).is_err());
    }

    #[test]
    fn test_connection_url_start_and_turn() {
        let s = settings(PowerPlatformCloud::Prod);
        let start = connection_url(&s, None).unwrap();
        assert_eq!(
            start.as_str(),
            "https://a1b2c3d40000111122223333444455.55.environment.api.powerplatform.com/copilotstudio/dataverse-backed/authenticated/bots/crf6d_aiSearchConnectionExample/conversations?api-version=2022-03-01-preview"
        );

        let turn = connection_url(&s, Some("conv-1")).unwrap();
        assert!(turn.path().ends_with("/conversations/conv-1"));
        assert_eq!(turn.query(), Some("api-version=2022-03-01-preview"));
    }

    #[test]
    fn test_connection_url_prebuilt() {
        let mut s = settings(PowerPlatformCloud::Prod);
        s.agent_type = AgentType::Prebuilt;
        let url = connection_url(&s, None).unwrap();
        assert!(url.path().starts_with("/copilotstudio/prebuilt/authenticated/bots/"));
    }

    #[test]
    fn test_connection_url_direct_connect() {
        let mut s = settings(PowerPlatformCloud::Prod);
        s.direct_connect_url =
            Some(Url::parse("http://127.0.0.1:9000/bots/agent/?api-version=old&x=1").unwrap());

        let url = connection_url(&s, Some("c-9")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9000/bots/agent/conversations/c-9?x=1&api-version=2022-03-01-preview"
        );
    }

    #[test]
    fn test_connection_url_direct_connect_already_pointing_at_conversations() {
        let mut s = settings(PowerPlatformCloud::Prod);
        s.direct_connect_url = Some(Url::parse("https://example.test/bots/a/conversations").unwrap());
        let url = connection_url(&s, None).unwrap();
        assert_eq!(url.path(), "/bots/a/conversations");
    }
}
