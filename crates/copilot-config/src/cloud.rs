//! Power Platform clouds and agent types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A Power Platform cloud (sovereign or internal ring).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerPlatformCloud {
    #[default]
    Prod,
    Preprod,
    Test,
    Dev,
    Exp,
    Prv,
    Local,
    FirstRelease,
    Gov,
    GovFR,
    High,
    DoD,
    Mooncake,
    Ex,
    Rx,
    /// A cloud addressed by a custom base address.
    Other,
}

impl PowerPlatformCloud {
    /// All known clouds.
    pub const ALL: [PowerPlatformCloud; 16] = [
        Self::Prod,
        Self::Preprod,
        Self::Test,
        Self::Dev,
        Self::Exp,
        Self::Prv,
        Self::Local,
        Self::FirstRelease,
        Self::Gov,
        Self::GovFR,
        Self::High,
        Self::DoD,
        Self::Mooncake,
        Self::Ex,
        Self::Rx,
        Self::Other,
    ];

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prod => "Prod",
            Self::Preprod => "Preprod",
            Self::Test => "Test",
            Self::Dev => "Dev",
            Self::Exp => "Exp",
            Self::Prv => "Prv",
            Self::Local => "Local",
            Self::FirstRelease => "FirstRelease",
            Self::Gov => "Gov",
            Self::GovFR => "GovFR",
            Self::High => "High",
            Self::DoD => "DoD",
            Self::Mooncake => "Mooncake",
            Self::Ex => "Ex",
            Self::Rx => "Rx",
            Self::Other => "Other",
        }
    }

    /// Power Platform API host suffix, or `None` for [`Self::Other`].
    pub fn api_suffix(&self) -> Option<&'static str> {
        let suffix = match self {
            Self::Local => "api.powerplatform.localhost",
            Self::Exp => "api.exp.powerplatform.com",
            Self::Dev => "api.dev.powerplatform.com",
            Self::Prv => "api.prv.powerplatform.com",
            Self::Test => "api.test.powerplatform.com",
            Self::Preprod => "api.preprod.powerplatform.com",
            Self::FirstRelease | Self::Prod => "api.powerplatform.com",
            Self::GovFR | Self::Gov => "api.gov.powerplatform.microsoftonline.us",
            Self::High => "api.high.powerplatform.microsoftonline.us",
            Self::DoD => "api.appsplatform.us",
            Self::Mooncake => "api.powerplatform.partner.microsoftonline.cn",
            Self::Ex => "api.powerplatform.eaglex.ic.gov",
            Self::Rx => "api.powerplatform.microsoft.scloud",
            Self::Other => return None,
        };
        Some(suffix)
    }

    /// Number of trailing environment-id characters that form the host label
    /// after the prefix.
    pub fn id_suffix_length(&self) -> usize {
        match self {
            Self::FirstRelease | Self::Prod => 2,
            _ => 1,
        }
    }

    /// Entra ID authority host for this cloud.
    pub fn authority_host(&self) -> &'static str {
        match self {
            Self::Gov | Self::GovFR | Self::High | Self::DoD => "https://login.microsoftonline.us",
            Self::Mooncake => "https://login.chinacloudapi.cn",
            _ => "https://login.microsoftonline.com",
        }
    }
}

impl std::fmt::Display for PowerPlatformCloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerPlatformCloud {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|cloud| cloud.as_str().eq_ignore_ascii_case(s))
            .or_else(|| match s.to_ascii_lowercase().as_str() {
                "public" | "production" => Some(Self::Prod),
                "gcc" => Some(Self::Gov),
                "gcchigh" => Some(Self::High),
                _ => None,
            })
            .ok_or_else(|| format!("unknown cloud '{}'", s))
    }
}

/// Which catalog an agent is published under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentType {
    /// An agent built and published in Copilot Studio.
    #[default]
    Published,
    /// A Microsoft-provided prebuilt agent.
    Prebuilt,
}

impl AgentType {
    /// Path segment used in connection URLs.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Published => "dataverse-backed",
            Self::Prebuilt => "prebuilt",
        }
    }
}

impl FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "published" => Ok(Self::Published),
            "prebuilt" => Ok(Self::Prebuilt),
            other => Err(format!("unknown agent type '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("prod".parse::<PowerPlatformCloud>().unwrap(), PowerPlatformCloud::Prod);
        assert_eq!("GOVFR".parse::<PowerPlatformCloud>().unwrap(), PowerPlatformCloud::GovFR);
        assert_eq!(" Mooncake ".parse::<PowerPlatformCloud>().unwrap(), PowerPlatformCloud::Mooncake);
        assert_eq!("public".parse::<PowerPlatformCloud>().unwrap(), PowerPlatformCloud::Prod);
        assert!("mars".parse::<PowerPlatformCloud>().is_err());
    }

    #[test]
    fn test_display_round_trips_for_every_cloud() {
        for cloud in PowerPlatformCloud::ALL {
            assert_eq!(cloud.to_string().parse::<PowerPlatformCloud>().unwrap(), cloud);
        }
    }

    #[test]
    fn test_suffix_lengths() {
        assert_eq!(PowerPlatformCloud::Prod.id_suffix_length(), 2);
        assert_eq!(PowerPlatformCloud::FirstRelease.id_suffix_length(), 2);
        assert_eq!(PowerPlatformCloud::Gov.id_suffix_length(), 1);
        assert_eq!(PowerPlatformCloud::Test.id_suffix_length(), 1);
    }

    #[test]
    fn test_api_suffix_and_authority() {
        assert_eq!(
            PowerPlatformCloud::Prod.api_suffix(),
            Some("api.powerplatform.com")
        );
        assert_eq!(PowerPlatformCloud::Other.api_suffix(), None);
        assert_eq!(
            PowerPlatformCloud::Prod.authority_host(),
            "https://login.microsoftonline.com"
        );
        assert_eq!(
            PowerPlatformCloud::High.authority_host(),
            "https://login.microsoftonline.us"
        );
    }

    #[test]
    fn test_agent_type() {
        assert_eq!("Prebuilt".parse::<AgentType>().unwrap(), AgentType::Prebuilt);
        assert_eq!(AgentType::default().path_segment(), "dataverse-backed");
        assert!("custom".parse::<AgentType>().is_err());
    }
}
