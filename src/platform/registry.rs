use thiserror::Error;
use tracing::debug;

use crate::platform::descriptor::PlatformDescriptor;

const BUILTIN_PLATFORMS: &str = include_str!("platforms.yaml");

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid platform registry YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("platform '{0}' declares no URL strategies")]
    NoUrlStrategies(String),

    #[error("platform '{0}' declares no hostnames")]
    NoHostnames(String),

    #[error("platform '{id}' has an invalid base_url '{base_url}': {source}")]
    BaseUrl {
        id: String,
        base_url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Immutable lookup table of supported platforms, kept in declaration order.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    platforms: Vec<PlatformDescriptor>,
}

impl PlatformRegistry {
    /// The descriptors shipped with the crate.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_yaml(BUILTIN_PLATFORMS)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, RegistryError> {
        let platforms: Vec<PlatformDescriptor> = serde_yaml::from_str(yaml)?;
        Self::new(platforms)
    }

    pub fn new(platforms: Vec<PlatformDescriptor>) -> Result<Self, RegistryError> {
        for platform in &platforms {
            validate(platform)?;
        }
        Ok(Self { platforms })
    }

    /// Replace built-ins that share an id with an override, append the rest.
    pub fn with_overrides(mut self, extra: Vec<PlatformDescriptor>) -> Result<Self, RegistryError> {
        for descriptor in extra {
            validate(&descriptor)?;
            match self.platforms.iter_mut().find(|p| p.id == descriptor.id) {
                Some(existing) => {
                    debug!(platform = %descriptor.id, "overriding built-in platform descriptor");
                    *existing = descriptor;
                }
                None => {
                    debug!(platform = %descriptor.id, "registering additional platform descriptor");
                    self.platforms.push(descriptor);
                }
            }
        }
        Ok(self)
    }

    pub fn get(&self, id: &str) -> Option<&PlatformDescriptor> {
        self.platforms.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlatformDescriptor> {
        self.platforms.iter()
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

fn validate(platform: &PlatformDescriptor) -> Result<(), RegistryError> {
    if platform.url_strategies.is_empty() {
        return Err(RegistryError::NoUrlStrategies(platform.id.clone()));
    }
    if platform.hostnames.is_empty() {
        return Err(RegistryError::NoHostnames(platform.id.clone()));
    }
    url::Url::parse(&platform.base_url).map_err(|source| RegistryError::BaseUrl {
        id: platform.id.clone(),
        base_url: platform.base_url.clone(),
        source,
    })?;
    Ok(())
}
