//! Provider catalog: which environment variable each service uses and how
//! to probe it.
//!
//! Built-in descriptors are compiled in. User descriptors live in
//! `services.toml` under the config root and win by `name`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use serde::{Deserialize, Serialize};

use crate::core::config::Config;
use crate::core::constants::COMPANION_KEYS;
use crate::core::perms;
use crate::core::validation::validate_key;
use crate::error::{CatalogError, Error, IoContext, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum AuthMethod {
    Bearer,
    Basic,
    ApiKey,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuthLocation {
    Header,
    Query,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// A service the catalog knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    pub name: String,
    pub key_name: String,
    /// Other variable names accepted for the same credential.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub test_endpoint: String,
    #[serde(default = "default_method")]
    pub test_method: HttpMethod,
    #[serde(default = "default_auth_method")]
    pub auth_method: AuthMethod,
    #[serde(default = "default_auth_location")]
    pub auth_location: AuthLocation,
    #[serde(default = "default_auth_parameter")]
    pub auth_parameter: String,
    #[serde(default)]
    pub auth_prefix: String,
    #[serde(default)]
    pub test_body: String,
    #[serde(default)]
    pub testable: bool,
    /// Extra request headers. Kept last so TOML emits it as a sub-table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(skip)]
    pub is_built_in: bool,
}

fn default_method() -> HttpMethod {
    HttpMethod::Get
}

fn default_auth_method() -> AuthMethod {
    AuthMethod::Bearer
}

fn default_auth_location() -> AuthLocation {
    AuthLocation::Header
}

fn default_auth_parameter() -> String {
    "Authorization".to_string()
}

impl ServiceDescriptor {
    /// An untestable descriptor; chain the builders below to make it probe.
    pub fn new(name: &str, key_name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            key_name: key_name.to_string(),
            aliases: Vec::new(),
            description: description.to_string(),
            test_endpoint: String::new(),
            test_method: HttpMethod::Get,
            headers: BTreeMap::new(),
            auth_method: AuthMethod::Bearer,
            auth_location: AuthLocation::Header,
            auth_parameter: default_auth_parameter(),
            auth_prefix: String::new(),
            test_body: String::new(),
            testable: false,
            is_built_in: false,
        }
    }

    fn get(mut self, url: &str) -> Self {
        self.test_method = HttpMethod::Get;
        self.test_endpoint = url.to_string();
        self.testable = true;
        self
    }

    fn post(mut self, url: &str, body: &str) -> Self {
        self.test_method = HttpMethod::Post;
        self.test_endpoint = url.to_string();
        self.test_body = body.to_string();
        self.testable = true;
        self
    }

    fn bearer(self) -> Self {
        self.header_auth("Authorization", "Bearer ")
    }

    fn header_auth(mut self, parameter: &str, prefix: &str) -> Self {
        self.auth_method = if parameter == "Authorization" {
            AuthMethod::Bearer
        } else {
            AuthMethod::ApiKey
        };
        self.auth_location = AuthLocation::Header;
        self.auth_parameter = parameter.to_string();
        self.auth_prefix = prefix.to_string();
        self
    }

    fn query_auth(mut self, parameter: &str) -> Self {
        self.auth_method = AuthMethod::ApiKey;
        self.auth_location = AuthLocation::Query;
        self.auth_parameter = parameter.to_string();
        self.auth_prefix = String::new();
        self
    }

    fn body_auth(mut self) -> Self {
        self.auth_method = AuthMethod::Custom;
        self.auth_location = AuthLocation::Body;
        self.auth_parameter = String::new();
        self
    }

    fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    fn aliases(mut self, names: &[&str]) -> Self {
        self.aliases = names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// `keyName` followed by aliases.
    pub fn key_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.key_name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Testable and has somewhere to send the probe.
    pub fn can_test(&self) -> bool {
        self.testable && !self.test_endpoint.is_empty()
    }
}

/// Compiled-in descriptors.
pub fn builtins() -> Vec<ServiceDescriptor> {
    use ServiceDescriptor as S;

    let bearer_get =
        |name: &str, key: &str, desc: &str, url: &str| S::new(name, key, desc).get(url).bearer();

    let mut all = vec![
        // AI providers
        bearer_get("openai", "OPENAI_API_KEY", "OpenAI", "https://api.openai.com/v1/models"),
        S::new("anthropic", "ANTHROPIC_API_KEY", "Anthropic Claude")
            .get("https://api.anthropic.com/v1/models")
            .header_auth("x-api-key", "")
            .header("anthropic-version", "2023-06-01"),
        S::new("gemini", "GEMINI_API_KEY", "Google Gemini")
            .get("https://generativelanguage.googleapis.com/v1beta/models")
            .query_auth("key")
            .aliases(&[
                "GOOGLE_API_KEY",
                "GOOGLE_GENERATIVE_AI_API_KEY",
                "GOOGLE_AI_API_KEY",
                "GOOGLE_CLOUD_API_KEY",
            ]),
        bearer_get("groq", "GROQ_API_KEY", "Groq", "https://api.groq.com/openai/v1/models"),
        bearer_get("mistral", "MISTRAL_API_KEY", "Mistral AI", "https://api.mistral.ai/v1/models"),
        bearer_get("cohere", "COHERE_API_KEY", "Cohere", "https://api.cohere.ai/v1/models"),
        S::new("perplexity", "PERPLEXITY_API_KEY", "Perplexity")
            .post(
                "https://api.perplexity.ai/chat/completions",
                r#"{"model":"sonar","messages":[{"role":"user","content":"ping"}],"max_tokens":1}"#,
            )
            .bearer(),
        bearer_get("together", "TOGETHER_API_KEY", "Together AI", "https://api.together.xyz/v1/models"),
        bearer_get("xai", "XAI_API_KEY", "xAI Grok", "https://api.x.ai/v1/models"),
        bearer_get("openrouter", "OPENROUTER_API_KEY", "OpenRouter", "https://openrouter.ai/api/v1/auth/key"),
        bearer_get("deepseek", "DEEPSEEK_API_KEY", "DeepSeek", "https://api.deepseek.com/models"),
        bearer_get(
            "fireworks",
            "FIREWORKS_API_KEY",
            "Fireworks AI",
            "https://api.fireworks.ai/inference/v1/models",
        ),
        bearer_get("sambanova", "SAMBANOVA_API_KEY", "SambaNova", "https://api.sambanova.ai/v1/models"),
        bearer_get(
            "huggingface",
            "HUGGINGFACE_TOKEN",
            "Hugging Face",
            "https://huggingface.co/api/whoami-v2",
        ),
        S::new("tavily", "TAVILY_API_KEY", "Tavily search")
            .post(
                "https://api.tavily.com/search",
                r#"{"api_key":"{credential}","query":"ping","max_results":1}"#,
            )
            .body_auth(),
        S::new("exa", "EXA_API_KEY", "Exa search")
            .post("https://api.exa.ai/search", r#"{"query":"ping","numResults":1}"#)
            .header_auth("x-api-key", ""),
        S::new("brave", "BRAVE_API_KEY", "Brave search")
            .get("https://api.search.brave.com/res/v1/web/search?q=ping")
            .header_auth("X-Subscription-Token", ""),
        S::new("azure_openai", "AZURE_OPENAI_API_KEY", "Azure OpenAI"),
        // Cloud credentials
        S::new("aws", "AWS_ACCESS_KEY_ID", "Amazon Web Services"),
        S::new("gcp", "GOOGLE_APPLICATION_CREDENTIALS", "Google Cloud"),
        S::new("azure", "AZURE_CLIENT_ID", "Microsoft Azure"),
        bearer_get("github", "GITHUB_TOKEN", "GitHub", "https://api.github.com/user"),
        // Infrastructure
        S::new("docker", "DOCKER_AUTH_TOKEN", "Docker registry"),
        S::new("mongodb", "MONGODB_URI", "MongoDB"),
        S::new("postgres", "DATABASE_URL", "PostgreSQL"),
        S::new("redis", "REDIS_URL", "Redis"),
        bearer_get("stripe", "STRIPE_SECRET_KEY", "Stripe", "https://api.stripe.com/v1/balance"),
        bearer_get("sendgrid", "SENDGRID_API_KEY", "SendGrid", "https://api.sendgrid.com/v3/scopes"),
        S::new("twilio", "TWILIO_AUTH_TOKEN", "Twilio"),
        bearer_get("slack", "SLACK_API_TOKEN", "Slack", "https://slack.com/api/auth.test"),
        S::new("discord", "DISCORD_TOKEN", "Discord bot")
            .get("https://discord.com/api/v10/users/@me")
            .header_auth("Authorization", "Bot "),
        bearer_get("vercel", "VERCEL_TOKEN", "Vercel", "https://api.vercel.com/v2/user"),
        bearer_get("netlify", "NETLIFY_AUTH_TOKEN", "Netlify", "https://api.netlify.com/api/v1/user"),
    ];

    for d in &mut all {
        d.is_built_in = true;
    }
    all
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserCatalogFile {
    #[serde(default, rename = "service")]
    services: Vec<ServiceDescriptor>,
}

/// Built-ins merged with the user's catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    services: BTreeMap<String, ServiceDescriptor>,
}

impl Catalog {
    /// Load built-ins and overlay `services.toml` if present.
    pub fn load(config: &Config) -> Result<Self> {
        let user = read_user(config)?;
        Ok(Self::merge(builtins(), user))
    }

    fn merge(builtin: Vec<ServiceDescriptor>, user: Vec<ServiceDescriptor>) -> Self {
        let mut services = BTreeMap::new();
        for d in builtin.into_iter().chain(user) {
            services.insert(d.name.clone(), d);
        }
        Self { services }
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.get(&name.to_ascii_lowercase())
    }

    pub fn require(&self, name: &str) -> Result<&ServiceDescriptor> {
        self.get(name)
            .ok_or_else(|| CatalogError::UnknownService(name.to_string()).into())
    }

    /// All descriptors sorted by name.
    pub fn all(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.values()
    }

    /// Variable names `import --keys` keeps.
    pub fn known_key_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self
            .all()
            .flat_map(|d| d.key_names().map(str::to_string).collect::<Vec<_>>())
            .collect();
        names.extend(COMPANION_KEYS.iter().map(|s| s.to_string()));
        names
    }
}

fn read_user(config: &Config) -> Result<Vec<ServiceDescriptor>> {
    let path = config.services_path();
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).at(&path),
    };
    let file: UserCatalogFile = toml::from_str(&text).map_err(CatalogError::from)?;
    Ok(file
        .services
        .into_iter()
        .map(|mut d| {
            d.name = d.name.to_ascii_lowercase();
            d.is_built_in = false;
            d
        })
        .collect())
}

fn write_user(config: &Config, services: Vec<ServiceDescriptor>) -> Result<()> {
    let path = config.services_path();
    if let Some(parent) = path.parent() {
        perms::create_private_dir(parent)?;
    }
    let body = toml::to_string_pretty(&UserCatalogFile { services }).map_err(CatalogError::from)?;
    perms::write_private(&path, body.as_bytes())
}

/// Insert or replace a user descriptor. Returns `true` if it replaced one.
pub fn upsert_user(config: &Config, mut descriptor: ServiceDescriptor) -> Result<bool> {
    descriptor.name = descriptor.name.to_ascii_lowercase();
    if descriptor.name.is_empty()
        || !descriptor
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::Usage(format!(
            "invalid service name '{}'",
            descriptor.name
        )));
    }
    validate_key(&descriptor.key_name)?;
    descriptor.is_built_in = false;

    let mut services = read_user(config)?;
    let replaced = match services.iter_mut().find(|d| d.name == descriptor.name) {
        Some(existing) => {
            *existing = descriptor;
            true
        }
        None => {
            services.push(descriptor);
            false
        }
    };
    write_user(config, services)?;
    Ok(replaced)
}

/// Remove a user descriptor. Built-ins cannot be removed; a user entry that
/// shadows a built-in can, which restores the built-in.
pub fn remove_user(config: &Config, name: &str) -> Result<()> {
    let name = name.to_ascii_lowercase();
    let mut services = read_user(config)?;
    let before = services.len();
    services.retain(|d| d.name != name);
    if services.len() == before {
        if builtins().iter().any(|d| d.name == name) {
            return Err(CatalogError::BuiltIn(name).into());
        }
        return Err(CatalogError::UnknownService(name).into());
    }
    write_user(config, services)
}
