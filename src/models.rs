use serde::{Serialize, Deserialize, Deserializer};
use chrono::{DateTime, Utc};
use std::{fmt, str::FromStr};
use uuid::Uuid;

pub const MIN_IDEA_LEN: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Monetization {
    Subscription,
    OneTime,
    Freemium,
    Marketplace,
    InternalTool,
}

impl Monetization {
    pub const ALL: [Monetization; 5] = [
        Monetization::Subscription,
        Monetization::OneTime,
        Monetization::Freemium,
        Monetization::Marketplace,
        Monetization::InternalTool,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Monetization::Subscription => "subscription",
            Monetization::OneTime => "one-time",
            Monetization::Freemium => "freemium",
            Monetization::Marketplace => "marketplace",
            Monetization::InternalTool => "internal-tool",
        }
    }

    /// Human-readable label used in prompts.
    pub fn label(self) -> &'static str {
        match self {
            Monetization::Subscription => "Subscription (recurring billing)",
            Monetization::OneTime => "One-time purchase",
            Monetization::Freemium => "Freemium (free tier with paid upgrades)",
            Monetization::Marketplace => "Marketplace (commission on transactions)",
            Monetization::InternalTool => "Internal tool (no direct monetization)",
        }
    }
}

impl fmt::Display for Monetization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Monetization {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Monetization::ALL.into_iter().find(|m| m.as_str() == s).ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantType {
    Single,
    Multi,
}

impl TenantType {
    pub fn as_str(self) -> &'static str {
        match self { TenantType::Single => "single", TenantType::Multi => "multi" }
    }

    pub fn label(self) -> &'static str {
        match self { TenantType::Single => "Single Tenant", TenantType::Multi => "Multi-Tenant" }
    }
}

impl fmt::Display for TenantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TenantType {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s { "single" => Ok(TenantType::Single), "multi" => Ok(TenantType::Multi), _ => Err(()) }
    }
}

/// Body of `POST /api/generate` as it arrives on the wire. Every field is
/// optional so that missing values surface as validation messages instead
/// of a bare deserialization failure.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawGenerateRequest {
    #[serde(default)]
    pub idea: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub monetization: Option<String>,
    #[serde(default)]
    pub tenant_type: Option<String>,
    #[serde(default)]
    pub tech_stack: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub idea: String,
    pub roles: Vec<String>,
    pub monetization: Monetization,
    pub tenant_type: TenantType,
    pub tech_stack: Vec<String>,
}

impl RawGenerateRequest {
    /// Checks every field rule and either returns the typed request or the
    /// full list of violations.
    pub fn validate(self) -> Result<GenerateRequest, Vec<String>> {
        let mut errors = Vec::new();

        let idea = match self.idea {
            Some(idea) if idea.trim().is_empty() => { errors.push("idea should not be empty".to_string()); None }
            Some(idea) if idea.chars().count() < MIN_IDEA_LEN => {
                errors.push(format!("idea must be longer than or equal to {MIN_IDEA_LEN} characters"));
                None
            }
            Some(idea) => Some(idea),
            None => { errors.push("idea must be a string".to_string()); None }
        };

        let roles = match self.roles {
            Some(roles) if roles.is_empty() => { errors.push("roles must contain at least 1 elements".to_string()); None }
            Some(roles) if roles.iter().any(|r| r.trim().is_empty()) => {
                errors.push("each value in roles should not be empty".to_string());
                None
            }
            Some(roles) => Some(roles),
            None => { errors.push("roles must be an array".to_string()); None }
        };

        let monetization = match self.monetization.as_deref().map(str::parse::<Monetization>) {
            Some(Ok(m)) => Some(m),
            _ => {
                let allowed: Vec<_> = Monetization::ALL.iter().map(|m| m.as_str()).collect();
                errors.push(format!("monetization must be one of the following values: {}", allowed.join(", ")));
                None
            }
        };

        let tenant_type = match self.tenant_type.as_deref().map(str::parse::<TenantType>) {
            Some(Ok(t)) => Some(t),
            _ => { errors.push("tenantType must be one of the following values: single, multi".to_string()); None }
        };

        if self.tech_stack.is_none() {
            errors.push("techStack must be an array".to_string());
        }

        match (idea, roles, monetization, tenant_type, self.tech_stack) {
            (Some(idea), Some(roles), Some(monetization), Some(tenant_type), Some(tech_stack)) if errors.is_empty() => {
                Ok(GenerateRequest { idea, roles, monetization, tenant_type, tech_stack })
            }
            _ => Err(errors),
        }
    }
}

/// Model output often carries `null` where a value is expected; inner
/// blueprint entries treat it as the field's default.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Column {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub column_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DatabaseTable {
    #[serde(default, deserialize_with = "null_as_default")]
    pub table_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<Column>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FolderStructure {
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ArchitectureBlueprint {
    pub project_summary: String,
    pub mvp_features: Vec<String>,
    pub future_features: Vec<String>,
    pub roles: Vec<RoleSpec>,
    pub database_schema: Vec<DatabaseTable>,
    pub folder_structure: FolderStructure,
}

/// A blueprint annotated with where it came from.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TaggedBlueprint {
    #[serde(flatten)]
    pub blueprint: ArchitectureBlueprint,
    #[serde(rename = "_isMock")]
    pub is_mock: bool,
    #[serde(rename = "_source")]
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub id: Uuid,
    pub data: TaggedBlueprint,
    pub is_mock: bool,
}

/// Row fields handed to the store. `tech_stack` and `ai_response` are
/// already-serialized JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGeneration {
    pub idea: String,
    pub roles_input: String,
    pub monetization_type: String,
    pub tenant_type: String,
    pub tech_stack: String,
    pub ai_response: String,
}

/// A persisted row exactly as the store keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGeneration {
    pub id: Uuid,
    pub idea: String,
    pub roles_input: String,
    pub monetization_type: String,
    pub tenant_type: String,
    pub tech_stack: String,
    pub ai_response: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationRecord {
    pub id: Uuid,
    pub idea: String,
    pub roles_input: String,
    pub monetization_type: String,
    pub tenant_type: String,
    pub tech_stack: Vec<String>,
    pub ai_response: TaggedBlueprint,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<StoredGeneration> for GenerationRecord {
    type Error = serde_json::Error;

    fn try_from(row: StoredGeneration) -> Result<Self, Self::Error> {
        Ok(Self {
            tech_stack: serde_json::from_str(&row.tech_stack)?,
            ai_response: serde_json::from_str(&row.ai_response)?,
            id: row.id,
            idea: row.idea,
            roles_input: row.roles_input,
            monetization_type: row.monetization_type,
            tenant_type: row.tenant_type,
            created_at: row.created_at,
        })
    }
}
