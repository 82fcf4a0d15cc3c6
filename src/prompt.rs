use crate::models::GenerateRequest;

/// Exact JSON shape every provider must return.
pub const BLUEPRINT_SCHEMA: &str = r#"{
  "project_summary": string,
  "mvp_features": string[],
  "future_features": string[],
  "roles": [{ "name": string, "description": string, "permissions": string[] }],
  "database_schema": [{ "table_name": string, "columns": [{ "name": string, "type": string, "description": string }] }],
  "folder_structure": { "frontend": string[], "backend": string[] }
}"#;

pub fn system_instruction() -> String {
    format!(
        "You are an expert SaaS architect. Generate a structured architecture blueprint in valid JSON format.\n\n\
         The JSON must follow this exact schema:\n{BLUEPRINT_SCHEMA}\n\n\
         Return ONLY valid JSON, no markdown, no code fences, no explanations."
    )
}

pub fn build_prompt(req: &GenerateRequest) -> String {
    let tech_stack = if req.tech_stack.is_empty() { "Not specified".to_string() } else { req.tech_stack.join(", ") };
    format!(
        "Create a SaaS architecture blueprint for the following:\n\n\
         **App Idea:**\n{idea}\n\n\
         **User Roles:**\n{roles}\n\n\
         **Monetization Type:**\n{monetization}\n\n\
         **Tenant Type:**\n{tenant}\n\n\
         **Tech Stack:**\n{tech_stack}\n\n\
         Generate a comprehensive architecture including:\n\
         1. Project summary\n\
         2. MVP features (prioritized list)\n\
         3. Future features (for later iterations)\n\
         4. Role & permission matrix for each role\n\
         5. Database schema with tables and columns\n\
         6. Suggested folder structure for frontend and backend\n\n\
         Respond with a single JSON object matching the schema, with no surrounding prose or code fences.",
        idea = req.idea,
        roles = req.roles.join(", "),
        monetization = req.monetization.label(),
        tenant = req.tenant_type.label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Monetization, TenantType};

    fn request(tech_stack: Vec<String>) -> GenerateRequest {
        GenerateRequest {
            idea: "Inventory tracking for small craft breweries".into(),
            roles: vec!["Owner".into(), "Brewer".into()],
            monetization: Monetization::Marketplace,
            tenant_type: TenantType::Multi,
            tech_stack,
        }
    }

    #[test]
    fn prompt_names_every_input() {
        let p = build_prompt(&request(vec!["Rust".into(), "Postgres".into()]));
        assert!(p.contains("Inventory tracking for small craft breweries"));
        assert!(p.contains("Owner, Brewer"));
        assert!(p.contains(Monetization::Marketplace.label()));
        assert!(p.contains("Multi-Tenant"));
        assert!(p.contains("Rust, Postgres"));
        assert!(p.contains("Role & permission matrix"));
    }

    #[test]
    fn empty_stack_uses_placeholder() {
        assert!(build_prompt(&request(vec![])).contains("**Tech Stack:**\nNot specified"));
    }

    #[test]
    fn system_instruction_embeds_schema() {
        let s = system_instruction();
        assert!(s.contains(BLUEPRINT_SCHEMA));
        assert!(s.contains("Return ONLY valid JSON"));
    }
}
