//! Plain-text action catalog for the system prompt.

use super::registry::{ActionDescriptor, ActionRegistry};

impl ActionDescriptor {
    /// One catalog line: `name: description. (field=type (desc), ...)`.
    ///
    /// The parenthetical is left out when the action takes no parameters.
    /// A trailing period in the description is not doubled.
    pub fn prompt_line(&self) -> String {
        let params: Vec<String> = self
            .params
            .fields()
            .iter()
            .map(|field| {
                let mut desc = field.name.clone();
                if let Some(ty) = field.ty.json_type() {
                    desc.push('=');
                    desc.push_str(ty);
                }
                if let Some(ref text) = field.description {
                    desc.push_str(&format!(" ({text})"));
                }
                desc
            })
            .collect();

        let description = self.description.trim_end().trim_end_matches('.');
        if params.is_empty() {
            format!("{}: {description}.", self.name)
        } else {
            format!("{}: {description}. ({})", self.name, params.join(", "))
        }
    }
}

impl ActionRegistry {
    /// Describe the actions offered for `target`, one line each.
    ///
    /// Without a target only global actions are listed.  With a target
    /// only domain-scoped actions whose filter matches are listed; global
    /// actions are left out on that path.
    pub fn prompt_description(&self, target: Option<&str>) -> String {
        self.iter()
            .filter(|d| match (target, d.domains.as_deref()) {
                (None, domains) => domains.is_none(),
                (Some(_), None) | (Some(_), Some([])) => false,
                (Some(url), Some(_)) => d.visible_on(url),
            })
            .map(ActionDescriptor::prompt_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
