use crate::config::FieldDef;
use crate::error::Result;
use crate::store::RealmConfigStore;
use crate::variables::VariableStore;

/// Produces field definitions with host constants substituted into their
/// human-facing text.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    store: &'a RealmConfigStore,
    variables: &'a VariableStore,
}

impl<'a> FieldResolver<'a> {
    pub fn new(store: &'a RealmConfigStore, variables: &'a VariableStore) -> Self {
        Self { store, variables }
    }

    /// Fields of `realm` in declaration order with `name`, `documentation`
    /// and `alias` substituted. Identifier-bearing attributes are untouched.
    pub fn resolve_fields(&self, realm: &str) -> Result<Vec<FieldDef>> {
        Ok(self
            .store
            .get_fields(realm)?
            .iter()
            .map(|field| resolve_field(field, self.variables))
            .collect())
    }
}

/// Apply substitution to a single field definition.
pub fn resolve_field(field: &FieldDef, variables: &VariableStore) -> FieldDef {
    let mut resolved = field.clone();
    resolved.name = variables.substitute(&field.name);
    for text in [&mut resolved.documentation, &mut resolved.alias]
        .into_iter()
        .flatten()
    {
        *text = variables.substitute(text);
    }
    resolved
}
