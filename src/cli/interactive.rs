//! Interactive mapping editor.

use anyhow::{bail, Result};
use console::Term;
use dialoguer::{theme::ColorfulTheme, Select};

use crate::align::set_mapping;
use crate::domain::FieldMapping;
use crate::render::render_mapping_table;

const IGNORE_CHOICE: &str = "(ignore)";

/// Menu entries: "(ignore)" followed by the schema fields.
fn choices(schema_fields: &[String]) -> Vec<&str> {
    std::iter::once(IGNORE_CHOICE).chain(schema_fields.iter().map(String::as_str)).collect()
}

/// Menu position of the mapping's current target; ignored or unknown targets land on "(ignore)".
fn current_choice(mapping: &FieldMapping, schema_fields: &[String]) -> usize {
    mapping
        .target_field
        .as_deref()
        .and_then(|target| schema_fields.iter().position(|f| f == target))
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Walk every source column and let the user pick its target field.
pub fn edit_mappings(mappings: &[FieldMapping], schema_fields: &[String]) -> Result<Vec<FieldMapping>> {
    if !Term::stderr().is_term() {
        bail!("--interactive requires a terminal");
    }

    eprintln!();
    eprintln!("Proposed mapping:");
    eprint!("{}", render_mapping_table(mappings));
    eprintln!();

    let items = choices(schema_fields);
    let mut edited = mappings.to_vec();
    for mapping in mappings {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Target field for '{}'", mapping.source_field))
            .default(current_choice(mapping, schema_fields))
            .items(&items)
            .interact()?;

        let target = if selection == 0 { None } else { items.get(selection).copied() };
        edited = set_mapping(&edited, &mapping.source_field, target)?;
    }
    Ok(edited)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<String> {
        vec!["name".to_string(), "sku".to_string()]
    }

    #[test]
    fn ignore_comes_first() {
        assert_eq!(choices(&fields()), vec!["(ignore)", "name", "sku"]);
    }

    #[test]
    fn current_choice_tracks_target() {
        let schema = fields();
        assert_eq!(current_choice(&FieldMapping::new("SKU", Some("sku".to_string())), &schema), 2);
        assert_eq!(current_choice(&FieldMapping::new("x", None), &schema), 0);
        assert_eq!(current_choice(&FieldMapping::new("x", Some("other".to_string())), &schema), 0);
    }
}
