//! Terminal rendering of plans, schemas and read results

use std::collections::HashMap;

use colored::Colorize;

use edgeform_core::effect::Effect;
use edgeform_core::plan::Plan;
use edgeform_core::resource::Value;
use edgeform_core::schema::ResourceSchema;

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Int(i) => i.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}: {}", k, format_value(&map[k])))
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}

pub fn format_effect(effect: &Effect) -> String {
    let verb = match effect {
        Effect::Read(_) => "Read",
        Effect::Create(_) => "Create",
        Effect::Update { .. } => "Update",
        Effect::Delete(_) => "Delete",
    };
    format!("{} {}", verb, effect.resource_id())
}

fn sorted(attributes: &HashMap<String, Value>) -> Vec<(&String, &Value)> {
    let mut attrs: Vec<(&String, &Value)> = attributes.iter().collect();
    attrs.sort_by(|a, b| a.0.cmp(b.0));
    attrs
}

pub fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        println!("{}", "No changes. Everything is up-to-date.".green());
        return;
    }

    println!("{}", "Execution Plan:".cyan().bold());
    println!();

    for effect in plan.effects() {
        let id = effect.resource_id();
        match effect {
            Effect::Read(r) => {
                println!("  {} {}", "<=".cyan().bold(), id.to_string().cyan().bold());
                for (key, value) in sorted(&r.attributes) {
                    println!("      {}: {}", key.bold(), format_value(value));
                }
            }
            Effect::Create(r) => {
                println!("  {} {}", "+".green().bold(), id.to_string().cyan().bold());
                for (key, value) in sorted(&r.attributes) {
                    println!("      {}: {}", key.bold(), format_value(value).green());
                }
            }
            Effect::Update { from, to, .. } => {
                println!("  {} {}", "~".yellow().bold(), id.to_string().cyan().bold());
                if let Some(identifier) = &from.identifier {
                    println!("      {}: {}", "id".bold(), identifier);
                }
                for (key, value) in sorted(&to.attributes) {
                    match from.attributes.get(key) {
                        Some(old) if old == value => {}
                        Some(old) => println!(
                            "      {}: {} => {}",
                            key.bold(),
                            format_value(old).red(),
                            format_value(value).green()
                        ),
                        None => println!(
                            "      {}: {} => {}",
                            key.bold(),
                            "(unset)".red(),
                            format_value(value).green()
                        ),
                    }
                }
            }
            Effect::Delete(state) => {
                println!("  {} {}", "-".red().bold(), id.to_string().red().bold());
                if let Some(identifier) = &state.identifier {
                    println!("      {}: {}", "id".bold(), identifier);
                }
            }
        }
    }

    println!();
    let summary = plan.summary();
    println!(
        "Plan: {} to read, {} to create, {} to update, {} to delete.",
        summary.read.to_string().cyan(),
        summary.create.to_string().green(),
        summary.update.to_string().yellow(),
        summary.delete.to_string().red()
    );
}

/// Attributes of a read data source; multi-line text is printed verbatim
pub fn print_attributes(attributes: &HashMap<String, Value>) {
    for (key, value) in sorted(attributes) {
        match value {
            Value::String(s) if s.contains('\n') => {
                println!("      {}:", key.bold());
                for line in s.lines() {
                    println!("        {}", line);
                }
            }
            _ => println!("      {}: {}", key.bold(), format_value(value)),
        }
    }
}

pub fn print_schema(schema: &ResourceSchema, kind: &str) {
    println!("{} {}", kind.dimmed(), schema.resource_type.cyan().bold());
    if let Some(description) = &schema.description {
        println!("  {}", description);
    }
    for attr in schema.sorted_attributes() {
        println!(
            "  {} {} ({})",
            attr.name.bold(),
            attr.attr_type,
            attr.mode
        );
        if let Some(description) = &attr.description {
            println!("      {}", description.dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgeform_core::resource::{Resource, ResourceId, State};

    #[test]
    fn nested_values() {
        let value = Value::List(vec![Value::Map(HashMap::from([
            ("name".to_string(), Value::from("after15Minutes")),
            ("value".to_string(), Value::Int(900)),
        ]))]);
        assert_eq!(
            format_value(&value),
            r#"[{name: "after15Minutes", value: 900}]"#
        );
    }

    #[test]
    fn effect_labels() {
        let create = Effect::Create(Resource::new("edgeform_iam_blocked_user_properties", "ops"));
        let delete = Effect::Delete(State::not_found(ResourceId::new(
            "edgeform_botman_challenge_action",
            "captcha",
        )));

        assert_eq!(
            format_effect(&create),
            "Create edgeform_iam_blocked_user_properties.ops"
        );
        assert_eq!(
            format_effect(&delete),
            "Delete edgeform_botman_challenge_action.captcha"
        );
    }
}
