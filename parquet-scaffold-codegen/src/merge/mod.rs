use std::collections::HashSet;

use tracing::debug;

use crate::{ModelDecl, ModuleItem, ReflectedModule, reflected::is_import};

/// Comment placed above models appended to an existing file
pub const APPENDED_MODELS_BANNER: &str = "# Models generated by inspectdb";

/// Merge reflected models into the text of an existing `models.py`.
///
/// Models are keyed by name. A model already in the file is replaced where it
/// stands, a new model is appended below a banner, and import lines of the
/// reflected text missing from the file are added after its last import.
/// Everything else in the file is left alone, so upserting the same models
/// twice gives the same text as upserting once.
pub fn upsert_models(existing: &str, reflected: &ReflectedModule) -> String {
    let mut module = ReflectedModule::parse(existing);

    let mut appended: Vec<&ModelDecl> = Vec::new();
    let mut seen = HashSet::new();
    for model in reflected.models() {
        if !seen.insert(model.name.as_str()) {
            continue;
        }
        let slot = module.items.iter_mut().find_map(|item| match item {
            ModuleItem::Model(old) if old.name == model.name => Some(old),
            _ => None,
        });
        match slot {
            Some(old) => {
                debug!("Replacing model {}", model.name);
                *old = model.clone();
            }
            None => {
                debug!("Appending model {}", model.name);
                appended.push(model);
            }
        }
    }

    merge_imports(&mut module, reflected);

    let mut output = module.render();
    if !appended.is_empty() {
        let trimmed_len = output.trim_end_matches('\n').len();
        output.truncate(trimmed_len);
        if !output.is_empty() {
            output.push_str("\n\n\n");
        }
        output.push_str(APPENDED_MODELS_BANNER);
        output.push('\n');
        for (i, model) in appended.iter().enumerate() {
            if i > 0 {
                output.push_str("\n\n\n");
            }
            output.push_str(&model.render());
        }
    }
    if !output.is_empty() && !output.ends_with('\n') {
        output.push('\n');
    }
    output
}

fn merge_imports(module: &mut ReflectedModule, reflected: &ReflectedModule) {
    let existing: HashSet<String> = module.imports().map(str::to_owned).collect();
    let missing: Vec<String> = reflected
        .imports()
        .filter(|line| !existing.contains(*line))
        .map(str::to_owned)
        .collect::<Vec<_>>();
    if missing.is_empty() {
        return;
    }

    let position = module
        .items
        .iter()
        .rposition(|item| matches!(item, ModuleItem::Raw(line) if is_import(line)))
        .map(|i| i + 1)
        .unwrap_or(0);
    for (offset, line) in missing.into_iter().enumerate() {
        module
            .items
            .insert(position + offset, ModuleItem::Raw(line));
    }
}
