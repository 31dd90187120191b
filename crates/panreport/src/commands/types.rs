//! Report type catalog listing.

use tabled::Tabled;

use panreport_core::{Category, EndpointDescriptor};

use crate::Context;
use crate::cli::{GlobalOpts, TypesArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct TypeRow {
    #[tabled(rename = "Type")]
    report_type: &'static str,
    #[tabled(rename = "Label")]
    label: &'static str,
    #[tabled(rename = "Category")]
    category: Category,
}

pub fn handle(args: &TypesArgs, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let registry = ctx.session.registry();

    let entries: Vec<EndpointDescriptor> = match &args.category {
        Some(name) => {
            let category = registry
                .categories()
                .into_iter()
                .find(|c| c.to_string().eq_ignore_ascii_case(name.trim()))
                .ok_or_else(|| CliError::Validation {
                    field: "category".into(),
                    reason: format!(
                        "unknown category '{name}' (one of: {})",
                        registry
                            .categories()
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                })?;
            registry.by_category(category).copied().collect()
        }
        None => registry.entries().to_vec(),
    };

    let out = output::render_list(
        &global.output,
        &entries,
        |e| TypeRow {
            report_type: e.report_type,
            label: e.label,
            category: e.category,
        },
        |e| e.report_type.to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
