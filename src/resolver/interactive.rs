use std::io::IsTerminal;

use console::style;
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use tracing::debug;

use super::{Resolution, Resolvable, Resolver, ResolverInput};
use crate::error::BoxError;

/// Asks the user, one created entity at a time, whether it is new or replaces a deleted one.
///
/// Without a terminal on stdin every entity is treated as independent.
#[derive(Default)]
pub struct InteractiveResolver {
    theme: ColorfulTheme,
}

impl InteractiveResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Resolver for InteractiveResolver {
    async fn resolve<T: Resolvable>(
        &mut self,
        input: ResolverInput<T>,
    ) -> Result<Resolution<T>, BoxError> {
        if !std::io::stdin().is_terminal() {
            debug!(
                "No terminal attached, treating {} as independent",
                input.category
            );
            return Ok(Resolution::independent(input));
        }

        let kind = input.category.singular();
        let mut remaining = input.deleted;
        let mut resolution = Resolution::default();

        for created in input.created {
            if remaining.is_empty() {
                resolution.created.push(created);
                continue;
            }

            let mut items = vec![format!(
                "{} {} {}",
                style("+").green(),
                created.id.path(),
                style(format!("create {kind}")).dim()
            )];
            for deleted in &remaining {
                let action = if deleted.id.same_name_other_schema(&created.id) {
                    format!(
                        "move from {}",
                        deleted.id.schema().filter(|s| !s.is_empty()).unwrap_or("default schema")
                    )
                } else {
                    format!("rename {kind}")
                };
                items.push(format!(
                    "{} {} › {} {}",
                    style("~").yellow(),
                    deleted.id.path(),
                    created.id.path(),
                    style(action).dim()
                ));
            }

            let selection = Select::with_theme(&self.theme)
                .with_prompt(format!(
                    "Is {} created or renamed from another {}?",
                    style(created.id.path()).bold(),
                    kind
                ))
                .items(&items)
                .default(0)
                .interact()?;

            if selection == 0 {
                resolution.created.push(created);
            } else {
                let deleted = remaining.remove(selection - 1);
                resolution.pair(deleted, created);
            }
        }

        resolution.deleted = remaining;
        Ok(resolution)
    }
}
