use anyhow::Result;
use console::style;
use dialoguer::Confirm;
use std::io::IsTerminal;

use crate::migrate::PushPlan;

/// Whether prompts can be shown at all.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stderr().is_terminal()
}

/// Print the data-loss warnings collected for a push.
pub fn print_push_warnings(plan: &PushPlan) {
    if plan.warnings.is_empty() {
        return;
    }

    eprintln!();
    eprintln!(
        "{}",
        style("Warning: found data-loss statements").yellow().bold()
    );
    for warning in &plan.warnings {
        eprintln!("{warning}");
    }
    if !plan.tables_to_truncate.is_empty() {
        let tables: Vec<String> = plan.tables_to_truncate.iter().map(ToString::to_string).collect();
        eprintln!(
            "{} {}",
            style("These tables need to be emptied first:").dim(),
            tables.join(", ")
        );
    }
    eprintln!();
}

/// Print statements one per line, for dry runs and previews.
pub fn print_statements(statements: &[String]) {
    for statement in statements {
        println!("{statement}");
    }
}

/// Ask the user to approve a push.
///
/// Returns `false` without prompting when no terminal is attached.
pub fn confirm_push(plan: &PushPlan) -> Result<bool> {
    if !is_interactive() {
        return Ok(false);
    }

    let prompt = if plan.has_data_loss {
        format!(
            "Apply {} statements? This may lose data",
            plan.statements_to_execute.len()
        )
    } else {
        format!("Apply {} statements?", plan.statements_to_execute.len())
    };

    let approved = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;

    Ok(approved)
}
