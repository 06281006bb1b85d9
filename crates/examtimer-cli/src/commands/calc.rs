//! The `examtimer calc` command.

use anyhow::Result;

use examtimer_tools::calculator::{evaluate, format_result};

pub fn execute(expression: Vec<String>) -> Result<()> {
    let expr = expression.join(" ");
    match evaluate(&expr) {
        Ok(value) => {
            println!("{}", format_result(value));
            Ok(())
        }
        Err(e) => anyhow::bail!("cannot evaluate '{expr}': {e}"),
    }
}
