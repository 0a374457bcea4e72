pub mod auth;
pub mod matches;
pub mod report;
pub mod scores;
pub mod shooters;
pub mod stages;

pub use stages::StageArg;

use anyhow::Result;
use serde::Serialize;

use crate::api::ApiClient;
use crate::output::print_json;

/// Input rejected before anything was sent to the server.
#[derive(Debug, thiserror::Error)]
#[error("invalid input:\n  - {}", .0.join("\n  - "))]
pub struct InvalidInput(pub Vec<String>);

/// Shared state for running one command.
pub struct CommandContext {
    pub client: ApiClient,
    pub use_colors: bool,
    pub json: bool,
}

impl CommandContext {
    /// Print `value` as JSON, or the text from `render` otherwise.
    pub fn emit<T: Serialize + ?Sized>(&self, value: &T, render: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            print_json(value)
        } else {
            println!("{}", render());
            Ok(())
        }
    }
}

/// Ask before destroying something unless `--yes` was given.
pub(crate) fn confirm(what: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    crate::config::prompt_yes_no(&format!("Delete {}?", what), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_lists_every_problem() {
        let err = InvalidInput(vec!["name: must not be empty".to_string(), "date: bad".to_string()]);
        assert_eq!(
            err.to_string(),
            "invalid input:\n  - name: must not be empty\n  - date: bad"
        );
    }
}
