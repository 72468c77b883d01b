use bist_core::{ColorSchemeHint, KeyValueStore, Theme, ThemePreference};
use serde_json::json;

use crate::cli::{ThemeArgs, ThemeCommand};
use crate::error::CliError;

use super::{CommandResult, Context};

pub fn run(args: &ThemeArgs, context: &Context) -> Result<CommandResult, CliError> {
    let store = context.store();
    let command = args.command.clone().unwrap_or(ThemeCommand::Get);
    apply(&store, ColorSchemeHint::from_env(), &command)
}

fn apply(
    store: &dyn KeyValueStore,
    hint: ColorSchemeHint,
    command: &ThemeCommand,
) -> Result<CommandResult, CliError> {
    let preference = ThemePreference::new(store, hint);

    let (theme, changed) = match command {
        ThemeCommand::Get => (preference.current()?, false),
        ThemeCommand::Set(args) => {
            let theme: Theme = args.theme.parse()?;
            preference.set(theme)?;
            (theme, true)
        }
        ThemeCommand::Toggle => (preference.toggle()?, true),
    };

    Ok(CommandResult::ok(json!({ "theme": theme, "changed": changed })))
}
