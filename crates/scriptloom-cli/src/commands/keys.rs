use scriptloom::{mask_secret, resolve_secret, CredentialCipher};
use secrecy::ExposeSecret;

use crate::args::KeysCommand;
use crate::error::CliError;
use crate::state::AppState;

pub fn handle(state: &AppState, cmd: KeysCommand) -> Result<(), CliError> {
    match cmd {
        KeysCommand::Add { value, file, env } => {
            let secret = resolve_secret(value.as_deref(), file.as_deref(), env.as_deref())?;
            let masked = mask_secret(secret.expose_secret());
            if state.credentials.add(secret.expose_secret())? {
                println!("Added key {}", masked);
            } else {
                println!("Key {} is already configured", masked);
            }
        }
        KeysCommand::Remove { index } => {
            if index == 0 {
                return Err(CliError::Invalid("key positions start at 1".to_string()));
            }
            state.credentials.remove_at(index - 1)?;
            println!("Removed key #{}", index);
        }
        KeysCommand::List => {
            let masked = state.credentials.masked()?;
            if masked.is_empty() {
                println!("No API keys configured");
            }
            for (i, key) in masked.iter().enumerate() {
                println!("{:>3}  {}", i + 1, key);
            }
        }
        KeysCommand::GenerateEncryptionKey => {
            let key = CredentialCipher::generate_key()?;
            println!("{}", key);
            eprintln!(
                "Export it as {} before adding keys to store them encrypted.",
                scriptloom::secrets::CREDENTIAL_KEY_ENV_VAR
            );
        }
    }
    Ok(())
}
