//! Config subcommand handlers.

use secrecy::SecretString;

use wpfleet_config::{Config, CredentialSource};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Mask plaintext credentials. Env and keyring references are safe to show.
fn redact(cfg: &mut Config) {
    for reference in cfg.sites.values_mut().filter_map(|e| e.credential.as_mut()) {
        if matches!(CredentialSource::parse(reference), CredentialSource::Plaintext(_)) {
            *reference = "****".into();
        }
    }
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = global.config_path();
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let mut cfg = wpfleet_config::load_config(&path)?;
            redact(&mut cfg);
            let out = match global.format() {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)?,
                format => {
                    output::render_single(format, &cfg, |_| String::new(), |_| String::new())?
                }
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetCredential { site } => {
            let mut cfg = wpfleet_config::load_config(&path)?;
            let Some(entry) = cfg.sites.get_mut(&site) else {
                return Err(CliError::NotFound {
                    resource_type: "site".into(),
                    identifier: site,
                    list_command: "config show".into(),
                });
            };

            let password = rpassword::prompt_password(format!("Application password for {site}: "))
                .map_err(prompt_err)?;
            if password.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "credential".into(),
                    reason: "application password cannot be empty".into(),
                });
            }

            let reference =
                wpfleet_config::store_keyring_credential(&site, &SecretString::from(password))?;
            entry.credential = Some(reference);
            wpfleet_config::save_config(&cfg, &path)?;

            if !global.quiet {
                eprintln!("✓ Credential for '{site}' stored in the system keyring");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wpfleet_config::SiteEntry;

    fn entry(credential: Option<&str>) -> SiteEntry {
        SiteEntry {
            name: None,
            url: "https://blog.example".into(),
            username: "bot".into(),
            credential: credential.map(Into::into),
        }
    }

    #[test]
    fn redact_masks_only_plaintext() {
        let mut cfg = Config::default();
        cfg.sites.insert("a".into(), entry(Some("hunter2")));
        cfg.sites.insert("b".into(), entry(Some("plain:hunter2")));
        cfg.sites.insert("c".into(), entry(Some("env:C_PASSWORD")));
        cfg.sites.insert("d".into(), entry(Some("keyring:d")));
        cfg.sites.insert("e".into(), entry(None));

        redact(&mut cfg);

        let creds: Vec<_> = cfg.sites.values().map(|e| e.credential.as_deref()).collect();
        assert_eq!(
            creds,
            vec![
                Some("****"),
                Some("****"),
                Some("env:C_PASSWORD"),
                Some("keyring:d"),
                None
            ]
        );
    }
}
