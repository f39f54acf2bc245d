use crate::cli::{Command, SharesArgs, SsvKeys, VerifyArgs};
use alloy::primitives::{Address, U256};
use key_shares::KeySharesVersion;
use payload::PayloadContext;
use ssv_types::OperatorId;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Validated configuration for one invocation
#[derive(Debug, Clone)]
pub struct Config {
    pub debug_level: String,
    pub command: CommandConfig,
}

#[derive(Debug, Clone)]
pub enum CommandConfig {
    Shares(SharesConfig),
    Verify(VerifyConfig),
}

#[derive(Clone)]
pub struct SharesConfig {
    /// Keystore files, directories already expanded
    pub keystores: Vec<PathBuf>,
    pub password: String,
    pub operator_ids: Vec<OperatorId>,
    pub operator_keys: Vec<String>,
    pub owner: Option<(Address, u64)>,
    pub amount: Option<U256>,
    pub output_folder: PathBuf,
    pub version: KeySharesVersion,
}

impl std::fmt::Debug for SharesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharesConfig")
            .field("keystores", &self.keystores)
            .field("operator_ids", &self.operator_ids)
            .field("owner", &self.owner)
            .field("amount", &self.amount)
            .field("output_folder", &self.output_folder)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl SharesConfig {
    /// Payload context of the keystore at `index`. Nonces increase by one per keystore.
    pub fn context(&self, index: usize) -> PayloadContext {
        PayloadContext {
            owner: self.owner.map(|(address, nonce)| payload::OwnerContext {
                address,
                nonce: nonce + index as u64,
            }),
            amount: self.amount,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerifyConfig {
    pub file: PathBuf,
}

/// Builds a validated `Config` from the command line
pub fn from_cli(cli: &SsvKeys) -> Result<Config, String> {
    let command = match &cli.command {
        Command::Shares(args) => CommandConfig::Shares(shares_config(args)?),
        Command::Verify(VerifyArgs { file }) => CommandConfig::Verify(VerifyConfig {
            file: file.clone(),
        }),
    };

    Ok(Config {
        debug_level: cli.debug_level.clone(),
        command,
    })
}

fn shares_config(args: &SharesArgs) -> Result<SharesConfig, String> {
    if args.operator_ids.len() != args.operator_keys.len() {
        return Err(format!(
            "Got {} operator ids but {} operator keys",
            args.operator_ids.len(),
            args.operator_keys.len()
        ));
    }
    let operator_ids: Vec<OperatorId> = args.operator_ids.iter().copied().map(OperatorId).collect();
    threshold::validate_committee(&operator_ids).map_err(|e| e.to_string())?;

    let owner = args
        .owner_address
        .as_deref()
        .map(|address| {
            Address::from_str(address)
                .map(|address| (address, args.owner_nonce.unwrap_or_default()))
                .map_err(|e| format!("Invalid owner address {address}: {e}"))
        })
        .transpose()?;
    let amount = args
        .amount
        .as_deref()
        .map(|amount| {
            U256::from_str(amount).map_err(|e| format!("Invalid amount {amount}: {e}"))
        })
        .transpose()?;
    if owner.is_none() && amount.is_none() {
        return Err("Either --owner-address or --amount is required".to_string());
    }

    let password = match (&args.password, &args.password_file) {
        (Some(password), _) => password.clone(),
        (None, Some(path)) => read_password(path)?,
        (None, None) => return Err("A keystore password is required".to_string()),
    };

    let version = KeySharesVersion::from_str(&args.version).map_err(|e| e.to_string())?;

    let keystores = expand_keystores(&args.keystore)?;
    // keystore i is registered with nonce + i
    if let Some((_, nonce)) = owner {
        let last = keystores.len() as u64 - 1;
        if nonce.checked_add(last).is_none() {
            return Err(format!(
                "Owner nonce {nonce} overflows across {} keystores",
                keystores.len()
            ));
        }
    }

    Ok(SharesConfig {
        keystores,
        password,
        operator_ids,
        operator_keys: args.operator_keys.clone(),
        owner,
        amount,
        output_folder: args.output_folder.clone(),
        version,
    })
}

fn read_password(path: &Path) -> Result<String, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Unable to read password file {}: {e}", path.display()))?;
    Ok(contents.trim_end_matches(['\r', '\n']).to_string())
}

// Directories contribute their .json files in name order
fn expand_keystores(paths: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
    let mut keystores = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries = fs::read_dir(path)
                .map_err(|e| format!("Unable to read directory {}: {e}", path.display()))?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("Unable to read directory {}: {e}", path.display()))?;
            entries.retain(|entry| {
                entry.is_file() && entry.extension().is_some_and(|ext| ext == "json")
            });
            entries.sort();
            keystores.extend(entries);
        } else if path.is_file() {
            keystores.push(path.clone());
        } else {
            return Err(format!("Keystore {} does not exist", path.display()));
        }
    }

    if keystores.is_empty() {
        return Err("No keystores found".to_string());
    }
    Ok(keystores)
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    const KEYS: &str = "a2V5MQ==,a2V5Mg==,a2V5Mw==,a2V5NA==";

    fn parse(args: &[&str]) -> Result<Config, String> {
        let cli = SsvKeys::try_parse_from(args).map_err(|e| e.to_string())?;
        from_cli(&cli)
    }

    fn shares(config: Config) -> SharesConfig {
        match config.command {
            CommandConfig::Shares(shares) => shares,
            other => panic!("Expected shares config, got {other:?}"),
        }
    }

    #[test]
    fn test_shares_config() {
        let dir = tempdir().unwrap();
        let keystore = dir.path().join("keystore.json");
        fs::write(&keystore, "{}").unwrap();
        let keystore = keystore.to_str().unwrap();

        let config = shares(
            parse(&[
                "ssv-keys",
                "shares",
                "--keystore",
                keystore,
                "--password",
                "secret",
                "--operator-ids",
                "1,2,3,4",
                "--operator-keys",
                KEYS,
                "--owner-address",
                "0x1111111111111111111111111111111111111111",
                "--owner-nonce",
                "5",
                "--amount",
                "123456789",
            ])
            .expect("Valid configuration"),
        );

        assert_eq!(config.operator_ids.len(), 4);
        assert_eq!(config.operator_keys[1], "a2V5Mg==");
        assert_eq!(config.version, KeySharesVersion::V3);
        assert_eq!(config.amount, Some(U256::from(123456789u64)));

        // nonces advance per keystore
        let context = config.context(2);
        assert_eq!(context.owner.map(|owner| owner.nonce), Some(7));
        assert_eq!(context.amount, Some(U256::from(123456789u64)));
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_password_file_and_keystore_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let password_file = dir.path().join("password.txt");
        fs::write(&password_file, "hunter2\n").unwrap();

        let config = shares(
            parse(&[
                "ssv-keys",
                "shares",
                "--keystore",
                dir.path().to_str().unwrap(),
                "--password-file",
                password_file.to_str().unwrap(),
                "--operator-ids",
                "1,2,3,4",
                "--operator-keys",
                KEYS,
                "--amount",
                "0x10",
                "--version",
                "v2",
            ])
            .expect("Valid configuration"),
        );

        assert_eq!(config.password, "hunter2");
        assert_eq!(
            config.keystores,
            vec![dir.path().join("a.json"), dir.path().join("b.json")]
        );
        assert_eq!(config.amount, Some(U256::from(16u64)));
        assert_eq!(config.version, KeySharesVersion::V2);
        assert!(config.context(0).owner.is_none());
    }

    #[test]
    fn test_invalid_shares_config() {
        let dir = tempdir().unwrap();
        let keystore = dir.path().join("keystore.json");
        fs::write(&keystore, "{}").unwrap();
        let keystore = keystore.to_str().unwrap();
        let base = [
            "ssv-keys",
            "shares",
            "--keystore",
            keystore,
            "--password",
            "secret",
        ];
        let with = |extra: &[&str]| {
            let args: Vec<&str> = base.iter().chain(extra).copied().collect();
            parse(&args)
        };

        // not a 3f+1 committee
        assert!(with(&[
            "--operator-ids",
            "1,2,3",
            "--operator-keys",
            "a,b,c",
            "--amount",
            "1"
        ])
        .is_err());
        // ids and keys differ in length
        assert!(with(&["--operator-ids", "1,2,3,4", "--operator-keys", "a,b,c", "--amount", "1"])
            .is_err());
        // no context
        assert!(with(&["--operator-ids", "1,2,3,4", "--operator-keys", KEYS]).is_err());
        // bad owner
        assert!(with(&[
            "--operator-ids",
            "1,2,3,4",
            "--operator-keys",
            KEYS,
            "--owner-address",
            "0x12"
        ])
        .is_err());
        // unknown version
        assert!(with(&[
            "--operator-ids",
            "1,2,3,4",
            "--operator-keys",
            KEYS,
            "--amount",
            "1",
            "--version",
            "v9"
        ])
        .is_err());
        // nonce without owner
        assert!(with(&[
            "--operator-ids",
            "1,2,3,4",
            "--operator-keys",
            KEYS,
            "--owner-nonce",
            "1"
        ])
        .is_err());
    }

    #[test]
    fn test_owner_nonce_range() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        let keystores = dir.path().to_str().unwrap();
        let with_nonce = |nonce: u64| {
            let nonce = nonce.to_string();
            parse(&[
                "ssv-keys",
                "shares",
                "--keystore",
                keystores,
                "--password",
                "secret",
                "--operator-ids",
                "1,2,3,4",
                "--operator-keys",
                KEYS,
                "--owner-address",
                "0x1111111111111111111111111111111111111111",
                "--owner-nonce",
                &nonce,
            ])
        };

        let config = shares(with_nonce(u64::MAX - 1).expect("Valid configuration"));
        assert_eq!(config.context(1).owner.map(|owner| owner.nonce), Some(u64::MAX));

        // the second keystore would need nonce u64::MAX + 1
        assert!(with_nonce(u64::MAX).is_err());
    }

    #[test]
    fn test_missing_keystore() {
        let result = parse(&[
            "ssv-keys",
            "shares",
            "--keystore",
            "/does/not/exist.json",
            "--password",
            "secret",
            "--operator-ids",
            "1,2,3,4",
            "--operator-keys",
            KEYS,
            "--amount",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_config() {
        let config = parse(&["ssv-keys", "--debug-level", "debug", "verify", "--file", "keys.json"])
            .expect("Valid configuration");
        assert_eq!(config.debug_level, "debug");
        match config.command {
            CommandConfig::Verify(verify) => assert_eq!(verify.file, PathBuf::from("keys.json")),
            other => panic!("Expected verify config, got {other:?}"),
        }
    }
}
