use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
#[clap(
    name = "ssv-keys",
    about = "Splits validator keys into encrypted operator shares and builds the registration \
    payloads for the SSV network"
)]
pub struct SsvKeys {
    #[clap(
        long,
        global = true,
        value_name = "LEVEL",
        help = "Specifies the verbosity level used when emitting logs to the terminal. \
        RUST_LOG takes precedence when set.",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        display_order = 0
    )]
    pub debug_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Split keystores across a committee of operators and write a key-shares document
    Shares(SharesArgs),
    /// Load a key-shares document and validate every item in it
    Verify(VerifyArgs),
}

#[derive(Args, Clone, Debug)]
pub struct SharesArgs {
    #[clap(
        long,
        value_name = "PATH",
        num_args = 1..,
        required = true,
        help = "EIP-2335 keystore file, or a directory whose .json files are all keystores. \
        May be given several times."
    )]
    pub keystore: Vec<PathBuf>,

    #[clap(
        long,
        value_name = "PASSWORD",
        required_unless_present = "password_file",
        conflicts_with = "password_file",
        help = "Password of the keystores"
    )]
    pub password: Option<String>,

    #[clap(
        long,
        value_name = "PATH",
        help = "File holding the password of the keystores. A trailing newline is ignored."
    )]
    pub password_file: Option<PathBuf>,

    #[clap(
        long,
        value_name = "IDS",
        value_delimiter = ',',
        required = true,
        help = "Comma separated ids of the operators in the committee"
    )]
    pub operator_ids: Vec<u64>,

    #[clap(
        long,
        value_name = "KEYS",
        value_delimiter = ',',
        required = true,
        help = "Comma separated base64 encoded RSA public keys, in the same order as the ids"
    )]
    pub operator_keys: Vec<String>,

    #[clap(
        long,
        value_name = "ADDRESS",
        help = "Address of the account that registers the validators"
    )]
    pub owner_address: Option<String>,

    #[clap(
        long,
        value_name = "NONCE",
        requires = "owner_address",
        help = "Registration nonce of the owner, 0 if not given. Each further keystore uses \
        the next nonce."
    )]
    pub owner_nonce: Option<u64>,

    #[clap(
        long,
        value_name = "WEI",
        help = "Token amount deposited with each registration, decimal or 0x prefixed hex"
    )]
    pub amount: Option<String>,

    #[clap(
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Directory the key-shares document is written to"
    )]
    pub output_folder: PathBuf,

    #[clap(
        long,
        value_name = "VERSION",
        default_value = "v3",
        help = "Schema version of the key-shares document"
    )]
    pub version: String,
}

#[derive(Args, Clone, Debug)]
pub struct VerifyArgs {
    #[clap(long, value_name = "PATH", help = "Key-shares document to check")]
    pub file: PathBuf,
}
