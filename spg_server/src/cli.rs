use std::{env, env::VarError};

/// The server takes no arguments. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // API keys, the IPN secret, the admin token and the bot token are deliberately left out
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "SPG_HOST",
        "SPG_PORT",
        "SPG_DATABASE_URL",
        "SPG_ADMIN_IDS",
        "SPG_TOPUP_AMOUNT",
        "SPG_REFERRAL_BONUS",
        "SPG_RESERVE_STOCK",
        "SPG_SEED_CATALOG",
        "SPG_NOWPAYMENTS_SANDBOX",
        "SPG_NOWPAYMENTS_BASE_URL",
        "SPG_IPN_CALLBACK_URL",
        "SPG_NOWPAYMENTS_TIMEOUT",
        "SPG_NOWPAYMENTS_RETRIES",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
