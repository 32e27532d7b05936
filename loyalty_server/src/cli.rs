use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
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
    // Be explicit about which envars to print. The database URL can carry credentials for other backends.
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "LPG_HOST",
        "LPG_PORT",
        "LPG_ACCRUAL_SYSTEM_URL",
        "LPG_ACCRUAL_TIMEOUT",
        "LPG_AUTH_HEADER",
        "LPG_QUEUE_CAPACITY",
        "LPG_POLL_INTERVAL",
        "LPG_PERSISTENCE_RETRY_DELAY",
        "LPG_MAX_NETWORK_FAILURES",
        "LPG_MAX_POLLS_PER_VISIT",
        "LPG_MAX_REQUEUES",
        "LPG_REQUEUE_DELAY",
        "LPG_RUN_MIGRATIONS",
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
