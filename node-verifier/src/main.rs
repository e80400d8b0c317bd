// src/main.rs
//
// One-shot command-line check against a single node:
//
// - normalizes the hostname and resolves it (0.5 s DNS budget),
// - scrapes /metrics twice with a 1 s pause in between,
// - reports whether the committed version advanced,
// - geolocates the node when MaxMind credentials are set.

use node_verifier::{DEFAULT_API_PORT, DEFAULT_METRICS_PORT, DefaultNodeVerifier, VerifierConfig};

fn main() {
    if let Err(err) = run() {
        eprintln!("fatal error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = std::env::args().skip(1);
    let hostname = args
        .next()
        .ok_or_else(|| "usage: node-verifier <hostname> [metrics_port] [http_api_port]".to_string())?;
    let metrics_port = parse_port(args.next(), DEFAULT_METRICS_PORT)?;
    let http_api_port = parse_port(args.next(), DEFAULT_API_PORT)?;

    let config = VerifierConfig::from_env();
    let has_maxmind = config.maxmind.is_some();

    let verifier = DefaultNodeVerifier::new(&hostname, metrics_port, http_api_port, &config)
        .map_err(|e| format!("failed to construct verifier: {e}"))?;

    match verifier.ip() {
        Ok(ip) => println!("resolved {} to {ip}", verifier.hostname()),
        Err(e) => eprintln!("could not resolve {}: {e}", verifier.hostname()),
    }

    if has_maxmind {
        match verifier.location() {
            Ok(record) => println!("location: {record}"),
            Err(e) => eprintln!("location lookup failed: {e}"),
        }
    }

    let mut all_passed = true;
    for outcome in verifier.verify() {
        let status = if outcome.passed { "PASS" } else { "FAIL" };
        let message = outcome.message.unwrap_or_default();
        println!("[{status}] {message}");
        all_passed &= outcome.passed;
    }

    if !all_passed {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_port(arg: Option<String>, default: u16) -> Result<u16, String> {
    match arg {
        None => Ok(default),
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|e| format!("invalid port `{raw}`: {e}")),
    }
}
