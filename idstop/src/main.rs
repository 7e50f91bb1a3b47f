//! Entry point for the idstop TUI. Parses args, resolves the backend URL and runs the App.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use idstop::api::parse_base;
use idstop::app::App;
use idstop::logging;
use idstop::profiles::{load_profiles, save_profiles, ProfileEntry, ProfileRequest, ResolveProfile};

const DEFAULT_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Default)]
struct ParsedArgs {
    url: Option<String>,
    profile: Option<String>,
    log: Option<PathBuf>,
    save: bool,
    dry_run: bool,
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--profile NAME|-P NAME] [--save] [--log FILE|-l FILE] [--dry-run] [http://HOST:PORT]\n\
         \n\
         Default backend: {DEFAULT_URL}\n\
         Log filter: set IDSTOP_LOG (default idstop=info)"
    )
}

/// `Err` carries the text to print: usage for `--help`, otherwise the problem.
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, (String, bool)> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "idstop".into());
    let mut parsed = ParsedArgs::default();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err((usage(&prog), true)),
            "--profile" | "-P" => {
                parsed.profile = it.next();
            }
            "--log" | "-l" => {
                parsed.log = it.next().map(PathBuf::from);
            }
            "--save" => parsed.save = true,
            "--dry-run" => parsed.dry_run = true,
            _ if arg.starts_with("--profile=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        parsed.profile = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with("--log=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        parsed.log = Some(PathBuf::from(v));
                    }
                }
            }
            _ if arg.starts_with('-') => {
                return Err((format!("Unknown option '{arg}'.\n{}", usage(&prog)), false));
            }
            _ => {
                if parsed.url.is_none() {
                    parsed.url = Some(arg);
                } else {
                    return Err((format!("Unexpected argument '{arg}'.\n{}", usage(&prog)), false));
                }
            }
        }
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err((msg, help)) => {
            if help {
                println!("{msg}");
                return Ok(());
            }
            eprintln!("{msg}");
            std::process::exit(2);
        }
    };

    let Some(url) = resolve_url(&parsed)? else {
        return Ok(());
    };
    if parsed.dry_run {
        println!("{url}");
        return Ok(());
    }

    // The guard flushes the log writer when main returns
    let (log_path, _log_guard) = logging::init(parsed.log.clone())?;
    info!(%url, log = %log_path.display(), "starting idstop");

    let mut app = App::connect(&url)
        .await
        .with_context(|| format!("connecting to {url}"))?;
    app.run().await
}

/// Applies the profile rules. `None` means the user aborted a prompt.
fn resolve_url(parsed: &ParsedArgs) -> anyhow::Result<Option<String>> {
    let mut profiles = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        url: parsed.url.clone(),
    };

    let url = match req.resolve(&profiles) {
        ResolveProfile::Direct(u) => {
            validate_url(&u)?;
            if let Some(name) = parsed.profile.as_ref() {
                let write = match profiles.profiles.get(name) {
                    // New profile: save on first use
                    None => true,
                    Some(entry) if entry.url != u => {
                        parsed.save
                            || prompt_yes_no(&format!("Overwrite existing profile '{name}'? [y/N]: "))
                    }
                    Some(_) => false,
                };
                if write {
                    profiles
                        .profiles
                        .insert(name.clone(), ProfileEntry { url: u.clone() });
                    save_profiles(&profiles).context("saving profiles")?;
                }
            }
            u
        }
        ResolveProfile::Loaded(u) => u,
        ResolveProfile::PromptSelect(names) => {
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ")?;
            let picked = line
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| idx.checked_sub(1))
                .and_then(|idx| names.get(idx))
                .and_then(|name| profiles.profiles.get(name));
            match picked {
                Some(entry) => entry.url.clone(),
                None => return Ok(None),
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string("Enter URL (http://HOST:PORT): ")?;
            let url = url.trim().to_string();
            if url.is_empty() {
                return Ok(None);
            }
            validate_url(&url)?;
            profiles
                .profiles
                .insert(name, ProfileEntry { url: url.clone() });
            save_profiles(&profiles).context("saving profiles")?;
            url
        }
        ResolveProfile::None => DEFAULT_URL.to_string(),
    };
    // Saved profiles can be hand-edited
    validate_url(&url)?;
    Ok(Some(url))
}

/// Rejects unusable URLs before they are saved or reach the terminal.
fn validate_url(url: &str) -> anyhow::Result<()> {
    parse_base(url).with_context(|| format!("invalid backend URL '{url}'"))?;
    Ok(())
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("idstop")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_all_flags() {
        let p = parse_args(args(&["-P", "lab", "--save", "-l", "/tmp/x.log", "--dry-run", "http://h:1"]))
            .unwrap();
        assert_eq!(p.profile.as_deref(), Some("lab"));
        assert!(p.save && p.dry_run);
        assert_eq!(p.log, Some(PathBuf::from("/tmp/x.log")));
        assert_eq!(p.url.as_deref(), Some("http://h:1"));
    }

    #[test]
    fn equals_forms() {
        let p = parse_args(args(&["--profile=lab", "--log=a.log"])).unwrap();
        assert_eq!(p.profile.as_deref(), Some("lab"));
        assert_eq!(p.log, Some(PathBuf::from("a.log")));
    }

    #[test]
    fn help_and_errors() {
        assert!(matches!(parse_args(args(&["--help"])), Err((_, true))));
        assert!(matches!(parse_args(args(&["--bogus"])), Err((_, false))));
        assert!(matches!(parse_args(args(&["http://a", "http://b"])), Err((_, false))));
    }
}
