use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, bail};
use directories::BaseDirs;
use reqwest::cookie::{CookieStore, Jar};
use rpassword::prompt_password;
use shared::{config::ClientConfig, models::Account};
use stores::StoreContext;
use tracing::warn;
use url::Url;

/// Signs in with `username` and a password read from the terminal, then stores the
/// session cookies at `jar_path`.
pub async fn login(
    config: &ClientConfig,
    jar_path: &Path,
    username: &str,
    remember_me: bool,
) -> Result<()> {
    let password = prompt_password("Password: ")?;
    if password.trim().is_empty() {
        bail!("password must not be empty");
    }

    let origin = config.origin()?;
    ensure_parent(jar_path)?;
    let jar = Arc::new(Jar::default());
    let context = connect(config, Arc::clone(&jar))?;

    let Some(account) = context
        .authentication()
        .login(username, &password, remember_me)
        .await?
    else {
        bail!("login rejected; check the username and password");
    };

    persist_cookie_jar(&jar, &origin, jar_path)?;
    println!("{}", format_account(&account));
    println!("cookies stored at {}", jar_path.display());
    Ok(())
}

/// Prints the account behind the stored session.
pub async fn me(config: &ClientConfig, jar_path: &Path, json: bool) -> Result<()> {
    let origin = config.origin()?;
    let jar = load_cookie_jar(&origin, jar_path)
        .context("no active session found; run `console login` first")?;
    let context = connect(config, Arc::clone(&jar))?;

    let Some(account) = context.authentication().get_account().await? else {
        bail!("session expired. run `console login` to sign in again");
    };

    persist_cookie_jar(&jar, &origin, jar_path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
    } else {
        println!("{}", format_account(&account));
    }
    Ok(())
}

/// Ends the session on the server and removes the stored cookies.
///
/// The local cookie file is removed even when the server cannot be reached.
pub async fn logout(config: &ClientConfig, jar_path: &Path) -> Result<()> {
    let origin = config.origin()?;

    match load_cookie_jar(&origin, jar_path) {
        Ok(jar) => {
            let context = connect(config, jar)?;
            if let Err(err) = context.authentication().logout().await {
                warn!(error = %err, "logout request failed");
            }
        }
        Err(err) => warn!(error = %err, "no stored session to end"),
    }

    if jar_path.exists() {
        fs::remove_file(jar_path)
            .with_context(|| format!("failed to remove session jar {}", jar_path.display()))?;
        println!("Removed session cookies at {}", jar_path.display());
    } else {
        println!("No session cookies found at {}", jar_path.display());
    }
    Ok(())
}

/// Default location of the session cookie file.
pub fn session_path() -> PathBuf {
    BaseDirs::new().map_or_else(
        || PathBuf::from("./session.cookies"),
        |dirs| dirs.config_dir().join("console").join("session.cookies"),
    )
}

/// Builds the store context over `jar`.
pub fn connect(config: &ClientConfig, jar: Arc<Jar>) -> Result<StoreContext> {
    StoreContext::connect(config, jar).context("failed to prepare the console client")
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create session directory {}", parent.display()))?;
    }
    Ok(())
}

/// Restores the cookies saved by [`persist_cookie_jar`].
pub fn load_cookie_jar(origin: &Url, path: &Path) -> Result<Arc<Jar>> {
    if !path.exists() {
        bail!("session cookie jar not found at {}", path.display());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session jar {}", path.display()))?;
    let jar = Arc::new(Jar::default());
    for entry in contents.split(';') {
        let cookie = entry.trim();
        if !cookie.is_empty() {
            jar.add_cookie_str(cookie, origin);
        }
    }
    Ok(jar)
}

/// Saves the cookies the jar would send to `origin`, readable by the owner only.
///
/// An empty jar removes any previous file.
pub fn persist_cookie_jar(jar: &Jar, origin: &Url, path: &Path) -> Result<()> {
    if let Some(header) = jar.cookies(origin) {
        fs::write(path, header.to_str()?.as_bytes())
            .with_context(|| format!("failed to write session jar at {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .context("failed to set session jar permissions")?;
        }
    } else if path.exists() {
        fs::remove_file(path).ok();
    }
    Ok(())
}

fn format_account(account: &Account) -> String {
    let mut lines = vec![format!(
        "Logged in as {}",
        account.display_name().unwrap_or_else(|| "<unnamed>".to_string())
    )];
    if let Some(login) = &account.login {
        lines.push(format!("login: {login}"));
    }
    if let Some(email) = &account.email {
        lines.push(format!("email: {email}"));
    }
    if !account.authorities.is_empty() {
        lines.push(format!("authorities: {}", account.authorities.join(", ")));
    }
    lines.join("\n")
}
