use std::fs;
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::account::{self, AccountClient, AccountService, Session, SessionStore};
use crate::asset::{self, HostEnv, ImageSource, select_sink};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::{AppError, NetworkError};
use crate::output::{
    catalog_json, prediction_json, print_catalog, print_prediction, save_outcome_json,
};
use crate::predict::PredictClient;
use crate::state::RequestState;

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => warn!(error = %e, "could not render JSON output"),
    }
}

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) config: &'a Config,
    pub(crate) sessions: SessionStore,
}

impl CommandContext<'_> {
    fn account_client(&self) -> Result<AccountClient, AppError> {
        let url = self.config.service_url.as_deref().ok_or_else(|| {
            AppError::Config(
                "account service URL not set (service_url or FITCHECK_SERVICE_URL)".to_string(),
            )
        })?;
        let key = self.config.service_key.as_deref().ok_or_else(|| {
            AppError::Config(
                "account service key not set (service_key or FITCHECK_SERVICE_KEY)".to_string(),
            )
        })?;
        Ok(AccountClient::new(url, key))
    }

    fn predict_client(&self) -> PredictClient {
        PredictClient::new(self.cli.predict_url())
    }

    fn host_env(&self, dir: Option<&Path>, create_dir: bool, force_download: bool) -> HostEnv {
        let clothes_dir = if force_download {
            None
        } else {
            dir.map(Path::to_path_buf)
                .or_else(|| self.config.clothes_dir.clone())
        };
        let downloads_dir = self
            .config
            .downloads_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        HostEnv {
            clothes_dir,
            create_dir: create_dir || self.config.create_dir,
            downloads_dir,
        }
    }
}

/// Password from the flag, else one line of stdin.
fn resolve_password(flag: Option<&str>) -> Result<String, AppError> {
    if let Some(password) = flag {
        return Ok(password.to_string());
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        // prompt only
        std::io::stderr().flush().ok();
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .map_err(|source| AppError::ReadInput {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn handle_login(
    ctx: &CommandContext<'_>,
    email: &str,
    password: Option<&str>,
    admin: bool,
) -> Result<(), AppError> {
    let service = ctx.account_client()?;
    let password = resolve_password(password)?;
    let session = if admin {
        account::admin_login(&service, email, &password)?
    } else {
        account::member_login(&service, email, &password)?
    };
    ctx.sessions.save(&session)?;
    debug!(path = %ctx.sessions.path().display(), admin, "session stored");

    if ctx.cli.json {
        print_json(&session_json(Some(&session)));
    } else {
        println!("Welcome {}", session.display_name);
    }
    Ok(())
}

fn handle_register(
    ctx: &CommandContext<'_>,
    email: &str,
    password: Option<&str>,
) -> Result<(), AppError> {
    let service = ctx.account_client()?;
    let password = resolve_password(password)?;
    account::register(&service, email, &password)?;

    if ctx.cli.json {
        print_json(&json!({ "created": true, "email": email }));
    } else {
        println!("Account created! Sign in with `fitcheck login {email}`.");
    }
    Ok(())
}

fn handle_logout(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let service = ctx.account_client().ok();
    if service.is_none() {
        debug!("account service not configured, skipping remote sign out");
    }
    let previous = account::logout(
        service.as_ref().map(|s| s as &dyn AccountService),
        &ctx.sessions,
    )?;

    if ctx.cli.json {
        print_json(&json!({ "signed_out": previous.is_some() }));
    } else {
        match previous {
            Some(session) => println!("Signed out {}", session.display_name),
            None => println!("Not signed in."),
        }
    }
    Ok(())
}

fn session_json(session: Option<&Session>) -> Value {
    match session {
        Some(s) => json!({
            "signed_in": true,
            "display_name": s.display_name,
            "email": s.email,
            "is_admin": s.is_admin,
            "signed_in_at": s.signed_in_at,
        }),
        None => json!({ "signed_in": false }),
    }
}

fn handle_whoami(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let session = ctx.sessions.load();
    if ctx.cli.json {
        print_json(&session_json(session.as_ref()));
        return Ok(());
    }
    match session {
        Some(s) if s.is_admin => println!("Hello, {} (admin)", s.display_name),
        Some(s) => println!("Hello, {}", s.display_name),
        None => println!("Not logged in"),
    }
    Ok(())
}

fn handle_upload(
    ctx: &CommandContext<'_>,
    image: &Path,
    save_matches: Option<&Path>,
) -> Result<(), AppError> {
    let session = ctx.sessions.load().ok_or(AppError::NotSignedIn)?;
    debug!(user = %session.display_name, "upload requested");

    let image = ImageSource::read(image)?;
    let client = ctx.predict_client();
    let mut state = RequestState::default();
    let prediction = client.predict(&mut state, &image)?;

    let mut saved = Vec::new();
    if let Some(dir) = save_matches {
        for path in &prediction.matches {
            match client.fetch_match(path, dir) {
                Ok(dest) => saved.push(dest),
                Err(e) => warn!(item = %path, error = %e, "could not download match"),
            }
        }
        info!(saved = saved.len(), dir = %dir.display(), "matches downloaded");
    }

    if ctx.cli.json {
        let mut value = prediction_json(&prediction, |m| client.match_url(m));
        if save_matches.is_some() {
            value["saved"] = json!(
                saved
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
            );
        }
        print_json(&value);
    } else {
        println!("Uploaded, results ready");
        print_prediction(&prediction, |m| client.match_url(m), ctx.cli.use_color());
        if let Some(dir) = save_matches {
            println!("Saved {} match image(s) to {}", saved.len(), dir.display());
        }
    }
    Ok(())
}

fn handle_ping(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    let client = ctx.predict_client();
    if !client.ping()? {
        return Err(NetworkError::Service(format!(
            "Prediction backend at {} is not healthy",
            client.base_url()
        ))
        .into());
    }
    if ctx.cli.json {
        print_json(&json!({ "ok": true, "url": client.base_url() }));
    } else {
        println!("Prediction backend at {} is up", client.base_url());
    }
    Ok(())
}

pub(crate) struct SaveArgs<'a> {
    pub(crate) image: Option<&'a Path>,
    pub(crate) name: Option<&'a str>,
    pub(crate) label: Option<&'a str>,
    pub(crate) label_file: Option<&'a Path>,
    pub(crate) dir: Option<&'a Path>,
    pub(crate) create_dir: bool,
    pub(crate) download: bool,
}

fn handle_save(ctx: &CommandContext<'_>, args: SaveArgs<'_>) -> Result<(), AppError> {
    let session = ctx.sessions.load();
    if !session.as_ref().is_some_and(|s| s.is_admin) {
        return Err(AppError::AdminRequired);
    }

    let image = args.image.map(ImageSource::read).transpose()?;
    let label_text = match (args.label, args.label_file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => fs::read_to_string(path).map_err(|source| AppError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?,
        (None, None) => String::new(),
    };
    let base_name = match args.name {
        Some(name) => name.to_string(),
        None => image.as_ref().map(|i| i.stem().to_string()).unwrap_or_default(),
    };

    let sink = select_sink(&ctx.host_env(args.dir, args.create_dir, args.download));
    let mut state = RequestState::default();
    let outcome = asset::save_pair(&mut state, sink.as_ref(), &base_name, image, &label_text)?;

    if ctx.cli.json {
        print_json(&save_outcome_json(&outcome, sink.name()));
    } else {
        let (image, label) = outcome.paths();
        println!("{}", outcome.message());
        println!("  image: {}", image.display());
        println!("  label: {}", label.display());
    }
    Ok(())
}

fn handle_catalog(ctx: &CommandContext<'_>, dir: Option<&Path>) -> Result<(), AppError> {
    let dir = dir
        .map(Path::to_path_buf)
        .or_else(|| ctx.config.clothes_dir.clone())
        .ok_or_else(|| {
            AppError::Config("no clothes folder: pass --dir or set clothes_dir".to_string())
        })?;
    let catalog = asset::scan(&dir)?;

    if ctx.cli.json {
        print_json(&catalog_json(&catalog));
    } else {
        print_catalog(&catalog, ctx.cli.use_color());
    }
    Ok(())
}

/// Dispatch the parsed command
pub(crate) fn run(ctx: &CommandContext<'_>) -> Result<(), AppError> {
    match &ctx.cli.command {
        Commands::Login {
            email,
            password,
            admin,
        } => handle_login(ctx, email, password.as_deref(), *admin),
        Commands::Register { email, password } => {
            handle_register(ctx, email, password.as_deref())
        }
        Commands::Logout => handle_logout(ctx),
        Commands::Whoami => handle_whoami(ctx),
        Commands::Upload {
            image,
            save_matches,
        } => handle_upload(ctx, image, save_matches.as_deref()),
        Commands::Ping => handle_ping(ctx),
        Commands::Save {
            image,
            name,
            label,
            label_file,
            dir,
            create_dir,
            download,
        } => handle_save(
            ctx,
            SaveArgs {
                image: image.as_deref(),
                name: name.as_deref(),
                label: label.as_deref(),
                label_file: label_file.as_deref(),
                dir: dir.as_deref(),
                create_dir: *create_dir,
                download: *download,
            },
        ),
        Commands::Catalog { dir } => handle_catalog(ctx, dir.as_deref()),
    }
}
