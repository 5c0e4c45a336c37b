mod cli;
mod config;
mod cookies;
mod output;

use std::io;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use gphoto_client::{Client, HttpContext, PageTokenSource, StaticToken, TokenSource};

use cli::{Cli, Command, CollectionsAction};
use output::Format;

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    if let Err(err) = run(cli) {
        eprintln!("gphoto error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = config::load(cli.config.as_deref())?;
    let mut client = connect(&cli, settings)?;
    let format = Format::from_flag(cli.json);
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Upload { path, name, collection, quiet } => {
            let mut report = |done: u64, total: u64| output::progress(done, total);
            let progress: Option<gphoto_client::Progress<'_>> =
                if quiet { None } else { Some(&mut report) };
            let item = client
                .upload(&path, name.as_deref(), collection.as_deref(), progress)
                .with_context(|| format!("failed to upload {}", path.display()))?;
            output::item(&mut out, format, &item)
        }
        Command::Collections { action: CollectionsAction::List } => {
            let collections = client.list_collections().context("failed to list collections")?;
            output::collections(&mut out, format, &collections)
        }
        Command::Collections { action: CollectionsAction::Create { name } } => {
            let collection = client
                .create_collection(&name)
                .with_context(|| format!("failed to create collection {name}"))?;
            output::collection(&mut out, format, &collection)
        }
        Command::Collections { action: CollectionsAction::Add { collection_id, item_id } } => {
            client
                .add_to_collection(&collection_id, &item_id)
                .with_context(|| format!("failed to add {item_id} to {collection_id}"))?;
            output::done(&mut out, format, &format!("added {item_id} to {collection_id}"))
        }
        Command::Remove { item_id } => {
            client
                .remove_from_collection(&item_id)
                .with_context(|| format!("failed to remove {item_id}"))?;
            output::done(&mut out, format, &format!("removed {item_id}"))
        }
    }
}

/// Builds a client from `--token`, `--cookies` and the config file.
fn connect(cli: &Cli, settings: config::CliConfig) -> Result<Client> {
    let cookie_path = cli.cookies.clone().or(settings.cookies);
    let cookie_header = cookie_path
        .as_deref()
        .map(cookies::load_cookie_header)
        .transpose()?;

    let client_config = settings.client;
    let mut http = HttpContext::new(&client_config);
    if let Some(header) = &cookie_header {
        http = http.with_cookie_header(header.as_str());
    }

    let source: Box<dyn TokenSource> = match (&cli.token, &cookie_header) {
        (Some(token), _) => Box::new(StaticToken::new(token.as_str())?),
        (None, Some(_)) => Box::new(PageTokenSource::new(client_config.endpoints.home.clone())),
        (None, None) => {
            return Err(anyhow!("no credentials: pass --cookies <file> or --token <token>"))
        }
    };
    Ok(Client::with_http(client_config, http, source)?)
}
