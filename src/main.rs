use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use playlist_scribe::cli::{Cli, Commands, SubtitleFormat};
use playlist_scribe::session::{Derived, PlaylistState};
use playlist_scribe::utils::{format_relative_time, normalize_language};
use playlist_scribe::{
    source, CannedGenerator, ChatCompletionGenerator, Config, JsonFileStore, PlaylistResult,
    Session, TextGenerator, UserStore, YoutubeSource,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match &cli.command {
        // Offline commands work without a config file
        Commands::Subtitles {
            file,
            format,
            output,
        } => return write_subtitles(file, *format, output.as_deref()),
        Commands::Languages => {
            let config = Config::load().await.unwrap_or_default();
            println!("Supported languages:");
            for language in &config.generation.supported_languages {
                let marker = if *language == config.generation.default_language {
                    " (default)"
                } else {
                    ""
                };
                println!("  • {}{}", language, marker);
            }
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load().await?;

    match &cli.command {
        Commands::Fetch { input } => {
            let source = youtube_source(&config)?;
            let progress = spinner(cli.quiet, "Fetching playlist...")?;
            let playlist = source::resolve_and_fetch_playlist(&source, input).await;
            progress.finish_and_clear();
            print_playlist(&playlist?);
        }
        Commands::Transcript {
            input,
            item,
            language,
            format,
            summary,
            topics,
            edit,
        } => {
            let mut session = build_session(&cli, &config)?;
            load_playlist(&mut session, input, cli.quiet).await?;

            if !session.open_item(item) {
                anyhow::bail!("No video with id {} in this playlist", item);
            }
            let title = session
                .open()
                .map(|open| open.item().title.clone())
                .unwrap_or_default();
            println!("{}", style(&title).bold());

            if let Some(path) = edit {
                let text = fs_err::read_to_string(path).context("Failed to read edited transcript")?;
                if !session.save_edited_transcript(item, &text) {
                    anyhow::bail!("Sign in with --user to save edited transcripts");
                }
                println!("Saved your edited transcript");
            } else if session.edited_transcript(item).is_some() {
                println!("{}", style("Using your edited transcript").dim());
            } else {
                let language = language
                    .as_deref()
                    .map(normalize_language)
                    .unwrap_or_else(|| config.generation.default_language.clone());

                let progress = spinner(cli.quiet, &format!("Generating {} transcript...", language))?;
                session.generate_transcript(&language).await;
                progress.finish_and_clear();

                if let Some(message) = session.open().and_then(|open| open.transcript().error()) {
                    anyhow::bail!("{}", message);
                }
            }

            if *summary {
                let progress = spinner(cli.quiet, "Summarizing...")?;
                session.generate_summary().await;
                progress.finish_and_clear();
                if let Some(open) = session.open() {
                    print_derived("Summary", open.summary(), |text| println!("{}", text));
                }
            }

            if *topics {
                let progress = spinner(cli.quiet, "Extracting key topics...")?;
                session.extract_key_topics().await;
                progress.finish_and_clear();
                if let Some(open) = session.open() {
                    print_derived("Key topics", open.key_topics(), |topics| {
                        for topic in topics {
                            println!("  • {}", topic);
                        }
                    });
                }
            }

            let artifact = session.export_open_item(*format)?;
            let path = artifact.save_to_dir(&config.output_dir())?;
            println!("Transcript saved to: {}", path.display());
        }
        Commands::Batch {
            input,
            items,
            all,
            language,
        } => {
            let mut session = build_session(&cli, &config)?;
            load_playlist(&mut session, input, cli.quiet).await?;

            if *all {
                session.toggle_select_all();
            } else {
                for id in items {
                    if !session.toggle_selection(id) {
                        tracing::warn!("Skipping {}: not in this playlist", id);
                    }
                }
            }
            let selected: HashSet<String> = session.selected_ids();
            if selected.is_empty() {
                anyhow::bail!("None of the requested videos are in this playlist");
            }

            let language = language
                .as_deref()
                .map(normalize_language)
                .unwrap_or_else(|| config.generation.default_language.clone());

            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::warn!("Interrupted, finishing the current video");
                        cancel.cancel();
                    }
                }
            });

            let progress = if cli.quiet {
                ProgressBar::hidden()
            } else {
                ProgressBar::new(selected.len() as u64)
            };
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?,
            );
            progress.set_message("Generating transcripts...");

            let outcome = session
                .run_selected_batch(&language, &cancel, |run| {
                    progress.set_position(run.processed() as u64)
                })
                .await;
            progress.finish_and_clear();

            println!(
                "{} succeeded, {} failed",
                style(outcome.succeeded).green(),
                style(outcome.failed).red()
            );
            if outcome.cancelled {
                println!("{}", style("Batch cancelled").yellow());
            }
            if !outcome.errors.is_empty() {
                println!("Some transcripts could not be generated:");
                for error in &outcome.errors {
                    println!("  • {}", error);
                }
            }
            if let Some(bundle) = outcome.bundle {
                let path = bundle.save_to_dir(&config.output_dir())?;
                println!("Transcripts saved to: {}", path.display());
            }
        }
        Commands::History { playlist } => {
            let Some(user) = cli.user.as_deref() else {
                anyhow::bail!("Sign in with --user to see your export history");
            };
            let store = JsonFileStore::new(config.data_dir());
            let data = store.load(user)?.unwrap_or_default();
            let history = &data.export_history;

            if history.is_empty() {
                println!("No exports yet");
                return Ok(());
            }

            let now = chrono::Utc::now();
            for (label, count) in history.groups() {
                if playlist.as_deref().map_or(false, |wanted| wanted != label) {
                    continue;
                }
                println!("{} ({})", style(&label).bold(), count);
                for record in history.filtered(Some(label.as_str())) {
                    println!(
                        "  {}  {} [{}] {}",
                        style(&record.id).dim(),
                        record.item_title,
                        record.format,
                        style(format_relative_time(record.exported_at, now)).dim()
                    );
                }
            }
        }
        Commands::Redownload { record_id, input } => {
            let mut session = build_session(&cli, &config)?;
            if session.current_user().is_none() {
                anyhow::bail!("Sign in with --user to re-download past exports");
            }
            load_playlist(&mut session, input, cli.quiet).await?;

            let progress = spinner(cli.quiet, "Regenerating transcript...")?;
            let artifact = session.redownload_export(record_id).await;
            progress.finish_and_clear();

            let path = artifact?.save_to_dir(&config.output_dir())?;
            println!("Transcript saved to: {}", path.display());
        }
        Commands::Config { show } => {
            if *show {
                config.display();
            } else {
                println!("Edit the config file to change settings:");
                println!("  {}", Config::config_path()?.display());
            }
        }
        Commands::Subtitles { .. } | Commands::Languages => {}
    }

    Ok(())
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose {
        "playlist_scribe=debug"
    } else {
        "playlist_scribe=info"
    };
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()));

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn spinner(quiet: bool, message: &str) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    progress.set_message(message.to_string());
    progress.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(progress)
}

fn youtube_source(config: &Config) -> Result<YoutubeSource> {
    let api_key = config.youtube_api_key().with_context(|| {
        format!(
            "YouTube API key is not configured. Set YOUTUBE_API_KEY or youtube.api_key in {}",
            Config::config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "config.yaml".to_string())
        )
    })?;

    Ok(YoutubeSource::new(api_key)
        .with_base_url(config.youtube.api_base_url.clone())
        .with_max_items(config.youtube.max_items))
}

fn text_generator(offline: bool, config: &Config) -> Result<Arc<dyn TextGenerator>> {
    if offline {
        tracing::info!("Using the offline sample generator");
        return Ok(Arc::new(CannedGenerator::new()));
    }

    let provider = config.generation.provider;
    let api_key = config.generation_api_key().with_context(|| {
        format!(
            "No API key for {}. Set {} or generation.api_key, or pass --offline",
            provider.name(),
            provider.config().env_var
        )
    })?;

    let mut generator = ChatCompletionGenerator::new(provider, api_key);
    if let Some(url) = &config.generation.api_url {
        generator = generator.with_api_url(url.clone());
    }
    if let Some(model) = &config.generation.model {
        generator = generator.with_model(model.clone());
    }
    Ok(Arc::new(generator))
}

fn build_session(cli: &Cli, config: &Config) -> Result<Session> {
    let source = youtube_source(config)?;
    let generator = text_generator(cli.offline, config)?;
    let store = JsonFileStore::new(config.data_dir());

    let mut session = Session::new(Arc::new(source), generator, Arc::new(store))
        .with_default_language(config.generation.default_language.clone())
        .with_batch_settle(config.batch_settle());

    if let Some(user) = &cli.user {
        if !session.login(user) {
            anyhow::bail!("User name must not be empty");
        }
    }
    Ok(session)
}

async fn load_playlist(session: &mut Session, input: &str, quiet: bool) -> Result<()> {
    let progress = spinner(quiet, "Fetching playlist...")?;
    let state = session.fetch_playlist(input).await.clone();
    progress.finish_and_clear();

    match state {
        PlaylistState::Loaded(playlist) => {
            println!(
                "{} ({} videos)",
                style(&playlist.title).bold(),
                playlist.items.len()
            );
            Ok(())
        }
        PlaylistState::Failed { message, .. } => anyhow::bail!("{}", message),
        _ => anyhow::bail!("Playlist did not load"),
    }
}

fn print_playlist(playlist: &PlaylistResult) {
    println!("{}", style(&playlist.title).bold());
    for (index, item) in playlist.items.iter().enumerate() {
        println!(
            "{:>3}. {}  {} {}",
            index + 1,
            style(&item.id).cyan(),
            item.title,
            style(format!("({})", item.source_label)).dim()
        );
    }
}

fn print_derived<T>(heading: &str, state: &Derived<T>, show: impl FnOnce(&T)) {
    match state {
        Derived::Ready(value) => {
            println!("\n{}", style(heading).bold());
            show(value);
        }
        Derived::Failed(message) => eprintln!("{} {}", style("warning:").yellow(), message),
        _ => {}
    }
}

fn write_subtitles(file: &Path, format: SubtitleFormat, output: Option<&Path>) -> Result<()> {
    let transcript = fs_err::read_to_string(file).context("Failed to read transcript file")?;
    let subtitles = format.render(&transcript);

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs_err::create_dir_all(parent)?;
            }
            fs_err::write(path, subtitles).context("Failed to write subtitles")?;
            println!("Subtitles saved to: {}", path.display());
        }
        None => print!("{}", subtitles),
    }
    Ok(())
}
