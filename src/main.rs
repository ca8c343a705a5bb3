use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::signal;

use fablespeak::audio::{PlaybackController, PlaybackEngine};
use fablespeak::catalog::{Language, PERSONAS, TONES, VoiceName};
use fablespeak::config::{Config, DEFAULT_CONFIG_FILE};
use fablespeak::connectivity::Connectivity;
use fablespeak::gemini::GeminiClient;
use fablespeak::store::StoryStore;
use fablespeak::story::Story;
use fablespeak::StoryApp;

#[derive(Parser)]
#[command(name = "fablespeak", version, about = "Narrated short stories, kept for offline listening")]
struct Cli {
    /// Config file (defaults to ./fablespeak.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a story with narration and save it to the library
    Generate {
        prompt: String,
        /// Narrator persona id (see `personas`)
        #[arg(long)]
        persona: Option<String>,
        /// Story language: en or hi
        #[arg(long)]
        lang: Option<Language>,
        /// Play the narration once it is ready
        #[arg(long)]
        play: bool,
    },
    /// List saved stories, newest first
    List,
    /// Print a saved story
    Show { id: String },
    /// Play a saved story's narration (Ctrl+C stops)
    Play { id: String },
    /// Export a saved story's narration as a WAV file
    Export {
        id: String,
        /// Output directory (defaults to `export_dir` from the config)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Delete a saved story
    Delete { id: String },
    /// List narrator personas
    Personas {
        #[arg(long)]
        lang: Option<Language>,
    },
    /// List narration tones
    Tones {
        #[arg(long)]
        lang: Option<Language>,
    },
    /// Show network status
    Status,
    /// Write a default config file
    InitConfig {
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn build_engine(config: &Config) -> Arc<dyn PlaybackEngine> {
    #[cfg(feature = "alsa")]
    {
        Arc::new(fablespeak::audio::AlsaEngine::new(config.playback.clone()))
    }
    #[cfg(not(feature = "alsa"))]
    {
        let _ = config;
        log::warn!("Built without the `alsa` feature, playback will be silent");
        Arc::new(fablespeak::audio::NullEngine)
    }
}

fn print_story_line(story: &Story) {
    let created = story
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    let audio = if story.has_audio() { "♪" } else { " " };
    println!("{} {}  {}  {}  [{}]", audio, story.id, created, story.title, story.language);
}

async fn play_to_end(app: &StoryApp, config: &Config, id: &str) -> anyhow::Result<()> {
    let mut player = PlaybackController::new(build_engine(config), config.sample_rate, 1);
    let story = app.play(id, &mut player).await?;
    println!("Playing \"{}\" ({}). Ctrl+C to stop.", story.title, story.byline());

    let interrupted = tokio::select! {
        _ = player.wait() => false,
        _ = signal::ctrl_c() => true,
    };
    if interrupted {
        player.stop();
        println!("Stopped.");
    } else {
        println!("Finished.");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    let cli = Cli::parse();

    if let Command::InitConfig { path, force } = &cli.command {
        let path = path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
        let text = Config::default_toml()?;
        std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    // 加载配置
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    log::debug!("Loaded {:?}", config);

    let probe = Arc::new(Connectivity::new(&config)?);
    let mut app = StoryApp::new(
        StoryStore::new(config.store_path.clone()),
        probe,
        config.sample_rate,
    );

    match cli.command {
        Command::Generate {
            prompt,
            persona,
            lang,
            play,
        } => {
            let client = GeminiClient::new(config.require_api_key()?, &config)?;
            app = app.with_generator(Arc::new(client));

            let persona = persona.unwrap_or_else(|| config.default_persona.clone());
            let lang = lang.unwrap_or(config.default_language);
            println!("Narrating...");
            let story = app.generate(&prompt, &persona, lang).await?;

            println!("\n{}\n{}\n\n{}\n", story.title, story.byline(), story.content);
            println!("Saved as {}", story.id);
            if play && story.has_audio() {
                play_to_end(&app, &config, &story.id).await?;
            }
        }
        Command::List => {
            let stories = app.list().await?;
            if stories.is_empty() {
                println!("No Stories Found. Generate your first story to see it here.");
            }
            for story in &stories {
                print_story_line(story);
            }
        }
        Command::Show { id } => {
            let story = app.get(&id).await?;
            println!("{}\n{}\n\n{}", story.title, story.byline(), story.content);
        }
        Command::Play { id } => play_to_end(&app, &config, &id).await?,
        Command::Export { id, out } => {
            let dir = out.unwrap_or_else(|| config.export_dir.clone());
            let path = app.export_wav(&id, &dir).await?;
            println!("Wrote {}", path.display());
        }
        Command::Delete { id } => {
            app.delete(&id).await?;
            println!("Deleted {}", id);
        }
        Command::Personas { lang } => {
            for p in PERSONAS.iter().filter(|p| lang.is_none_or(|l| p.lang == l)) {
                let display = lang.unwrap_or(config.default_language);
                println!(
                    "{:<12} {} {:<14} {:<7} {:<12} {}",
                    p.id,
                    p.emoji,
                    p.display_name(display),
                    p.voice,
                    p.tone,
                    p.description
                );
            }
        }
        Command::Tones { lang } => {
            let display = lang.unwrap_or(config.default_language);
            for t in TONES.iter() {
                println!(
                    "{:<12} {} {:<16} {}",
                    t.id,
                    t.emoji,
                    t.display_label(display),
                    t.description
                );
            }
            println!();
            for v in VoiceName::ALL {
                println!("voice {:<7} {}", v, v.character());
            }
        }
        Command::Status => {
            let status = app.network_status().await;
            println!("{}", status.banner(config.default_language));
        }
        Command::InitConfig { .. } => unreachable!("handled before loading configuration"),
    }
    Ok(())
}
