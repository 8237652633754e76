// Interactive menu
//
// Prompts are blocking; each action is driven to completion on the runtime
// before the menu is shown again.

use std::path::PathBuf;

use requestty::{ErrorKind, Question};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::app::App;
use crate::downloader::{ChainMode, DownloadError, Result};
use crate::output;

const ACTIONS: [&str; 6] = [
    "Download a video",
    "Download several videos (from a file)",
    "Configure cookies",
    "Update yt-dlp",
    "Help",
    "Exit",
];

const HELP: &str = "\
Basic use:
  1. Copy the full video URL from your browser
  2. Choose \"Download a video\" and paste it

Batch download:
  Create a .txt file with one URL per line; lines starting with # are skipped.
  Failed URLs can be saved to a file and fed back in later.

Private videos:
  Export cookies.txt from a logged-in browser (e.g. the \"Get cookies.txt\"
  extension) and choose \"Configure cookies\".

Common problems:
  - Private video: configure cookies
  - Unsupported URL: make sure it is a direct video link
  - Repeated failures: update yt-dlp
  - Facebook: the `facebook` command tries every known method";

/// `Ok(None)` when the user backed out of the prompt
fn prompt(question: Question<'_>) -> Result<Option<requestty::Answer>> {
    match requestty::prompt_one(question) {
        Ok(answer) => Ok(Some(answer)),
        Err(ErrorKind::IoError(e)) => Err(DownloadError::Io(e)),
        // Ctrl-C, Esc or end of input
        Err(_) => Ok(None),
    }
}

fn ask_text(name: &str, message: &str) -> Result<Option<String>> {
    let question = Question::input(name).message(message).build();
    Ok(prompt(question)?
        .and_then(|a| a.as_string().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty()))
}

pub(crate) fn confirm(name: &str, message: &str, default: bool) -> Result<bool> {
    let question = Question::confirm(name).message(message).default(default).build();
    Ok(prompt(question)?.and_then(|a| a.as_bool()).unwrap_or(false))
}

fn banner(app: &App) {
    println!();
    println!("=== Social video downloader ===");
    println!("Platforms: Facebook, Instagram, TikTok, YouTube, Twitter/X and many more");
    println!("Saving to: {}", app.config().output_dir().display());
    match app.credentials() {
        Some(c) => println!("Cookies:   {}", c.path().display()),
        None => println!("Cookies:   not configured"),
    }
}

pub fn run_menu(app: &mut App, runtime: &Runtime) -> Result<()> {
    loop {
        banner(app);
        let question = Question::select("action")
            .message("What do you want to do?")
            .choices(ACTIONS)
            .build();
        let Some(answer) = prompt(question)? else {
            break;
        };
        let Some(choice) = answer.as_list_item().map(|item| item.index) else {
            continue;
        };
        debug!(choice, "Menu selection");

        let outcome = match choice {
            0 => single(app, runtime),
            1 => batch(app, runtime),
            2 => cookies(app),
            3 => update(app, runtime),
            4 => {
                println!("{}", HELP);
                Ok(())
            }
            _ => break,
        };
        if let Err(e) = outcome {
            output::print_error(&e);
        }
    }

    println!("Bye!");
    Ok(())
}

fn single(app: &App, runtime: &Runtime) -> Result<()> {
    let Some(url) = ask_text("url", "Video URL:")? else {
        println!("No URL entered");
        return Ok(());
    };
    let success = runtime.block_on(app.download(&url, ChainMode::Standard))?;
    output::print_success(&success);
    Ok(())
}

fn batch(app: &App, runtime: &Runtime) -> Result<()> {
    println!("The file must contain one URL per line");
    let Some(path) = ask_text("file", "Path to the URL file:")? else {
        println!("No path entered");
        return Ok(());
    };
    let list = app.load_batch(&PathBuf::from(path))?;
    output::print_skipped(&list);
    println!("{} URLs to download", list.urls.len());

    let report = runtime.block_on(app.batch(&list))?;
    output::print_report(&report);

    if !report.failed.is_empty() && confirm("save", "Save the list of failed URLs?", true)? {
        let path = app.save_failed(&report)?;
        println!("Failed URLs saved to {}", path.display());
    }
    Ok(())
}

fn cookies(app: &mut App) -> Result<()> {
    println!("Export cookies.txt from a browser where you are logged in.");
    match ask_text("cookies", "Path to cookies.txt (empty to clear):")? {
        Some(path) => {
            app.set_credentials(Some(&PathBuf::from(path)))?;
            println!("Cookies configured");
        }
        None => {
            app.set_credentials(None)?;
            println!("Continuing without cookies; some private videos may fail");
        }
    }
    Ok(())
}

fn update(app: &App, runtime: &Runtime) -> Result<()> {
    runtime.block_on(app.update())?;
    println!("yt-dlp updated; updating weekly is recommended");
    Ok(())
}
