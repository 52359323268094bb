//! portfolio-board: console front-end.
//! Stands in for the page: renders the board to stdout, reads line commands
//! from stdin, and drives the admin content flows.
//!
//! Type `help` at the prompt for the command list.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use portfolio_board::content::{self, EditableSurface, Region, RegionMap};
use portfolio_board::metrics::Metrics;
use portfolio_board::model::RecordId;
use portfolio_board::{
    AdminMode, BoardCoordinator, BoardView, ContentDocument, Interaction, SiteConfig, SiteContext,
};
use tracing::{info, warn};

const HELP: &str = "\
commands:
  status                         backend, state, visitor count
  notices | posts                list current notices / guest posts
  post <author> | <content>      leave a guest post (author may be blank)
  admin [secret]                 enter admin mode (or leave it)
  notice <title> | <content>     add a notice (admin)
  edit <id>                      edit a notice interactively (admin)
  delete-notice <id>             delete a notice (admin)
  delete-post <id>               delete a guest post (admin)
  set <region> <text>            change page text, e.g. `set hero.title Hi` (admin)
  show                           print the page regions
  save | export [dir] | import <file> | reset
  token <token> | deploy         GitHub publishing (admin)
  metrics                        Prometheus exposition text
  quit";

struct ConsoleView;

impl BoardView for ConsoleView {
    fn render_notices(&self, html: &str) {
        println!("[notices] {html}");
    }

    fn render_guest_posts(&self, html: &str) {
        println!("[guest-posts] {html}");
    }

    fn show_visitor_count(&self, count: u64) {
        println!("[visitors] {count}");
    }
}

struct ConsoleInteraction;

fn read_line() -> Option<String> {
    let mut buf = String::new();
    match tokio::task::block_in_place(|| io::stdin().lock().read_line(&mut buf)) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim_end_matches(['\r', '\n']).to_string()),
    }
}

impl Interaction for ConsoleInteraction {
    fn alert(&self, message: &str) {
        println!("! {message}");
    }

    fn confirm(&self, message: &str) -> bool {
        print!("? {message} [y/N] ");
        let _ = io::stdout().flush();
        read_line().is_some_and(|a| matches!(a.trim(), "y" | "Y" | "yes"))
    }

    fn prompt(&self, message: &str, default: &str) -> Option<String> {
        print!("? {message} [{default}] ");
        let _ = io::stdout().flush();
        read_line().map(|a| if a.is_empty() { default.to_string() } else { a })
    }
}

/// Page text from `content.json` next to the binary's working dir, if any.
fn load_page(path: &Path) -> RegionMap {
    match std::fs::read_to_string(path) {
        Ok(raw) => match ContentDocument::from_json(&raw) {
            Ok(doc) => {
                info!(path = %path.display(), "page content loaded");
                content::layout(&doc)
            }
            Err(e) => {
                warn!(error = %e, "content file unreadable, using empty page");
                content::layout(&ContentDocument::default())
            }
        },
        Err(_) => content::layout(&ContentDocument::default()),
    }
}

fn split_pair(rest: &str) -> (&str, &str) {
    match rest.split_once('|') {
        Some((a, b)) => (a.trim(), b.trim()),
        None => ("", rest.trim()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; harmless when absent.
    let _ = dotenvy::dotenv();
    portfolio_board::init_tracing();

    let metrics = Metrics::install()
        .map_err(|e| warn!(error = ?e, "metrics recorder not installed"))
        .ok();

    let config = SiteConfig::load_default().context("loading site config")?;
    let page_path = PathBuf::from(&config.publish.path);
    let ctx = SiteContext::from_config(config)?;

    let view: Arc<dyn BoardView> = Arc::new(ConsoleView);
    let interaction: Arc<dyn Interaction> = Arc::new(ConsoleInteraction);
    let mut board = BoardCoordinator::new(ctx.clone(), view, interaction.clone());
    let state = board.start().await;
    info!(?state, backend = board.backend_name(), "board ready");

    let mut admin = AdminMode::new(ctx.clone(), load_page(&page_path));
    println!("{HELP}");

    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let Some(line) = read_line() else { break };
        let line = line.trim();
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        let needs_admin = matches!(
            cmd,
            "notice" | "edit" | "delete-notice" | "delete-post" | "set" | "save" | "export"
                | "import" | "reset" | "token" | "deploy"
        );
        if needs_admin && !admin.is_enabled() {
            interaction.alert("Admin mode is not enabled.");
            continue;
        }

        match cmd {
            "" => {}
            "help" => println!("{HELP}"),
            "quit" | "exit" => break,
            "status" => println!(
                "backend={} state={:?} demo={} visitors={} admin={} token={}",
                board.backend_name(),
                board.state(),
                board.is_demo(),
                board.visitor_count(),
                admin.is_enabled(),
                if admin.has_token() { "set" } else { "missing" },
            ),
            "notices" => {
                for n in board.notices() {
                    let id = n.id.map(|i| i.to_string()).unwrap_or_default();
                    println!("{id}\t{}\t{}", n.title, n.content);
                }
            }
            "posts" => {
                for p in board.guest_posts() {
                    let id = p.id.map(|i| i.to_string()).unwrap_or_default();
                    println!("{id}\t{}\t{}", p.author, p.content);
                }
            }
            "post" => {
                let (author, text) = split_pair(rest);
                board.submit_guest_post(author, text).await;
            }
            "admin" => {
                if admin.is_enabled() {
                    admin.disable();
                    board.set_admin_mode(false);
                } else if admin.enable(rest) {
                    board.set_admin_mode(true);
                    println!("admin mode on");
                } else {
                    interaction.alert("Wrong secret.");
                }
            }
            "notice" => {
                let (title, text) = split_pair(rest);
                board.add_notice(title, text).await;
            }
            "edit" => {
                board.edit_notice(&RecordId::parse(rest)).await;
            }
            "delete-notice" => {
                board.delete_notice(&RecordId::parse(rest)).await;
            }
            "delete-post" => {
                board.delete_guest_post(&RecordId::parse(rest)).await;
            }
            "set" => {
                let (key, text) = rest.split_once(' ').unwrap_or((rest, ""));
                match key.parse::<Region>() {
                    Ok(region) if region.is_text_editable() => {
                        if !admin.surface_mut().set_text(region, text) {
                            interaction.alert(&format!("{region} is not on this page."));
                        }
                    }
                    Ok(region) => interaction.alert(&format!("{region} is not editable.")),
                    Err(e) => interaction.alert(&e.to_string()),
                }
            }
            "show" => {
                for (region, text) in admin.surface().iter() {
                    println!("{region} = {text}");
                }
            }
            "save" => match admin.save() {
                Ok(_) => println!("saved; export or deploy next"),
                Err(e) => interaction.alert(&e.to_string()),
            },
            "export" => {
                let dir = if rest.is_empty() { "." } else { rest };
                match admin.export(dir) {
                    Ok(p) => println!("wrote {}", p.display()),
                    Err(e) => interaction.alert(&e.to_string()),
                }
            }
            "import" => match admin.import(rest) {
                Ok(n) => println!("applied {n} regions"),
                Err(e) => interaction.alert(&e.to_string()),
            },
            "reset" => {
                if interaction.confirm("Discard all unsaved and saved changes?") {
                    admin.reset();
                }
            }
            "token" => match admin.set_token(rest) {
                Ok(()) => println!("token stored"),
                Err(e) => interaction.alert(&e.to_string()),
            },
            "deploy" => {
                if !interaction.confirm("Publish the saved content to GitHub?") {
                    continue;
                }
                match admin.deploy().await {
                    Ok(out) => println!(
                        "published commit {}; the site updates in a minute or two: {}",
                        out.commit_sha, out.site_url
                    ),
                    Err(e) => interaction.alert(&e.to_string()),
                }
            }
            "metrics" => match &metrics {
                Some(m) => println!("{}", m.render()),
                None => println!("metrics recorder not installed"),
            },
            other => interaction.alert(&format!("unknown command `{other}`; try `help`")),
        }
    }

    let closed = board.cleanup();
    info!(closed, "bye");
    Ok(())
}
