//! Line-driven interactive session over a `Remixer`.
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::app::Remixer;
use crate::share;
use crate::view;

pub const HELP: &str = "\
commands:
  input <text>      replace the input text
  paste             read input lines until a line with a single '.'
  remix             generate tweets from the input
  save <n>          save generated tweet n
  share <n>         open generated tweet n in the browser
  share-saved <id>  open saved tweet <id> in the browser
  delete <id>       delete saved tweet <id>
  edit <id>         start editing saved tweet <id>
  draft <text>      replace the draft being edited
  update            write the draft
  cancel            discard the draft
  refresh           reload saved tweets
  show              print the screen
  help              this text
  quit              leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Input(String),
    Paste,
    Remix,
    Save(usize),
    Share(usize),
    ShareSaved(i64),
    Delete(i64),
    Edit(i64),
    Draft(String),
    Update,
    Cancel,
    Refresh,
    Show,
    Help,
    Quit,
}

/// Parse one line. Posts are numbered from 1 on screen.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };
    let index = |rest: &str| -> Result<usize, String> {
        match rest.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("expected a tweet number, got {rest:?}")),
        }
    };
    let id = |rest: &str| -> Result<i64, String> {
        rest.parse::<i64>()
            .map_err(|_| format!("expected a saved tweet id, got {rest:?}"))
    };
    match word {
        "input" => Ok(Command::Input(rest.to_string())),
        "paste" => Ok(Command::Paste),
        "remix" => Ok(Command::Remix),
        "save" => index(rest).map(Command::Save),
        "share" => index(rest).map(Command::Share),
        "share-saved" => id(rest).map(Command::ShareSaved),
        "delete" => id(rest).map(Command::Delete),
        "edit" => id(rest).map(Command::Edit),
        "draft" => Ok(Command::Draft(rest.to_string())),
        "update" => Ok(Command::Update),
        "cancel" => Ok(Command::Cancel),
        "refresh" => Ok(Command::Refresh),
        "show" | "" => Ok(Command::Show),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command {other:?}; try 'help'")),
    }
}

/// Run until `quit` or end of input. `open_browser` is false in tests.
pub async fn run<R, W>(remixer: &Remixer, reader: R, mut out: W, open_browser: bool) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    remixer.load().await;
    out.write_all(view::render(&remixer.snapshot().await).as_bytes())
        .await?;
    out.write_all(b"> ").await?;
    out.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let cmd = match parse_command(&line) {
            Ok(cmd) => cmd,
            Err(msg) => {
                out.write_all(format!("{msg}\n> ").as_bytes()).await?;
                out.flush().await?;
                continue;
            }
        };
        debug!(?cmd, "session command");
        let mut reply: Option<String> = None;
        match cmd {
            Command::Quit => break,
            Command::Help => reply = Some(HELP.to_string()),
            Command::Input(text) => remixer.set_input(&text).await,
            Command::Paste => {
                let mut buf = Vec::new();
                while let Some(l) = lines.next_line().await? {
                    if l.trim() == "." {
                        break;
                    }
                    buf.push(l);
                }
                remixer.set_input(&buf.join("\n")).await;
            }
            Command::Remix => {
                if !remixer.remix().await {
                    reply = Some("nothing to remix".into());
                }
            }
            Command::Save(idx) => {
                remixer.save_generated(idx).await;
            }
            Command::Share(idx) => {
                let st = remixer.snapshot().await;
                reply = Some(match st.generated.get(idx) {
                    Some(post) if !st.generation_failed => open(remixer, post, open_browser),
                    _ => "no such tweet".into(),
                });
            }
            Command::ShareSaved(id) => {
                let st = remixer.snapshot().await;
                reply = Some(match st.find_saved(id) {
                    Some(item) => open(remixer, &item.content, open_browser),
                    None => "no such saved tweet".into(),
                });
            }
            Command::Delete(id) => {
                remixer.delete(id).await;
            }
            Command::Edit(id) => {
                if !remixer.start_edit(id).await {
                    reply = Some("no such saved tweet".into());
                }
            }
            Command::Draft(text) => remixer.set_draft(&text).await,
            Command::Update => {
                remixer.commit_edit().await;
            }
            Command::Cancel => remixer.cancel_edit().await,
            Command::Refresh => {
                remixer.refresh().await;
            }
            Command::Show => {}
        }
        if let Some(reply) = reply {
            out.write_all(format!("{reply}\n").as_bytes()).await?;
        }
        out.write_all(view::render(&remixer.snapshot().await).as_bytes())
            .await?;
        out.write_all(b"> ").await?;
        out.flush().await?;
    }
    Ok(())
}

fn open(remixer: &Remixer, content: &str, open_browser: bool) -> String {
    if open_browser {
        share::share(content)
    } else {
        remixer.share_url(content)
    }
}
