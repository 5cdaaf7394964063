use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use study_companion::backend::HttpBackend;
use study_companion::chat::{ChatId, ChatThreadController, Message, MessageId, Sender};
use study_companion::config::ClientConfig;
use study_companion::error::{GenerationError, Result};
use study_companion::study::mindmap::RenderState;
use study_companion::study::quiz::OptionMark;
use study_companion::study::{
    ArtifactKind, ArtifactStatus, ArtifactStore, DocumentId, OutlineRenderer, Presenter,
    StudySession,
};
use study_companion::view::{Theme, ViewState};

const HELP: &str = "\
Commands:
  /chat <id>            open a chat and load its history
  /leave                close the current chat
  <text>                ask about the chat's document
  /general <text>       ask without document context
  /refine <message-id>  re-ask the question behind a reply without context
  /study <doc> [tab]    open study tools (tabs: flashcards, quiz, map)
  /tab <tab>            switch study tab
  /next, /prev          flip flashcards
  /pick <n>             answer quiz option n
  /continue             next quiz question
  /restart              restart the quiz
  /retry                regenerate the current tab, or re-render a failed map
  /close                close study tools
  /theme, /sidebar      toggle theme / status line
  /quit";

struct Host {
    config: ClientConfig,
    chat: Arc<ChatThreadController>,
    store: Arc<ArtifactStore>,
    study: Option<StudySession>,
    view: ViewState,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env();
    let backend = Arc::new(HttpBackend::new(config.clone()).context("creating backend client")?);

    eprintln!("📚 Study Companion v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", config.api_url);
    eprintln!("   Type /help for commands.\n");

    let mut host = Host {
        chat: ChatThreadController::new(backend.clone()),
        store: ArtifactStore::new(backend),
        study: None,
        view: ViewState::default(),
        config,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt(&host).await;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "/quit" {
            break;
        }
        if !line.is_empty() {
            host.handle(line).await;
        }
        prompt(&host).await;
    }

    Ok(())
}

async fn prompt(host: &Host) {
    if !host.view.sidebar_collapsed {
        let chat = host
            .chat
            .active_chat()
            .await
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into());
        let study = match &host.study {
            Some(s) if host.view.study_open => format!("{} [{}]", s.document_id(), host.view.active_tab),
            _ => "-".into(),
        };
        eprintln!("── chat: {chat} · study: {study}");
    }
    eprint!("> ");
}

impl Host {
    async fn handle(&mut self, line: &str) {
        if let Err(e) = self.dispatch(line).await {
            eprintln!("❌ {e}");
        }
    }

    async fn dispatch(&mut self, line: &str) -> Result<()> {
        let (cmd, arg) = match line.split_once(' ') {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (line, ""),
        };

        match cmd {
            "/help" => println!("{HELP}"),
            "/chat" => self.open_chat(arg).await?,
            "/leave" => {
                self.chat.close().await;
                eprintln!("ℹ️  Chat closed");
            }
            "/general" => {
                let reply = self.chat.send_ungrounded(arg).await?;
                self.print_message(&reply);
            }
            "/refine" => match self.chat.refine(&MessageId::from(arg)).await? {
                Some(reply) => self.print_message(&reply),
                None => eprintln!("ℹ️  No earlier question to refine"),
            },
            "/study" => self.open_study(arg).await?,
            "/tab" => match arg.parse::<ArtifactKind>() {
                Ok(tab) => {
                    self.view.select_tab(tab);
                    self.show_tab().await?;
                }
                Err(e) => eprintln!("❌ {e}"),
            },
            "/retry" => self.retry().await?,
            "/next" | "/prev" | "/pick" | "/continue" | "/restart" => self.drive_presenter(cmd, arg),
            "/close" => {
                self.view.study_open = false;
                self.study = None;
            }
            "/theme" => {
                let theme = self.view.toggle_theme();
                eprintln!("ℹ️  Theme: {theme:?}");
            }
            "/sidebar" => {
                self.view.toggle_sidebar();
            }
            _ if cmd.starts_with('/') => eprintln!("❌ Unknown command {cmd}. Try /help"),
            _ => {
                let [_, reply] = self.chat.send_grounded(line).await?;
                self.print_message(&reply);
            }
        }
        Ok(())
    }

    async fn open_chat(&mut self, id: &str) -> Result<()> {
        if id.is_empty() {
            eprintln!("❌ Usage: /chat <id>");
            return Ok(());
        }
        match self.chat.load_thread(ChatId::from(id)).await? {
            0 => eprintln!("ℹ️  Empty chat. Ask your first question."),
            _ => {
                for message in self.chat.log().await.iter() {
                    self.print_message(message);
                }
            }
        }
        Ok(())
    }

    async fn open_study(&mut self, arg: &str) -> Result<()> {
        let mut parts = arg.split_whitespace();
        let Some(doc) = parts.next() else {
            eprintln!("❌ Usage: /study <doc> [tab]");
            return Ok(());
        };
        if let Some(tab) = parts.next() {
            match tab.parse() {
                Ok(tab) => {
                    self.view.select_tab(tab);
                }
                Err(e) => {
                    eprintln!("❌ {e}");
                    return Ok(());
                }
            }
        }
        self.study = Some(StudySession::new(
            DocumentId::from(doc),
            self.store.clone(),
            Arc::new(OutlineRenderer),
            self.config.map_max_depth,
        ));
        self.view.study_open = true;
        self.show_tab().await
    }

    async fn show_tab(&mut self) -> Result<()> {
        let tab = self.view.active_tab;
        let Some(study) = self.study.as_mut().filter(|_| self.view.study_open) else {
            eprintln!("❌ Study tools are closed. Use /study <doc>");
            return Ok(());
        };
        eprintln!("⏳ Generating {tab}...");
        let entry = study.open(tab).await;
        match entry.status {
            ArtifactStatus::Error(message) => {
                return Err(GenerationError::Backend { message }.into());
            }
            ArtifactStatus::Ready(_) => self.render_presenter(),
            ArtifactStatus::Loading | ArtifactStatus::Idle => {}
        }
        Ok(())
    }

    async fn retry(&mut self) -> Result<()> {
        if let Some(Presenter::Map(view)) = self.study.as_mut().and_then(|s| s.presenter_mut()) {
            if matches!(view.state(), RenderState::Failed(_)) {
                view.retry().await?;
                self.render_presenter();
                return Ok(());
            }
        }
        self.show_tab().await
    }

    fn drive_presenter(&mut self, cmd: &str, arg: &str) {
        let Some(presenter) = self.study.as_mut().and_then(|s| s.presenter_mut()) else {
            eprintln!("❌ Nothing to interact with. Use /study <doc>");
            return;
        };
        let applied = match (cmd, presenter) {
            ("/next", Presenter::Flashcards(deck)) => {
                deck.next();
                true
            }
            ("/prev", Presenter::Flashcards(deck)) => {
                deck.prev();
                true
            }
            ("/pick", Presenter::Quiz(runner)) => match arg.parse::<usize>() {
                Ok(n) if n >= 1 => runner.select_option(n - 1),
                _ => false,
            },
            ("/continue", Presenter::Quiz(runner)) => runner.advance(),
            ("/restart", Presenter::Quiz(runner)) => {
                runner.restart();
                true
            }
            _ => false,
        };
        if applied {
            self.render_presenter();
        } else {
            eprintln!("❌ {cmd} does not apply right now");
        }
    }

    fn render_presenter(&self) {
        let Some(presenter) = self.study.as_ref().and_then(|s| s.presenter()) else {
            return;
        };
        match presenter {
            Presenter::Flashcards(deck) => match deck.current() {
                None => println!("No flashcards for this document."),
                Some(card) => {
                    let color = self.paint(deck.palette().ansi_code());
                    println!(
                        "{color}[{}/{}] {}{}\n{}",
                        deck.index() + 1,
                        deck.len(),
                        card.title,
                        self.paint(0),
                        card.description
                    );
                }
            },
            Presenter::Quiz(runner) => {
                if runner.is_empty() {
                    println!("No quiz questions for this document.");
                } else if let Some(mastery) = runner.mastery_percent() {
                    let s = runner.state();
                    println!("🏆 Score {}/{} · mastery {mastery}%  (/restart)", s.score, runner.len());
                } else if let Some(q) = runner.current() {
                    let s = runner.state();
                    println!(
                        "Question {}/{} · accuracy {:.0}%\n{}",
                        s.index + 1,
                        runner.len(),
                        runner.accuracy() * 100.0,
                        q.question
                    );
                    for (i, option) in q.options.iter().enumerate() {
                        let mark = match runner.option_mark(i) {
                            OptionMark::Correct => "✅",
                            OptionMark::Incorrect => "❌",
                            OptionMark::Neutral => "  ",
                        };
                        println!("  {mark} {}. {option}", i + 1);
                    }
                    if s.revealed {
                        println!("(/continue)");
                    }
                }
            }
            Presenter::Map(view) => match view.state() {
                RenderState::Rendered(rendered) => {
                    print!("{}", rendered.body);
                    if view.diagram().is_truncated() {
                        println!("… {} deeper node(s) not shown", view.diagram().elided_nodes);
                    }
                }
                RenderState::Failed(e) => {
                    eprintln!("❌ Map generated but could not be drawn: {e}  (/retry)")
                }
                RenderState::NotRendered => {}
            },
        }
    }

    fn print_message(&self, message: &Message) {
        let who = match message.sender {
            Sender::User => "YOU",
            Sender::Assistant => "SYSTEM",
        };
        println!(
            "{}{who}{} #{} {}\n{}\n",
            self.paint(1),
            self.paint(0),
            message.id,
            message.timestamp.format("%H:%M"),
            message.text
        );
    }

    /// ANSI escape for `code`; the light theme prints plain text.
    fn paint(&self, code: u8) -> String {
        match self.view.theme {
            Theme::Dark => format!("\x1b[{code}m"),
            Theme::Light => String::new(),
        }
    }
}
