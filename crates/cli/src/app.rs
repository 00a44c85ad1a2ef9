//! Host application state and event loop.
//!
//! `App` stands in for the graphical shell: every event is printed as one
//! JSON line on stdout, operator commands arrive on stdin, and a global
//! hotkey drives the toggle. The hotkey is simulated (pressed with `toggle`)
//! unless system hotkeys were requested and are available. The loop
//! multiplexes all of them with `tokio::select!`.

use crate::operator::{OperatorCommand, HELP};
use colored::Colorize;
use dk_core::config::HostConfig;
use dk_core::hotkey::{HotkeyRegistrar, HotkeyToggleController, InMemoryHotkeys};
use dk_core::preferences::{EffectivePreferences, PreferenceKey, PreferenceStore};
use dk_core::state::ProcessSupervisor;
use dk_protocol::{Command, Event, EventKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::select;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

/// How long teardown and restart wait for the worker's `exit` event.
const EXIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Launch options that are not part of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub model: Option<String>,
    pub language: Option<String>,
    pub hotkey: Option<String>,
    pub autoload: bool,
    /// Register the hotkey with the OS instead of simulating it.
    pub system_hotkeys: bool,
}

pub struct App {
    supervisor: ProcessSupervisor,
    events_rx: UnboundedReceiver<Event>,
    hotkeys: Arc<dyn HotkeyRegistrar>,
    toggle: HotkeyToggleController,
    requests_rx: UnboundedReceiver<Command>,
    preferences: Arc<dyn PreferenceStore>,
    effective: EffectivePreferences,
    autoload: bool,
    should_exit: bool,
}

impl App {
    /// Wire the supervisor, the hotkey toggle and the preference store.
    ///
    /// Launch options win over stored preferences, which win over the
    /// configured defaults.
    pub fn new(config: HostConfig, preferences: Arc<dyn PreferenceStore>, options: LaunchOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();

        let mut effective = EffectivePreferences::resolve(preferences.as_ref(), &config.defaults);
        if let Some(model) = options.model {
            effective.model = model;
        }
        if options.language.is_some() {
            effective.language = options.language;
        }
        if options.hotkey.is_some() {
            effective.hotkey = options.hotkey;
        }

        let supervisor = ProcessSupervisor::new(config.worker, events_tx);
        let hotkeys = options
            .system_hotkeys
            .then(system_hotkeys)
            .flatten()
            .unwrap_or_else(|| Arc::new(InMemoryHotkeys::new()));
        let toggle = HotkeyToggleController::new(
            Arc::clone(&hotkeys),
            supervisor.run_state(),
            requests_tx,
        );

        Self {
            supervisor,
            events_rx,
            hotkeys,
            toggle,
            requests_rx,
            preferences,
            effective,
            autoload: options.autoload,
            should_exit: false,
        }
    }

    /// Main event loop. Returns when the operator exits, stdin closes or
    /// Ctrl-C is received; the worker is killed on the way out.
    pub async fn run(&mut self) -> color_eyre::Result<()> {
        self.startup().await;

        let mut input = BufReader::new(tokio::io::stdin()).lines();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        while !self.should_exit {
            select! {
                Some(event) = self.events_rx.recv() => {
                    self.handle_event(&event);
                }
                Some(command) = self.requests_rx.recv() => {
                    // Failures come back as `error` events
                    let _ = self.supervisor.send(&command).await;
                }
                line = input.next_line() => match line {
                    Ok(Some(line)) => self.handle_line(&line).await,
                    Ok(None) => {
                        debug!("operator input closed");
                        self.should_exit = true;
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read operator input");
                        self.should_exit = true;
                    }
                },
                _ = &mut ctrl_c => {
                    info!("interrupted");
                    self.should_exit = true;
                }
            }
        }

        self.teardown().await;
        Ok(())
    }

    /// The presentation layer is ready as soon as the loop runs, so the
    /// worker is started right away.
    async fn startup(&mut self) {
        if let Some(hotkey) = self.effective.hotkey.clone() {
            self.bind_hotkey(&hotkey);
        }
        self.emit_prefs();

        match self.supervisor.start().await {
            Ok(()) => {
                if self.autoload {
                    let _ = self.supervisor.send(&Command::load(self.effective.model.as_str())).await;
                }
            }
            Err(e) => warn!(error = %e, "worker not started"),
        }
    }

    async fn teardown(&mut self) {
        self.toggle.clear();
        if self.supervisor.shutdown() {
            self.drain_until_exit().await;
        }
        while let Ok(event) = self.events_rx.try_recv() {
            print_event(&event);
        }
    }

    /// Print events until the worker's `exit` arrives.
    async fn drain_until_exit(&mut self) {
        let events_rx = &mut self.events_rx;
        let drain = async {
            while let Some(event) = events_rx.recv().await {
                print_event(&event);
                if event.is(&EventKind::Exit) {
                    break;
                }
            }
        };
        if tokio::time::timeout(EXIT_TIMEOUT, drain).await.is_err() {
            warn!("worker did not report exit in time");
        }
    }

    fn handle_event(&mut self, event: &Event) {
        match event.kind() {
            Some(EventKind::Exit) => info!(%event, "worker exited"),
            Some(EventKind::Error) => debug!(%event, "error event"),
            _ => {}
        }
        print_event(event);
    }

    async fn handle_line(&mut self, line: &str) {
        match OperatorCommand::parse(line) {
            Ok(Some(command)) => self.execute(command).await,
            Ok(None) => {}
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                eprintln!("{}", HELP.dimmed());
            }
        }
    }

    async fn execute(&mut self, command: OperatorCommand) {
        match command {
            OperatorCommand::Load(model) => {
                let model = model.unwrap_or_else(|| self.effective.model.clone());
                self.send(Command::load(model)).await;
            }
            OperatorCommand::Start(language) => {
                let language = language.or_else(|| self.effective.language.clone());
                self.send(Command::start(language.as_deref())).await;
            }
            OperatorCommand::Stop => self.send(Command::stop()).await,
            OperatorCommand::Status => {
                self.print_status();
                self.send(Command::status()).await;
            }
            OperatorCommand::Flush => self.send(Command::flush()).await,
            OperatorCommand::Quit => self.send(Command::quit()).await,
            OperatorCommand::Toggle => match self.toggle.current() {
                Some(accelerator) => {
                    self.hotkeys.press(&accelerator);
                }
                None => hint("no hotkey is bound"),
            },
            OperatorCommand::Hotkey(accelerator) => {
                if self.bind_hotkey(&accelerator) {
                    if let Some(bound) = &self.effective.hotkey {
                        self.preferences.set(PreferenceKey::Hotkey, bound);
                    }
                }
                self.emit_prefs();
            }
            OperatorCommand::ClearHotkey => {
                self.toggle.clear();
                self.preferences.delete(PreferenceKey::Hotkey);
                self.effective.hotkey = None;
                self.emit_prefs();
            }
            OperatorCommand::Language(language) => {
                self.preferences.set(PreferenceKey::Language, &language);
                self.effective.language = Some(language);
                // The toggle captures the language at bind time
                if let Some(accelerator) = self.toggle.current() {
                    self.bind_hotkey(&accelerator.to_string());
                }
                self.emit_prefs();
            }
            OperatorCommand::Model(model) => {
                self.preferences.set(PreferenceKey::Model, &model);
                self.effective.model = model;
                self.emit_prefs();
                if self.supervisor.state().is_live() {
                    self.send(Command::load(self.effective.model.as_str())).await;
                }
            }
            OperatorCommand::Restart => self.restart().await,
            OperatorCommand::Exit => self.should_exit = true,
        }
    }

    async fn send(&self, command: Command) {
        // Failures come back as `error` events
        let _ = self.supervisor.send(&command).await;
    }

    async fn restart(&mut self) {
        if self.supervisor.shutdown() {
            self.drain_until_exit().await;
        }
        if self.supervisor.start().await.is_ok() && self.autoload {
            self.send(Command::load(self.effective.model.as_str())).await;
        }
    }

    /// Bind `accelerator` and make the effective hotkey match the outcome:
    /// the canonical accelerator on success, `None` on failure.
    fn bind_hotkey(&mut self, accelerator: &str) -> bool {
        let bound = self.toggle.bind(accelerator, self.effective.language.as_deref());
        if !bound {
            hint(&format!("hotkey '{accelerator}' could not be registered; no hotkey is active"));
        }
        self.effective.hotkey = self.toggle.current().map(|a| a.to_string());
        bound
    }

    fn emit_prefs(&self) {
        print_event(&Event::prefs(
            Some(self.effective.model.as_str()),
            self.effective.language.as_deref(),
            self.effective.hotkey.as_deref(),
        ));
    }

    fn print_status(&self) {
        let status = self.supervisor.status();
        let pid = status.pid.map_or_else(|| "-".to_string(), |pid| pid.to_string());
        let progress = status
            .last_progress
            .map_or_else(|| "-".to_string(), |p| format!("{}%", p.percent));
        let hotkey = self
            .toggle
            .current()
            .map_or_else(|| "-".to_string(), |a| a.to_string());

        eprintln!(
            "{} state={} running={} pid={} progress={} hotkey={}",
            "host:".cyan().bold(),
            status.state,
            status.running,
            pid,
            progress,
            hotkey,
        );
    }
}

/// The OS-backed registrar, if this build and platform have one.
#[cfg(all(target_os = "macos", feature = "macos-hotkeys"))]
fn system_hotkeys() -> Option<Arc<dyn HotkeyRegistrar>> {
    match dk_core::hotkey::EventTapHotkeys::start() {
        Ok(hotkeys) => {
            info!("system hotkeys enabled");
            Some(Arc::new(hotkeys))
        }
        Err(e) => {
            warn!(error = %e, "system hotkeys unavailable, falling back to simulated hotkeys");
            None
        }
    }
}

#[cfg(not(all(target_os = "macos", feature = "macos-hotkeys")))]
fn system_hotkeys() -> Option<Arc<dyn HotkeyRegistrar>> {
    warn!("built without system hotkey support, falling back to simulated hotkeys");
    None
}

fn print_event(event: &Event) {
    println!("{event}");
}

fn hint(message: &str) {
    eprintln!("{} {}", "hint:".yellow().bold(), message);
}
