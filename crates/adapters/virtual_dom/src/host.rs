//! Simulated chat host — renders a composer-style UI into a
//! [`VirtualDocument`] and keeps changing it the way a real host does.
//!
//! The host re-renders its button bar periodically (dropping anything
//! injected into it), posts interruption notices into the chat window, and
//! resolves a notice when one of its recovery actions is clicked.

mod notice;

pub use notice::{ACTION_ATTRIBUTE, Notice};

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use autoresume_app::ports::{Document, HostEvent};
use autoresume_domain::element::ElementSpec;
use autoresume_domain::error::HostError;
use autoresume_domain::selector::Selector;

use crate::config::DemoConfig;
use crate::document::VirtualDocument;
use crate::tree::NodeId;

/// Scripted host driving a [`VirtualDocument`].
pub struct SimulatedHost {
    document: Arc<VirtualDocument>,
    config: DemoConfig,
    window: Option<NodeId>,
    button_bar: Option<NodeId>,
    messages: VecDeque<NodeId>,
    next_notice: usize,
}

impl SimulatedHost {
    #[must_use]
    pub fn new(document: Arc<VirtualDocument>, config: DemoConfig) -> Self {
        Self {
            document,
            config,
            window: None,
            button_bar: None,
            messages: VecDeque::new(),
            next_notice: 0,
        }
    }

    /// Spawn the host loop. Abort the handle to stop it.
    pub fn start(document: Arc<VirtualDocument>, config: DemoConfig) -> JoinHandle<()> {
        tokio::spawn(Self::new(document, config).run())
    }

    /// Render the chat window, once.
    ///
    /// # Errors
    ///
    /// Propagates host errors from the document.
    pub fn render_chat(&mut self) -> Result<NodeId, HostError> {
        if let Some(window) = self.window.filter(|w| self.document.is_connected(w)) {
            return Ok(window);
        }
        let window = self
            .document
            .append(&self.document.root(), &ElementSpec::new("div").class("conversations"))?;
        self.window = Some(window);
        Ok(window)
    }

    /// Render the composer button bar, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Propagates host errors from the document.
    pub fn render_composer(&mut self) -> Result<NodeId, HostError> {
        let bar = match self.button_bar.filter(|b| self.document.is_connected(b)) {
            Some(old) => self.document.replace(&old, &button_bar())?,
            None => {
                let composer = self
                    .document
                    .append(&self.document.root(), &ElementSpec::new("div").class("composer"))?;
                self.document.append(&composer, &button_bar())?
            }
        };
        self.button_bar = Some(bar);
        tracing::debug!("composer rendered");
        Ok(bar)
    }

    /// Post a plain chat message.
    ///
    /// # Errors
    ///
    /// Propagates host errors from the document.
    pub fn post_message(&mut self, text: &str) -> Result<NodeId, HostError> {
        self.post(&ElementSpec::new("div").class("message").child(ElementSpec::new("p").text(text)))
    }

    /// Post `notice` into the chat window.
    ///
    /// # Errors
    ///
    /// Propagates host errors from the document.
    pub fn post_notice(&mut self, notice: Notice) -> Result<NodeId, HostError> {
        let node = self.post(&notice.render())?;
        tracing::info!(?notice, "host posted notice");
        Ok(node)
    }

    /// Post the next notice of the demo cycle.
    ///
    /// # Errors
    ///
    /// Propagates host errors from the document.
    pub fn post_next_notice(&mut self) -> Result<Notice, HostError> {
        let notice = Notice::ALL[self.next_notice % Notice::ALL.len()];
        self.next_notice += 1;
        self.post_notice(notice)?;
        Ok(notice)
    }

    fn post(&mut self, spec: &ElementSpec) -> Result<NodeId, HostError> {
        let window = self.render_chat()?;
        let node = self.document.append(&window, spec)?;
        self.messages.push_back(node);
        while self.messages.len() > self.config.history_limit {
            if let Some(oldest) = self.messages.pop_front() {
                let _ = self.document.remove(&oldest);
            }
        }
        Ok(node)
    }

    /// React to a click. A recovery action resolves its notice, which is
    /// re-rendered as a plain message. Returns whether a notice was resolved.
    ///
    /// # Errors
    ///
    /// Propagates host errors from the document.
    pub fn handle_activation(&mut self, node: &NodeId) -> Result<bool, HostError> {
        let action_selector = Selector::attribute(ACTION_ATTRIBUTE, None);
        let Some(action) = self.document.closest(node, &action_selector) else {
            return Ok(false);
        };
        let action_name = self.document.attribute(&action, ACTION_ATTRIBUTE);
        if !matches!(action_name.as_deref(), Some("resume" | "retry")) {
            return Ok(false);
        }
        let Some(position) = self
            .messages
            .iter()
            .position(|m| self.document.contains(m, &action))
        else {
            return Ok(false);
        };

        let resolved = ElementSpec::new("div")
            .class("message")
            .child(ElementSpec::new("p").text("Resuming..."));
        let fresh = self.document.replace(&self.messages[position], &resolved)?;
        self.messages[position] = fresh;
        tracing::info!(action = action_name.as_deref(), "host resolved notice");
        Ok(true)
    }

    async fn run(mut self) {
        if let Err(err) = self.render_chat() {
            tracing::warn!(error = %err, "chat window render failed");
            return;
        }

        let mut events = self.document.subscribe();
        let startup = tokio::time::sleep(self.config.startup_delay());
        tokio::pin!(startup);
        let mut composer_ready = false;
        let mut rerender = self.config.rerender_interval().map(periodic);
        let mut notices = self.config.notice_interval().map(periodic);

        loop {
            let result = tokio::select! {
                () = &mut startup, if !composer_ready => {
                    composer_ready = true;
                    self.render_composer().map(|_| ())
                }
                () = next_tick(&mut rerender), if composer_ready => {
                    self.render_composer().map(|_| ())
                }
                () = next_tick(&mut notices) => self.post_next_notice().map(|_| ()),
                event = events.recv() => match event {
                    Ok(HostEvent::Activated(node)) => self.handle_activation(&node).map(|_| ()),
                    Ok(HostEvent::Mutations(_)) | Err(RecvError::Lagged(_)) => Ok(()),
                    Err(RecvError::Closed) => break,
                },
            };
            if let Err(err) = result {
                tracing::warn!(error = %err, "simulated host update failed");
            }
        }
    }
}

fn button_bar() -> ElementSpec {
    ElementSpec::new("div")
        .class("button-container composer-button-area")
        .child(
            ElementSpec::new("div")
                .class("anysphere-icon-button")
                .attr("title", "Add image")
                .child(ElementSpec::new("span").class("codicon codicon-image-two")),
        )
        .child(
            ElementSpec::new("div")
                .class("anysphere-icon-button")
                .attr("title", "Send")
                .child(ElementSpec::new("span").class("codicon codicon-send")),
        )
}

/// An interval whose first tick is one full period away.
fn periodic(period: std::time::Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
