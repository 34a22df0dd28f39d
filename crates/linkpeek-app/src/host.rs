//! The content script host.
//!
//! Mounted once per page. Reads the stored behavior and theme, runs a
//! detection session when a behavior is set, and opens every detected link
//! on the preview surface. [`ContentHost::refresh`] re-reads the settings
//! after they change and switches modes in place.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use linkpeek_detect::{SessionHandle, TimerQueue, activate};
use linkpeek_dom::{NodeId, Page};
use linkpeek_settings::{LocalStorage, SettingsStore, Theme, ThemeChoice, load_detection_config};
use linkpeek_types::config::{DetectionConfig, TriggerMode};
use linkpeek_types::error::Result;

use crate::preview::{PreviewSurface, PreviewTarget};

/// Long-press delay used by the content script.
pub const CONTENT_LONG_PRESS_DELAY_MS: u32 = 300;

/// Drag threshold used by the content script.
pub const CONTENT_DRAG_THRESHOLD_PX: f64 = 10.0;

/// Thresholds of the content script. The mode comes from settings.
pub fn content_tuning() -> Result<DetectionConfig> {
    DetectionConfig::new(TriggerMode::Drag)
        .with_long_press_delay(CONTENT_LONG_PRESS_DELAY_MS)?
        .with_drag_threshold(CONTENT_DRAG_THRESHOLD_PX)
}

/// Something the host did in response to a detection.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Detected {
        at_ms: u64,
        url: String,
        source: NodeId,
    },
    Previewed {
        at_ms: u64,
        target: PreviewTarget,
    },
    Refused {
        at_ms: u64,
        url: String,
    },
}

pub struct ContentHost<S> {
    page: Rc<Page>,
    timers: Rc<dyn TimerQueue>,
    storage: LocalStorage<S>,
    surface: Rc<RefCell<PreviewSurface>>,
    events: Rc<RefCell<Vec<HostEvent>>>,
    session: Option<SessionHandle>,
}

impl<S: SettingsStore> ContentHost<S> {
    /// Mount on `page`. With no stored behavior, nothing is bound.
    pub async fn mount(page: Rc<Page>, timers: Rc<dyn TimerQueue>, storage: LocalStorage<S>) -> Result<Self> {
        let mut host = Self {
            page,
            timers,
            storage,
            surface: Rc::new(RefCell::new(PreviewSurface::default())),
            events: Rc::new(RefCell::new(Vec::new())),
            session: None,
        };
        host.refresh().await?;
        log::info!(
            "content host mounted on {} ({})",
            host.page.location(),
            host.mode().map_or("off", TriggerMode::as_str)
        );
        Ok(host)
    }

    /// Re-read the settings and bring the session in line with them.
    pub async fn refresh(&mut self) -> Result<()> {
        let theme = read_theme(&self.storage).await;
        self.surface.borrow_mut().set_theme(theme);

        let Some(config) = load_detection_config(&self.storage, content_tuning()?).await? else {
            if let Some(session) = self.session.take() {
                session.teardown();
                log::info!("behavior cleared, detection off");
            }
            return Ok(());
        };

        if let Some(session) = &self.session {
            if session.config() != config {
                log::info!("behavior changed: {} -> {}", session.mode(), config.mode());
                session.reconfigure(config);
            }
            return Ok(());
        }
        self.session = Some(self.start(config));
        Ok(())
    }

    fn start(&self, config: DetectionConfig) -> SessionHandle {
        let surface = Rc::clone(&self.surface);
        let events = Rc::clone(&self.events);
        let timers = Rc::clone(&self.timers);
        activate(
            Rc::clone(&self.page),
            Rc::clone(&self.timers),
            config,
            move |url: &str, source: NodeId| {
                let at_ms = timers.now_ms();
                log::info!("link detected: {url}");
                let mut events = events.borrow_mut();
                events.push(HostEvent::Detected {
                    at_ms,
                    url: url.to_string(),
                    source,
                });
                match surface.borrow_mut().open(url) {
                    Some(target) => events.push(HostEvent::Previewed {
                        at_ms,
                        target: target.clone(),
                    }),
                    None => {
                        log::debug!("preview refused for {url}");
                        events.push(HostEvent::Refused {
                            at_ms,
                            url: url.to_string(),
                        });
                    },
                }
            },
        )
    }

    /// Tear the session down. The host stays mounted and a later
    /// [`ContentHost::refresh`] starts a new one.
    pub fn unmount(&mut self) {
        if let Some(session) = self.session.take() {
            session.teardown();
        }
    }

    /// The active mode, if detection is on.
    pub fn mode(&self) -> Option<TriggerMode> {
        self.session.as_ref().map(SessionHandle::mode)
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    pub fn surface(&self) -> Ref<'_, PreviewSurface> {
        self.surface.borrow()
    }

    pub fn close_preview(&self) {
        self.surface.borrow_mut().close();
    }

    pub fn storage(&self) -> &LocalStorage<S> {
        &self.storage
    }

    pub fn page(&self) -> &Rc<Page> {
        &self.page
    }

    /// Everything recorded since the last call.
    pub fn drain_events(&self) -> Vec<HostEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}

async fn read_theme<S: SettingsStore>(storage: &LocalStorage<S>) -> ThemeChoice {
    match storage.get_item_with_default::<Theme>(ThemeChoice::default()).await {
        Ok(theme) => theme,
        Err(e) => {
            log::warn!("theme setting ignored: {e}");
            ThemeChoice::default()
        },
    }
}
