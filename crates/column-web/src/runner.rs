use column_engine::{Command, InputEvent, Page, PageAssets, Session, ViewportProfile};
use wasm_bindgen::JsValue;

use crate::dom::DomPresenter;

/// Generic page runner that wires a [`Session`] to the browser.
///
/// Each concrete page creates a `thread_local!` PageRunner and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct PageRunner<P: Page> {
    page: P,
    session: Session,
    presenter: DomPresenter,
    assets: PageAssets,
    initialized: bool,
}

impl<P: Page> PageRunner<P> {
    pub fn new(page: P, profile: ViewportProfile) -> Result<Self, JsValue> {
        let session = Session::from_page(&page, profile)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let assets = page.assets(profile);
        let presenter = DomPresenter::new(&assets)?;
        Ok(Self {
            page,
            session,
            presenter,
            assets,
            initialized: false,
        })
    }

    /// Build the initial column, register popup content found in the
    /// document, and start the session. Call once after construction.
    pub fn init(&mut self) -> Result<(), JsValue> {
        for _ in 0..self.assets.initial_images {
            self.presenter.add_column_image()?;
        }
        let height = self.presenter.content_height()?;
        self.session.handle(InputEvent::ContentHeight { height });

        let profile = self.session.config().profile;
        for descriptor in self.page.descriptors(profile) {
            match self.presenter.content_of(&descriptor.id) {
                Some(html) => self.session.handle(InputEvent::RegisterContent {
                    id: descriptor.id,
                    html,
                }),
                None => log::warn!("popup content `{}` not found in the page", descriptor.id),
            }
        }

        self.session.start(self.presenter.scroll_y());
        self.initialized = true;
        self.flush();
        Ok(())
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.session.push_input(event);
    }

    /// Run one frame: hand over button events, advance the session, apply commands.
    pub fn tick(&mut self, dt_ms: f64) {
        if !self.initialized {
            return;
        }
        for event in self.presenter.take_pending() {
            self.session.push_input(event);
        }
        self.session.tick(dt_ms);
        self.flush();
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn flush(&mut self) {
        let commands = self.session.drain_commands();
        for command in &commands {
            if let Err(err) = self.presenter.apply(command) {
                log::warn!("failed to apply {:?}: {:?}", command, err);
            }
        }
        if changes_height(&commands) {
            match self.presenter.content_height() {
                Ok(height) => self.session.push_input(InputEvent::ContentHeight { height }),
                Err(err) => log::warn!("failed to measure content height: {:?}", err),
            }
        }
    }
}

/// Whether applying `commands` changed the document height.
fn changes_height(commands: &[Command]) -> bool {
    commands.iter().any(|c| matches!(c, Command::GrowColumn))
}
