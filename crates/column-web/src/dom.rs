//! Applies engine commands to the live document.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use column_engine::{
    Command, ConfirmSpec, InputEvent, Layout, PageAssets, PopupBody, PopupHandle,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlAudioElement, HtmlElement, Window};

/// Class added to an element while its popup is on screen.
const HIDDEN_CLASS: &str = "hidden-by-popup";
/// Element showing the running column height.
const HEIGHT_DISPLAY_ID: &str = "height-display";
/// Container the column images are appended to.
const COLUMN_ID: &str = "column";

pub fn window() -> Result<Window, JsValue> {
    web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))
}

pub fn document() -> Result<Document, JsValue> {
    window()?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

/// Events raised by DOM callbacks (popup buttons), drained by the runner each tick.
pub type PendingEvents = Rc<RefCell<Vec<InputEvent>>>;

struct PopupNode {
    root: Element,
    height_line: Option<Element>,
    /// Button callbacks; dropped with the node.
    _listeners: Vec<Closure<dyn FnMut()>>,
}

pub struct DomPresenter {
    window: Window,
    document: Document,
    popups: HashMap<PopupHandle, PopupNode>,
    pending: PendingEvents,
    audio: Option<HtmlAudioElement>,
    column_image: String,
    images_added: u32,
}

impl DomPresenter {
    pub fn new(assets: &PageAssets) -> Result<Self, JsValue> {
        let window = window()?;
        let document = document()?;
        let audio = if assets.music.is_empty() {
            None
        } else {
            let audio = HtmlAudioElement::new_with_src(&assets.music)?;
            audio.set_loop(true);
            Some(audio)
        };
        Ok(Self {
            window,
            document,
            popups: HashMap::new(),
            pending: Rc::new(RefCell::new(Vec::new())),
            audio,
            column_image: assets.column_image.clone(),
            images_added: 0,
        })
    }

    /// Take the events raised by popup buttons since the last call.
    pub fn take_pending(&self) -> Vec<InputEvent> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    /// Inner HTML of the element with `id`, if it exists.
    pub fn content_of(&self, id: &str) -> Option<String> {
        self.document
            .get_element_by_id(id)
            .map(|el| el.inner_html())
    }

    /// Rendered height of the document body, in CSS pixels.
    pub fn content_height(&self) -> Result<f32, JsValue> {
        Ok(self.body()?.offset_height() as f32)
    }

    pub fn scroll_y(&self) -> f32 {
        self.window.scroll_y().unwrap_or(0.0) as f32
    }

    pub fn apply(&mut self, command: &Command) -> Result<(), JsValue> {
        match command {
            Command::RenderPopup {
                handle,
                body,
                layout,
                height_text,
            } => self.render_popup(*handle, body, layout, height_text),
            Command::TeardownPopup { handle } => {
                if let Some(node) = self.popups.remove(handle) {
                    node.root.remove();
                }
                Ok(())
            }
            Command::HideElement { id } => self.toggle_hidden(id, true),
            Command::RestoreElement { id } => self.toggle_hidden(id, false),
            Command::LockScroll { at } => {
                let style = self.body()?.style();
                style.set_property("position", "fixed")?;
                style.set_property("top", &format!("-{}px", at))?;
                style.set_property("width", "100%")
            }
            Command::UnlockScroll { restore_to } => {
                let style = self.body()?.style();
                for property in ["position", "top", "width"] {
                    style.remove_property(property)?;
                }
                self.window.scroll_to_with_x_and_y(0.0, *restore_to as f64);
                Ok(())
            }
            Command::ScrollTo { y } => {
                self.window.scroll_to_with_x_and_y(0.0, *y as f64);
                Ok(())
            }
            Command::SetHeightText { text } => {
                if let Some(el) = self.document.get_element_by_id(HEIGHT_DISPLAY_ID) {
                    el.set_text_content(Some(text));
                }
                Ok(())
            }
            Command::SetPopupHeightText { handle, text } => {
                if let Some(line) = self.popups.get(handle).and_then(|n| n.height_line.as_ref()) {
                    line.set_text_content(Some(text));
                }
                Ok(())
            }
            Command::GrowColumn => self.add_column_image(),
            Command::PlayAudio => {
                if let Some(audio) = &self.audio {
                    let promise: js_sys::Promise = audio.play()?;
                    let on_blocked = Closure::<dyn FnMut(JsValue)>::new(|_| {
                        log::info!("audio autoplay still blocked");
                    });
                    let _ = promise.catch(&on_blocked);
                    // Emitted once per session
                    on_blocked.forget();
                }
                Ok(())
            }
            Command::PauseAudio => {
                if let Some(audio) = &self.audio {
                    audio.pause()?;
                }
                Ok(())
            }
            Command::Navigate { url } => self.window.location().set_href(url),
        }
    }

    /// Append one more column image to the bottom of the page.
    pub fn add_column_image(&mut self) -> Result<(), JsValue> {
        let column = match self.document.get_element_by_id(COLUMN_ID) {
            Some(el) => el,
            None => self.body()?.into(),
        };
        let img = self.document.create_element("img")?;
        self.images_added += 1;
        img.set_id(&format!("column-{}", self.images_added));
        img.set_attribute("src", &self.column_image)?;
        img.set_class_name("column-image");
        column.append_child(&img)?;
        Ok(())
    }

    fn body(&self) -> Result<HtmlElement, JsValue> {
        self.document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))
    }

    fn toggle_hidden(&self, id: &str, hidden: bool) -> Result<(), JsValue> {
        let Some(el) = self.document.get_element_by_id(id) else {
            log::debug!("no #{} to {}", id, if hidden { "hide" } else { "restore" });
            return Ok(());
        };
        if hidden {
            el.class_list().add_1(HIDDEN_CLASS)
        } else {
            el.class_list().remove_1(HIDDEN_CLASS)
        }
    }

    fn create(&self, tag: &str, class: &str) -> Result<Element, JsValue> {
        let el = self.document.create_element(tag)?;
        el.set_class_name(class);
        Ok(el)
    }

    fn button(
        &self,
        label: &str,
        class: &str,
        event: InputEvent,
        listeners: &mut Vec<Closure<dyn FnMut()>>,
    ) -> Result<Element, JsValue> {
        let button = self.create("button", class)?;
        button.set_text_content(Some(label));
        let pending = Rc::clone(&self.pending);
        let on_click = Closure::<dyn FnMut()>::new(move || {
            pending.borrow_mut().push(event.clone());
        });
        button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        listeners.push(on_click);
        Ok(button)
    }

    fn render_popup(
        &mut self,
        handle: PopupHandle,
        body: &PopupBody,
        layout: &Layout,
        height_text: &str,
    ) -> Result<(), JsValue> {
        let mut listeners = Vec::new();
        let mut height_line = None;

        let root = self.create("div", "popup-overlay")?;
        let popup = self.create("div", &format!("popup popup-{:?}", body.kind()).to_lowercase())?;
        popup.set_attribute(
            "style",
            &format!(
                "width: {}px; height: {}px; font-size: {}em;",
                layout.size.x, layout.size.y, layout.font_scale
            ),
        )?;

        match body {
            PopupBody::Text {
                html, button_label, ..
            } => {
                let content = self.create("div", "popup-content")?;
                content.set_inner_html(html);
                popup.append_child(&content)?;

                let footer = self.create("div", "popup-footer")?;
                let line = self.create("span", "popup-height")?;
                line.set_text_content(Some(height_text));
                footer.append_child(&line)?;
                let close = self.button(
                    button_label,
                    "popup-button",
                    InputEvent::CloseRequested,
                    &mut listeners,
                )?;
                footer.append_child(&close)?;
                popup.append_child(&footer)?;
                height_line = Some(line);
            }
            PopupBody::Image { src, .. } => {
                let img = self.create("img", "popup-image")?;
                img.set_attribute("src", src)?;
                popup.append_child(&img)?;
                let close =
                    self.button("✕", "popup-close", InputEvent::CloseRequested, &mut listeners)?;
                popup.append_child(&close)?;
            }
            PopupBody::Milestone { milestone_cm } => {
                let title = self.create("h2", "popup-title")?;
                title.set_text_content(Some("Great job😈"));
                let text = self.create("p", "popup-message")?;
                text.set_text_content(Some(&format!("You've reached {} cm!", milestone_cm)));
                let line = self.create("p", "popup-height")?;
                line.set_text_content(Some(height_text));
                let close =
                    self.button("OK", "popup-button", InputEvent::CloseRequested, &mut listeners)?;
                for child in [&title, &text, &line, &close] {
                    popup.append_child(child)?;
                }
            }
            PopupBody::Confirm(spec) => self.render_confirm(&popup, spec, &mut listeners)?,
        }

        root.append_child(&popup)?;
        self.body()?.append_child(&root)?;
        self.popups.insert(
            handle,
            PopupNode {
                root,
                height_line,
                _listeners: listeners,
            },
        );
        Ok(())
    }

    fn render_confirm(
        &self,
        popup: &Element,
        spec: &ConfirmSpec,
        listeners: &mut Vec<Closure<dyn FnMut()>>,
    ) -> Result<(), JsValue> {
        if !spec.title.is_empty() {
            let title = self.create("h2", "popup-title")?;
            title.set_text_content(Some(&spec.title));
            popup.append_child(&title)?;
        }
        let message = self.create("p", "popup-message")?;
        message.set_text_content(Some(&spec.message));
        popup.append_child(&message)?;

        let buttons = self.create("div", "popup-footer")?;
        let cancel = self.button(
            &spec.cancel_text,
            "popup-button cancel",
            InputEvent::ConfirmCancelled,
            listeners,
        )?;
        let ok = self.button(
            &spec.ok_text,
            "popup-button ok",
            InputEvent::ConfirmAccepted,
            listeners,
        )?;
        buttons.append_child(&cancel)?;
        buttons.append_child(&ok)?;
        popup.append_child(&buttons)?;
        Ok(())
    }
}
