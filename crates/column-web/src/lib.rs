pub mod dom;
pub mod runner;

pub use column_engine;
pub use dom::DomPresenter;
pub use runner::PageRunner;

/// Generate all `#[wasm_bindgen]` exports for a page.
///
/// Generates:
/// - `thread_local!` storage for the PageRunner
/// - `with_runner()` helper function
/// - All wasm-bindgen exports (page_init, page_tick, input handlers)
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
///
/// mod page;
/// use page::MyPage;
///
/// column_web::export_page!(MyPage, "my-page");
/// ```
///
/// # Arguments
///
/// - `$page_type`: The page struct type that implements `column_engine::Page`
/// - `$page_name`: A string literal used in the initialization log message
#[macro_export]
macro_rules! export_page {
    ($page_type:ty, $page_name:literal) => {
        use std::cell::RefCell;
        use $crate::column_engine::InputEvent;

        thread_local! {
            static RUNNER: RefCell<Option<$crate::PageRunner<$page_type>>> = RefCell::new(None);
        }

        fn with_runner<R>(f: impl FnOnce(&mut $crate::PageRunner<$page_type>) -> R) -> Option<R> {
            RUNNER.with(|cell| cell.borrow_mut().as_mut().map(f))
        }

        fn push(event: InputEvent) {
            if with_runner(|r| r.push_input(event)).is_none() {
                log::warn!("{}: input before page_init()", $page_name);
            }
        }

        #[wasm_bindgen]
        pub fn page_init(touch: bool) -> Result<(), JsValue> {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);

            let profile = if touch {
                $crate::column_engine::ViewportProfile::Touch
            } else {
                $crate::column_engine::ViewportProfile::Desktop
            };
            let mut runner = $crate::PageRunner::new(<$page_type>::new(), profile)?;
            runner.init()?;

            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });
            log::info!("{}: initialized", $page_name);
            Ok(())
        }

        #[wasm_bindgen]
        pub fn page_tick(dt: f64) {
            with_runner(|r| r.tick(dt));
        }

        #[wasm_bindgen]
        pub fn page_scroll(y: f32) {
            push(InputEvent::Scroll { y });
        }

        #[wasm_bindgen]
        pub fn page_touch_start() {
            push(InputEvent::TouchStart);
        }

        #[wasm_bindgen]
        pub fn page_touch_move() {
            push(InputEvent::TouchMove);
        }

        #[wasm_bindgen]
        pub fn page_touch_end() {
            push(InputEvent::TouchEnd);
        }

        #[wasm_bindgen]
        pub fn page_key_down(key_code: u32) {
            push(InputEvent::KeyDown { key_code });
        }

        #[wasm_bindgen]
        pub fn page_fullscreen_change(fullscreen: bool) {
            push(InputEvent::FullscreenChanged { fullscreen });
        }

        #[wasm_bindgen]
        pub fn page_resize(width: f32, height: f32, screen_width: f32, screen_height: f32) {
            push(InputEvent::Resize {
                width,
                height,
                screen_width,
                screen_height,
            });
        }

        #[wasm_bindgen]
        pub fn page_content_height(height: f32) {
            push(InputEvent::ContentHeight { height });
        }

        #[wasm_bindgen]
        pub fn page_image_visible(id: &str, src: &str, natural_width: f32, natural_height: f32) {
            push(InputEvent::ImageVisible {
                id: id.to_string(),
                src: src.to_string(),
                natural_width,
                natural_height,
            });
        }

        #[wasm_bindgen]
        pub fn page_register_content(id: &str, html: &str) {
            push(InputEvent::RegisterContent {
                id: id.to_string(),
                html: html.to_string(),
            });
        }

        #[wasm_bindgen]
        pub fn page_close_popup() {
            push(InputEvent::CloseRequested);
        }

        #[wasm_bindgen]
        pub fn page_confirm(ok: bool) {
            push(if ok {
                InputEvent::ConfirmAccepted
            } else {
                InputEvent::ConfirmCancelled
            });
        }

        #[wasm_bindgen]
        pub fn page_reset() {
            push(InputEvent::Reset);
        }
    };
}
