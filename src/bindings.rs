//! JavaScript API
//!
//! The `#[wasm_bindgen]` exports the page scripts call, plus the DOM event
//! listeners and `console.*` wrappers. Everything routes through the one
//! `Session`, so calls made before `init()` throw `console not initiated!`.

use crate::config::ConsoleConfig;
use crate::console::{Console, Host, Session};
use crate::console_log;
use crate::error::ConsoleError;
use crate::passthrough::Level;
use crate::platform::web::{self, ConsoleHook, DomLoader, JsEvaluator, WebScheduler, WebViewport};
use crate::resources::LoadCallback;
use futures::channel::oneshot;
use js_sys::{Array, Map, Promise};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

thread_local! {
    static SESSION: Session = const { Session::new() };
    /// DOM listeners outlive a release and serve every later session
    static LISTENERS_ATTACHED: Cell<bool> = const { Cell::new(false) };
}

fn console() -> Result<Rc<Console>, JsValue> {
    SESSION.with(Session::get).map_err(JsValue::from)
}

// ============ Lifecycle ============

/// Start the console; `std_enabled` turns on passthrough to the real console.
#[wasm_bindgen]
pub fn init(std_enabled: Option<bool>) -> Result<(), JsValue> {
    let config = ConsoleConfig {
        std_passthrough: std_enabled.unwrap_or(false),
        ..ConsoleConfig::default()
    };
    start(config)
}

/// Start the console from an options object, e.g. `{ marker: ">>" }`
#[wasm_bindgen(js_name = initWithOptions)]
pub fn init_with_options(options: JsValue) -> Result<(), JsValue> {
    let json = if options.is_undefined() || options.is_null() {
        "{}".to_string()
    } else {
        js_sys::JSON::stringify(&options)?
            .as_string()
            .unwrap_or_else(|| "{}".to_string())
    };
    start(ConsoleConfig::from_json(&json)?)
}

fn start(config: ConsoleConfig) -> Result<(), JsValue> {
    if SESSION.with(Session::is_initialized) {
        return Ok(());
    }
    crate::init_panic_hook();

    let window = web::window()?;
    let document = web::document()?;
    let viewport = Rc::new(web::mount(&document, &config)?);
    let host = Host {
        viewport: viewport.clone(),
        scheduler: Rc::new(WebScheduler::new(window)),
        evaluator: Box::new(JsEvaluator),
        loader: Box::new(DomLoader::new(&document)?),
        host_console: Box::new(ConsoleHook::capture(dispatch, dispatch_clear)?),
    };
    let console = Console::new(&config, host)?;
    SESSION.with(|session| session.install(console));
    if !LISTENERS_ATTACHED.with(Cell::get) {
        attach_listeners(&viewport)?;
        LISTENERS_ATTACHED.with(|attached| attached.set(true));
    }
    Ok(())
}

/// Restore the page's console functions and shut the overlay down
#[wasm_bindgen]
pub fn release() -> Result<(), JsValue> {
    SESSION.with(Session::shutdown)?;
    Ok(())
}

fn attach_listeners(viewport: &WebViewport) -> Result<(), ConsoleError> {
    // Body key up: Enter opens the input
    {
        let closure = Closure::wrap(Box::new(|event: web_sys::KeyboardEvent| {
            if let Ok(console) = console() {
                console.on_page_key(&event.key());
            }
        }) as Box<dyn FnMut(_)>);
        viewport
            .body()
            .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Input key up
    {
        let closure = Closure::wrap(Box::new(|event: web_sys::KeyboardEvent| {
            if let Ok(console) = console() {
                console.on_input_key(&event.key());
            }
        }) as Box<dyn FnMut(_)>);
        viewport
            .input_element()
            .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Input focus out
    {
        let closure = Closure::wrap(Box::new(|_event: web_sys::FocusEvent| {
            if let Ok(console) = console() {
                console.on_input_blur();
            }
        }) as Box<dyn FnMut(_)>);
        viewport
            .input_element()
            .add_event_listener_with_callback("focusout", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    console_log!("[devpane] Event listeners attached");
    Ok(())
}

/// Target of the patched `console.log/info/warn/error`
fn dispatch(level: Level, args: &Array) -> Result<(), JsValue> {
    let (args, attributes) = web::split_args(args);
    console()?.emit(level, &args, attributes);
    Ok(())
}

/// Target of the patched `console.clear`
fn dispatch_clear() -> Result<(), JsValue> {
    console()?.clear();
    Ok(())
}

// ============ Output ============

#[wasm_bindgen]
pub fn help() -> String {
    Console::help()
}

#[wasm_bindgen]
pub fn clear() -> Result<(), JsValue> {
    console()?.clear();
    Ok(())
}

#[wasm_bindgen]
pub fn log(message: JsValue, attributes: Option<Map>) -> Result<(), JsValue> {
    emit(Level::Log, message, attributes)
}

#[wasm_bindgen]
pub fn info(message: JsValue, attributes: Option<Map>) -> Result<(), JsValue> {
    emit(Level::Info, message, attributes)
}

#[wasm_bindgen]
pub fn warn(message: JsValue, attributes: Option<Map>) -> Result<(), JsValue> {
    emit(Level::Warn, message, attributes)
}

#[wasm_bindgen]
pub fn error(message: JsValue, attributes: Option<Map>) -> Result<(), JsValue> {
    emit(Level::Error, message, attributes)
}

fn emit(level: Level, message: JsValue, attributes: Option<Map>) -> Result<(), JsValue> {
    let attributes = attributes
        .as_ref()
        .map(web::attributes_from_map)
        .unwrap_or_default();
    console()?.emit(level, &[web::arg_from_js(&message)], attributes);
    Ok(())
}

#[wasm_bindgen(js_name = enableStdPassthrough)]
pub fn enable_std_passthrough() -> Result<(), JsValue> {
    console()?.enable_std_passthrough();
    Ok(())
}

#[wasm_bindgen(js_name = disableStdPassthrough)]
pub fn disable_std_passthrough() -> Result<(), JsValue> {
    console()?.disable_std_passthrough();
    Ok(())
}

#[wasm_bindgen(js_name = printUsingTimeouts)]
pub fn print_using_timeouts() -> Result<(), JsValue> {
    console()?.print_using_timeouts();
    Ok(())
}

#[wasm_bindgen(js_name = printUsingAnimations)]
pub fn print_using_animations() -> Result<(), JsValue> {
    console()?.print_using_animations();
    Ok(())
}

// ============ Resources ============

/// A load callback plus the promise it settles
fn load_promise() -> (LoadCallback, Promise) {
    let (tx, rx) = oneshot::channel::<()>();
    let on_load: LoadCallback = Box::new(move || {
        let _ = tx.send(());
    });
    let promise = future_to_promise(async move {
        rx.await
            .map_err(|_| JsValue::from_str("resource failed to load"))?;
        Ok(JsValue::UNDEFINED)
    });
    (on_load, promise)
}

/// Inject a classic script; resolves once it has loaded
#[wasm_bindgen(js_name = loadScript)]
pub fn load_script(url: String) -> Result<Promise, JsValue> {
    let (on_load, promise) = load_promise();
    console()?.load_script(&url, Some(on_load))?;
    Ok(promise)
}

#[wasm_bindgen(js_name = listScripts)]
pub fn list_scripts() -> Result<String, JsValue> {
    Ok(console()?.list_scripts())
}

#[wasm_bindgen(js_name = reloadScript)]
pub fn reload_script(index: i32) -> Result<String, JsValue> {
    Ok(console()?.reload_script(index.into())?.to_string())
}

/// Inject an ES module; resolves once it has loaded
#[wasm_bindgen(js_name = loadModule)]
pub fn load_module(url: String) -> Result<Promise, JsValue> {
    let (on_load, promise) = load_promise();
    console()?.load_module(&url, Some(on_load))?;
    Ok(promise)
}

#[wasm_bindgen(js_name = listModules)]
pub fn list_modules() -> Result<String, JsValue> {
    Ok(console()?.list_modules())
}

#[wasm_bindgen(js_name = reloadModule)]
pub fn reload_module(index: i32) -> Result<String, JsValue> {
    Ok(console()?.reload_module(index.into())?.to_string())
}

#[wasm_bindgen(js_name = loadStylesheet)]
pub fn load_stylesheet(url: String) -> Result<(), JsValue> {
    console()?.load_stylesheet(&url)?;
    Ok(())
}

#[wasm_bindgen(js_name = listStylesheets)]
pub fn list_stylesheets() -> Result<String, JsValue> {
    Ok(console()?.list_stylesheets())
}

#[wasm_bindgen(js_name = reloadStylesheet)]
pub fn reload_stylesheet(index: i32) -> Result<String, JsValue> {
    Ok(console()?.reload_stylesheet(index.into())?.to_string())
}
