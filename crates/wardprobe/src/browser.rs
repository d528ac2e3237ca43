//! Browser control over the Chrome DevTools Protocol.
//!
//! With the `browser` feature, [`ChromiumDriver`] implements [`WebDriver`]
//! on top of chromiumoxide. It owns a tokio runtime and blocks on every CDP
//! round trip. Without the feature, `ChromiumDriver::launch` fails with
//! [`UiError::BrowserLaunch`] so callers still compile.
//!
//! Elements are tracked in a page-side registry (`window.__wardprobe`). A
//! handle whose node was removed, or whose registry was lost to navigation,
//! reports [`UiError::Stale`].
//!
//! [`WebDriver`]: crate::WebDriver

use crate::result::UiError;
use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            sandbox: true,
            viewport_width: 1920,
            viewport_height: 1080,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

fn launch_error(err: impl std::fmt::Display) -> UiError {
    UiError::BrowserLaunch {
        message: err.to_string(),
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::{launch_error, BrowserConfig};
    use crate::driver::{split_key_input, ElementHandle, Key, KeyInput, ScriptArg, WebDriver};
    use crate::locator::Selector;
    use crate::result::{UiError, UiResult};
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
        DispatchMouseEventType, InsertTextParams, MouseButton,
    };
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde_json::Value;
    use std::cell::RefCell;
    use tracing::{debug, info};

    fn driver_error(err: impl std::fmt::Display) -> UiError {
        UiError::driver(err.to_string())
    }

    /// [`WebDriver`] backed by a Chromium instance
    #[derive(Debug)]
    pub struct ChromiumDriver {
        config: BrowserConfig,
        runtime: tokio::runtime::Runtime,
        browser: RefCell<Option<CdpBrowser>>,
        page: CdpPage,
        handler: tokio::task::JoinHandle<()>,
    }

    impl ChromiumDriver {
        /// Launch Chromium and open a blank page
        ///
        /// # Errors
        ///
        /// Returns error if browser cannot be launched
        pub fn launch(config: BrowserConfig) -> UiResult<Self> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(launch_error)?;

            let mut builder =
                CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);
            if !config.headless {
                builder = builder.with_head();
            }
            if !config.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }
            let cdp_config = builder.build().map_err(launch_error)?;

            let (browser, page, handler) = runtime.block_on(async {
                let (browser, mut handler) =
                    CdpBrowser::launch(cdp_config).await.map_err(launch_error)?;

                let handler = tokio::spawn(async move {
                    while let Some(event) = handler.next().await {
                        if event.is_err() {
                            break;
                        }
                    }
                });

                let page = browser.new_page("about:blank").await.map_err(launch_error)?;
                Ok::<_, UiError>((browser, page, handler))
            })?;

            info!(headless = config.headless, "Chromium launched");
            Ok(Self {
                config,
                runtime,
                browser: RefCell::new(Some(browser)),
                page,
                handler,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        ///
        /// # Errors
        ///
        /// Returns error if the browser does not shut down cleanly
        pub fn close(self) -> UiResult<()> {
            let browser = self.browser.borrow_mut().take();
            if let Some(mut browser) = browser {
                self.runtime.block_on(async {
                    browser.close().await.map_err(driver_error)?;
                    browser.wait().await.map_err(driver_error)?;
                    Ok::<_, UiError>(())
                })?;
            }
            self.handler.abort();
            Ok(())
        }

        fn evaluate(&self, expression: String) -> UiResult<Value> {
            self.runtime.block_on(async {
                let result = self
                    .page
                    .evaluate_expression(expression)
                    .await
                    .map_err(|e| UiError::Script {
                        message: e.to_string(),
                    })?;
                Ok(result.value().cloned().unwrap_or(Value::Null))
            })
        }

        /// Run `body` with `el` bound to the registered node
        fn on_element(&self, element: &ElementHandle, body: &str) -> UiResult<Value> {
            let expression = format!(
                "(() => {{ const reg = window.__wardprobe; \
                 const el = reg && reg.nodes[{id}]; \
                 if (!el || !el.isConnected) return {{ stale: true }}; \
                 return {{ value: (function(el) {{ {body} }})(el) }}; }})()",
                id = Value::from(element.id.as_str()),
            );
            unwrap_envelope(self.evaluate(expression)?, element)
        }

        fn center_of(&self, element: &ElementHandle) -> UiResult<(f64, f64)> {
            let point = self.on_element(
                element,
                "el.scrollIntoView({ block: 'center', inline: 'center' }); \
                 const r = el.getBoundingClientRect(); \
                 return [r.left + r.width / 2, r.top + r.height / 2];",
            )?;
            match (point[0].as_f64(), point[1].as_f64()) {
                (Some(x), Some(y)) => Ok((x, y)),
                _ => Err(UiError::driver(format!("{element} has no layout box"))),
            }
        }

        fn mouse(&self, kind: DispatchMouseEventType, x: f64, y: f64) -> UiResult<()> {
            let mut params = DispatchMouseEventParams::builder().r#type(kind.clone()).x(x).y(y);
            if kind != DispatchMouseEventType::MouseMoved {
                params = params.button(MouseButton::Left).click_count(1);
            }
            let params = params.build().map_err(driver_error)?;
            self.runtime
                .block_on(self.page.execute(params))
                .map_err(driver_error)?;
            Ok(())
        }

        fn key_event(
            &self,
            kind: DispatchKeyEventType,
            key: &str,
            code: &str,
            virtual_key: i64,
            modifiers: i64,
            text: Option<&str>,
        ) -> UiResult<()> {
            let mut params = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key(key)
                .code(code)
                .windows_virtual_key_code(virtual_key)
                .native_virtual_key_code(virtual_key)
                .modifiers(modifiers);
            if let Some(text) = text {
                params = params.text(text);
            }
            let params = params.build().map_err(driver_error)?;
            self.runtime
                .block_on(self.page.execute(params))
                .map_err(driver_error)?;
            Ok(())
        }

        fn press(&self, key: Key, modifiers: i64) -> UiResult<()> {
            let text = match key {
                Key::Enter => Some("\r"),
                _ => None,
            };
            let down = if text.is_some() {
                DispatchKeyEventType::KeyDown
            } else {
                DispatchKeyEventType::RawKeyDown
            };
            let code = key.dom_key();
            let vk = key.virtual_key_code();
            self.key_event(down, key.dom_key(), code, vk, modifiers, text)?;
            self.key_event(DispatchKeyEventType::KeyUp, key.dom_key(), code, vk, modifiers, None)
        }

        fn insert_text(&self, text: &str) -> UiResult<()> {
            let params = InsertTextParams::builder()
                .text(text)
                .build()
                .map_err(driver_error)?;
            self.runtime
                .block_on(self.page.execute(params))
                .map_err(driver_error)?;
            Ok(())
        }
    }

    fn unwrap_envelope(envelope: Value, element: &ElementHandle) -> UiResult<Value> {
        if envelope.get("stale").and_then(Value::as_bool) == Some(true) {
            return Err(UiError::Stale {
                element: element.to_string(),
            });
        }
        Ok(envelope.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Script that registers every match of `query` and returns their ids.
    ///
    /// A node already in the registry keeps its id, and entries whose node
    /// left the document are dropped, so repeated polling does not grow the
    /// registry.
    fn register_expression(query: &str, batch: uuid::Uuid) -> String {
        format!(
            "(() => {{ const reg = window.__wardprobe = window.__wardprobe || \
             {{ nodes: {{}}, ids: new WeakMap() }}; \
             for (const [id, el] of Object.entries(reg.nodes)) {{ if (!el.isConnected) delete reg.nodes[id]; }} \
             return {query}.map((el, i) => {{ let id = reg.ids.get(el); \
             if (!id || reg.nodes[id] !== el) {{ id = '{batch}-' + i; reg.ids.set(el, id); reg.nodes[id] = el; }} \
             return id; }}); }})()"
        )
    }

    fn script_arg(arg: &ScriptArg<'_>) -> String {
        match arg {
            ScriptArg::Element(handle) => {
                format!("__el({})", Value::from(handle.id.as_str()))
            }
            ScriptArg::Number(n) => Value::from(*n).to_string(),
        }
    }

    impl WebDriver for ChromiumDriver {
        fn navigate(&self, url: &str) -> UiResult<()> {
            debug!(url, "navigate");
            self.runtime
                .block_on(self.page.goto(url))
                .map_err(|e| UiError::driver(format!("navigation to {url} failed: {e}")))?;
            Ok(())
        }

        fn current_url(&self) -> UiResult<String> {
            Ok(self
                .evaluate("window.location.href".to_string())?
                .as_str()
                .unwrap_or_default()
                .to_string())
        }

        fn title(&self) -> UiResult<String> {
            Ok(self
                .evaluate("document.title".to_string())?
                .as_str()
                .unwrap_or_default()
                .to_string())
        }

        fn find_elements(&self, selector: &Selector) -> UiResult<Vec<ElementHandle>> {
            let expression = register_expression(&selector.to_query_all(), uuid::Uuid::new_v4());
            let ids = self.evaluate(expression)?;
            Ok(ids
                .as_array()
                .map(|ids| {
                    ids.iter()
                        .filter_map(Value::as_str)
                        .map(|id| ElementHandle::new(id, selector.to_string()))
                        .collect()
                })
                .unwrap_or_default())
        }

        fn is_displayed(&self, element: &ElementHandle) -> UiResult<bool> {
            let shown = self.on_element(
                element,
                "const r = el.getBoundingClientRect(); const s = getComputedStyle(el); \
                 return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';",
            )?;
            Ok(shown.as_bool().unwrap_or(false))
        }

        fn is_enabled(&self, element: &ElementHandle) -> UiResult<bool> {
            let enabled = self.on_element(element, "return !el.disabled;")?;
            Ok(enabled.as_bool().unwrap_or(true))
        }

        fn click(&self, element: &ElementHandle) -> UiResult<()> {
            let (x, y) = self.center_of(element)?;
            self.mouse(DispatchMouseEventType::MouseMoved, x, y)?;
            self.mouse(DispatchMouseEventType::MousePressed, x, y)?;
            self.mouse(DispatchMouseEventType::MouseReleased, x, y)
        }

        fn clear(&self, element: &ElementHandle) -> UiResult<()> {
            self.on_element(
                element,
                "el.focus(); el.value = ''; \
                 el.dispatchEvent(new Event('input', { bubbles: true })); return null;",
            )
            .map(drop)
        }

        fn send_keys(&self, element: &ElementHandle, text: &str) -> UiResult<()> {
            self.on_element(element, "el.focus(); return null;")?;
            for part in split_key_input(text) {
                match part {
                    KeyInput::Text(run) => self.insert_text(&run)?,
                    KeyInput::Key(key) => self.press(key, 0)?,
                }
            }
            Ok(())
        }

        fn text(&self, element: &ElementHandle) -> UiResult<String> {
            let text = self.on_element(element, "return el.innerText ?? el.textContent ?? '';")?;
            Ok(text.as_str().unwrap_or_default().to_string())
        }

        fn attribute(&self, element: &ElementHandle, name: &str) -> UiResult<Option<String>> {
            let body = format!(
                "const name = {name}; \
                 if (name === 'value' && 'value' in el) return String(el.value); \
                 return el.getAttribute(name);",
                name = Value::from(name),
            );
            let value = self.on_element(element, &body)?;
            Ok(value.as_str().map(str::to_string))
        }

        fn hover(&self, element: &ElementHandle) -> UiResult<()> {
            let (x, y) = self.center_of(element)?;
            self.mouse(DispatchMouseEventType::MouseMoved, x, y)
        }

        fn execute_script(&self, script: &str, args: &[ScriptArg<'_>]) -> UiResult<Value> {
            let args: Vec<String> = args.iter().map(script_arg).collect();
            let expression = format!(
                "(() => {{ const reg = window.__wardprobe; \
                 const __el = (id) => {{ const el = reg && reg.nodes[id]; \
                 if (!el || !el.isConnected) throw new Error('stale:' + id); return el; }}; \
                 let args; try {{ args = [{args}]; }} catch (e) {{ return {{ stale: true }}; }} \
                 return {{ value: (function() {{ {script} }}).apply(null, args) ?? null }}; }})()",
                args = args.join(", "),
            );
            let description = ElementHandle::new("script-argument", "script argument");
            unwrap_envelope(self.evaluate(expression)?, &description)
        }

        fn key_chord(&self, modifier: Key, key: char) -> UiResult<()> {
            let bit = modifier
                .modifier_bit()
                .ok_or_else(|| UiError::driver(format!("{} is not a modifier", modifier.dom_key())))?;
            let upper = key.to_ascii_uppercase();
            let code = format!("Key{upper}");
            let vk = i64::from(u32::from(upper));
            let name = key.to_string();

            self.key_event(
                DispatchKeyEventType::RawKeyDown,
                modifier.dom_key(),
                modifier.dom_key(),
                modifier.virtual_key_code(),
                bit,
                None,
            )?;
            self.key_event(DispatchKeyEventType::RawKeyDown, &name, &code, vk, bit, None)?;
            self.key_event(DispatchKeyEventType::KeyUp, &name, &code, vk, bit, None)?;
            self.key_event(
                DispatchKeyEventType::KeyUp,
                modifier.dom_key(),
                modifier.dom_key(),
                modifier.virtual_key_code(),
                0,
                None,
            )
        }

        fn screenshot(&self) -> UiResult<Vec<u8>> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            let screenshot = self
                .runtime
                .block_on(self.page.execute(params))
                .map_err(driver_error)?;

            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(driver_error)
        }
    }

}

// ============================================================================
// Stand-in when the `browser` feature is disabled
// ============================================================================

#[cfg(not(feature = "browser"))]
mod unavailable {
    use super::{launch_error, BrowserConfig};
    use crate::result::UiResult;

    /// Placeholder; enable the `browser` feature for real CDP support
    #[derive(Debug)]
    pub struct ChromiumDriver {
        config: BrowserConfig,
    }

    impl ChromiumDriver {
        /// Always fails without the `browser` feature
        ///
        /// # Errors
        ///
        /// Always returns `BrowserLaunch`
        pub fn launch(config: BrowserConfig) -> UiResult<Self> {
            let _ = config;
            Err(launch_error(
                "Browser feature not enabled. Enable 'browser' feature for real CDP support.",
            ))
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        ///
        /// # Errors
        ///
        /// Never fails
        pub fn close(self) -> UiResult<()> {
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;

#[cfg(not(feature = "browser"))]
pub use unavailable::ChromiumDriver;

#[cfg(test)]
mod tests {
    use super::*;

    mod browser_config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = BrowserConfig::default();
            assert!(config.headless);
            assert!(config.sandbox);
            assert_eq!((config.viewport_width, config.viewport_height), (1920, 1080));
            assert!(config.chromium_path.is_none());
        }

        #[test]
        fn test_builders() {
            let config = BrowserConfig::default()
                .with_headless(false)
                .with_no_sandbox()
                .with_viewport(1280, 720)
                .with_chromium_path("/usr/bin/chromium");
            assert!(!config.headless);
            assert!(!config.sandbox);
            assert_eq!(config.viewport_width, 1280);
            assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        }

        #[test]
        fn test_partial_yaml_uses_defaults() {
            let config: BrowserConfig = serde_yaml_ng::from_str("headless: false\n").unwrap();
            assert!(!config.headless);
            assert_eq!(config.viewport_width, 1920);
        }
    }

    #[cfg(not(feature = "browser"))]
    mod unavailable_tests {
        use super::*;

        #[test]
        fn test_launch_without_feature_fails() {
            let err = ChromiumDriver::launch(BrowserConfig::default()).unwrap_err();
            assert!(matches!(err, UiError::BrowserLaunch { .. }));
        }
    }
}
